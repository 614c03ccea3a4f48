//! Identifier minting.

/// Mint a new opaque identifier.
///
/// Identifiers are the 32-character simple form of a random UUID, which keeps
/// them URL-safe without escaping.
#[must_use]
pub fn new_identifier() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
