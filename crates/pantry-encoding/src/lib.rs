//! Content-type aware encoding and decoding for Pantry.
//!
//! This crate provides the value <-> bytes layer shared by every Pantry
//! service. A [`Codec`] is bound to one [`ContentType`] and dispatches to the
//! matching format driver:
//!
//! - **JSON** via `serde_json` (the default, and the fallback for anything
//!   unrecognised)
//! - **XML** via `quick-xml`'s serde support
//! - **YAML** via `serde_yaml`
//! - **TOML** via `toml`
//! - **Emoji**: CBOR via `ciborium`, re-encoded in base-1024 over emoji
//!   codepoints (see [`emoji`])
//!
//! JSON decoding comes in two flavours: [`Codec::unmarshal`] is lenient and
//! ignores unknown fields, [`Codec::unmarshal_strict`] rejects them. Request
//! bodies are always decoded strictly.

pub mod codec;
pub mod content_type;
pub mod emoji;
pub mod error;

pub use codec::Codec;
pub use content_type::ContentType;
pub use error::EncodingError;
