//! Core configuration, error types, and state management for Pantry.
//!
//! This crate provides the foundational building blocks shared by the
//! encoding, model, and HTTP crates: process configuration loaded from the
//! environment, the core error type, identifier minting, and a
//! household-partitioned in-memory state store.

mod config;
mod error;
mod identifiers;
mod state;

pub use config::PantryConfig;
pub use error::{PantryError, PantryResult};
pub use identifiers::new_identifier;
pub use state::HouseholdStore;
