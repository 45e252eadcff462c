//! AgriSens Store
//!
//! SQLite persistence for user accounts and farm profiles.
//!
//! Passwords are stored as SHA-256 hex digests and compared in constant
//! time. All access goes through a single connection guarded by a mutex,
//! so callers on an async runtime should use `spawn_blocking`.

pub mod database;
pub mod error;

pub use database::{hash_password, Database, Farm, FarmUpdate, User};
pub use error::{Result, StoreError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::database::{Database, Farm, FarmUpdate, User};
    pub use crate::error::StoreError;
}
