//! # TaskNest Shared Library
//!
//! This crate contains the shared types and backend contracts used by the
//! TaskNest live sync core.
//!
//! ## Module Organization
//!
//! - `models`: Records (projects, columns, tasks), principals and write fields
//! - `paths`: Collection and blob path layout
//! - `backend`: Document store, blob store and identity provider contracts
//! - `config`: Configuration management
//! - `error`: Sync error taxonomy

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod paths;

pub use error::{SyncError, SyncResult, UploadError};

/// Current version of the TaskNest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
