//! # miso-core
//!
//! Core types and utilities shared across all miso crates.
//!
//! This crate provides:
//! - Registry identity types (provider and module addresses)
//! - Storage key construction for provider binaries and module archives
//! - Version-set derivation from listed storage keys
//! - The `DownloadMode` switch between presigned redirects and proxying
//! - `MisoError` for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Identity tuples, storage keys, version sets, download mode
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{MisoError, MisoResult, StorageOperation};
pub use types::{
    DownloadMode, ModuleAddress, ProviderAddress, ProviderPlatform, StorageKey, VersionSet,
};
