//! Core data types for the miso registry.
//!
//! This module provides the fundamental types used throughout miso:
//! - Identity tuples addressing providers and modules
//! - Storage keys derived from those identities
//! - Version sets aggregated from listed keys
//! - The configured download strategy

pub mod address;
pub mod download;
pub mod key;
pub mod version;

// Re-export all public types
pub use address::{ModuleAddress, ProviderAddress, ProviderPlatform};
pub use download::DownloadMode;
pub use key::StorageKey;
pub use version::VersionSet;

#[cfg(test)]
mod tests;
