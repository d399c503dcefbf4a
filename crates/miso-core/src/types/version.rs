//! Version sets aggregated from object-store listings.
//!
//! Every stored artifact sits exactly one segment below its identity prefix,
//! so the first segment left after stripping the prefix is the version label.
//! Several objects share a version (one per platform for providers), hence
//! the set.

use std::collections::hash_set::{IntoIter, Iter};
use std::collections::HashSet;

/// Distinct version labels found under one identity prefix
///
/// Iteration order is unspecified; the registry protocol does not require
/// sorted output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet {
    versions: HashSet<String>,
}

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the distinct version labels of `keys` listed under `prefix`
    pub fn from_keys<I, S>(prefix: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for key in keys {
            if let Some(label) = version_label(prefix, key.as_ref()) {
                set.versions.insert(label.to_string());
            }
        }
        set
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String> {
        self.versions.iter()
    }
}

impl IntoIterator for VersionSet {
    type Item = String;
    type IntoIter = IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.into_iter()
    }
}

impl<'a> IntoIterator for &'a VersionSet {
    type Item = &'a String;
    type IntoIter = Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

/// First path segment of `key` once `prefix` is removed
///
/// A key without the prefix is taken whole, and a remainder without `/` is
/// itself the label. Returns `None` only for an empty label: a key equal to
/// the prefix (left behind by folder-marker objects) or a doubled slash
/// right after it.
pub fn version_label<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(prefix).unwrap_or(key);
    let label = rest.split('/').next().unwrap_or(rest);
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
