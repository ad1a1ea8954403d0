//! In-memory key-value backend.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{KeyValueBackend, StorageError, StorageResult};

/// Process-local backend holding values in a map.
///
/// An optional byte quota makes writes fail the way a full origin store does,
/// which lets callers exercise the best-effort persistence path.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Creates an empty backend with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend that rejects writes past `bytes` total.
    ///
    /// Keys and values both count towards the quota.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota: Some(bytes),
        }
    }

    /// Seeds `key` with `value`, bypassing the quota.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(entries) = self.entries.get_mut() {
            entries.insert(key.into(), value.into());
        }
        self
    }

    /// Number of keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.entries.read().map_err(|_| StorageError::Poisoned)?.len())
    }

    /// Whether the backend holds no keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn used_bytes(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        if let Some(quota) = self.quota {
            let replaced = entries.get(key).map_or(0, |old| key.len() + old.len());
            let needed = used_bytes(&entries) - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("nope").unwrap(), None);
        assert!(backend.is_empty().unwrap());
    }

    #[test]
    fn test_set_overwrites() {
        let backend = MemoryBackend::new();
        backend.set("k", "one").unwrap();
        backend.set("k", "two").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(backend.len().unwrap(), 1);
    }

    #[test]
    fn test_seeded_entry() {
        let backend = MemoryBackend::new().with_entry("k", "v");
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let backend = MemoryBackend::with_quota(8);
        backend.set("k", "1234567").unwrap();
        let err = backend.set("k2", "x").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded { needed: 11, quota: 8 }
        ));
        // Failed write leaves prior state intact
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("1234567"));
        assert_eq!(backend.get("k2").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_replacement_not_sum() {
        let backend = MemoryBackend::with_quota(8);
        backend.set("k", "1234567").unwrap();
        backend.set("k", "7654321").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("7654321"));
    }
}
