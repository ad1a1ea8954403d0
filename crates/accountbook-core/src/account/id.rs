//! Account identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use super::model::AccountId;

/// Source of fresh account identifiers.
pub trait IdGenerator {
    /// Returns an identifier not previously returned in this process.
    fn generate(&self) -> AccountId;
}

/// Random UUIDs drawn from the operating system's CSPRNG.
///
/// Falls back to [`TimestampIdGenerator`] if the OS generator is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureIdGenerator;

impl IdGenerator for SecureIdGenerator {
    fn generate(&self) -> AccountId {
        let mut bytes = [0u8; 16];
        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => {
                let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
                AccountId::new(uuid.to_string())
            }
            Err(e) => {
                warn!("Secure random source unavailable, using timestamp id: {e}");
                TimestampIdGenerator.generate()
            }
        }
    }
}

/// Process-wide sequence shared by every [`TimestampIdGenerator`].
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// `"{unix_millis}_{sequence}"` identifiers.
///
/// The sequence number makes ids unique within the process even when many are
/// generated in the same millisecond.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIdGenerator;

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self) -> AccountId {
        let millis = chrono::Utc::now().timestamp_millis();
        let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        AccountId::new(format!("{millis}_{n}"))
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
    use std::collections::HashSet;

    #[test]
    fn test_secure_ids_are_v4_uuids() {
        let id = SecureIdGenerator.generate();
        let parsed = uuid::Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_secure_uniqueness() {
        let mut seen = HashSet::new();
        for _ in 0..10000 {
            assert!(seen.insert(SecureIdGenerator.generate()), "duplicate id generated");
        }
    }

    #[test]
    fn test_timestamp_format() {
        let id = TimestampIdGenerator.generate();
        let (millis, seq) = id.as_str().split_once('_').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        seq.parse::<u64>().unwrap();
    }

    #[test]
    fn test_timestamp_uniqueness_in_tight_loop() {
        let mut seen = HashSet::new();
        for _ in 0..10000 {
            assert!(
                seen.insert(TimestampIdGenerator.generate()),
                "duplicate id generated"
            );
        }
    }
}
