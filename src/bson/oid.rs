//! Client-side ObjectId generation.
//!
//! Layout of the 12 bytes:
//!
//! ```text
//! ┌───────────┬────────────────┬──────────────┬───────────┐
//! │ timestamp │ process-unique │ counter seed │ counter   │
//! │ 4 bytes   │ 3 bytes        │ 2 bytes      │ 3 bytes   │
//! └───────────┴────────────────┴──────────────┴───────────┘
//! ```
//!
//! Timestamp and counter are big-endian. The process-unique bytes and the
//! counter seed are drawn once per process; the counter increments per id
//! and wraps at 24 bits.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// 12-byte unique identifier, used as a default primary key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

/// Counter wraps at 24 bits; only the low 3 bytes land on the wire.
static COUNTER: AtomicU32 = AtomicU32::new(0);

fn process_unique() -> &'static [u8; 5] {
    static UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    UNIQUE.get_or_init(rand::random)
}

impl ObjectId {
    /// Generate a fresh id from the current time, the per-process random
    /// bytes and the incrementing counter.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Build an id from raw bytes (e.g. decoded from the wire).
    #[inline]
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// The raw 12 bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Creation time as seconds since the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(\"{}\")", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_counter_increments() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let counter = |id: &ObjectId| {
            let b = id.bytes();
            u32::from_be_bytes([0, b[9], b[10], b[11]])
        };
        assert_eq!(counter(&b), (counter(&a) + 1) & 0x00FF_FFFF);
    }

    #[test]
    fn test_process_unique_is_stable() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_eq!(&a.bytes()[4..9], &b.bytes()[4..9]);
    }

    #[test]
    fn test_timestamp_is_recent() {
        let id = ObjectId::new();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        assert!(now - id.timestamp() < 5);
    }

    #[test]
    fn test_hex_display() {
        let id = ObjectId::from_bytes([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67,
        ]);
        assert_eq!(id.to_string(), "0123456789abcdef01234567");
        assert_eq!(id.to_string().len(), 24);
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let raw = [7u8; 12];
        assert_eq!(ObjectId::from_bytes(raw).bytes(), &raw);
    }
}
