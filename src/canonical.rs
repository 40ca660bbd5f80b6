//! Canonical serialization for backup documents and fingerprints.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable Vec order: entries serialize in listing order
//! - No maps in serialized state, so no key-order drift

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to compact JSON bytes.
///
/// Only used with plain derived structs whose serialization cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Probe {
        name: String,
        value: i32,
    }

    #[test]
    fn test_determinism() {
        let probe = Probe {
            name: "test".to_string(),
            value: 42,
        };

        assert_eq!(canonical_hash(&probe), canonical_hash(&probe));
        assert_eq!(canonical_hash_hex(&probe).len(), 16);
    }

    #[test]
    fn test_compact_output() {
        let probe = Probe {
            name: "a".to_string(),
            value: 1,
        };
        assert_eq!(to_canonical_bytes(&probe), br#"{"name":"a","value":1}"#.to_vec());
    }
}
