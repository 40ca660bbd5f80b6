//! Backup tokens.
//!
//! A backup token is the literal prefix [`BACKUP_PREFIX`] followed by the
//! standard base64 encoding of a UTF-8 JSON document:
//!
//! ```text
//! EMOJI_BACKUP:eyJlbW9qaV9jYXRhbG9nIjpbXSwiYXBwcm92ZXJzIjpbXX0=
//!              └── {"emoji_catalog":[],"approvers":[]}
//! ```
//!
//! Decoding accepts `catalog` as an alias of `emoji_catalog` (when both are
//! present `emoji_catalog` wins), tolerates a missing or null array, and maps
//! every defect to a [`DecodeError`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash_hex, to_canonical_bytes};
use crate::types::{ApproverEntry, CatalogEntry};

/// Literal prefix of every backup token.
pub const BACKUP_PREFIX: &str = "EMOJI_BACKUP:";

/// Full content of the catalog and roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotDocument")]
pub struct Snapshot {
    /// Catalog entries in catalog order.
    #[serde(rename = "emoji_catalog")]
    pub catalog: Vec<CatalogEntry>,
    /// Roster entries in roster order.
    pub approvers: Vec<ApproverEntry>,
}

/// Wire form accepted on decode, current and legacy keys side by side.
#[derive(Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    emoji_catalog: Option<Vec<CatalogEntry>>,
    #[serde(default)]
    catalog: Option<Vec<CatalogEntry>>,
    #[serde(default)]
    approvers: Option<Vec<ApproverEntry>>,
}

impl From<SnapshotDocument> for Snapshot {
    fn from(document: SnapshotDocument) -> Self {
        Self {
            catalog: document
                .emoji_catalog
                .or(document.catalog)
                .unwrap_or_default(),
            approvers: document.approvers.unwrap_or_default(),
        }
    }
}

impl Snapshot {
    /// Short content hash, for logs and operator comparison.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }

    /// Whether both stores are empty.
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty() && self.approvers.is_empty()
    }
}

/// Why a backup token was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The token does not start with [`BACKUP_PREFIX`].
    #[error("backup must start with {BACKUP_PREFIX}")]
    MissingPrefix,
    /// The payload is not valid base64.
    #[error("backup payload is not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// The decoded payload is not UTF-8.
    #[error("backup payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The document does not have the expected structure.
    #[error("backup document is malformed: {0}")]
    Document(#[from] serde_json::Error),
}

/// Encode a snapshot as a backup token.
pub fn encode(snapshot: &Snapshot) -> String {
    let document = to_canonical_bytes(snapshot);
    format!("{BACKUP_PREFIX}{}", BASE64.encode(document))
}

/// Decode a backup token.
pub fn decode(token: &str) -> Result<Snapshot, DecodeError> {
    let payload = token
        .strip_prefix(BACKUP_PREFIX)
        .ok_or(DecodeError::MissingPrefix)?;
    let bytes = BASE64.decode(payload)?;
    let document = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlyphId, UserId};
    use chrono::{TimeZone, Utc};

    fn sample() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2024, 2, 2, 10, 30, 0).unwrap();
        Snapshot {
            catalog: vec![
                CatalogEntry::new(GlyphId::new("111"), "Fire", "alice", at),
                CatalogEntry::new(GlyphId::new("222"), "Ice", "", at),
            ],
            approvers: vec![ApproverEntry::new(UserId::new(5), "bob", "root", at)],
        }
    }

    #[test]
    fn test_round_trip() {
        let snapshot = sample();
        assert_eq!(decode(&encode(&snapshot)).unwrap(), snapshot);
    }

    #[test]
    fn test_round_trip_empty() {
        let token = encode(&Snapshot::default());
        assert_eq!(token, "EMOJI_BACKUP:eyJlbW9qaV9jYXRhbG9nIjpbXSwiYXBwcm92ZXJzIjpbXX0=");
        assert!(decode(&token).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_missing_prefix() {
        let token = encode(&sample());
        let stripped = token.trim_start_matches(BACKUP_PREFIX);

        assert!(matches!(decode(stripped), Err(DecodeError::MissingPrefix)));
        assert!(matches!(decode(""), Err(DecodeError::MissingPrefix)));
        assert!(matches!(
            decode(&token.to_lowercase()),
            Err(DecodeError::MissingPrefix)
        ));
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(
            decode("EMOJI_BACKUP:not base64!"),
            Err(DecodeError::Encoding(_))
        ));
    }

    #[test]
    fn test_rejects_non_utf8_payload() {
        let token = format!("{BACKUP_PREFIX}{}", BASE64.encode([0xff, 0xfe, 0x00]));
        assert!(matches!(decode(&token), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_rejects_wrong_structure() {
        for document in ["[1,2,3]", "{\"emoji_catalog\": [{\"name\": \"x\"}]}", "nope"] {
            let token = format!("{BACKUP_PREFIX}{}", BASE64.encode(document));
            assert!(
                matches!(decode(&token), Err(DecodeError::Document(_))),
                "accepted {document}"
            );
        }
    }

    #[test]
    fn test_accepts_catalog_alias_and_naive_timestamps() {
        let document = r#"{
            "catalog": [
                {"emoji_id": "5285430309720966085", "name": "Default #1",
                 "added_by": "system", "added_at": "2024-06-01T08:15:30.250000"}
            ]
        }"#;
        let token = format!("{BACKUP_PREFIX}{}", BASE64.encode(document));
        let snapshot = decode(&token).unwrap();

        assert_eq!(snapshot.catalog.len(), 1);
        assert_eq!(snapshot.catalog[0].name, "Default #1");
        assert!(snapshot.approvers.is_empty());
    }

    #[test]
    fn test_current_key_wins_over_legacy_alias() {
        let document = r#"{
            "catalog": [{"emoji_id": "1", "name": "Old", "added_by": "", "added_at": "2023-01-01T00:00:00"}],
            "emoji_catalog": [{"emoji_id": "2", "name": "New", "added_by": "", "added_at": "2024-01-01T00:00:00Z"}],
            "approvers": null
        }"#;
        let token = format!("{BACKUP_PREFIX}{}", BASE64.encode(document));
        let snapshot = decode(&token).unwrap();

        assert_eq!(snapshot.catalog.len(), 1);
        assert_eq!(snapshot.catalog[0].name, "New");
        assert!(snapshot.approvers.is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = sample();
        let mut b = sample();
        b.catalog[0].name = "Flame".to_string();

        assert_eq!(a.fingerprint(), sample().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
