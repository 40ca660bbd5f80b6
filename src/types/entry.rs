//! Catalog and roster records.
//!
//! Both record types serialize with the field names of the backup document
//! (`emoji_id`, `user_id`, `username`, `added_by`, `added_at`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::glyph::GlyphId;

/// Numeric chat-platform user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw user id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A curated glyph available in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Glyph id (unique key).
    #[serde(rename = "emoji_id")]
    pub id: GlyphId,
    /// Display name shown in the picker.
    pub name: String,
    /// Handle of the curator who added the glyph.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub added_by: String,
    /// When the entry was last written. Drives catalog order.
    #[serde(with = "timestamp")]
    pub added_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Create a catalog entry.
    pub fn new(
        id: GlyphId,
        name: impl Into<String>,
        added_by: impl Into<String>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            added_by: added_by.into(),
            added_at,
        }
    }
}

/// A non-admin user allowed to curate the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverEntry {
    /// User id (unique key).
    pub user_id: UserId,
    /// Platform handle without the leading `@`, empty when unknown.
    #[serde(rename = "username", default, deserialize_with = "null_as_empty")]
    pub handle: String,
    /// Handle or id of the admin who granted the role.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub added_by: String,
    /// When the entry was last written.
    #[serde(with = "timestamp")]
    pub added_at: DateTime<Utc>,
}

impl ApproverEntry {
    /// Create a roster entry.
    pub fn new(
        user_id: UserId,
        handle: impl Into<String>,
        added_by: impl Into<String>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            handle: handle.into(),
            added_by: added_by.into(),
            added_at,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamp wire format.
///
/// Written as RFC 3339 in UTC with as many fractional digits as needed.
/// Read as RFC 3339, or as a naive ISO 8601 timestamp taken to be UTC
/// (the format older backups were written in).
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}
