//! Composer configuration.
//!
//! ## Environment
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `COMPOSER_ADMINS` | Comma-separated admin handles | none |
//! | `COMPOSER_DEFAULT_GLYPH` | Glyph attached to new fragments | `5285430309720966085` |
//! | `COMPOSER_MAX_ADDITIONS` | Fragments allowed beyond the primary | 5 |
//! | `COMPOSER_PAGE_SIZE` | Picker entries per page | 10 |
//! | `COMPOSER_SESSION_IDLE_SECS` | Idle session ttl, 0 keeps sessions forever | 0 |
//! | `COMPOSER_SESSION_CAPACITY` | Soft limit on live sessions | 10000 |
//! | `COMPOSER_SEED_CATALOG` | Insert the default glyphs at startup | true |

use chrono::Duration;
use std::str::FromStr;

use crate::picker::PICKER_PAGE_SIZE;
use crate::session::EvictionPolicy;
use crate::types::GlyphId;

/// Glyph attached to every new fragment unless configured otherwise.
pub const DEFAULT_GLYPH_ID: &str = "5285430309720966085";

/// Fragments allowed beyond the primary one.
pub const MAX_ADDITIONS: usize = 5;

/// Curator recorded for seeded catalog entries.
pub const SEED_CURATOR: &str = "system";

/// Glyphs present in a fresh catalog.
pub const DEFAULT_CATALOG: [(&str, &str); 4] = [
    ("5285430309720966085", "Default #1"),
    ("5310169226856644648", "Default #2"),
    ("5310076249404621168", "Default #3"),
    ("5285032475490273112", "Default #4"),
];

/// Runtime configuration of the composer.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Admin handles, without `@`.
    pub admins: Vec<String>,
    /// Glyph attached to new fragments and restored by the toggle.
    pub default_glyph: GlyphId,
    /// Fragments allowed beyond the primary one.
    pub max_additions: usize,
    /// Picker entries per page.
    pub page_size: usize,
    /// Session eviction parameters.
    pub eviction: EvictionPolicy,
    /// Whether to insert [`DEFAULT_CATALOG`] at startup.
    pub seed_catalog: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            default_glyph: GlyphId::new(DEFAULT_GLYPH_ID),
            max_additions: MAX_ADDITIONS,
            page_size: PICKER_PAGE_SIZE,
            eviction: EvictionPolicy::default(),
            seed_catalog: true,
        }
    }
}

impl ComposerConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let admins = lookup("COMPOSER_ADMINS")
            .map(|raw| parse_admins(&raw))
            .unwrap_or(defaults.admins);
        let default_glyph = lookup("COMPOSER_DEFAULT_GLYPH")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(GlyphId::new)
            .unwrap_or(defaults.default_glyph);
        let max_additions = parsed(&lookup, "COMPOSER_MAX_ADDITIONS", defaults.max_additions);
        let page_size = parsed(&lookup, "COMPOSER_PAGE_SIZE", defaults.page_size).max(1);
        let idle_secs: i64 = parsed(&lookup, "COMPOSER_SESSION_IDLE_SECS", 0);
        let capacity = parsed(
            &lookup,
            "COMPOSER_SESSION_CAPACITY",
            defaults.eviction.capacity,
        );
        let seed_catalog = parsed(&lookup, "COMPOSER_SEED_CATALOG", defaults.seed_catalog);

        Self {
            admins,
            default_glyph,
            max_additions,
            page_size,
            eviction: EvictionPolicy {
                idle_ttl: (idle_secs > 0).then(|| Duration::seconds(idle_secs)),
                capacity,
            },
            seed_catalog,
        }
    }

    /// Largest number of fragments a session may hold.
    pub fn fragment_cap(&self) -> usize {
        1 + self.max_additions
    }
}

fn parse_admins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().trim_start_matches('@').to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "unparseable setting, using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ComposerConfig::from_lookup(|_| None);
        assert!(config.admins.is_empty());
        assert_eq!(config.default_glyph.as_str(), DEFAULT_GLYPH_ID);
        assert_eq!(config.fragment_cap(), 6);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.eviction.idle_ttl, None);
        assert!(config.seed_catalog);
    }

    #[test]
    fn test_reads_overrides() {
        let config = ComposerConfig::from_lookup(lookup(&[
            ("COMPOSER_ADMINS", " @Alice, bob ,,"),
            ("COMPOSER_MAX_ADDITIONS", "2"),
            ("COMPOSER_SESSION_IDLE_SECS", "600"),
            ("COMPOSER_SEED_CATALOG", "false"),
        ]));

        assert_eq!(config.admins, vec!["Alice", "bob"]);
        assert_eq!(config.fragment_cap(), 3);
        assert_eq!(config.eviction.idle_ttl, Some(Duration::seconds(600)));
        assert!(!config.seed_catalog);
    }

    #[test]
    fn test_garbage_falls_back() {
        let config = ComposerConfig::from_lookup(lookup(&[
            ("COMPOSER_PAGE_SIZE", "lots"),
            ("COMPOSER_MAX_ADDITIONS", "-3"),
        ]));
        assert_eq!(config.page_size, PICKER_PAGE_SIZE);
        assert_eq!(config.max_additions, MAX_ADDITIONS);
    }
}
