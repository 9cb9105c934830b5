//! Linker configuration.
//!
//! [`SiblingConfig`] is the user-editable snapshot. It is compiled into
//! [`ScanRules`] at the start of every scan, so a bad pattern fails that scan
//! and nothing else.

use crate::error::ConfigError;
use crate::types::DocumentId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Supported quiescence window, in milliseconds.
pub const QUIESCENCE_RANGE_MS: RangeInclusive<u64> = 100..=60_000;

/// Scope remembered by the scheduler for a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeScope {
    /// Scan only the changed document.
    #[default]
    Document,
    /// Rescan the whole vault.
    Vault,
}

/// Sibling linker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiblingConfig {
    /// Regex a document's short name must match to be scanned.
    pub eligible_pattern: String,
    /// Documents whose identity contains any of these substrings are skipped.
    pub exclude_paths: Vec<String>,
    /// Frontmatter property receiving sibling mentions.
    pub property: String,
    /// Debounce window after the last change notification.
    pub quiescence_ms: u64,
    /// Notify the user when a scan changed something.
    pub notify_on_change: bool,
    /// What a change notification scans.
    pub change_scope: ChangeScope,
    /// Scan lines inside a document's own frontmatter block.
    pub include_frontmatter: bool,
    /// Extension of documents whose changes trigger a scan.
    pub text_extension: String,
}

impl Default for SiblingConfig {
    fn default() -> Self {
        Self {
            eligible_pattern: r"[0-9]{4}-[0-9]{2}-[0-9]{2}".to_string(),
            exclude_paths: Vec::new(),
            property: "mentions".to_string(),
            quiescence_ms: 1000,
            notify_on_change: false,
            change_scope: ChangeScope::Document,
            include_frontmatter: false,
            text_extension: "md".to_string(),
        }
    }
}

impl SiblingConfig {
    /// Validate and compile the scan rules.
    pub fn compile(&self) -> Result<ScanRules, ConfigError> {
        let pattern =
            Regex::new(&self.eligible_pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: self.eligible_pattern.clone(),
                source,
            })?;

        if !is_valid_property(&self.property) {
            return Err(ConfigError::InvalidProperty(self.property.clone()));
        }

        Ok(ScanRules {
            filter: EligibilityFilter {
                pattern,
                exclusions: self
                    .exclude_paths
                    .iter()
                    .filter(|s| !s.is_empty())
                    .cloned()
                    .collect(),
            },
            property: self.property.clone(),
            include_frontmatter: self.include_frontmatter,
        })
    }

    /// Validated debounce window.
    pub fn quiescence(&self) -> Result<Duration, ConfigError> {
        if QUIESCENCE_RANGE_MS.contains(&self.quiescence_ms) {
            Ok(Duration::from_millis(self.quiescence_ms))
        } else {
            Err(ConfigError::QuiescenceOutOfRange(self.quiescence_ms))
        }
    }

    /// Debounce window, clamped into the supported range.
    pub fn quiescence_clamped(&self) -> Duration {
        let ms = self
            .quiescence_ms
            .clamp(*QUIESCENCE_RANGE_MS.start(), *QUIESCENCE_RANGE_MS.end());
        Duration::from_millis(ms)
    }

    /// Validate every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile()?;
        self.quiescence()?;
        Ok(())
    }
}

fn is_valid_property(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

/// Which documents participate in scanning.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    pattern: Regex,
    exclusions: Vec<String>,
}

impl EligibilityFilter {
    /// A document qualifies iff its short name matches the pattern and its
    /// identity contains no exclusion substring.
    pub fn is_eligible(&self, id: &DocumentId) -> bool {
        self.pattern.is_match(id.short_name())
            && !self
                .exclusions
                .iter()
                .any(|excluded| id.as_str().contains(excluded.as_str()))
    }
}

/// Compiled configuration consumed by a single scan.
#[derive(Debug, Clone)]
pub struct ScanRules {
    /// Eligibility predicate.
    pub filter: EligibilityFilter,
    /// Target property name.
    pub property: String,
    /// Whether frontmatter lines are scanned.
    pub include_frontmatter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_daily_notes() {
        let rules = SiblingConfig::default().compile().unwrap();
        assert!(rules.filter.is_eligible(&DocumentId::new("daily/2024-01-01.md")));
        assert!(rules.filter.is_eligible(&DocumentId::new("Meeting 2024-01-01 notes.md")));
        assert!(!rules.filter.is_eligible(&DocumentId::new("Alice.md")));
        assert_eq!(rules.property, "mentions");
    }

    #[test]
    fn test_pattern_matches_short_name_not_folder() {
        let rules = SiblingConfig::default().compile().unwrap();
        assert!(!rules.filter.is_eligible(&DocumentId::new("2024-01-01/Alice.md")));
    }

    #[test]
    fn test_exclusions_match_identity_substrings() {
        let config = SiblingConfig {
            exclude_paths: vec!["templates/".to_string(), String::new()],
            ..Default::default()
        };
        let rules = config.compile().unwrap();
        assert!(!rules.filter.is_eligible(&DocumentId::new("templates/2024-01-01.md")));
        assert!(rules.filter.is_eligible(&DocumentId::new("daily/2024-01-01.md")));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let config = SiblingConfig {
            eligible_pattern: "([0-9".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_property_names() {
        for good in ["mentions", "_x", "see-also", "rel_2"] {
            assert!(is_valid_property(good), "{good} should be valid");
        }
        for bad in ["", "2nd", "with space", "a:b", "-lead"] {
            assert!(!is_valid_property(bad), "{bad} should be invalid");
        }

        let config = SiblingConfig {
            property: "has space".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidProperty(_))
        ));
    }

    #[test]
    fn test_quiescence_bounds() {
        let mut config = SiblingConfig::default();
        assert_eq!(config.quiescence().unwrap(), Duration::from_millis(1000));

        config.quiescence_ms = 10;
        assert!(config.quiescence().is_err());
        assert_eq!(config.quiescence_clamped(), Duration::from_millis(100));

        config.quiescence_ms = 120_000;
        assert!(config.validate().is_err());
        assert_eq!(config.quiescence_clamped(), Duration::from_millis(60_000));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SiblingConfig = toml::from_str(
            r#"
            property = "related"
            change_scope = "vault"
            "#,
        )
        .unwrap();
        assert_eq!(config.property, "related");
        assert_eq!(config.change_scope, ChangeScope::Vault);
        assert_eq!(config.quiescence_ms, 1000);
        assert_eq!(config.text_extension, "md");
    }
}
