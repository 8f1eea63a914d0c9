// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative configuration for errtree taxonomies.
//!
//! [`TaxonomyConfig`] holds the declared kinds, the base metadata seeded into
//! every root context and the log level. Helpers load it from TOML files,
//! merge overlays and produce advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use errtree_error::UNKNOWN_KIND_LABEL;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The same kind is declared more than once; the last declaration wins.
    DuplicateKind {
        /// The repeated kind.
        kind: String,
    },
    /// A declared kind uses the fallback label, so its errors display the
    /// same name as undeclared ones.
    ShadowsUnknownKind,
    /// No kinds are declared; every error resolves to the fallback kind.
    NoKindsDeclared,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::DuplicateKind { kind } => {
                write!(f, "kind '{kind}' declared more than once; last one wins")
            }
            ConfigWarning::ShadowsUnknownKind => write!(
                f,
                "kind '{UNKNOWN_KIND_LABEL}' is declared and shares its label with the fallback"
            ),
            ConfigWarning::NoKindsDeclared => {
                write!(f, "no kinds declared; every error will be '{UNKNOWN_KIND_LABEL}'")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level taxonomy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct TaxonomyConfig {
    /// Log level for the `errtree.*` tracing targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Metadata seeded beneath every root context's own metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_metadata: BTreeMap<String, serde_json::Value>,

    /// Declared kinds, in declaration order.
    #[serde(default)]
    pub kinds: Vec<KindEntry>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            base_metadata: BTreeMap::new(),
            kinds: Vec::new(),
        }
    }
}

/// One declared kind.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct KindEntry {
    /// Kind label, e.g. `"ValidationError"`.
    pub kind: String,

    /// Suffix appended to messages when a cause is supplied. `{cause}` is
    /// replaced with the cause's display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_suffix: Option<String>,
}

impl KindEntry {
    /// A kind with no suffix template.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            cause_suffix: None,
        }
    }

    /// Builder-style suffix template.
    #[must_use]
    pub fn with_cause_suffix(mut self, template: impl Into<String>) -> Self {
        self.cause_suffix = Some(template.into());
        self
    }

    /// Render this kind's suffix for `cause`, if it declares one.
    pub fn render_suffix(&self, cause: &str) -> Option<String> {
        self.cause_suffix
            .as_deref()
            .map(|template| render_cause_suffix(template, cause))
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Placeholder replaced by the cause text in [`KindEntry::cause_suffix`].
pub const CAUSE_PLACEHOLDER: &str = "{cause}";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Substitute every [`CAUSE_PLACEHOLDER`] in `template`.
pub fn render_cause_suffix(template: &str, cause: &str) -> String {
    template.replace(CAUSE_PLACEHOLDER, cause)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`TaxonomyConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`TaxonomyConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<TaxonomyConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => TaxonomyConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`TaxonomyConfig`].
pub fn parse_toml(content: &str) -> Result<TaxonomyConfig, ConfigError> {
    toml::from_str::<TaxonomyConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `ERRTREE_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut TaxonomyConfig) {
    if let Ok(val) = std::env::var("ERRTREE_LOG_LEVEL") {
        config.log_level = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (bad log level, blank kind names, suffix templates without a
/// placeholder) are returned as a [`ConfigError::ValidationError`]; soft
/// issues come back as warnings.
pub fn validate_config(config: &TaxonomyConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported_duplicates: HashSet<&str> = HashSet::new();
    for (idx, entry) in config.kinds.iter().enumerate() {
        if entry.kind.trim().is_empty() {
            errors.push(format!("kinds[{idx}]: kind must not be empty"));
            continue;
        }
        if let Some(ref template) = entry.cause_suffix {
            if !template.contains(CAUSE_PLACEHOLDER) {
                errors.push(format!(
                    "kind '{}': cause_suffix must contain {CAUSE_PLACEHOLDER}",
                    entry.kind
                ));
            }
        }
        if !seen.insert(entry.kind.as_str()) && reported_duplicates.insert(entry.kind.as_str()) {
            warnings.push(ConfigWarning::DuplicateKind {
                kind: entry.kind.clone(),
            });
        }
    }

    if seen.contains(UNKNOWN_KIND_LABEL) {
        warnings.push(ConfigWarning::ShadowsUnknownKind);
    }
    if config.kinds.is_empty() {
        warnings.push(ConfigWarning::NoKindsDeclared);
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
///
/// Base metadata is merged key-wise with overlay keys winning. Kind lists are
/// concatenated, so an overlay redeclaring a kind wins by the last-declaration
/// rule.
pub fn merge_configs(base: TaxonomyConfig, overlay: TaxonomyConfig) -> TaxonomyConfig {
    let mut base_metadata = base.base_metadata;
    base_metadata.extend(overlay.base_metadata);
    let mut kinds = base.kinds;
    kinds.extend(overlay.kinds);
    TaxonomyConfig {
        log_level: overlay.log_level.or(base.log_level),
        base_metadata,
        kinds,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn config_with_kinds(kinds: &[&str]) -> TaxonomyConfig {
        TaxonomyConfig {
            kinds: kinds.iter().map(|k| KindEntry::new(*k)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_is_valid_but_warns() {
        let warnings = validate_config(&TaxonomyConfig::default()).unwrap();
        assert_eq!(warnings, vec![ConfigWarning::NoKindsDeclared]);
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = TaxonomyConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert!(cfg.kinds.is_empty());
        assert!(cfg.base_metadata.is_empty());
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            log_level = "debug"

            [base_metadata]
            service = "billing"
            replicas = 3

            [[kinds]]
            kind = "ValidationError"

            [[kinds]]
            kind = "NetworkError"
            cause_suffix = " (caused by: {cause})"
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.base_metadata["service"], json!("billing"));
        assert_eq!(cfg.base_metadata["replicas"], json!(3));
        assert_eq!(cfg.kinds.len(), 2);
        assert_eq!(cfg.kinds[0], KindEntry::new("ValidationError"));
        assert_eq!(
            cfg.kinds[1].render_suffix("timeout").as_deref(),
            Some(" (caused by: timeout)")
        );
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let err = parse_toml("this is [not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_wrong_types_gives_parse_error() {
        let err = parse_toml("kinds = 42").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = TaxonomyConfig {
            log_level: Some("verbose".into()),
            ..config_with_kinds(&["A"])
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_blank_kind() {
        let err = validate_config(&config_with_kinds(&["A", "  "])).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert_eq!(reasons, vec!["kinds[1]: kind must not be empty".to_string()]);
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_suffix_without_placeholder() {
        let mut cfg = config_with_kinds(&[]);
        cfg.kinds
            .push(KindEntry::new("NetworkError").with_cause_suffix(" (network)"));
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("cause_suffix must contain {cause}"));
    }

    #[test]
    fn duplicate_kind_warns_once() {
        let warnings = validate_config(&config_with_kinds(&["A", "B", "A", "A"])).unwrap();
        assert_eq!(
            warnings,
            vec![ConfigWarning::DuplicateKind { kind: "A".into() }]
        );
    }

    #[test]
    fn unknown_label_as_kind_warns() {
        let warnings = validate_config(&config_with_kinds(&[UNKNOWN_KIND_LABEL])).unwrap();
        assert_eq!(warnings, vec![ConfigWarning::ShadowsUnknownKind]);
    }

    #[test]
    fn merge_overlay_overrides_base() {
        let base = TaxonomyConfig {
            log_level: Some("info".into()),
            base_metadata: BTreeMap::from([
                ("shared".into(), json!("base")),
                ("only_base".into(), json!(1)),
            ]),
            kinds: vec![KindEntry::new("A")],
        };
        let overlay = TaxonomyConfig {
            log_level: None,
            base_metadata: BTreeMap::from([("shared".into(), json!("overlay"))]),
            kinds: vec![KindEntry::new("B")],
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.log_level.as_deref(), Some("info"));
        assert_eq!(merged.base_metadata["shared"], json!("overlay"));
        assert_eq!(merged.base_metadata["only_base"], json!(1));
        assert_eq!(
            merged.kinds.iter().map(|k| k.kind.as_str()).collect::<Vec<_>>(),
            ["A", "B"]
        );
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[[kinds]]\nkind = \"ValidationError\"").unwrap();
        let cfg = load_config(Some(tmp.path())).unwrap();
        assert_eq!(cfg.kinds, vec![KindEntry::new("ValidationError")]);
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn serialize_omits_empty_optional_fields() {
        let cfg = config_with_kinds(&["A"]);
        let s = toml::to_string(&cfg).unwrap();
        assert!(!s.contains("base_metadata"));
        assert!(!s.contains("cause_suffix"));
        assert_eq!(parse_toml(&s).unwrap(), cfg);
    }

    #[test]
    fn schema_lists_top_level_fields() {
        let schema = schemars::schema_for!(TaxonomyConfig);
        let json = serde_json::to_value(&schema).unwrap();
        let props = json["properties"].as_object().unwrap();
        assert!(props.contains_key("kinds"));
        assert!(props.contains_key("base_metadata"));
        assert!(props.contains_key("log_level"));
    }
}
