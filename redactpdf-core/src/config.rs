//! Configuration management for `redactpdf-core`.
//!
//! This module defines the core data structures for replacement rules and the
//! compression policy. It handles deserialization of the JSON configuration
//! file and provides utilities for building, normalizing, and validating the
//! rule set before any document is opened.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{RedactError, Result};

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A single find/replace rule, fully normalized: one pattern per rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    /// The text or regex pattern to search for.
    pub find: String,
    /// The string to replace matches with. For regex rules this may contain
    /// `$n` group references with the `regex` crate's substitution semantics.
    pub replace: String,
    /// If true, `find` is treated as a regular expression.
    pub is_regex: bool,
    /// If true, matching ignores letter case.
    pub case_insensitive: bool,
}

/// How the output document is written.
///
/// `preserve` mirrors the input's compression characteristics: a compressed
/// input produces a compressed output at `level`, an uncompressed input stays
/// uncompressed. With `preserve` off the output is always uncompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionPolicy {
    pub preserve: bool,
    pub level: u32,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self { preserve: true, level: 9 }
    }
}

/// The `find` field of a config entry accepts either a single pattern or an
/// array of patterns sharing the entry's `replace` and flags.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FindSpec {
    One(String),
    Many(Vec<String>),
}

/// A raw replacement entry as it appears in the JSON configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfigRule {
    pub find: FindSpec,
    pub replace: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default, rename = "caseInsensitive")]
    pub case_insensitive: bool,
}

/// Top-level structure of the JSON configuration file. `compression` is
/// `None` when the file does not set it, so CLI-provided settings survive a
/// config file that is silent about compression.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub replacements: Vec<ConfigRule>,
    pub compression: Option<CompressionPolicy>,
}

impl RedactionConfig {
    /// Loads a configuration from a JSON file. Malformed JSON is a
    /// configuration error; the rules are validated later, when the rule set
    /// is built.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading replacement rules from: {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| RedactError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RedactionConfig = serde_json::from_str(&text).map_err(|e| {
            RedactError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        info!(
            "Loaded {} replacement entries from {}.",
            config.replacements.len(),
            path.display()
        );
        Ok(config)
    }
}

/// An immutable, ordered list of normalized rules plus the compression
/// policy for the run. Built once per invocation, then passed by reference
/// to all document-processing calls.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    pub compression: CompressionPolicy,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Accumulates rules from the config file and CLI flags, in order, and
/// validates the lot before any document is opened.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
    compression: CompressionPolicy,
}

impl RuleSetBuilder {
    /// Appends a single rule.
    pub fn add_rule(mut self, find: &str, replace: &str, is_regex: bool, case_insensitive: bool) -> Self {
        self.rules.push(Rule {
            find: find.to_string(),
            replace: replace.to_string(),
            is_regex,
            case_insensitive,
        });
        self
    }

    /// Appends all entries from a loaded configuration, expanding multi-find
    /// entries into one rule per pattern, in array order. An explicit
    /// compression section replaces the builder's current policy.
    pub fn add_config(mut self, config: &RedactionConfig) -> Self {
        for entry in &config.replacements {
            let patterns: Vec<&str> = match &entry.find {
                FindSpec::One(p) => vec![p.as_str()],
                FindSpec::Many(ps) => ps.iter().map(String::as_str).collect(),
            };
            for pattern in patterns {
                self.rules.push(Rule {
                    find: pattern.to_string(),
                    replace: entry.replace.clone(),
                    is_regex: entry.regex,
                    case_insensitive: entry.case_insensitive,
                });
            }
        }
        if let Some(policy) = config.compression {
            self.compression = policy;
        }
        self
    }

    /// Overrides the compression policy (CLI flags win over the config file).
    pub fn compression(mut self, policy: CompressionPolicy) -> Self {
        self.compression = policy;
        self
    }

    /// Validates and finalizes the rule set. Fails fast on any invalid rule,
    /// before any document I/O begins.
    pub fn build(self) -> Result<RuleSet> {
        validate_rules(&self.rules)?;
        if self.compression.level > 9 {
            return Err(RedactError::Config(format!(
                "Compression level {} is out of range (0-9).",
                self.compression.level
            )));
        }
        debug!("Rule set built with {} rules.", self.rules.len());
        Ok(RuleSet {
            rules: self.rules,
            compression: self.compression,
        })
    }
}

/// Validates rule integrity: non-empty patterns, bounded length, and regex
/// compilation for regex rules.
fn validate_rules(rules: &[Rule]) -> Result<()> {
    let mut errors = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        if rule.find.is_empty() {
            errors.push(format!("Rule #{} has an empty `find` pattern.", index + 1));
            continue;
        }
        if rule.find.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Rule #{}: pattern length ({}) exceeds maximum allowed ({}).",
                index + 1,
                rule.find.len(),
                MAX_PATTERN_LENGTH
            ));
            continue;
        }
        if rule.is_regex {
            if let Err(e) = regex::Regex::new(&rule.find) {
                errors.push(format!("Rule #{} has an invalid regex pattern: {}", index + 1, e));
            }
        }
    }

    if !errors.is_empty() {
        Err(RedactError::Config(format!(
            "Rule validation failed:\n{}",
            errors.join("\n")
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_find_entry_expands_to_one_rule_per_pattern() {
        let json = r#"{
            "replacements": [
                {"find": ["John Doe", "Jane Smith"], "replace": "[NAME REDACTED]"}
            ]
        }"#;
        let config: RedactionConfig = serde_json::from_str(json).unwrap();
        let rules = RuleSet::builder().add_config(&config).build().unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[0].find, "John Doe");
        assert_eq!(rules.rules()[1].find, "Jane Smith");
        assert!(rules.rules().iter().all(|r| r.replace == "[NAME REDACTED]"));
        assert!(rules.rules().iter().all(|r| !r.is_regex && !r.case_insensitive));
    }

    #[test]
    fn config_defaults_are_applied() {
        let json = r#"{"replacements": [{"find": "SSN", "replace": "[REDACTED]"}]}"#;
        let config: RedactionConfig = serde_json::from_str(json).unwrap();

        assert!(!config.replacements[0].regex);
        assert!(!config.replacements[0].case_insensitive);
        assert!(config.compression.is_none());

        let rules = RuleSet::builder().add_config(&config).build().unwrap();
        assert!(rules.compression.preserve);
        assert_eq!(rules.compression.level, 9);
    }

    #[test]
    fn compression_section_is_honored() {
        let json = r#"{
            "replacements": [{"find": "x", "replace": "y"}],
            "compression": {"preserve": false, "level": 3}
        }"#;
        let config: RedactionConfig = serde_json::from_str(json).unwrap();
        let rules = RuleSet::builder().add_config(&config).build().unwrap();

        assert!(!rules.compression.preserve);
        assert_eq!(rules.compression.level, 3);
    }

    #[test]
    fn invalid_regex_fails_the_build() {
        let result = RuleSet::builder()
            .add_rule("[unclosed", "x", true, false)
            .build();
        assert!(matches!(result, Err(RedactError::Config(_))));
    }

    #[test]
    fn empty_find_fails_the_build() {
        let result = RuleSet::builder().add_rule("", "x", false, false).build();
        assert!(matches!(result, Err(RedactError::Config(_))));
    }

    #[test]
    fn cli_rules_append_after_config_rules() {
        let json = r#"{"replacements": [{"find": "first", "replace": "1"}]}"#;
        let config: RedactionConfig = serde_json::from_str(json).unwrap();
        let rules = RuleSet::builder()
            .add_config(&config)
            .add_rule("second", "2", false, false)
            .build()
            .unwrap();

        assert_eq!(rules.rules()[0].find, "first");
        assert_eq!(rules.rules()[1].find, "second");
    }
}
