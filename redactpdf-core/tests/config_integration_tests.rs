// redactpdf-core/tests/config_integration_tests.rs
//! Integration tests for loading and validating JSON rule configurations.

use std::io::Write;

use redactpdf_core::{RedactError, RedactionConfig, RuleSet};
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(json.as_bytes()).expect("write temp config");
    file
}

#[test_log::test]
fn loads_rules_and_compression_from_file() {
    let file = write_config(
        r#"{
            "replacements": [
                {"find": "John Doe", "replace": "[REDACTED]"},
                {"find": "\\d{3}-\\d{2}-\\d{4}", "replace": "XXX-XX-XXXX", "regex": true}
            ],
            "compression": {"preserve": true, "level": 6}
        }"#,
    );

    let config = RedactionConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.replacements.len(), 2);

    let rules = RuleSet::builder().add_config(&config).build().unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules.rules()[1].is_regex);
    assert_eq!(rules.compression.level, 6);
}

#[test_log::test]
fn find_arrays_expand_in_order_with_shared_flags() {
    let file = write_config(
        r#"{
            "replacements": [
                {
                    "find": ["John Doe", "Jane Smith", "Bob Jones"],
                    "replace": "[NAME REDACTED]",
                    "caseInsensitive": true
                }
            ]
        }"#,
    );

    let config = RedactionConfig::load_from_file(file.path()).unwrap();
    let rules = RuleSet::builder().add_config(&config).build().unwrap();

    assert_eq!(rules.len(), 3);
    let finds: Vec<&str> = rules.rules().iter().map(|r| r.find.as_str()).collect();
    assert_eq!(finds, ["John Doe", "Jane Smith", "Bob Jones"]);
    assert!(rules.rules().iter().all(|r| r.replace == "[NAME REDACTED]"));
    assert!(rules.rules().iter().all(|r| r.case_insensitive && !r.is_regex));
}

#[test_log::test]
fn malformed_json_is_a_config_error() {
    let file = write_config(r#"{"replacements": [{"find": "#);
    let result = RedactionConfig::load_from_file(file.path());
    assert!(matches!(result, Err(RedactError::Config(_))));
}

#[test_log::test]
fn missing_config_file_is_a_file_access_error() {
    let result = RedactionConfig::load_from_file("/no/such/config.json");
    assert!(matches!(result, Err(RedactError::FileAccess { .. })));
}

#[test_log::test]
fn invalid_regex_in_config_fails_before_any_document_io() {
    let file = write_config(
        r#"{"replacements": [{"find": "(unclosed", "replace": "x", "regex": true}]}"#,
    );
    let config = RedactionConfig::load_from_file(file.path()).unwrap();
    let result = RuleSet::builder().add_config(&config).build();
    assert!(matches!(result, Err(RedactError::Config(_))));
}
