// redactpdf-core/tests/redaction_integration_tests.rs
//! End-to-end tests for the built-in span engine over generated fixture
//! documents: span location, erase/insert, the byte-identical fast path,
//! and the compression/save policy.

use std::fs;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use redactpdf_core::pdf::{fonts, info, text};
use redactpdf_core::{
    CompressionPolicy, RedactionEngine, RuleSet, SpanRedactionEngine,
};
use tempfile::TempDir;

/// Builds a single-page document with one text line per entry, starting at
/// baseline (72, 700) and stepping down 20 points per line.
fn build_document_with_font(lines: &[&str], base_font: &str) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut operations = Vec::new();
    let mut baseline = 700i64;
    for line in lines {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("Td", vec![72.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(*line)]),
            Operation::new("ET", vec![]),
        ]);
        baseline -= 20;
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn write_fixture(path: &Path, lines: &[&str], compress: bool) {
    let mut doc = build_document_with_font(lines, "Helvetica");
    if compress {
        doc.compress();
    }
    doc.save(path).expect("save fixture");
}

/// Extracts every span of every page of the saved output.
fn extract_spans(path: &Path) -> Vec<text::TextSpan> {
    let doc = info::load_document(path).expect("output must parse");
    let mut spans = Vec::new();
    let page_ids: Vec<_> = doc.page_iter().collect();
    for page_id in page_ids {
        let page_fonts = fonts::page_fonts(&doc, page_id);
        let blocks = text::extract_blocks(&doc, page_id, &page_fonts).expect("extract");
        for block in blocks {
            for line in block.lines {
                spans.extend(line.spans);
            }
        }
    }
    spans
}

fn simple_rules(find: &str, replace: &str) -> RuleSet {
    RuleSet::builder().add_rule(find, replace, false, false).build().unwrap()
}

#[test_log::test]
fn changed_span_is_replaced_at_its_baseline() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello John Doe and Jane Smith"], false);

    let engine = SpanRedactionEngine::new(&simple_rules("John Doe", "[REDACTED]")).unwrap();
    let outcome = engine.redact_file(&input, &output).unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.pages, 1);
    assert_eq!(outcome.spans_replaced, 1);
    assert_eq!(outcome.spans_degraded, 0);

    let spans = extract_spans(&output);
    let replaced: Vec<_> = spans.iter().filter(|s| s.text.contains("[REDACTED]")).collect();
    assert_eq!(replaced.len(), 1);
    let span = replaced[0];
    assert_eq!(span.text, "Hello [REDACTED] and Jane Smith");
    // The replacement sits on the original baseline, not the bbox corner.
    assert!((span.origin.x - 72.0).abs() < 0.5, "origin.x = {}", span.origin.x);
    assert!((span.origin.y - 700.0).abs() < 0.5, "origin.y = {}", span.origin.y);
    assert!((span.size - 11.0).abs() < 0.01);
    assert!(spans.iter().all(|s| !s.text.contains("John Doe")));
}

#[test_log::test]
fn unchanged_spans_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(
        &input,
        &["Account 123-45-6789", "Nothing sensitive here"],
        false,
    );

    let rules = RuleSet::builder()
        .add_rule(r"\d{3}-\d{2}-\d{4}", "XXX-XX-XXXX", true, false)
        .build()
        .unwrap();
    let engine = SpanRedactionEngine::new(&rules).unwrap();
    let outcome = engine.redact_file(&input, &output).unwrap();

    assert_eq!(outcome.spans_replaced, 1);
    let spans = extract_spans(&output);
    assert!(spans.iter().any(|s| s.text == "Account XXX-XX-XXXX"));
    assert!(spans.iter().any(|s| s.text == "Nothing sensitive here"));
}

#[test_log::test]
fn zero_matches_copies_the_input_byte_for_byte() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello World"], true);

    let engine = SpanRedactionEngine::new(&simple_rules("John Doe", "[REDACTED]")).unwrap();
    let outcome = engine.redact_file(&input, &output).unwrap();

    assert!(!outcome.changed);
    assert_eq!(fs::read(&input).unwrap(), fs::read(&output).unwrap());
}

#[test_log::test]
fn compressed_input_stays_compressed_by_default() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello John Doe"], true);

    assert!(info::inspect(&input).unwrap().uses_compression);

    let engine = SpanRedactionEngine::new(&simple_rules("John Doe", "[REDACTED]")).unwrap();
    let outcome = engine.redact_file(&input, &output).unwrap();

    assert!(outcome.changed);
    assert!(info::inspect(&output).unwrap().uses_compression);
}

#[test_log::test]
fn no_compress_policy_writes_plain_streams() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello John Doe"], true);

    let rules = RuleSet::builder()
        .add_rule("John Doe", "[REDACTED]", false, false)
        .compression(CompressionPolicy { preserve: false, level: 9 })
        .build()
        .unwrap();
    let engine = SpanRedactionEngine::new(&rules).unwrap();
    engine.redact_file(&input, &output).unwrap();

    assert!(!info::inspect(&output).unwrap().uses_compression);
}

#[test_log::test]
fn uncompressed_input_is_not_compressed_even_when_preserving() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello John Doe"], false);

    assert!(!info::inspect(&input).unwrap().uses_compression);

    let engine = SpanRedactionEngine::new(&simple_rules("John Doe", "[REDACTED]")).unwrap();
    engine.redact_file(&input, &output).unwrap();

    assert!(!info::inspect(&output).unwrap().uses_compression);
}

#[test_log::test]
fn missing_input_is_a_file_access_error() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output.pdf");

    let engine = SpanRedactionEngine::new(&simple_rules("x", "y")).unwrap();
    let result = engine.redact_file(Path::new("/no/such/input.pdf"), &output);
    assert!(matches!(result, Err(redactpdf_core::RedactError::FileAccess { .. })));
}

#[test_log::test]
fn inspect_reports_pages_objects_and_size() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    write_fixture(&input, &["Hello World"], false);

    let document_info = info::inspect(&input).unwrap();
    assert_eq!(document_info.page_count, 1);
    assert!(!document_info.encrypted);
    assert!(document_info.object_count > 0);
    assert!(document_info.file_size > 0);
}

#[test_log::test]
fn named_but_not_embedded_arial_falls_back_to_helvetica() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    let mut doc = build_document_with_font(&["Hello John Doe"], "Arial");
    doc.save(&input).unwrap();

    let engine = SpanRedactionEngine::new(&simple_rules("John Doe", "[REDACTED]")).unwrap();
    let outcome = engine.redact_file(&input, &output).unwrap();
    assert_eq!(outcome.spans_replaced, 1);
    assert_eq!(outcome.spans_degraded, 0);

    let spans = extract_spans(&output);
    let replaced = spans
        .iter()
        .find(|s| s.text.contains("[REDACTED]"))
        .expect("replacement span present");
    // Arial is not embedded, so the replacement draws with the mapped
    // standard sans-serif font.
    assert_eq!(replaced.font_base, "Helvetica");
    assert!((replaced.origin.y - 700.0).abs() < 0.5);
}

#[test_log::test]
fn multi_pattern_rules_replace_every_name() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello John Doe and Jane Smith"], false);

    let config: redactpdf_core::RedactionConfig = serde_json::from_str(
        r#"{"replacements": [{"find": ["John Doe", "Jane Smith"], "replace": "[NAME REDACTED]"}]}"#,
    )
    .unwrap();
    let rules = RuleSet::builder().add_config(&config).build().unwrap();
    let engine = SpanRedactionEngine::new(&rules).unwrap();
    engine.redact_file(&input, &output).unwrap();

    let spans = extract_spans(&output);
    assert!(spans
        .iter()
        .any(|s| s.text == "Hello [NAME REDACTED] and [NAME REDACTED]"));
}
