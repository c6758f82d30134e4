// redactpdf/tests/cli_integration_tests.rs
//! Command-line integration tests for the `redactpdf` executable.
//!
//! These tests exercise the binary the way a user would: fixture PDFs are
//! generated with `lopdf` into temporary directories, the binary is invoked
//! with `assert_cmd`, and assertions run against exit status, stdout,
//! stderr, and the produced output files. `tempfile` keeps every test
//! isolated and artifact-free.

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Builds a single-page Helvetica document with one text line per entry.
fn write_fixture(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
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
    doc.save(path).expect("save fixture");
}

fn redactpdf() -> Command {
    let mut cmd = Command::cargo_bin("redactpdf").unwrap();
    cmd.env("RUST_LOG", "info");
    cmd
}

#[test]
fn no_arguments_is_a_usage_error() {
    redactpdf()
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Specify either input/output files or --input-dir/--output-dir",
        ));
}

#[test]
fn single_file_mode_requires_a_rule_source() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    write_fixture(&input, &["Hello World"]);

    redactpdf()
        .arg(&input)
        .arg(dir.path().join("output.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Single file mode requires either --config or --find/--replace",
        ));
}

#[test]
fn replace_without_find_is_rejected_by_the_parser() {
    redactpdf()
        .args(["a.pdf", "b.pdf", "--replace", "[X]"])
        .assert()
        .failure();
}

#[test]
fn compression_level_out_of_range_is_rejected() {
    redactpdf()
        .args(["a.pdf", "b.pdf", "--find", "x", "--replace", "y"])
        .args(["--compression-level", "12"])
        .assert()
        .failure();
}

#[test]
fn info_mode_prints_document_characteristics() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    write_fixture(&input, &["Hello World"]);

    redactpdf()
        .arg(&input)
        .arg("--info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pages: 1"))
        .stdout(predicate::str::contains("Encrypted: false"))
        .stdout(predicate::str::contains("File Size:"));
}

#[test]
fn info_without_input_is_a_usage_error() {
    redactpdf()
        .arg("--info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--info requires an input file"));
}

#[test]
fn single_file_run_produces_a_valid_redacted_pdf() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello John Doe and Jane Smith"]);

    redactpdf()
        .arg(&input)
        .arg(&output)
        .args(["--find", "John Doe", "--replace", "[REDACTED]"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Successfully created"));

    let doc = Document::load(&output).expect("output must be a valid PDF");
    assert_eq!(doc.get_pages().len(), 1);
    let text = doc.extract_text(&[1]).unwrap_or_default();
    assert!(!text.contains("John Doe"), "original text must be gone: {}", text);
}

#[test]
fn missing_input_fails_with_exit_code_one() {
    let dir = TempDir::new().unwrap();

    redactpdf()
        .arg(dir.path().join("missing.pdf"))
        .arg(dir.path().join("output.pdf"))
        .args(["--find", "x", "--replace", "y"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot access"));
}

#[test]
fn invalid_regex_fails_before_any_document_io() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("output.pdf");
    write_fixture(&input, &["Hello World"]);

    redactpdf()
        .arg(&input)
        .arg(&output)
        .args(["--find", "(unclosed", "--replace", "x", "--regex"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Rule validation failed"));

    assert!(!output.exists());
}

#[test]
fn batch_mode_processes_every_pdf_and_reports_a_summary() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    fs::create_dir(&input_dir).unwrap();
    write_fixture(&input_dir.join("a.pdf"), &["Call John Doe today"]);
    write_fixture(&input_dir.join("b.pdf"), &["Nothing to hide"]);

    let config_path = dir.path().join("rules.json");
    fs::write(
        &config_path,
        r#"{"replacements": [{"find": ["John Doe", "Jane Smith"], "replace": "[NAME REDACTED]"}]}"#,
    )
    .unwrap();

    redactpdf()
        .args(["--input-dir"])
        .arg(&input_dir)
        .args(["--output-dir"])
        .arg(&output_dir)
        .args(["--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Found 2 PDF files to process"))
        .stderr(predicate::str::contains("Successfully processed 2/2 files"));

    assert!(output_dir.join("a.pdf").exists());
    assert!(output_dir.join("b.pdf").exists());
    // The unchanged document is copied byte for byte.
    assert_eq!(
        fs::read(input_dir.join("b.pdf")).unwrap(),
        fs::read(output_dir.join("b.pdf")).unwrap()
    );
}

#[test]
fn batch_mode_continues_past_unreadable_files() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    fs::create_dir(&input_dir).unwrap();
    write_fixture(&input_dir.join("good.pdf"), &["Hello John Doe"]);
    fs::write(input_dir.join("broken.pdf"), b"this is not a pdf").unwrap();

    redactpdf()
        .args(["--input-dir"])
        .arg(&input_dir)
        .args(["--output-dir"])
        .arg(&output_dir)
        .args(["--find", "John Doe", "--replace", "[REDACTED]"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Successfully processed 1/2 files"));

    assert!(output_dir.join("good.pdf").exists());
}

#[test]
fn malformed_config_fails_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.pdf");
    write_fixture(&input, &["Hello World"]);
    let config_path = dir.path().join("rules.json");
    fs::write(&config_path, "{not valid json").unwrap();

    redactpdf()
        .arg(&input)
        .arg(dir.path().join("output.pdf"))
        .args(["--config"])
        .arg(&config_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}
