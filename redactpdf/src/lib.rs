// redactpdf/src/lib.rs
//! # RedactPDF CLI Application
//!
//! This crate provides the command-line interface for the RedactPDF engine:
//! argument parsing, logging setup, and the single-file / batch / info
//! commands. All redaction logic lives in `redactpdf-core`.

pub mod cli;
pub mod commands;
pub mod logger;
