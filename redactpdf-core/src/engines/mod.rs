// redactpdf-core/src/engines/mod.rs
//! Contains the concrete implementations of the `RedactionEngine` trait.

pub mod span_engine;
pub mod tools_engine;

pub use span_engine::SpanRedactionEngine;
pub use tools_engine::ExternalToolsEngine;
