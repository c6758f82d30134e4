//! PDF-level machinery: inspection, structured text extraction, span
//! location, content-stream redaction, and the save policy.

pub mod fonts;
pub mod info;
pub mod locator;
pub mod redactor;
pub mod save;
pub mod text;
