//! info.rs - Document inspection.
//!
//! Opens a PDF and reports the facts the pipeline needs before processing:
//! page count, encryption, compression characteristics, object count, file
//! size, and the Info-dictionary metadata. The same record backs the CLI's
//! `--info` mode.
//!
//! License: MIT OR APACHE 2.0

use std::fs;
use std::path::Path;

use lopdf::{Document, Object};

use crate::errors::{RedactError, Result};

/// Inspection record for one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub encrypted: bool,
    pub uses_compression: bool,
    pub compressed_objects: usize,
    pub object_count: usize,
    pub file_size: u64,
    pub metadata: Vec<(String, String)>,
}

/// Opens `path` as a PDF, mapping missing/unreadable files to `FileAccess`
/// and parse failures to `DocumentParse`.
pub fn load_document(path: &Path) -> Result<Document> {
    fs::metadata(path).map_err(|source| RedactError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Document::load(path).map_err(|e| RedactError::DocumentParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Inspects the document at `path`.
pub fn inspect(path: &Path) -> Result<DocumentInfo> {
    let file_size = fs::metadata(path)
        .map_err(|source| RedactError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    let doc = load_document(path)?;
    Ok(inspect_document(&doc, file_size))
}

/// Inspects an already-open document.
pub fn inspect_document(doc: &Document, file_size: u64) -> DocumentInfo {
    let compressed_objects = compressed_stream_count(doc);
    DocumentInfo {
        page_count: doc.get_pages().len(),
        encrypted: is_encrypted(doc),
        uses_compression: compressed_objects > 0,
        compressed_objects,
        object_count: doc.objects.len(),
        file_size,
        metadata: document_metadata(doc),
    }
}

/// An encrypted document carries an Encrypt entry in its trailer. The core
/// does not decrypt; such documents surface as parse errors downstream.
pub fn is_encrypted(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// Counts indirect objects stored as filtered (compressed) streams. The
/// input counts as compressed if at least one such object exists.
pub fn compressed_stream_count(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter(|object| match object {
            Object::Stream(stream) => stream.dict.get(b"Filter").is_ok(),
            _ => false,
        })
        .count()
}

/// Reads the trailer's Info dictionary into displayable key/value pairs.
fn document_metadata(doc: &Document) -> Vec<(String, String)> {
    let mut metadata = Vec::new();
    let info_dict = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return metadata,
        },
        Ok(Object::Dictionary(dict)) => dict,
        _ => return metadata,
    };
    for (key, value) in info_dict.iter() {
        let rendered = match value {
            Object::String(bytes, _) => String::from_utf8_lossy(bytes).to_string(),
            Object::Name(bytes) => String::from_utf8_lossy(bytes).to_string(),
            Object::Integer(n) => n.to_string(),
            Object::Real(n) => n.to_string(),
            _ => continue,
        };
        if !rendered.is_empty() {
            metadata.push((String::from_utf8_lossy(key).to_string(), rendered));
        }
    }
    metadata
}
