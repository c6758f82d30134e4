//! save.rs - Compression/save policy.
//!
//! Writes the output document, mirroring the input's compression
//! characteristics unless overridden: a compressed input is re-deflated at
//! the configured level, everything else is written with plain streams.
//! Structure cleanup (pruning unreferenced objects, dropping zero-length
//! streams, renumbering) always runs, so the erase/insert churn does not
//! bloat the output with dead objects.
//!
//! License: MIT OR Apache-2.0

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Document, Object};
use log::{debug, info};

use crate::config::CompressionPolicy;
use crate::errors::{RedactError, Result};

/// Cleans up the document and writes it to `path` under the given policy.
/// Returns the size of the written file.
pub fn save_document(
    doc: &mut Document,
    path: &Path,
    input_was_compressed: bool,
    policy: &CompressionPolicy,
) -> Result<u64> {
    let _ = doc.prune_objects();
    let _ = doc.delete_zero_length_streams();
    doc.renumber_objects();

    if policy.preserve && input_was_compressed && policy.level > 0 {
        info!("Saving with compression (level {})...", policy.level);
        compress_streams(doc, policy.level)?;
    } else {
        debug!("Saving without stream compression.");
        doc.decompress();
    }

    doc.save(path).map_err(|e| RedactError::Save {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let final_size = fs::metadata(path)
        .map_err(|source| RedactError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    Ok(final_size)
}

/// Deflates every unfiltered, compressible stream at the given level (1-9).
fn compress_streams(doc: &mut Document, level: u32) -> Result<()> {
    let mut compressed = 0usize;
    for object in doc.objects.values_mut() {
        if let Object::Stream(stream) = object {
            if !stream.allows_compression || stream.dict.get(b"Filter").is_ok() {
                continue;
            }
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
            encoder.write_all(&stream.content)?;
            let data = encoder.finish()?;
            stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            stream.dict.set("Length", data.len() as i64);
            stream.content = data;
            compressed += 1;
        }
    }
    debug!("Deflated {} streams at level {}.", compressed, level);
    Ok(())
}
