//! Info command: inspect a PDF and print its characteristics.

use anyhow::{Context, Result};
use std::path::Path;

/// Prints page count, encryption and compression status, object count, file
/// size, and the Info-dictionary metadata, then returns.
pub fn run(input: &Path) -> Result<()> {
    let info = redactpdf_core::inspect(input)
        .with_context(|| format!("Failed to inspect {}", input.display()))?;

    println!("\nPDF Information for: {}", input.display());
    println!("Pages: {}", info.page_count);
    println!("Encrypted: {}", info.encrypted);
    println!("Uses Compression: {}", info.uses_compression);
    println!("Compressed Objects: {}", info.compressed_objects);
    println!("Objects: {}", info.object_count);
    println!("File Size: {} bytes", info.file_size);

    if !info.metadata.is_empty() {
        println!("\nMetadata:");
        for (key, value) in &info.metadata {
            println!("  {}: {}", key, value);
        }
    }
    Ok(())
}
