//! redactor.rs - The redaction applicator.
//!
//! Rewrites one page's content stream in three phases that are never
//! interleaved per span: mark every op's erase region, commit all erasures
//! at once by dropping the marked show operators, then insert each
//! replacement at its recorded baseline. Interleaving erase and insert per
//! span would risk a later erase removing an earlier insertion where
//! regions overlap.
//!
//! A span whose insertion fails (font registration, unencodable text) is
//! left erased-but-blank and counted, rather than failing the page.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use log::{debug, warn};

use crate::errors::{RedactError, Result};
use crate::pdf::fonts::{ensure_standard_font, fallback_base_font};
use crate::pdf::locator::RedactionOp;
use crate::pdf::text::{page_content, unpack_rgb};

/// What happened to one page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageEdit {
    pub replaced: usize,
    pub degraded: usize,
}

/// Applies all redaction ops to one page.
pub fn apply(doc: &mut Document, page_id: ObjectId, ops: Vec<RedactionOp>) -> Result<PageEdit> {
    if ops.is_empty() {
        return Ok(PageEdit::default());
    }

    let data = page_content(doc, page_id)?;
    let content = Content::decode(&data)
        .map_err(|e| RedactError::Processing(format!("cannot decode content stream: {}", e)))?;

    // Mark phase: register every erase region.
    let mut marked: HashSet<usize> = HashSet::new();
    for op in &ops {
        marked.extend(op.op_indices.iter().copied());
    }
    debug!(
        "Page {:?}: erasing {} show operators for {} spans",
        page_id,
        marked.len(),
        ops.len()
    );

    // Commit phase: drop all marked operators in one pass.
    let mut operations: Vec<Operation> = content
        .operations
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !marked.contains(index))
        .map(|(_, op)| op)
        .collect();

    // Insert phase: draw each replacement at its recorded baseline.
    let mut edit = PageEdit::default();
    for op in &ops {
        match resolve_draw_font(doc, page_id, op) {
            Ok(font_res) => {
                operations.extend(draw_text_ops(&font_res, op));
                edit.replaced += 1;
            }
            Err(e) => {
                warn!(
                    "Replacement at ({:.1}, {:.1}) could not be drawn, leaving span blank: {}",
                    op.origin.x, op.origin.y, e
                );
                edit.degraded += 1;
            }
        }
    }

    install_content(doc, page_id, Content { operations })?;
    Ok(edit)
}

/// Picks the font resource to draw with. An embedded, simple-encoded font is
/// still registered on the page and is reused as-is; composite or
/// non-embedded fonts fall through to the standard-font table.
fn resolve_draw_font(doc: &mut Document, page_id: ObjectId, op: &RedactionOp) -> Result<String> {
    if op.font_program.is_some() && op.simple_font && !op.font_res.is_empty() {
        return Ok(op.font_res.clone());
    }
    ensure_standard_font(doc, page_id, fallback_base_font(&op.font_base))
}

fn draw_text_ops(font_res: &str, op: &RedactionOp) -> Vec<Operation> {
    let (r, g, b) = unpack_rgb(op.color);
    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(font_res.as_bytes().to_vec()),
                Object::Real(op.size),
            ],
        ),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        Operation::new(
            "Td",
            vec![Object::Real(op.origin.x), Object::Real(op.origin.y)],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(
                encode_simple(&op.new_text),
                lopdf::StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Encodes replacement text for a single-byte font. Characters outside
/// Latin-1 have no slot in the target encoding and degrade to '?'.
fn encode_simple(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

/// Replaces the page's content with the rewritten operation list. The old
/// stream objects become unreferenced and are pruned at save time.
fn install_content(doc: &mut Document, page_id: ObjectId, content: Content) -> Result<()> {
    let encoded = content
        .encode()
        .map_err(|e| RedactError::Processing(format!("cannot encode content stream: {}", e)))?;
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| RedactError::Processing(format!("cannot access page object: {}", e)))?;
    if let Object::Dictionary(dict) = page {
        dict.set("Contents", Object::Reference(stream_id));
        Ok(())
    } else {
        Err(RedactError::Processing(
            "page object is not a dictionary".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_encoding_degrades_unmappable_chars() {
        assert_eq!(encode_simple("abc"), b"abc");
        assert_eq!(encode_simple("caf\u{e9}"), b"caf\xe9");
        assert_eq!(encode_simple("\u{2603}"), b"?");
    }
}
