//! locator.rs - Span location: which spans change, and how to redraw them.
//!
//! Walks the page's structured text model (blocks -> lines -> spans) and,
//! for every span whose text changes under the rule set, captures the
//! geometry, baseline origin, font, size, and color needed to erase and
//! redraw it. Produces a lazy sequence consumed once by the applicator in
//! the same page pass; extraction order is preserved and never re-sorted.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashMap;

use log::debug;

use crate::matcher::CompiledRules;
use crate::pdf::fonts::FontInfo;
use crate::pdf::text::{Point, Rect, TextBlock};

/// The instruction to erase a region and draw replacement text.
#[derive(Debug, Clone)]
pub struct RedactionOp {
    /// Erase region.
    pub bbox: Rect,
    /// Exact draw point for the replacement: the original baseline origin,
    /// not the bbox corner.
    pub origin: Point,
    pub new_text: String,
    pub font_res: String,
    pub font_base: String,
    pub size: f32,
    pub color: u32,
    /// Raw embedded font program bytes, when the span's font is embedded.
    pub font_program: Option<Vec<u8>>,
    pub simple_font: bool,
    /// Operation indices of the show operators to erase.
    pub op_indices: Vec<usize>,
}

/// Runs the matcher over every span of the page and yields one
/// `RedactionOp` per changed span, lazily, in extraction order.
pub fn locate<'a>(
    blocks: &'a [TextBlock],
    fonts: &'a HashMap<String, FontInfo>,
    rules: &'a CompiledRules,
) -> impl Iterator<Item = RedactionOp> + 'a {
    blocks
        .iter()
        .flat_map(|block| block.lines.iter())
        .flat_map(|line| line.spans.iter())
        .filter_map(move |span| {
            if span.text.trim().is_empty() {
                return None;
            }
            let (new_text, changed) = rules.apply(&span.text);
            if !changed {
                return None;
            }
            debug!(
                "Span at ({:.1}, {:.1}) changes: {:?} -> {:?}",
                span.origin.x, span.origin.y, span.text, new_text
            );
            let font_program = fonts
                .get(&span.font_res)
                .and_then(|f| f.font_program.clone());
            Some(RedactionOp {
                bbox: span.bbox,
                origin: span.origin,
                new_text,
                font_res: span.font_res.clone(),
                font_base: span.font_base.clone(),
                size: span.size,
                color: span.color,
                font_program,
                simple_font: span.simple_font,
                op_indices: span.op_indices.clone(),
            })
        })
}
