//! text.rs - Structured text extraction from page content streams.
//!
//! Walks a page's decoded operation list with a small text-state interpreter
//! (graphics stack, current transformation matrix, text/line matrices, font,
//! size, fill color) and produces the page's structured text model:
//! blocks (one per BT..ET group) -> lines (runs sharing a baseline) ->
//! spans (maximal runs sharing one font, size, and color). Non-text content
//! (paths, image XObjects) is not walked.
//!
//! Each span records the indices of the content-stream operations that drew
//! it, so the redaction commit phase can erase exactly those operators.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::errors::{RedactError, Result};
use crate::pdf::fonts::FontInfo;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box in page user space, `(x0, y0)` bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// A maximal run of text sharing one font, size, and color within a line.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
    /// The point the first glyph sits on. Distinct from the bbox corner:
    /// drawing at the box corner misplaces text vertically.
    pub origin: Point,
    /// Font resource name selected with `Tf` (e.g. "F1").
    pub font_res: String,
    /// Resolved BaseFont name (e.g. "Arial").
    pub font_base: String,
    pub size: f32,
    /// Fill color, packed 0xRRGGBB.
    pub color: u32,
    /// Indices into the page's operation list of the show operators that
    /// produced this span.
    pub op_indices: Vec<usize>,
    pub simple_font: bool,
    pub embedded_font: bool,
}

/// Spans sharing one baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub baseline: f32,
    pub spans: Vec<TextSpan>,
}

/// One BT..ET text object.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// Glyph box above/below the baseline, as a fraction of the font size.
const ASCENT_RATIO: f32 = 0.8;
const DESCENT_RATIO: f32 = 0.2;
/// Baselines closer than this are the same line.
const BASELINE_EPSILON: f32 = 1.0;

/// Collects a page's content stream data, concatenating multi-part streams
/// and decompressing where needed.
pub fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page = doc
        .get_object(page_id)
        .map_err(|e| RedactError::Processing(format!("cannot read page object: {}", e)))?;
    let Object::Dictionary(dict) = page else {
        return Err(RedactError::Processing("page object is not a dictionary".to_string()));
    };
    let Ok(contents) = dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    let mut data = Vec::new();
    match contents {
        Object::Reference(id) => {
            if let Ok(Object::Stream(stream)) = doc.get_object(*id) {
                data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
            }
        }
        Object::Array(parts) => {
            for part in parts {
                if let Object::Reference(id) = part {
                    if let Ok(Object::Stream(stream)) = doc.get_object(*id) {
                        data.extend(
                            stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone()),
                        );
                        data.push(b'\n');
                    }
                }
            }
        }
        Object::Stream(stream) => {
            data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
        }
        _ => {}
    }
    Ok(data)
}

/// Extracts the structured text model for one page.
pub fn extract_blocks(
    doc: &Document,
    page_id: ObjectId,
    fonts: &HashMap<String, FontInfo>,
) -> Result<Vec<TextBlock>> {
    let data = page_content(doc, page_id)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let content = Content::decode(&data)
        .map_err(|e| RedactError::Processing(format!("cannot decode content stream: {}", e)))?;

    let mut interpreter = Interpreter::new(fonts);
    interpreter.run(&content.operations);
    Ok(interpreter.finish())
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Concatenates `op` before `ctm`: the result maps a point through `op`,
/// then through `ctm`, matching the `cm` operator's semantics.
fn concat(op: Matrix, ctm: Matrix) -> Matrix {
    [
        op[0] * ctm[0] + op[1] * ctm[2],
        op[0] * ctm[1] + op[1] * ctm[3],
        op[2] * ctm[0] + op[3] * ctm[2],
        op[2] * ctm[1] + op[3] * ctm[3],
        op[4] * ctm[0] + op[5] * ctm[2] + ctm[4],
        op[4] * ctm[1] + op[5] * ctm[3] + ctm[5],
    ]
}

fn apply_matrix(m: Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    let clamp = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (clamp(r) << 16) | (clamp(g) << 8) | clamp(b)
}

/// Unpacks 0xRRGGBB into unit-range components.
pub fn unpack_rgb(color: u32) -> (f32, f32, f32) {
    (
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
    )
}

/// Simple fonts are decoded byte-per-glyph. WinAnsi and Standard encodings
/// agree with Latin-1 over the printable range, which is close enough for
/// matching; exotic encodings degrade to their Latin-1 reading.
fn decode_simple(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

struct SpanBuilder {
    text: String,
    origin: Point,
    pen_x: f32,
    baseline: f32,
    font_res: String,
    font_base: String,
    size: f32,
    color: u32,
    op_indices: Vec<usize>,
    simple_font: bool,
    embedded_font: bool,
}

impl SpanBuilder {
    fn into_span(self) -> TextSpan {
        TextSpan {
            bbox: Rect {
                x0: self.origin.x,
                y0: self.baseline - DESCENT_RATIO * self.size,
                x1: self.pen_x,
                y1: self.baseline + ASCENT_RATIO * self.size,
            },
            text: self.text,
            origin: self.origin,
            font_res: self.font_res,
            font_base: self.font_base,
            size: self.size,
            color: self.color,
            op_indices: self.op_indices,
            simple_font: self.simple_font,
            embedded_font: self.embedded_font,
        }
    }
}

struct Interpreter<'a> {
    fonts: &'a HashMap<String, FontInfo>,
    default_font: FontInfo,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    font_res: String,
    font_size: f32,
    color: u32,
    in_text: bool,
    current: Option<SpanBuilder>,
    block_spans: Vec<TextSpan>,
    blocks: Vec<TextBlock>,
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a HashMap<String, FontInfo>) -> Self {
        Self {
            fonts,
            default_font: FontInfo::default(),
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            leading: 0.0,
            font_res: String::new(),
            font_size: 0.0,
            color: 0x000000,
            in_text: false,
            current: None,
            block_spans: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn run(&mut self, operations: &[lopdf::content::Operation]) {
        for (index, op) in operations.iter().enumerate() {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.ctm_stack.push(self.ctm),
                "Q" => {
                    if let Some(saved) = self.ctm_stack.pop() {
                        self.ctm = saved;
                    }
                }
                "cm" if operands.len() >= 6 => {
                    if let Some(m) = matrix_operands(operands) {
                        self.ctm = concat(m, self.ctm);
                    }
                }
                "BT" => {
                    self.end_block();
                    self.in_text = true;
                    self.text_matrix = IDENTITY;
                    self.line_matrix = IDENTITY;
                }
                "ET" => {
                    self.end_block();
                    self.in_text = false;
                }
                "Tm" if self.in_text && operands.len() >= 6 => {
                    if let Some(m) = matrix_operands(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "Td" if self.in_text && operands.len() >= 2 => {
                    self.translate_line(operands);
                }
                "TD" if self.in_text && operands.len() >= 2 => {
                    if let Some(ty) = number(&operands[1]) {
                        self.leading = -ty;
                    }
                    self.translate_line(operands);
                }
                "T*" if self.in_text => self.next_line(),
                "TL" if !operands.is_empty() => {
                    if let Some(leading) = number(&operands[0]) {
                        self.leading = leading;
                    }
                }
                "Tf" if operands.len() >= 2 => {
                    if let Object::Name(name) = &operands[0] {
                        self.font_res = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = number(&operands[1]) {
                        self.font_size = size.abs();
                    }
                }
                "rg" if operands.len() >= 3 => self.set_color_rgb(operands),
                "g" if !operands.is_empty() => {
                    if let Some(v) = number(&operands[0]) {
                        self.color = pack_rgb(v, v, v);
                    }
                }
                "k" if operands.len() >= 4 => {
                    let values: Vec<f32> = operands.iter().filter_map(number).collect();
                    if values.len() >= 4 {
                        let (c, m, y, k) = (values[0], values[1], values[2], values[3]);
                        self.color =
                            pack_rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k));
                    }
                }
                "sc" | "scn" => {
                    let values: Vec<f32> = operands.iter().filter_map(number).collect();
                    match values.len() {
                        1 => self.color = pack_rgb(values[0], values[0], values[0]),
                        3 => self.color = pack_rgb(values[0], values[1], values[2]),
                        4 => {
                            let (c, m, y, k) = (values[0], values[1], values[2], values[3]);
                            self.color = pack_rgb(
                                (1.0 - c) * (1.0 - k),
                                (1.0 - m) * (1.0 - k),
                                (1.0 - y) * (1.0 - k),
                            );
                        }
                        _ => {}
                    }
                }
                "Tj" if self.in_text => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes, index);
                    }
                }
                "'" if self.in_text => {
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes, index);
                    }
                }
                "\"" if self.in_text && operands.len() >= 3 => {
                    self.next_line();
                    if let Object::String(bytes, _) = &operands[2] {
                        self.show(bytes, index);
                    }
                }
                "TJ" if self.in_text => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(bytes, index),
                                Object::Integer(_) | Object::Real(_) => {
                                    if let Some(adjustment) = number(item) {
                                        self.advance(-adjustment / 1000.0 * self.font_size);
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        self.end_block();
    }

    fn finish(self) -> Vec<TextBlock> {
        self.blocks
    }

    fn translate_line(&mut self, operands: &[Object]) {
        if let (Some(tx), Some(ty)) = (number(&operands[0]), number(&operands[1])) {
            self.line_matrix[4] += tx;
            self.line_matrix[5] += ty;
            self.text_matrix = self.line_matrix;
        }
    }

    fn next_line(&mut self) {
        self.line_matrix[5] -= self.leading;
        self.text_matrix = self.line_matrix;
    }

    fn set_color_rgb(&mut self, operands: &[Object]) {
        let values: Vec<f32> = operands.iter().filter_map(number).collect();
        if values.len() >= 3 {
            self.color = pack_rgb(values[0], values[1], values[2]);
        }
    }

    fn font(&self) -> &FontInfo {
        self.fonts.get(&self.font_res).unwrap_or(&self.default_font)
    }

    /// Moves the pen without emitting glyphs (TJ kerning adjustments).
    fn advance(&mut self, dx: f32) {
        self.text_matrix[4] += dx;
        if let Some(span) = self.current.as_mut() {
            span.pen_x += dx;
        }
    }

    fn show(&mut self, bytes: &[u8], op_index: usize) {
        if bytes.is_empty() {
            return;
        }
        let (x, y) = apply_matrix(self.ctm, self.text_matrix[4], self.text_matrix[5]);
        let font = self.font();
        let text = decode_simple(bytes);
        let width = font.text_width(bytes, self.font_size);
        let simple = font.simple;
        let embedded = font.embedded;
        let font_base = font.base_name.clone();

        // Segments of one show operator always extend the same span: the
        // operator can only be erased whole, so it must not straddle spans.
        let continues = self.current.as_ref().is_some_and(|span| {
            span.font_res == self.font_res
                && span.size == self.font_size
                && span.color == self.color
                && (span.op_indices.last() == Some(&op_index)
                    || ((span.baseline - y).abs() < BASELINE_EPSILON
                        && (span.pen_x - x).abs() <= (0.2 * self.font_size).max(1.0)))
        });

        if continues {
            let span = self.current.as_mut().expect("span checked above");
            span.text.push_str(&text);
            span.pen_x = x + width;
            if span.op_indices.last() != Some(&op_index) {
                span.op_indices.push(op_index);
            }
        } else {
            self.flush_span();
            self.current = Some(SpanBuilder {
                text,
                origin: Point { x, y },
                pen_x: x + width,
                baseline: y,
                font_res: self.font_res.clone(),
                font_base,
                size: self.font_size,
                color: self.color,
                op_indices: vec![op_index],
                simple_font: simple,
                embedded_font: embedded,
            });
        }
        self.text_matrix[4] += width;
    }

    fn flush_span(&mut self) {
        if let Some(span) = self.current.take() {
            self.block_spans.push(span.into_span());
        }
    }

    fn end_block(&mut self) {
        self.flush_span();
        if self.block_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.block_spans);
        self.blocks.push(TextBlock {
            lines: group_lines(spans),
        });
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f32> = operands.iter().take(6).filter_map(number).collect();
    if values.len() == 6 {
        Some([values[0], values[1], values[2], values[3], values[4], values[5]])
    } else {
        None
    }
}

/// Groups spans into lines by baseline, preserving extraction order.
fn group_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    for span in spans {
        let baseline = span.origin.y;
        match lines
            .last_mut()
            .filter(|line| (line.baseline - baseline).abs() < BASELINE_EPSILON)
        {
            Some(line) => line.spans.push(span),
            None => lines.push(TextLine {
                baseline,
                spans: vec![span],
            }),
        }
    }
    lines
}
