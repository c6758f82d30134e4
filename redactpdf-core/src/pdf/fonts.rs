//! fonts.rs - Font resources: lookup, metrics, and standard-font fallback.
//!
//! Builds a per-page table of the fonts a content stream can select with
//! `Tf`, including glyph widths (for span geometry), whether the font
//! program is embedded, and whether its encoding is simple (single-byte).
//! Also provides the static standard-font fallback used when replacement
//! text cannot be drawn with the original font.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use log::debug;
use once_cell::sync::Lazy;

use crate::errors::{RedactError, Result};

/// Average glyph width in millesimal text-space units, used when a font
/// carries no Widths array.
pub const DEFAULT_GLYPH_WIDTH: f32 = 550.0;

/// Everything the interpreter and the applicator need to know about one
/// font resource.
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// BaseFont name with any subset prefix (`ABCDEF+`) stripped.
    pub base_name: String,
    pub first_char: i64,
    pub widths: Vec<f32>,
    pub default_width: f32,
    /// Single-byte encoded (Type1/TrueType/Type3). Composite Type0 fonts
    /// use multi-byte CMaps and cannot carry re-encoded replacement text.
    pub simple: bool,
    pub embedded: bool,
    /// Raw embedded font program bytes (FontFile/FontFile2/FontFile3),
    /// captured so the span's exact font can be reused for the insertion.
    pub font_program: Option<Vec<u8>>,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            base_name: "Helvetica".to_string(),
            first_char: 0,
            widths: Vec::new(),
            default_width: DEFAULT_GLYPH_WIDTH,
            simple: true,
            embedded: false,
            font_program: None,
        }
    }
}

impl FontInfo {
    /// Width of one glyph code in millesimal units.
    pub fn glyph_width(&self, code: u8) -> f32 {
        let index = code as i64 - self.first_char;
        if index >= 0 && (index as usize) < self.widths.len() {
            let w = self.widths[index as usize];
            if w > 0.0 {
                return w;
            }
        }
        self.default_width
    }

    /// Width of a byte string at `size`, in text-space units.
    pub fn text_width(&self, bytes: &[u8], size: f32) -> f32 {
        bytes.iter().map(|&b| self.glyph_width(b)).sum::<f32>() / 1000.0 * size
    }
}

/// Follows a reference one level; non-references pass through.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn name_of(doc: &Document, object: &Object) -> Option<String> {
    match resolve(doc, object) {
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

fn number_of(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Resolves a page's Resources dictionary, following Parent inheritance the
/// way page attributes inherit in the page tree.
pub fn resources_dict<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    let mut current: &Object = doc.get_object(page_id).ok()?;
    loop {
        let Object::Dictionary(dict) = current else {
            return None;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Object::Dictionary(resolved) = resolve(doc, resources) {
                return Some(resolved);
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = doc.get_object(*parent_id).ok()?,
            _ => return None,
        }
    }
}

/// Builds the font table for one page: resource name -> FontInfo.
pub fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<String, FontInfo> {
    let mut fonts = HashMap::new();
    let Some(resources) = resources_dict(doc, page_id) else {
        return fonts;
    };
    let Ok(font_entry) = resources.get(b"Font") else {
        return fonts;
    };
    let Object::Dictionary(font_dict) = resolve(doc, font_entry) else {
        return fonts;
    };
    for (name, entry) in font_dict.iter() {
        if let Object::Dictionary(descriptor) = resolve(doc, entry) {
            fonts.insert(
                String::from_utf8_lossy(name).to_string(),
                font_info(doc, descriptor),
            );
        }
    }
    fonts
}

fn font_info(doc: &Document, dict: &Dictionary) -> FontInfo {
    let base_name = dict
        .get(b"BaseFont")
        .ok()
        .and_then(|o| name_of(doc, o))
        .map(|n| strip_subset_prefix(&n).to_string())
        .unwrap_or_else(|| "Helvetica".to_string());
    let subtype = dict.get(b"Subtype").ok().and_then(|o| name_of(doc, o));
    let simple = subtype.as_deref() != Some("Type0");

    let first_char = dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| match resolve(doc, o) {
            Object::Integer(i) => Some(*i),
            _ => None,
        })
        .unwrap_or(0);
    let widths = dict
        .get(b"Widths")
        .ok()
        .and_then(|o| match resolve(doc, o) {
            Object::Array(items) => Some(items.iter().filter_map(number_of).collect()),
            _ => None,
        })
        .unwrap_or_default();

    let descriptor = dict
        .get(b"FontDescriptor")
        .ok()
        .and_then(|o| match resolve(doc, o) {
            Object::Dictionary(d) => Some(d),
            _ => None,
        });
    let default_width = descriptor
        .and_then(|d| d.get(b"MissingWidth").ok())
        .and_then(number_of)
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_GLYPH_WIDTH);
    let font_program = descriptor.and_then(|d| embedded_font_program(doc, d));

    FontInfo {
        base_name,
        first_char,
        widths,
        default_width,
        simple,
        embedded: font_program.is_some(),
        font_program,
    }
}

const FONT_FILE_KEYS: [&[u8]; 3] = [b"FontFile", b"FontFile2", b"FontFile3"];

/// Captures the raw font program bytes from a font descriptor, if embedded.
fn embedded_font_program(doc: &Document, descriptor: &Dictionary) -> Option<Vec<u8>> {
    for key in FONT_FILE_KEYS {
        if let Ok(entry) = descriptor.get(key) {
            if let Object::Stream(stream) = resolve(doc, entry) {
                return Some(
                    stream
                        .decompressed_content()
                        .unwrap_or_else(|_| stream.content.clone()),
                );
            }
        }
    }
    None
}

/// Subset fonts are named like `ABCDEF+RealName`.
fn strip_subset_prefix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() > 7 && bytes[6] == b'+' && bytes[..6].iter().all(u8::is_ascii_uppercase) {
        &name[7..]
    } else {
        name
    }
}

/// The static standard-font fallback table: a named-but-not-embedded font
/// maps onto one of the base-14 fonts by family; unmapped names get the
/// sans-serif default.
static STANDARD_FALLBACKS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("courier", "Courier"),
        ("consol", "Courier"),
        ("mono", "Courier"),
        ("times", "Times-Roman"),
        ("georgia", "Times-Roman"),
        ("garamond", "Times-Roman"),
        ("cambria", "Times-Roman"),
        ("arial", "Helvetica"),
        ("helvetica", "Helvetica"),
        ("verdana", "Helvetica"),
        ("calibri", "Helvetica"),
    ]
});

pub fn fallback_base_font(original: &str) -> &'static str {
    let lowered = original.to_lowercase();
    for (family, standard) in STANDARD_FALLBACKS.iter() {
        if lowered.contains(family) {
            return standard;
        }
    }
    "Helvetica"
}

/// Makes sure a standard Type1 font with the given BaseFont is registered in
/// the page's font resources, reusing an existing matching entry when there
/// is one. Returns the resource name to select with `Tf`.
pub fn ensure_standard_font(doc: &mut Document, page_id: ObjectId, base: &str) -> Result<String> {
    let mut taken_names: Vec<String> = Vec::new();
    if let Some(resources) = resources_dict(doc, page_id) {
        if let Ok(font_entry) = resources.get(b"Font") {
            if let Object::Dictionary(font_dict) = resolve(doc, font_entry) {
                for (name, entry) in font_dict.iter() {
                    let res_name = String::from_utf8_lossy(name).to_string();
                    if let Object::Dictionary(d) = resolve(doc, entry) {
                        let is_type1 = name_of(doc, d.get(b"Subtype").unwrap_or(&Object::Null))
                            .as_deref()
                            == Some("Type1");
                        let same_base = name_of(doc, d.get(b"BaseFont").unwrap_or(&Object::Null))
                            .as_deref()
                            == Some(base);
                        if is_type1 && same_base {
                            debug!("Reusing existing font resource /{} for {}", res_name, base);
                            return Ok(res_name);
                        }
                    }
                    taken_names.push(res_name);
                }
            }
        }
    }

    let mut index = 0;
    let res_name = loop {
        let candidate = format!("RF{}", index);
        if !taken_names.contains(&candidate) {
            break candidate;
        }
        index += 1;
    };

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    });
    add_font_resource(doc, page_id, &res_name, font_id)?;
    debug!("Registered standard font {} as /{}", base, res_name);
    Ok(res_name)
}

/// Inserts `res_name -> font_id` into the page's font resources, creating
/// the Resources and Font dictionaries when absent and following references
/// when they are indirect.
fn add_font_resource(
    doc: &mut Document,
    page_id: ObjectId,
    res_name: &str,
    font_id: ObjectId,
) -> Result<()> {
    let processing = |e: lopdf::Error| RedactError::Processing(format!("font registration: {}", e));

    let resources_ref: Option<ObjectId> = match doc.get_object(page_id).map_err(processing)? {
        Object::Dictionary(dict) => match dict.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        },
        _ => {
            return Err(RedactError::Processing(
                "page object is not a dictionary".to_string(),
            ))
        }
    };

    let mut indirect_font_dict: Option<ObjectId> = None;
    {
        let resources: &mut Dictionary = if let Some(id) = resources_ref {
            doc.get_object_mut(id)
                .map_err(processing)?
                .as_dict_mut()
                .map_err(processing)?
        } else {
            let page = doc
                .get_object_mut(page_id)
                .map_err(processing)?
                .as_dict_mut()
                .map_err(processing)?;
            if page.get(b"Resources").is_err() {
                page.set("Resources", Object::Dictionary(Dictionary::new()));
            }
            page.get_mut(b"Resources")
                .map_err(processing)?
                .as_dict_mut()
                .map_err(processing)?
        };

        match resources.get(b"Font") {
            Ok(Object::Reference(id)) => indirect_font_dict = Some(*id),
            Ok(Object::Dictionary(_)) => {
                resources
                    .get_mut(b"Font")
                    .map_err(processing)?
                    .as_dict_mut()
                    .map_err(processing)?
                    .set(res_name, Object::Reference(font_id));
            }
            _ => {
                let mut font_dict = Dictionary::new();
                font_dict.set(res_name, Object::Reference(font_id));
                resources.set("Font", Object::Dictionary(font_dict));
            }
        }
    }

    if let Some(id) = indirect_font_dict {
        doc.get_object_mut(id)
            .map_err(processing)?
            .as_dict_mut()
            .map_err(processing)?
            .set(res_name, Object::Reference(font_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_maps_common_families() {
        assert_eq!(fallback_base_font("Arial"), "Helvetica");
        assert_eq!(fallback_base_font("Times New Roman"), "Times-Roman");
        assert_eq!(fallback_base_font("Courier New"), "Courier");
        assert_eq!(fallback_base_font("SomeObscureFont"), "Helvetica");
    }

    #[test]
    fn subset_prefix_is_stripped() {
        assert_eq!(strip_subset_prefix("ABCDEF+Garamond"), "Garamond");
        assert_eq!(strip_subset_prefix("Garamond"), "Garamond");
        assert_eq!(strip_subset_prefix("AbCdEf+X"), "AbCdEf+X");
    }
}
