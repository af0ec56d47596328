use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{CaptionError, CaptionResult};

/// Width of an average glyph relative to the font size, used when no font is loaded.
const ESTIMATED_ADVANCE_EM: f64 = 0.55;
/// Line height relative to the font size for estimated metrics.
const ESTIMATED_LINE_EM: f64 = 1.2;

const GENERIC_FAMILIES: &[&str] = &[
    "sans-serif",
    "serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-sans-serif",
    "ui-serif",
    "ui-monospace",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// One registered font file.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    bytes: Arc<Vec<u8>>,
    font: vello_cpu::peniko::FontData,
}

impl FontFace {
    /// Family name read from the font's name table.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Fonts available to the caption renderer, in registration order.
///
/// The first registered face is the fallback for stacks that name no known family.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl FontBook {
    /// Empty book; captions render with estimated metrics and no glyphs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every file in `paths`.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> CaptionResult<Self> {
        let mut book = Self::new();
        for p in paths {
            book.add_file(p.as_ref())?;
        }
        Ok(book)
    }

    /// Read and register a TrueType/OpenType file. Returns the family name.
    pub fn add_file(&mut self, path: &Path) -> CaptionResult<String> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font file '{}'", path.display()))?;
        self.add_bytes(bytes)
    }

    /// Register raw font bytes. Returns the family name.
    pub fn add_bytes(&mut self, bytes: Vec<u8>) -> CaptionResult<String> {
        let mut probe = parley::FontContext::default();
        let families = probe
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CaptionError::validation("no font families found in font data"))?;
        let family = probe
            .collection
            .family_name(family_id)
            .ok_or_else(|| CaptionError::validation("registered font family has no name"))?
            .to_string();

        let bytes = Arc::new(bytes);
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        tracing::debug!(family = %family, "registered font");
        self.faces.push(FontFace {
            family: family.clone(),
            bytes,
            font,
        });
        Ok(family)
    }

    /// Return `true` when no font has been registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Registered family names.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(FontFace::family)
    }

    /// First face whose family appears in `stack`, else the fallback face.
    pub fn resolve(&self, stack: &[String]) -> Option<&FontFace> {
        stack
            .iter()
            .filter(|name| !GENERIC_FAMILIES.contains(&name.to_ascii_lowercase().as_str()))
            .find_map(|name| {
                self.faces
                    .iter()
                    .find(|f| f.family.eq_ignore_ascii_case(name))
            })
            .or_else(|| self.faces.first())
    }
}

/// A single shaped line ready to paint.
#[derive(Clone, Debug)]
pub struct ShapedLine {
    /// Advance width in pixels.
    pub width: f64,
    /// Line box height in pixels.
    pub height: f64,
    /// Glyphs positioned relative to the top-left of the line box.
    pub glyphs: Vec<vello_cpu::Glyph>,
    /// Font size the glyphs were shaped at.
    pub font_size: f32,
}

/// Measured text, shaped when a font was available.
#[derive(Clone, Debug)]
pub enum MeasuredText {
    /// Real glyph layout.
    Shaped {
        /// Face used for shaping.
        face: FontFace,
        /// Layout result.
        line: ShapedLine,
    },
    /// No font available; only the box is painted.
    Estimated {
        /// Estimated advance width.
        width: f64,
        /// Estimated line height.
        height: f64,
    },
}

impl MeasuredText {
    /// Width in pixels.
    pub fn width(&self) -> f64 {
        match self {
            MeasuredText::Shaped { line, .. } => line.width,
            MeasuredText::Estimated { width, .. } => *width,
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> f64 {
        match self {
            MeasuredText::Shaped { line, .. } => line.height,
            MeasuredText::Estimated { height, .. } => *height,
        }
    }
}

/// Estimated single-line metrics for `text` at `size_px`.
pub fn estimate_metrics(text: &str, size_px: f64) -> (f64, f64) {
    let chars = text.chars().count() as f64;
    (
        chars * size_px * ESTIMATED_ADVANCE_EM,
        size_px * ESTIMATED_LINE_EM,
    )
}

/// Stateful helper for building Parley layouts from the faces of a [`FontBook`].
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    /// Measure `text`, shaping it with the face resolved from `stack` when possible.
    pub(crate) fn measure(
        &mut self,
        fonts: &FontBook,
        stack: &[String],
        text: &str,
        size_px: f32,
    ) -> CaptionResult<MeasuredText> {
        let Some(face) = fonts.resolve(stack) else {
            let (width, height) = estimate_metrics(text, f64::from(size_px));
            return Ok(MeasuredText::Estimated { width, height });
        };
        let line = self.shape_line(face, text, size_px)?;
        Ok(MeasuredText::Shaped {
            face: face.clone(),
            line,
        })
    }

    /// Shape `text` as one unwrapped line.
    pub(crate) fn shape_line(
        &mut self,
        face: &FontFace,
        text: &str,
        size_px: f32,
    ) -> CaptionResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CaptionError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_name_for(face)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::default()));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        Ok(ShapedLine {
            width: f64::from(layout.width()),
            height: f64::from(layout.height()),
            glyphs,
            font_size: size_px,
        })
    }

    fn family_name_for(&mut self, face: &FontFace) -> CaptionResult<String> {
        if let Some(name) = self.registered.get(face.family()) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(face.bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CaptionError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CaptionError::validation("registered font family has no name"))?
            .to_string();
        self.registered
            .insert(face.family().to_string(), name.clone());
        Ok(name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
