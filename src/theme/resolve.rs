use crate::theme::color::{Color, parse_css_color};
use crate::theme::spec::{BackgroundToken, PaintSpec, TextTransform};
use crate::theme::table::ThemeEntry;
use std::collections::HashMap;
use std::sync::Arc;

/// Font size used when a theme omits it or spells it badly.
pub const DEFAULT_FONT_SIZE_PX: f32 = 24.0;
/// Vertical box padding fallback.
pub const DEFAULT_PADDING_V_PX: f32 = 8.0;
/// Horizontal box padding fallback.
pub const DEFAULT_PADDING_H_PX: f32 = 16.0;
/// Corner radius fallback.
pub const DEFAULT_RADIUS_PX: f32 = 4.0;
/// Upper bound for box padding and corner radius.
pub const MAX_BOX_INSET_PX: f32 = 1024.0;

/// Concrete caption box background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    /// Nothing is painted behind the text.
    None,
    /// Single color.
    Solid(Color),
    /// Two-stop linear gradient running left to right across the box.
    LinearX {
        /// Left edge color.
        from: Color,
        /// Right edge color.
        to: Color,
    },
}

/// Text shadow parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    /// Horizontal offset in pixels.
    pub offset_x: f32,
    /// Vertical offset in pixels.
    pub offset_y: f32,
    /// Blur radius in pixels.
    pub blur: f32,
    /// Shadow color.
    pub color: Color,
}

/// Box padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    /// Top and bottom padding.
    pub vertical: f32,
    /// Left and right padding.
    pub horizontal: f32,
}

/// Concrete paint parameters derived from a [`PaintSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    /// Font families in preference order, quotes stripped.
    pub font_families: Vec<String>,
    /// Font size in pixels.
    pub font_size_px: f32,
    /// Text color.
    pub text_color: Color,
    /// Box background.
    pub background: Fill,
    /// Optional text shadow.
    pub shadow: Option<Shadow>,
    /// Box padding.
    pub padding: Padding,
    /// Box corner radius in pixels; `0` paints square corners.
    pub radius_px: f32,
    /// Case transform applied to chunk text at paint time.
    pub text_transform: TextTransform,
    /// Pulse the caption scale while visible.
    pub pulse: bool,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        resolve_style(&PaintSpec::default())
    }
}

/// Resolve a paint spec into concrete draw parameters.
///
/// Pure and infallible: every malformed field falls back to its documented default.
pub fn resolve_style(spec: &PaintSpec) -> ResolvedStyle {
    let background = resolve_background(spec);
    ResolvedStyle {
        font_families: parse_font_families(spec.font_family.as_deref()),
        font_size_px: spec
            .font_size
            .as_deref()
            .and_then(parse_px)
            .filter(|v| *v > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE_PX),
        text_color: resolve_text_color(spec, background),
        background,
        shadow: spec.text_shadow.as_deref().and_then(parse_shadow),
        padding: spec
            .padding
            .as_deref()
            .and_then(parse_padding)
            .unwrap_or(Padding {
                vertical: DEFAULT_PADDING_V_PX,
                horizontal: DEFAULT_PADDING_H_PX,
            }),
        radius_px: spec
            .border_radius
            .as_deref()
            .and_then(parse_px)
            .filter(|v| *v >= 0.0)
            .unwrap_or(DEFAULT_RADIUS_PX)
            .min(MAX_BOX_INSET_PX),
        text_transform: spec.text_transform,
        pulse: spec.pulse,
    }
}

fn resolve_background(spec: &PaintSpec) -> Fill {
    if let Some(g) = &spec.gradient {
        let from = g
            .from
            .as_deref()
            .and_then(parse_css_color)
            .unwrap_or(BackgroundToken::Black80.color());
        let to = g
            .to
            .as_deref()
            .and_then(parse_css_color)
            .unwrap_or(BackgroundToken::Black60.color());
        return Fill::LinearX { from, to };
    }
    let color = spec
        .background
        .as_deref()
        .and_then(parse_css_color)
        .or_else(|| spec.background_token.map(BackgroundToken::color))
        .unwrap_or(BackgroundToken::Black80.color());
    if color.is_invisible() {
        Fill::None
    } else {
        Fill::Solid(color)
    }
}

fn resolve_text_color(spec: &PaintSpec, background: Fill) -> Color {
    if let Some(c) = spec.color.as_deref().and_then(parse_css_color) {
        return c;
    }
    if let Some(token) = spec.text_token {
        return token.color();
    }
    // Brightness heuristic: dark text only on a clearly light, mostly opaque box.
    let probe = match background {
        Fill::None => return Color::WHITE,
        Fill::Solid(c) => c,
        Fill::LinearX { from, to } => from.lerp(to, 0.5),
    };
    if probe.a >= 0.5 && probe.luminance() > 0.6 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

fn parse_font_families(stack: Option<&str>) -> Vec<String> {
    stack
        .unwrap_or_default()
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a CSS length in pixels (`"12px"`, `"12"`, `"12.5px"`).
pub(crate) fn parse_px(s: &str) -> Option<f32> {
    let s = s.trim();
    let num = s.strip_suffix("px").unwrap_or(s).trim();
    let v: f32 = num.parse().ok()?;
    v.is_finite().then_some(v)
}

fn parse_padding(s: &str) -> Option<Padding> {
    let parts: Vec<f32> = s
        .split_whitespace()
        .map(parse_px)
        .collect::<Option<Vec<_>>>()?;
    let (vertical, horizontal) = match parts.as_slice() {
        [all] => (*all, *all),
        [v, h, ..] => (*v, *h),
        [] => return None,
    };
    if vertical < 0.0 || horizontal < 0.0 {
        return None;
    }
    Some(Padding {
        vertical: vertical.min(MAX_BOX_INSET_PX),
        horizontal: horizontal.min(MAX_BOX_INSET_PX),
    })
}

fn parse_shadow(s: &str) -> Option<Shadow> {
    let first = s.split(',').next().unwrap_or_default();
    // `rgba(...)` carries its own commas; re-join when the first shadow was cut inside it.
    let first = if first.contains('(') && !first.contains(')') {
        let end = s.find(')').map(|i| i + 1).unwrap_or(s.len());
        &s[..end]
    } else {
        first
    };
    let first = first.trim();
    if first.is_empty() || first.eq_ignore_ascii_case("none") {
        return None;
    }

    let mut lengths = [0.0f32; 3];
    let mut parsed = 0usize;
    let mut rest = first;
    for slot in &mut lengths {
        let trimmed = rest.trim_start();
        let (tok, tail) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        match parse_px(tok) {
            Some(v) => {
                *slot = v;
                parsed += 1;
                rest = tail;
            }
            None => break,
        }
    }
    if parsed < 2 {
        return None;
    }
    let color = parse_css_color(rest.trim()).unwrap_or(Color::rgb8_alpha(0, 0, 0, 0.8));
    Some(Shadow {
        offset_x: lengths[0],
        offset_y: lengths[1],
        blur: lengths[2].max(0.0),
        color,
    })
}

/// Memoized resolution keyed by theme id.
///
/// An entry is reused only while the table still hands out the same `Arc<PaintSpec>`, so
/// replacing the custom theme invalidates its cached style automatically.
#[derive(Debug, Default)]
pub struct StyleCache {
    entries: HashMap<String, (Arc<PaintSpec>, Arc<ResolvedStyle>)>,
}

impl StyleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `entry`, reusing a previous result when its spec is unchanged.
    pub fn resolve(&mut self, entry: &ThemeEntry) -> Arc<ResolvedStyle> {
        if let Some((spec, style)) = self.entries.get(entry.id.as_str())
            && Arc::ptr_eq(spec, &entry.spec)
        {
            return style.clone();
        }
        let style = Arc::new(resolve_style(&entry.spec));
        self.entries.insert(
            entry.id.as_str().to_owned(),
            (entry.spec.clone(), style.clone()),
        );
        style
    }

    /// Number of cached styles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/theme/resolve.rs"]
mod tests;
