use crate::foundation::error::{CaptionError, CaptionResult};
use crate::theme::spec::{BackgroundToken, GradientSpec, PaintSpec, TextToken, TextTransform};
use std::sync::Arc;

/// Identifier of the theme every lookup falls back to.
pub const DEFAULT_THEME_ID: &str = "default";

/// Identifier of the single runtime-authored theme slot.
pub const CUSTOM_THEME_ID: &str = "custom";

/// Theme identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThemeId(pub String);

impl ThemeId {
    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ThemeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Display for ThemeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registered theme.
#[derive(Clone, Debug)]
pub struct ThemeEntry {
    /// Theme id.
    pub id: ThemeId,
    /// Short human description.
    pub description: String,
    /// Immutable paint specification.
    pub spec: Arc<PaintSpec>,
}

/// Append-only theme table.
///
/// Built-in entries are shared behind an `Arc` and never mutated. Registering the custom
/// theme produces a new table; existing tables (and `Arc<PaintSpec>` handles obtained from
/// them) keep observing exactly what they observed before.
#[derive(Clone, Debug)]
pub struct ThemeTable {
    builtins: Arc<Vec<ThemeEntry>>,
    custom: Option<ThemeEntry>,
}

impl Default for ThemeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ThemeTable {
    /// Table with the built-in themes only.
    pub fn builtin() -> Self {
        Self {
            builtins: Arc::new(builtin_entries()),
            custom: None,
        }
    }

    /// Return a new table whose custom slot holds `spec`.
    pub fn with_custom(&self, spec: PaintSpec) -> Self {
        Self {
            builtins: self.builtins.clone(),
            custom: Some(ThemeEntry {
                id: ThemeId::from(CUSTOM_THEME_ID),
                description: "Custom theme".to_owned(),
                spec: Arc::new(spec),
            }),
        }
    }

    /// Look up a theme by id.
    pub fn get(&self, id: &str) -> Option<&ThemeEntry> {
        self.entries().find(|e| e.id.as_str() == id)
    }

    /// Look up a theme, falling back to the default theme for unknown ids.
    pub fn get_or_default(&self, id: &str) -> &ThemeEntry {
        if let Some(e) = self.get(id) {
            return e;
        }
        tracing::warn!(theme = id, "unknown caption theme, using default");
        // The built-in list always starts with the default theme.
        &self.builtins[0]
    }

    /// Look up a theme, failing for unknown ids. Used at configuration boundaries.
    pub fn require(&self, id: &str) -> CaptionResult<&ThemeEntry> {
        self.get(id)
            .ok_or_else(|| CaptionError::validation(format!("unknown caption theme '{id}'")))
    }

    /// Iterate all entries: built-ins in declaration order, then the custom slot.
    pub fn entries(&self) -> impl Iterator<Item = &ThemeEntry> {
        self.builtins.iter().chain(self.custom.iter())
    }

    /// Number of registered themes.
    pub fn len(&self) -> usize {
        self.builtins.len() + usize::from(self.custom.is_some())
    }

    /// Always `false`: the built-in set is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn builtin_entries() -> Vec<ThemeEntry> {
    fn entry(id: &str, description: &str, spec: PaintSpec) -> ThemeEntry {
        ThemeEntry {
            id: ThemeId::from(id),
            description: description.to_owned(),
            spec: Arc::new(spec),
        }
    }
    fn s(v: &str) -> Option<String> {
        Some(v.to_owned())
    }
    fn gradient(from: &str, to: &str) -> Option<GradientSpec> {
        Some(GradientSpec {
            from: s(from),
            to: s(to),
        })
    }
    const SF_PRO: &str = "'SF Pro Display', sans-serif";

    vec![
        entry(
            DEFAULT_THEME_ID,
            "Classic black background with white text",
            PaintSpec {
                font_family: s("Arial, sans-serif"),
                font_size: s("20px"),
                text_token: Some(TextToken::White),
                background_token: Some(BackgroundToken::Black80),
                padding: s("8px 16px"),
                border_radius: s("4px"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "modern",
            "Clean and minimal with light background",
            PaintSpec {
                font_family: s("'Helvetica Neue', sans-serif"),
                font_size: s("22px"),
                text_token: Some(TextToken::Black),
                background_token: Some(BackgroundToken::White80),
                padding: s("10px 20px"),
                border_radius: s("8px"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "minimal",
            "Transparent with text shadow",
            PaintSpec {
                font_family: s(SF_PRO),
                font_size: s("24px"),
                text_token: Some(TextToken::White),
                background_token: Some(BackgroundToken::Transparent),
                padding: s("8px 16px"),
                text_shadow: s("2px 2px 4px rgba(0,0,0,0.8)"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "bold",
            "High contrast yellow with black text",
            PaintSpec {
                font_family: s("'Impact', sans-serif"),
                font_size: s("26px"),
                text_token: Some(TextToken::Black),
                background_token: Some(BackgroundToken::Yellow90),
                padding: s("6px 12px"),
                text_transform: TextTransform::Uppercase,
                ..PaintSpec::default()
            },
        ),
        entry(
            "subtitle",
            "Traditional subtitle style",
            PaintSpec {
                font_family: s("'Times New Roman', serif"),
                font_size: s("20px"),
                text_token: Some(TextToken::White),
                background_token: Some(BackgroundToken::Black60),
                padding: s("8px 16px"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "capcut",
            "Professional CapCut-style captions",
            PaintSpec {
                font_family: s(SF_PRO),
                font_size: s("24px"),
                text_token: Some(TextToken::White),
                gradient: Some(GradientSpec::default()),
                padding: s("12px 24px"),
                border_radius: s("12px"),
                text_shadow: s("0 2px 4px rgba(0,0,0,0.5)"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "neon",
            "Glowing neon effect",
            PaintSpec {
                font_family: s(SF_PRO),
                font_size: s("24px"),
                color: s("#fff"),
                background_token: Some(BackgroundToken::Black80),
                padding: s("12px 24px"),
                border_radius: s("12px"),
                text_shadow: s("0 0 10px #fff, 0 0 20px #fff, 0 0 30px #00ff00, 0 0 40px #00ff00"),
                pulse: true,
                ..PaintSpec::default()
            },
        ),
        entry(
            "glass",
            "Frosted glass effect",
            PaintSpec {
                font_family: s(SF_PRO),
                font_size: s("24px"),
                text_token: Some(TextToken::White),
                background_token: Some(BackgroundToken::White10),
                padding: s("12px 24px"),
                border_radius: s("12px"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "cinematic",
            "Movie-style dramatic captions",
            PaintSpec {
                font_family: s("'Playfair Display', serif"),
                font_size: s("26px"),
                text_token: Some(TextToken::White),
                gradient: gradient("rgba(0,0,0,0.9)", "rgba(0,0,0,0.7)"),
                padding: s("16px 32px"),
                border_radius: s("4px"),
                text_shadow: s("1px 1px 2px rgba(0,0,0,0.5)"),
                text_transform: TextTransform::Uppercase,
                ..PaintSpec::default()
            },
        ),
        entry(
            "retro",
            "Vintage typewriter style",
            PaintSpec {
                font_family: s("'Courier Prime', monospace"),
                font_size: s("22px"),
                text_token: Some(TextToken::Black),
                background_token: Some(BackgroundToken::Yellow80),
                padding: s("8px 16px"),
                border_radius: s("0px"),
                text_transform: TextTransform::Uppercase,
                ..PaintSpec::default()
            },
        ),
        entry(
            "social",
            "Modern social media style",
            PaintSpec {
                font_family: s("'Poppins', sans-serif"),
                font_size: s("24px"),
                text_token: Some(TextToken::White),
                gradient: gradient("rgba(236,72,153,0.8)", "rgba(168,85,247,0.8)"),
                padding: s("12px 24px"),
                border_radius: s("16px"),
                text_shadow: s("1px 1px 2px rgba(0,0,0,0.3)"),
                ..PaintSpec::default()
            },
        ),
        entry(
            "gaming",
            "Dynamic gaming stream style",
            PaintSpec {
                font_family: s("'Rajdhani', sans-serif"),
                font_size: s("26px"),
                text_token: Some(TextToken::White),
                gradient: gradient("rgba(34,197,94,0.8)", "rgba(59,130,246,0.8)"),
                padding: s("10px 20px"),
                border_radius: s("8px"),
                text_shadow: s("0 0 10px rgba(0,255,255,0.5)"),
                ..PaintSpec::default()
            },
        ),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/theme/table.rs"]
mod tests;
