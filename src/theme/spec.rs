use crate::theme::color::Color;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Text color token used when a theme gives no explicit color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextToken {
    /// Light text.
    White,
    /// Dark text.
    Black,
}

impl TextToken {
    /// Concrete color for the token.
    pub fn color(self) -> Color {
        match self {
            Self::White => Color::WHITE,
            Self::Black => Color::BLACK,
        }
    }
}

/// Background token used when a theme gives no explicit background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundToken {
    /// Black at 80 % alpha.
    Black80,
    /// Black at 60 % alpha.
    Black60,
    /// White at 80 % alpha.
    White80,
    /// White at 10 % alpha.
    White10,
    /// Warm yellow at 90 % alpha.
    Yellow90,
    /// Warm yellow at 80 % alpha.
    Yellow80,
    /// No box.
    Transparent,
}

impl BackgroundToken {
    /// Concrete color for the token.
    pub fn color(self) -> Color {
        match self {
            Self::Black80 => Color::rgb8_alpha(0, 0, 0, 0.8),
            Self::Black60 => Color::rgb8_alpha(0, 0, 0, 0.6),
            Self::White80 => Color::rgb8_alpha(255, 255, 255, 0.8),
            Self::White10 => Color::rgb8_alpha(255, 255, 255, 0.1),
            Self::Yellow90 => Color::rgb8_alpha(250, 204, 21, 0.9),
            Self::Yellow80 => Color::rgb8_alpha(250, 204, 21, 0.8),
            Self::Transparent => Color::TRANSPARENT,
        }
    }
}

/// Marks a left-to-right gradient background. Missing stops fall back to fixed defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradientSpec {
    /// Left stop color.
    pub from: Option<String>,
    /// Right stop color.
    pub to: Option<String>,
}

/// Text case transform applied at paint time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTransform {
    /// Leave text as written.
    #[default]
    None,
    /// Upper-case every character.
    Uppercase,
    /// Lower-case every character.
    Lowercase,
}

impl TextTransform {
    /// Apply the transform without touching the source string.
    pub fn apply<'a>(self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::None => Cow::Borrowed(text),
            Self::Uppercase => Cow::Owned(text.to_uppercase()),
            Self::Lowercase => Cow::Owned(text.to_lowercase()),
        }
    }
}

/// Declarative caption appearance.
///
/// String-valued fields keep CSS-like spelling (`"20px"`, `"8px 16px"`,
/// `"2px 2px 4px rgba(0,0,0,0.8)"`) and are resolved leniently: anything malformed
/// falls back to a default instead of failing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaintSpec {
    /// Comma-separated font family stack.
    pub font_family: Option<String>,
    /// Font size, e.g. `"24px"`.
    pub font_size: Option<String>,
    /// Explicit text color.
    pub color: Option<String>,
    /// Text color token used when `color` is absent.
    pub text_token: Option<TextToken>,
    /// Explicit solid background color.
    pub background: Option<String>,
    /// Background token used when `background` is absent.
    pub background_token: Option<BackgroundToken>,
    /// Gradient background; takes precedence over solid backgrounds.
    pub gradient: Option<GradientSpec>,
    /// Box padding, CSS shorthand with one or two lengths.
    pub padding: Option<String>,
    /// Box corner radius.
    pub border_radius: Option<String>,
    /// Text shadow `"<x> <y> <blur> <color>"`; only the first of a comma list is used.
    pub text_shadow: Option<String>,
    /// Case transform.
    pub text_transform: TextTransform,
    /// Gently pulse the caption scale while visible.
    pub pulse: bool,
}
