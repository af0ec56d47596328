use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::export::pipeline::{DEFAULT_READY_TIMEOUT_MS, ExportSettings};
use crate::foundation::core::Fps;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::render::caption::RenderSettings;
use crate::theme::table::DEFAULT_THEME_ID;
use crate::timeline::scheduler::DEFAULT_MIN_INTERVAL_MS;

/// Engine-wide knobs. Every field has a default; JSON files may set any subset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Minimum spacing between two live scheduler recomputations.
    pub scheduler_min_interval_ms: u64,
    /// Export frame rate.
    pub export_fps: Fps,
    /// Bound on the export's wait for source media.
    pub ready_timeout_ms: u64,
    /// Distance from the surface bottom to the caption text centre line.
    pub caption_bottom_offset_px: f64,
    /// Extra alpha multiplier for caption boxes.
    pub background_opacity: f32,
    /// Theme used when none is selected.
    pub default_theme: String,
    /// Straight RGBA8 background used to flatten alpha before encoding.
    pub export_bg_rgba: [u8; 4],
}

impl Default for EngineConfig {
    fn default() -> Self {
        let render = RenderSettings::default();
        Self {
            scheduler_min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            export_fps: Fps::default(),
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            caption_bottom_offset_px: render.bottom_offset_px,
            background_opacity: render.background_opacity,
            default_theme: DEFAULT_THEME_ID.to_owned(),
            export_bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> CaptionResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| CaptionError::serde(format!("invalid engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: &Path) -> CaptionResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> CaptionResult<()> {
        Fps::new(self.export_fps.num, self.export_fps.den)?;
        if self.scheduler_min_interval_ms < DEFAULT_MIN_INTERVAL_MS {
            return Err(CaptionError::validation(format!(
                "scheduler_min_interval_ms must be >= {DEFAULT_MIN_INTERVAL_MS}"
            )));
        }
        if self.ready_timeout_ms == 0 {
            return Err(CaptionError::validation("ready_timeout_ms must be > 0"));
        }
        if !self.caption_bottom_offset_px.is_finite() || self.caption_bottom_offset_px < 0.0 {
            return Err(CaptionError::validation(
                "caption_bottom_offset_px must be finite and >= 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.background_opacity) {
            return Err(CaptionError::validation(
                "background_opacity must be in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Caption placement derived from this config.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            bottom_offset_px: self.caption_bottom_offset_px,
            background_opacity: self.background_opacity,
        }
    }

    /// Export loop parameters derived from this config.
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            fps: self.export_fps,
            ready_timeout_ms: self.ready_timeout_ms,
            bg_rgba: self.export_bg_rgba,
            render: self.render_settings(),
        }
    }
}
