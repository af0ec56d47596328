use std::sync::Arc;

use crate::config::EngineConfig;
use crate::encode::profile::EncoderCaps;
use crate::encode::sink::EncoderSink;
use crate::export::job::ExportConfig;
use crate::export::pipeline::{ExportPipeline, ExportRequest};
use crate::foundation::core::Canvas;
use crate::foundation::error::CaptionResult;
use crate::media::source::MediaSource;
use crate::render::caption::FrameRenderer;
use crate::render::frame::FrameRGBA;
use crate::render::text::FontBook;
use crate::theme::resolve::{ResolvedStyle, StyleCache};
use crate::theme::spec::PaintSpec;
use crate::theme::table::{ThemeId, ThemeTable};
use crate::timeline::clock::PlaybackClock;
use crate::timeline::scheduler::{ActiveChunks, SubscriptionId, TickOutcome, TimeSyncScheduler};
use crate::transcript::store::{UtteranceFilter, UtteranceStore};
use crate::transcript::utterance::{SpeakerId, Utterance};
use crate::transcript::vtt::to_webvtt;

/// Caption engine facade: transcript, themes, live scheduling, preview paint and export.
///
/// The live path (`tick_live` + `render_once`) and every export own separate renderers,
/// surfaces and clocks. An export works on a snapshot of the transcript taken when it is
/// created.
#[derive(Debug)]
pub struct CaptionEngine {
    config: EngineConfig,
    store: UtteranceStore,
    themes: ThemeTable,
    styles: StyleCache,
    selected: ThemeId,
    fonts: Arc<FontBook>,
    renderer: FrameRenderer,
    scheduler: TimeSyncScheduler,
}

impl CaptionEngine {
    /// Build an engine over `store` with the built-in themes.
    pub fn new(config: EngineConfig, store: UtteranceStore, fonts: FontBook) -> CaptionResult<Self> {
        config.validate()?;
        let themes = ThemeTable::builtin();
        let selected = themes.require(&config.default_theme)?.id.clone();
        let fonts = Arc::new(fonts);
        let renderer = FrameRenderer::new(Arc::clone(&fonts), config.render_settings());
        let scheduler = TimeSyncScheduler::new(config.scheduler_min_interval_ms);
        tracing::debug!(
            utterances = store.len(),
            theme = %selected,
            fonts = fonts.families().count(),
            "caption engine ready"
        );
        Ok(Self {
            config,
            store,
            themes,
            styles: StyleCache::new(),
            selected,
            fonts,
            renderer,
            scheduler,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Transcript.
    pub fn store(&self) -> &UtteranceStore {
        &self.store
    }

    /// Current theme table.
    pub fn themes(&self) -> &ThemeTable {
        &self.themes
    }

    /// Registered fonts.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Distinct speakers in first-seen order.
    pub fn speakers(&self) -> Vec<SpeakerId> {
        self.store.speakers()
    }

    /// Utterances passing `filter`, with their store indices.
    pub fn filter<'a>(&'a self, filter: &'a UtteranceFilter) -> Vec<(usize, &'a Utterance)> {
        self.store.filter(move |u| filter.matches(u)).collect()
    }

    /// WebVTT rendering of the transcript.
    pub fn to_webvtt(&self) -> String {
        to_webvtt(&self.store)
    }

    /// Replace the text of utterance `index`; the next live tick recomputes at once.
    pub fn edit_utterance_text(&mut self, index: usize, text: impl Into<String>) -> CaptionResult<()> {
        self.store.edit_text(index, text)?;
        self.scheduler.invalidate();
        Ok(())
    }

    /// Install `spec` as the custom theme and return its id.
    ///
    /// The table is replaced, not mutated; styles resolved from the previous table stay valid.
    pub fn add_custom_theme(&mut self, spec: PaintSpec) -> ThemeId {
        self.themes = self.themes.with_custom(spec);
        let id = crate::theme::table::CUSTOM_THEME_ID;
        tracing::info!(theme = id, "custom theme registered");
        ThemeId::from(id)
    }

    /// Select the theme used by preview and export. Unknown ids are rejected.
    pub fn select_theme(&mut self, id: &str) -> CaptionResult<()> {
        self.selected = self.themes.require(id)?.id.clone();
        Ok(())
    }

    /// Id of the selected theme.
    pub fn selected_theme(&self) -> &ThemeId {
        &self.selected
    }

    /// Resolve `id`, falling back to the default theme for unknown ids.
    pub fn resolve_theme(&mut self, id: &str) -> Arc<ResolvedStyle> {
        let entry = self.themes.get_or_default(id);
        self.styles.resolve(entry)
    }

    /// Register a callback for live chunk changes.
    pub fn subscribe_active_chunks<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ActiveChunks) + Send + 'static,
    {
        self.scheduler.subscribe(callback)
    }

    /// Remove a live subscriber.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.scheduler.unsubscribe(id)
    }

    /// One live scheduler step against the preview clock.
    pub fn tick_live(&mut self, now_ms: u64, clock: &dyn PlaybackClock) -> TickOutcome {
        self.scheduler.tick(now_ms, clock, &self.store)
    }

    /// Last chunk set emitted by the live scheduler.
    pub fn current_chunks(&self) -> Option<&ActiveChunks> {
        self.scheduler.current()
    }

    /// Chunk set at `t_ms`, computed directly without the scheduler.
    pub fn active_chunks(&self, t_ms: u64) -> ActiveChunks {
        ActiveChunks::compute(&self.store, t_ms)
    }

    /// Paint `source` plus `active` onto `surface` with theme `theme_id`.
    pub fn render_once(
        &mut self,
        surface: &mut FrameRGBA,
        source: Option<&FrameRGBA>,
        active: &ActiveChunks,
        theme_id: &str,
    ) -> CaptionResult<()> {
        let style = self.resolve_theme(theme_id);
        self.renderer
            .render_into(surface, source, &active.chunks, active.t_ms, &style)
    }

    /// Captioned still at `t_ms` in the selected theme, on a fresh surface.
    pub fn render_preview(
        &mut self,
        canvas: Canvas,
        source: Option<&FrameRGBA>,
        t_ms: u64,
    ) -> CaptionResult<FrameRGBA> {
        let active = self.active_chunks(t_ms);
        let theme = self.selected.clone();
        let mut surface = FrameRGBA::transparent(canvas);
        self.render_once(&mut surface, source, &active, theme.as_str())?;
        Ok(surface)
    }

    /// Idle export pipeline over a snapshot of the transcript and the selected theme.
    pub fn export_pipeline(
        &mut self,
        config: ExportConfig,
        source: Box<dyn MediaSource>,
        sink: Box<dyn EncoderSink>,
    ) -> ExportPipeline {
        let theme = self.selected.clone();
        let request = ExportRequest {
            config,
            settings: self.config.export_settings(),
            store: self.store.clone(),
            style: self.resolve_theme(theme.as_str()),
            fonts: Arc::clone(&self.fonts),
        };
        ExportPipeline::new(request, source, sink)
    }

    /// Create an export pipeline and leave `Idle` at host time `now_ms`.
    ///
    /// The returned pipeline is the job handle: tick it, observe it or cancel it.
    pub fn start_export(
        &mut self,
        config: ExportConfig,
        caps: &dyn EncoderCaps,
        source: Box<dyn MediaSource>,
        sink: Box<dyn EncoderSink>,
        now_ms: u64,
    ) -> ExportPipeline {
        let mut pipeline = self.export_pipeline(config, source, sink);
        pipeline.start(caps, now_ms);
        pipeline
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
