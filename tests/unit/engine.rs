use super::*;
use crate::encode::profile::{ExportFormat, ExportQuality, StaticEncoderCaps};
use crate::encode::sink::InMemorySink;
use crate::export::job::ExportState;
use crate::media::source::ScriptedSource;
use crate::theme::spec::GradientSpec;
use crate::timeline::clock::{ManualClock, ManualTicker, ReadyState, Ticker};
use std::sync::Mutex;

fn engine() -> CaptionEngine {
    let store = UtteranceStore::new(vec![
        Utterance::new(SpeakerId::new("A"), 0, 2000, "a b c d e f g h").unwrap(),
        Utterance::new(SpeakerId::new("B"), 500, 1500, "overlapping line").unwrap(),
    ]);
    CaptionEngine::new(EngineConfig::default(), store, FontBook::new()).unwrap()
}

#[test]
fn unknown_default_theme_is_rejected() {
    let cfg = EngineConfig {
        default_theme: "nope".to_owned(),
        ..EngineConfig::default()
    };
    assert!(CaptionEngine::new(cfg, UtteranceStore::default(), FontBook::new()).is_err());
}

#[test]
fn live_ticks_emit_to_subscribers() {
    let mut e = engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    e.subscribe_active_chunks(move |a: &ActiveChunks| {
        sink.lock().unwrap().push(a.chunks.iter().map(|c| c.text.clone()).collect::<Vec<_>>())
    });

    let mut clock = ManualClock::new(2000);
    clock.seek(700);
    assert_eq!(e.tick_live(0, &clock), TickOutcome::Emitted);
    assert_eq!(
        seen.lock().unwrap().last().unwrap(),
        &vec!["a b c d".to_owned(), "overlapping line".to_owned()]
    );
    assert_eq!(e.current_chunks().unwrap().t_ms, 700);

    clock.state = ReadyState::Seeking;
    assert_eq!(e.tick_live(100, &clock), TickOutcome::Inert);
}

#[test]
fn edit_invalidates_and_reemits() {
    let mut e = engine();
    let count = Arc::new(Mutex::new(0usize));
    let c = Arc::clone(&count);
    e.subscribe_active_chunks(move |_| *c.lock().unwrap() += 1);

    let mut clock = ManualClock::new(2000);
    clock.seek(1200);
    e.tick_live(0, &clock);
    e.edit_utterance_text(0, "w x y z q r s t").unwrap();
    // Inside the cadence window, but the edit forces a recompute.
    assert_eq!(e.tick_live(1, &clock), TickOutcome::Emitted);
    assert_eq!(e.current_chunks().unwrap().chunks[0].text, "q r s t");
    assert_eq!(*count.lock().unwrap(), 2);
    assert!(e.edit_utterance_text(9, "x").is_err());
}

#[test]
fn custom_theme_replaces_table_and_cached_style() {
    let mut e = engine();
    let before = e.resolve_theme("custom");
    assert_eq!(before, e.resolve_theme("default"));
    assert!(e.select_theme("custom").is_err());

    let id = e.add_custom_theme(PaintSpec {
        font_size: Some("40px".into()),
        ..PaintSpec::default()
    });
    assert_eq!(id.as_str(), "custom");
    e.select_theme("custom").unwrap();
    assert_eq!(e.selected_theme().as_str(), "custom");
    assert_eq!(e.resolve_theme("custom").font_size_px, 40.0);
    // Previously handed-out styles are untouched.
    assert_ne!(before.font_size_px, 40.0);
}

#[test]
fn render_preview_matches_render_once() {
    let mut e = engine();
    let canvas = Canvas {
        width: 96,
        height: 64,
    };
    let source = FrameRGBA::solid(canvas, [10, 120, 30, 255]);
    let preview = e.render_preview(canvas, Some(&source), 700).unwrap();

    let active = e.active_chunks(700);
    let mut surface = FrameRGBA::transparent(canvas);
    e.render_once(&mut surface, Some(&source), &active, "default").unwrap();
    assert_eq!(preview, surface);
    assert_ne!(preview, source);
}

#[test]
fn unknown_theme_falls_back_when_painting() {
    let mut e = engine();
    let canvas = Canvas {
        width: 64,
        height: 64,
    };
    let active = e.active_chunks(300);
    let mut a = FrameRGBA::transparent(canvas);
    let mut b = FrameRGBA::transparent(canvas);
    e.render_once(&mut a, None, &active, "does-not-exist").unwrap();
    e.render_once(&mut b, None, &active, "default").unwrap();
    assert_eq!(a, b);
}

#[test]
fn export_uses_a_transcript_snapshot() {
    let mut e = engine();
    let sink = InMemorySink::new();
    let record = sink.record();
    let mut job = e.start_export(
        ExportConfig {
            format: ExportFormat::Webm,
            quality: ExportQuality::Low,
        },
        &StaticEncoderCaps::all(),
        Box::new(ScriptedSource::new(64, 36, 300)),
        Box::new(sink),
        0,
    );
    assert_eq!(job.job().state, ExportState::Preparing);
    e.edit_utterance_text(0, "changed while exporting").unwrap();

    let mut ticker = ManualTicker::new(0);
    while !job.job().state.is_terminal() {
        job.tick(ticker.now_ms());
        ticker.schedule_next(33);
    }
    assert_eq!(job.job().state, ExportState::Completed);
    assert_eq!(record.lock().unwrap().frames.len(), 9);
    assert_eq!(e.store().all()[0].text(), "changed while exporting");
}

#[test]
fn transcript_helpers() {
    let e = engine();
    assert_eq!(e.speakers(), vec![SpeakerId::new("A"), SpeakerId::new("B")]);
    let f = UtteranceFilter {
        speaker: None,
        query: Some("OVERLAP".into()),
    };
    let hits = e.filter(&f);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, 1);
    assert!(e.to_webvtt().starts_with("WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.000\n"));
}

#[test]
fn gradient_theme_with_huge_padding_still_paints() {
    let mut e = engine();
    for padding in ["4px 33000px", "40000px"] {
        let id = e.add_custom_theme(PaintSpec {
            padding: Some(padding.to_owned()),
            gradient: Some(GradientSpec::default()),
            ..PaintSpec::default()
        });
        e.select_theme(id.as_str()).unwrap();
        let canvas = Canvas {
            width: 320,
            height: 180,
        };
        let frame = e.render_preview(canvas, None, 500).unwrap();
        assert!(frame.data.chunks_exact(4).any(|px| px[3] > 0), "{padding}");
    }
}
