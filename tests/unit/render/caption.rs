use super::*;
use crate::theme::resolve::{Padding, Shadow};
use crate::transcript::utterance::SpeakerId;

fn canvas() -> Canvas {
    Canvas {
        width: 320,
        height: 180,
    }
}

fn chunk(text: &str, opacity: f32) -> WordChunk {
    WordChunk {
        text: text.to_string(),
        start_ms: 0.0,
        end_ms: 1000.0,
        speaker: SpeakerId::new("A"),
        opacity,
        scale: 1.0,
        translate_y: 0.0,
    }
}

fn renderer() -> FrameRenderer {
    FrameRenderer::new(Arc::new(FontBook::new()), RenderSettings::default())
}

fn font_renderer() -> Option<FrameRenderer> {
    let bytes = std::fs::read("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf").ok()?;
    let mut book = FontBook::new();
    book.add_bytes(bytes).ok()?;
    Some(FrameRenderer::new(Arc::new(book), RenderSettings::default()))
}

fn gray_source() -> FrameRGBA {
    FrameRGBA::solid(
        Canvas {
            width: 64,
            height: 36,
        },
        [90, 90, 90, 255],
    )
}

#[test]
fn source_only_is_scaled_to_surface() {
    let mut r = renderer();
    let out = r
        .render(canvas(), Some(&gray_source()), &[], 0, &ResolvedStyle::default())
        .unwrap();
    assert_eq!((out.width, out.height), (320, 180));
    for (x, y) in [(0, 0), (160, 90), (319, 179)] {
        let px = out.pixel(x, y).unwrap();
        assert_eq!(px[3], 255, "({x},{y})");
        assert!((88..=92).contains(&px[0]), "({x},{y}) {px:?}");
    }
}

#[test]
fn same_size_source_is_copied_exactly() {
    let src = FrameRGBA::solid(canvas(), [1, 2, 3, 255]);
    let out = renderer()
        .render(canvas(), Some(&src), &[], 0, &ResolvedStyle::default())
        .unwrap();
    assert_eq!(out, src);
}

#[test]
fn box_is_painted_near_the_bottom_centre() {
    let mut r = renderer();
    let style = ResolvedStyle::default();
    let out = r
        .render(canvas(), None, &[chunk("a b c d", 1.0)], 0, &style)
        .unwrap();

    let centre = out.pixel(160, 130).unwrap();
    // Black80 scaled by the 0.8 burn-in multiplier.
    assert!((158..=168).contains(&centre[3]), "{centre:?}");
    assert_eq!(out.pixel(160, 20).unwrap(), [0, 0, 0, 0]);
    assert_eq!(out.pixel(5, 130).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn layout_uses_padding_and_bottom_offset() {
    let mut r = renderer();
    let mut style = ResolvedStyle::default();
    style.padding = Padding {
        vertical: 10.0,
        horizontal: 20.0,
    };
    let l = r
        .layout_chunk(canvas(), &chunk("a b c d", 1.0), 0, &style)
        .unwrap();
    let (tw, th) = crate::render::text::estimate_metrics("a b c d", 24.0);
    assert!((l.box_rect.width() - (tw + 40.0)).abs() < 1e-9);
    assert!((l.box_rect.height() - (th + 20.0)).abs() < 1e-9);
    assert!((l.box_rect.center().x - 160.0).abs() < 1e-9);
    assert!((l.box_rect.center().y - 130.0).abs() < 1e-9);
}

#[test]
fn text_transform_is_applied_to_layout_only() {
    let mut r = renderer();
    let mut style = ResolvedStyle::default();
    style.text_transform = crate::theme::spec::TextTransform::Uppercase;
    let c = chunk("mixed Case", 1.0);
    let l = r.layout_chunk(canvas(), &c, 0, &style).unwrap();
    assert_eq!(l.text, "MIXED CASE");
    assert_eq!(c.text, "mixed Case");
}

#[test]
fn invisible_chunk_leaves_frame_untouched() {
    let src = FrameRGBA::solid(canvas(), [7, 8, 9, 255]);
    let out = renderer()
        .render(canvas(), Some(&src), &[chunk("hidden", 0.0)], 0, &ResolvedStyle::default())
        .unwrap();
    assert_eq!(out, src);
}

#[test]
fn slide_in_moves_the_box_down() {
    let mut r = renderer();
    let style = ResolvedStyle::default();
    let mut c = chunk("a b c d", 1.0);
    c.translate_y = 20.0;
    let l = r.layout_chunk(canvas(), &c, 0, &style).unwrap();
    let moved = l.transform * l.box_rect.center();
    assert!((moved.y - 150.0).abs() < 1e-9);
}

#[test]
fn pulse_oscillates_around_one() {
    assert!((pulse_factor(0) - 1.0).abs() < 1e-12);
    assert!((pulse_factor(250) - 1.04).abs() < 1e-12);
    assert!((pulse_factor(750) - 0.96).abs() < 1e-12);
    assert!((pulse_factor(1250) - pulse_factor(250)).abs() < 1e-12);
}

#[test]
fn preview_and_export_paths_are_pixel_identical() {
    let style = ResolvedStyle {
        shadow: Some(Shadow {
            offset_x: 2.0,
            offset_y: 2.0,
            blur: 4.0,
            color: Color::BLACK,
        }),
        ..ResolvedStyle::default()
    };
    let chunks = [chunk("first line here", 0.7), chunk("second speaker", 1.0)];
    let src = gray_source();

    let mut live = font_renderer().unwrap_or_else(renderer);
    let preview = live.render(canvas(), Some(&src), &chunks, 480, &style).unwrap();

    let mut export = font_renderer().unwrap_or_else(renderer);
    let mut offscreen = FrameRGBA::solid(canvas(), [255, 0, 255, 255]);
    export
        .render_into(&mut offscreen, Some(&src), &chunks, 480, &style)
        .unwrap();
    assert_eq!(preview, offscreen);

    let again = live.render(canvas(), Some(&src), &chunks, 480, &style).unwrap();
    assert_eq!(preview, again);
}

#[test]
fn glyphs_are_painted_with_the_text_color() {
    let Some(mut r) = font_renderer() else {
        return;
    };
    let style = ResolvedStyle {
        background: Fill::None,
        text_color: Color::rgba(1.0, 0.0, 0.0, 1.0),
        font_size_px: 40.0,
        ..ResolvedStyle::default()
    };
    let out = r
        .render(canvas(), None, &[chunk("HHHH", 1.0)], 0, &style)
        .unwrap();
    let reds = out
        .data
        .chunks_exact(4)
        .filter(|px| px[3] > 200 && px[0] > 200 && px[1] < 40)
        .count();
    assert!(reds > 50, "only {reds} red pixels");
}

#[test]
fn gradient_box_runs_left_to_right() {
    let mut r = renderer();
    let style = ResolvedStyle {
        background: Fill::LinearX {
            from: Color::rgba(1.0, 0.0, 0.0, 1.0),
            to: Color::rgba(0.0, 0.0, 1.0, 1.0),
        },
        radius_px: 0.0,
        ..ResolvedStyle::default()
    };
    let c = chunk("a wide caption box", 1.0);
    let l = r.layout_chunk(canvas(), &c, 0, &style).unwrap();
    let out = r.render(canvas(), None, &[c], 0, &style).unwrap();
    let y = 130;
    let left = out.pixel((l.box_rect.x0 + 3.0) as u32, y).unwrap();
    let right = out.pixel((l.box_rect.x1 - 3.0) as u32, y).unwrap();
    assert!(left[0] > left[2], "{left:?}");
    assert!(right[2] > right[0], "{right:?}");
}

#[test]
fn oversized_surface_is_rejected() {
    let mut r = renderer();
    let big = Canvas {
        width: 70_000,
        height: 1,
    };
    assert!(
        r.render(big, None, &[], 0, &ResolvedStyle::default())
            .is_err()
    );
}
