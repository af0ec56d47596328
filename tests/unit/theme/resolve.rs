use super::*;
use crate::theme::spec::{GradientSpec, TextToken};
use crate::theme::table::ThemeTable;

fn spec() -> PaintSpec {
    PaintSpec::default()
}

#[test]
fn explicit_text_color_wins_over_token() {
    let s = PaintSpec {
        color: Some("#ff0000".to_owned()),
        text_token: Some(TextToken::Black),
        ..spec()
    };
    assert_eq!(resolve_style(&s).text_color.to_rgba8(), [255, 0, 0, 255]);
}

#[test]
fn text_color_falls_back_to_token_then_brightness() {
    let s = PaintSpec {
        text_token: Some(TextToken::Black),
        ..spec()
    };
    assert_eq!(resolve_style(&s).text_color, Color::BLACK);

    let light_box = PaintSpec {
        background_token: Some(BackgroundToken::White80),
        ..spec()
    };
    assert_eq!(resolve_style(&light_box).text_color, Color::BLACK);

    let faint_box = PaintSpec {
        background_token: Some(BackgroundToken::White10),
        ..spec()
    };
    assert_eq!(resolve_style(&faint_box).text_color, Color::WHITE);

    assert_eq!(resolve_style(&spec()).text_color, Color::WHITE);
}

#[test]
fn malformed_color_falls_back_silently() {
    let s = PaintSpec {
        color: Some("not-a-color".to_owned()),
        text_token: Some(TextToken::Black),
        background: Some("rgba(nope)".to_owned()),
        background_token: Some(BackgroundToken::Yellow90),
        ..spec()
    };
    let r = resolve_style(&s);
    assert_eq!(r.text_color, Color::BLACK);
    assert_eq!(r.background, Fill::Solid(BackgroundToken::Yellow90.color()));
}

#[test]
fn background_defaults_and_transparent_token() {
    assert_eq!(
        resolve_style(&spec()).background,
        Fill::Solid(BackgroundToken::Black80.color())
    );
    let s = PaintSpec {
        background_token: Some(BackgroundToken::Transparent),
        ..spec()
    };
    assert_eq!(resolve_style(&s).background, Fill::None);
}

#[test]
fn gradient_without_stops_uses_fixed_defaults() {
    let s = PaintSpec {
        gradient: Some(GradientSpec::default()),
        background_token: Some(BackgroundToken::White80),
        ..spec()
    };
    assert_eq!(
        resolve_style(&s).background,
        Fill::LinearX {
            from: BackgroundToken::Black80.color(),
            to: BackgroundToken::Black60.color(),
        }
    );

    let s = PaintSpec {
        gradient: Some(GradientSpec {
            from: Some("#ff0000".to_owned()),
            to: None,
        }),
        ..spec()
    };
    let Fill::LinearX { from, to } = resolve_style(&s).background else {
        panic!("expected gradient");
    };
    assert_eq!(from.to_rgba8(), [255, 0, 0, 255]);
    assert_eq!(to, BackgroundToken::Black60.color());
}

#[test]
fn shadow_parsing() {
    let sh = parse_shadow("2px 2px 4px rgba(0,0,0,0.8)").unwrap();
    assert_eq!((sh.offset_x, sh.offset_y, sh.blur), (2.0, 2.0, 4.0));
    assert_eq!(sh.color.to_rgba8(), [0, 0, 0, 204]);

    let sh = parse_shadow("0 0 10px #fff, 0 0 20px #fff").unwrap();
    assert_eq!((sh.offset_x, sh.offset_y, sh.blur), (0.0, 0.0, 10.0));
    assert_eq!(sh.color, Color::WHITE);

    let sh = parse_shadow("1px 3px").unwrap();
    assert_eq!((sh.offset_x, sh.offset_y, sh.blur), (1.0, 3.0, 0.0));
    assert_eq!(sh.color.to_rgba8(), [0, 0, 0, 204]);

    assert_eq!(parse_shadow("none"), None);
    assert_eq!(parse_shadow(""), None);
    assert_eq!(parse_shadow("fancy glow"), None);
}

#[test]
fn padding_radius_and_size_are_lenient() {
    let s = PaintSpec {
        padding: Some("10px 20px".to_owned()),
        border_radius: Some("0px".to_owned()),
        font_size: Some("26px".to_owned()),
        ..spec()
    };
    let r = resolve_style(&s);
    assert_eq!(
        r.padding,
        Padding {
            vertical: 10.0,
            horizontal: 20.0
        }
    );
    assert_eq!(r.radius_px, 0.0);
    assert_eq!(r.font_size_px, 26.0);

    let s = PaintSpec {
        padding: Some("lots".to_owned()),
        border_radius: Some("round".to_owned()),
        font_size: Some("-3px".to_owned()),
        ..spec()
    };
    let r = resolve_style(&s);
    assert_eq!(r.padding.vertical, DEFAULT_PADDING_V_PX);
    assert_eq!(r.padding.horizontal, DEFAULT_PADDING_H_PX);
    assert_eq!(r.radius_px, DEFAULT_RADIUS_PX);
    assert_eq!(r.font_size_px, DEFAULT_FONT_SIZE_PX);

    let s = PaintSpec {
        padding: Some("6px".to_owned()),
        ..spec()
    };
    assert_eq!(resolve_style(&s).padding.horizontal, 6.0);
}

#[test]
fn font_stack_is_unquoted() {
    let s = PaintSpec {
        font_family: Some("'Helvetica Neue', \"Arial\", sans-serif".to_owned()),
        ..spec()
    };
    assert_eq!(
        resolve_style(&s).font_families,
        vec!["Helvetica Neue", "Arial", "sans-serif"]
    );
}

#[test]
fn every_builtin_resolves() {
    let t = ThemeTable::builtin();
    for e in t.entries() {
        let r = resolve_style(&e.spec);
        assert!(r.font_size_px > 0.0, "{}", e.id);
        assert!(!r.font_families.is_empty(), "{}", e.id);
    }
    let bold = resolve_style(&t.get("bold").unwrap().spec);
    assert_eq!(bold.text_transform, TextTransform::Uppercase);
    assert!(resolve_style(&t.get("neon").unwrap().spec).pulse);
    assert_eq!(resolve_style(&t.get("minimal").unwrap().spec).background, Fill::None);
}

#[test]
fn resolution_is_deterministic() {
    let t = ThemeTable::builtin();
    let spec = &t.get("cinematic").unwrap().spec;
    assert_eq!(resolve_style(spec), resolve_style(spec));
}

#[test]
fn cache_reuses_until_spec_is_replaced() {
    let t = ThemeTable::builtin();
    let mut cache = StyleCache::new();
    let a = cache.resolve(t.get("modern").unwrap());
    let b = cache.resolve(t.get("modern").unwrap());
    assert!(Arc::ptr_eq(&a, &b));

    let t1 = t.with_custom(PaintSpec {
        font_size: Some("30px".to_owned()),
        ..spec()
    });
    let c1 = cache.resolve(t1.get("custom").unwrap());
    assert_eq!(c1.font_size_px, 30.0);

    let t2 = t1.with_custom(PaintSpec {
        font_size: Some("40px".to_owned()),
        ..spec()
    });
    let c2 = cache.resolve(t2.get("custom").unwrap());
    assert_eq!(c2.font_size_px, 40.0);
    assert_eq!(cache.len(), 2);
}

#[test]
fn oversized_box_metrics_are_clamped() {
    let s = PaintSpec {
        padding: Some("4px 33000px".to_owned()),
        border_radius: Some("90000px".to_owned()),
        ..spec()
    };
    let r = resolve_style(&s);
    assert_eq!(r.padding.vertical, 4.0);
    assert_eq!(r.padding.horizontal, MAX_BOX_INSET_PX);
    assert_eq!(r.radius_px, MAX_BOX_INSET_PX);
}
