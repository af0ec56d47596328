use super::*;

const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

fn system_font() -> Option<Vec<u8>> {
    std::fs::read(SYSTEM_FONT).ok()
}

#[test]
fn empty_book_estimates_metrics() {
    let book = FontBook::new();
    assert!(book.is_empty());
    assert!(book.resolve(&["Arial".to_string()]).is_none());

    let mut engine = TextLayoutEngine::new();
    let m = engine
        .measure(&book, &["Arial".to_string()], "abcd", 20.0)
        .unwrap();
    assert!(matches!(m, MeasuredText::Estimated { .. }));
    assert!((m.width() - 44.0).abs() < 1e-9);
    assert!((m.height() - 24.0).abs() < 1e-9);
}

#[test]
fn garbage_bytes_are_rejected() {
    let mut book = FontBook::new();
    assert!(book.add_bytes(vec![0, 1, 2, 3]).is_err());
    assert!(book.is_empty());
}

#[test]
fn missing_file_reports_path() {
    let mut book = FontBook::new();
    let err = book
        .add_file(Path::new("/definitely/not/here.ttf"))
        .unwrap_err();
    assert!(err.to_string().contains("here.ttf"));
}

#[test]
fn stacks_resolve_by_family_then_fallback() {
    let Some(bytes) = system_font() else {
        return;
    };
    let mut book = FontBook::new();
    let family = book.add_bytes(bytes).unwrap();
    assert_eq!(family, "DejaVu Sans");

    let hit = book
        .resolve(&["Impact".to_string(), "dejavu sans".to_string()])
        .unwrap();
    assert_eq!(hit.family(), "DejaVu Sans");
    let fallback = book.resolve(&["sans-serif".to_string()]).unwrap();
    assert_eq!(fallback.family(), "DejaVu Sans");
}

#[test]
fn shaping_produces_glyphs_left_to_right() {
    let Some(bytes) = system_font() else {
        return;
    };
    let mut book = FontBook::new();
    book.add_bytes(bytes).unwrap();
    let mut engine = TextLayoutEngine::new();

    let m = engine.measure(&book, &[], "Hello there", 24.0).unwrap();
    let MeasuredText::Shaped { line, .. } = &m else {
        panic!("expected shaped text");
    };
    assert_eq!(line.glyphs.len(), "Hello there".len());
    assert!(line.width > 24.0);
    assert!(line.height > 0.0);
    assert!(line.glyphs.windows(2).all(|w| w[0].x <= w[1].x));

    let again = engine.measure(&book, &[], "Hello there", 24.0).unwrap();
    assert_eq!(again.width(), m.width());
}
