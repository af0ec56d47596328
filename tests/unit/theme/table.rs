use super::*;

#[test]
fn builtin_table_has_twelve_themes_default_first() {
    let t = ThemeTable::builtin();
    assert_eq!(t.len(), 12);
    let ids: Vec<&str> = t.entries().map(|e| e.id.as_str()).collect();
    assert_eq!(ids[0], DEFAULT_THEME_ID);
    for id in [
        "modern",
        "minimal",
        "bold",
        "subtitle",
        "capcut",
        "neon",
        "glass",
        "cinematic",
        "retro",
        "social",
        "gaming",
    ] {
        assert!(t.get(id).is_some(), "{id}");
    }
    assert!(t.get(CUSTOM_THEME_ID).is_none());
}

#[test]
fn unknown_ids_fall_back_to_default() {
    let t = ThemeTable::builtin();
    assert_eq!(t.get_or_default("nope").id.as_str(), DEFAULT_THEME_ID);
    assert!(t.require("nope").is_err());
    assert!(t.require("neon").is_ok());
}

#[test]
fn with_custom_returns_new_table_and_leaves_old_untouched() {
    let base = ThemeTable::builtin();
    let neon_before = base.get("neon").unwrap().spec.clone();

    let custom = PaintSpec {
        color: Some("#ff0000".to_owned()),
        ..PaintSpec::default()
    };
    let next = base.with_custom(custom.clone());
    assert_eq!(next.len(), 13);
    assert_eq!(*next.get(CUSTOM_THEME_ID).unwrap().spec, custom);
    assert!(base.get(CUSTOM_THEME_ID).is_none());

    // Built-ins are shared, not copied.
    assert!(Arc::ptr_eq(&neon_before, &next.get("neon").unwrap().spec));

    let replaced = next.with_custom(PaintSpec::default());
    assert_eq!(*next.get(CUSTOM_THEME_ID).unwrap().spec, custom);
    assert_eq!(*replaced.get(CUSTOM_THEME_ID).unwrap().spec, PaintSpec::default());
}
