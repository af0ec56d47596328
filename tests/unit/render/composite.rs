use super::*;

#[test]
fn zero_opacity_is_noop() {
    assert_eq!(over([1, 2, 3, 4], [200, 200, 200, 200], 0.0), [1, 2, 3, 4]);
}

#[test]
fn transparent_source_is_noop() {
    assert_eq!(over([10, 20, 30, 40], [255, 255, 255, 0], 1.0), [10, 20, 30, 40]);
}

#[test]
fn opaque_source_replaces() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn half_opacity_blends() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert_eq!(out[3], 255);
    assert!((127..=129).contains(&out[0]), "{out:?}");
}

#[test]
fn layer_composite_checks_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
    over_in_place(&mut dst, &[0, 0, 255, 255, 0, 0, 0, 0], 1.0).unwrap();
    assert_eq!(dst, vec![0, 0, 255, 255, 0, 0, 0, 0]);
}
