use super::*;

#[test]
fn transparent_source_leaves_destination() {
    let dst = [10, 20, 30, 40];
    assert_eq!(over(dst, [255, 255, 255, 0], 255), dst);
    assert_eq!(over(dst, [255, 255, 255, 255], 0), dst);
}

#[test]
fn opaque_source_replaces_destination() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255], 255), [255, 0, 0, 255]);
}

#[test]
fn half_red_over_opaque_black() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 128], 255), [128, 0, 0, 255]);
}

#[test]
fn blend_clips_to_destination() {
    let mut dst = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]));
    let src = RgbaImage::from_pixel(3, 3, image::Rgba([0, 255, 0, 255]));
    blend_image_at(&mut dst, &src, -1, 2, 255);

    assert_eq!(dst.get_pixel(0, 2).0, [0, 255, 0, 255]);
    assert_eq!(dst.get_pixel(1, 3).0, [0, 255, 0, 255]);
    assert_eq!(dst.get_pixel(2, 2).0, [0, 0, 0, 255]);
    assert_eq!(dst.get_pixel(0, 1).0, [0, 0, 0, 255]);
}

#[test]
fn blend_fully_outside_is_noop() {
    let mut dst = RgbaImage::new(2, 2);
    let src = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
    blend_image_at(&mut dst, &src, 5, 5, 255);
    blend_image_at(&mut dst, &src, -2, 0, 255);
    assert!(dst.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128u8, 0, 0, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn flatten_to_rgb_drops_alpha() {
    let img = RgbaImage::from_raw(2, 1, vec![255, 255, 255, 0, 10, 20, 30, 255]).unwrap();
    let rgb = flatten_to_rgb(&img, [50, 60, 70, 255]).unwrap();
    assert_eq!(rgb.as_raw(), &vec![50, 60, 70, 10, 20, 30]);
}
