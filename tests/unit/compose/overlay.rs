use super::*;

use std::time::Duration;

use crate::frame::TimedFrame;

fn solid(w: u32, h: u32, px: [u8; 4]) -> ImageFrame {
    ImageFrame::still(RgbaImage::from_pixel(w, h, image::Rgba(px))).unwrap()
}

#[test]
fn placement_rejects_out_of_bounds_and_negative_origins() {
    let data = OverlayData::new(10, 10).with_overlay_at(8, 0);
    let err = data.placement((10, 10), (4, 4)).unwrap_err();
    assert!(matches!(err, MediaError::Validation(_)));

    let data = OverlayData::new(10, 10).with_base_at(-1, 0);
    assert!(data.placement((5, 5), (1, 1)).is_err());

    assert!(OverlayData::new(0, 10).placement((0, 0), (0, 0)).is_err());
}

#[test]
fn placement_accepts_exact_fit() {
    let data = OverlayData::new(10, 6).with_overlay_at(6, 2);
    let (base, overlay) = data.placement((10, 6), (4, 4)).unwrap();
    assert_eq!(
        base,
        Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 6
        }
    );
    assert_eq!((overlay.x, overlay.y), (6, 2));
}

#[test]
fn centered_and_stacked_layouts() {
    let c = OverlayData::centered((10, 4), (4, 8));
    assert_eq!((c.width, c.height), (10, 8));
    assert_eq!((c.base_x, c.base_y), (0, 2));
    assert_eq!((c.overlay_x, c.overlay_y), (3, 0));

    let s = OverlayData::stacked_vertical((6, 2), (2, 3)).unwrap();
    assert_eq!((s.width, s.height), (6, 5));
    assert_eq!((s.overlay_x, s.overlay_y), (2, 2));
    assert!(s.placement((6, 2), (2, 3)).is_ok());
}

#[test]
fn stacking_rejects_heights_past_i32() {
    let tall = u32::try_from(i32::MAX).unwrap() + 1;
    let err = OverlayData::stacked_vertical((1, tall), (1, 1)).unwrap_err();
    assert!(matches!(err, MediaError::Validation(_)));

    let err = OverlayData::stacked_vertical((1, u32::MAX), (1, 1)).unwrap_err();
    assert!(matches!(err, MediaError::Validation(_)));

    let edge = OverlayData::stacked_vertical((1, 1), (1, u32::MAX - 1)).unwrap();
    assert_eq!((edge.height, edge.overlay_y), (u32::MAX, 1));
}

#[test]
fn overlay_is_drawn_over_base_at_its_placement() {
    let base = ImageFrame::new(
        RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255])),
        Duration::from_millis(40),
        Some(Duration::from_millis(40)),
        1,
    )
    .unwrap();
    let overlay = solid(2, 2, [255, 0, 0, 255]);
    let data = OverlayData::new(4, 4).with_overlay_at(2, 2);

    let out = compose_overlay(&base, &overlay, &data).unwrap();
    assert_eq!(out.image().get_pixel(0, 0).0, [0, 0, 255, 255]);
    assert_eq!(out.image().get_pixel(3, 3).0, [255, 0, 0, 255]);
    assert_eq!(out.timestamp(), Duration::from_millis(40));
    assert_eq!(out.index(), 1);
    assert_eq!(base.image().get_pixel(3, 3).0, [0, 0, 255, 255]);
}

#[test]
fn composition_is_repeatable() {
    let base = solid(6, 6, [10, 10, 10, 255]);
    let overlay = solid(3, 2, [200, 100, 0, 128]);
    let data = OverlayData::new(8, 8).with_base_at(1, 1).with_overlay_at(4, 5);
    let a = compose_overlay(&base, &overlay, &data).unwrap();
    let b = compose_overlay(&base, &overlay, &data).unwrap();
    assert_eq!(a, b);
}

#[test]
fn rgb8_output_is_opaque() {
    let base = solid(2, 2, [0, 0, 0, 0]);
    let overlay = solid(1, 1, [255, 255, 255, 255]);
    let data = OverlayData::new(3, 3).with_format(PixelFormat::Rgb8);
    let out = compose_overlay(&base, &overlay, &data).unwrap();
    assert!(out.image().pixels().all(|p| p.0[3] == 255));
    assert_eq!(out.image().get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(out.image().get_pixel(2, 2).0, [0, 0, 0, 255]);
}
