use super::*;
use crate::frame::TimedFrame;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn yields_exactly_one_frame_at_zero() {
    let src = MediaSource::bytes(png_bytes(3, 2, [10, 20, 30, 255]));
    let mut r = StillImageReader::open(src, MediaFormat::Png).unwrap();
    assert_eq!(r.dimensions(), (3, 2));
    assert_eq!(r.frame_count(), Some(1));

    let f = r.next_frame().unwrap().unwrap();
    assert_eq!(f.timestamp(), Duration::ZERO);
    assert_eq!(f.index(), 0);
    assert_eq!(f.duration(), None);
    assert_eq!(f.image().get_pixel(2, 1).0, [10, 20, 30, 255]);

    assert!(r.next_frame().unwrap().is_none());
    assert!(r.is_finished());
    assert!(r.next_frame().unwrap().is_none());
}

#[test]
fn seek_before_end_rewinds_to_the_single_frame() {
    let src = MediaSource::bytes(png_bytes(1, 1, [1, 2, 3, 4]));
    let mut r = StillImageReader::open(src, MediaFormat::Png).unwrap();
    r.next_frame().unwrap().unwrap();
    r.seek(Duration::from_secs(5)).unwrap();
    assert_eq!(r.next_frame().unwrap().unwrap().index(), 0);
}

#[test]
fn corrupt_bytes_are_decode_error() {
    let src = MediaSource::bytes(b"this is not a png at all".to_vec());
    let err = StillImageReader::open(src, MediaFormat::Png).unwrap_err();
    assert!(matches!(err, MediaError::Decode(_)), "{err:?}");
}

#[test]
fn non_still_format_is_rejected() {
    let err = StillImageReader::open(MediaSource::bytes(vec![0u8]), MediaFormat::F32le).unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
}
