use super::*;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;

use crate::frame::AudioFrame;
use crate::write::AudioCapability;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn writer(format: MediaFormat, buf: &SharedBuf) -> StillImageWriter {
    StillImageWriter::new(MediaSink::stream(buf.clone()), format, &WriterOpts::default()).unwrap()
}

fn frame(px: [u8; 4]) -> ImageFrame {
    ImageFrame::still(RgbaImage::from_pixel(3, 2, image::Rgba(px))).unwrap()
}

#[test]
fn second_image_frame_is_invalid_state() {
    let buf = SharedBuf::default();
    let mut w = writer(MediaFormat::Png, &buf);
    assert!(w.is_static());
    w.write_image_frame(frame([1, 2, 3, 255])).unwrap();
    let err = w.write_image_frame(frame([1, 2, 3, 255])).unwrap_err();
    assert!(matches!(err, MediaError::InvalidState(_)));
}

#[test]
fn audio_after_single_frame_is_a_noop() {
    let buf = SharedBuf::default();
    let mut w = writer(MediaFormat::Png, &buf);
    w.write_image_frame(frame([200, 100, 50, 255])).unwrap();
    assert!(!w.supports_audio());
    let audio = AudioFrame::new(vec![1.0; 2], Duration::ZERO, 48_000, 2, 0).unwrap();
    w.write_audio_frame(audio).unwrap();
    assert!(w.is_static());
    w.finish().unwrap();

    let bytes = buf.0.lock().unwrap().clone();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert_eq!(decoded.get_pixel(0, 0).0, [200, 100, 50, 255]);
}

#[test]
fn finish_without_frame_is_invalid_state() {
    let buf = SharedBuf::default();
    let mut w = writer(MediaFormat::Png, &buf);
    assert!(matches!(w.finish(), Err(MediaError::InvalidState(_))));
    assert!(buf.0.lock().unwrap().is_empty());
}

#[test]
fn second_finish_is_invalid_state() {
    let buf = SharedBuf::default();
    let mut w = writer(MediaFormat::Bmp, &buf);
    w.write_image_frame(frame([0, 0, 0, 255])).unwrap();
    w.finish().unwrap();
    assert!(matches!(w.finish(), Err(MediaError::InvalidState(_))));
}

#[test]
fn jpeg_flattens_transparency_onto_background() {
    let buf = SharedBuf::default();
    let opts = WriterOpts {
        bg_rgba: [255, 255, 255, 255],
        jpeg_quality: 100,
        ..WriterOpts::default()
    };
    let mut w =
        StillImageWriter::new(MediaSink::stream(buf.clone()), MediaFormat::Jpeg, &opts).unwrap();
    w.write_image_frame(frame([0, 0, 0, 0])).unwrap();
    w.finish().unwrap();

    let bytes = buf.0.lock().unwrap().clone();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert!(decoded.pixels().all(|p| p.0.iter().all(|c| *c > 240)));
}

#[test]
fn drop_finalizes_an_unfinished_writer() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("dropped.png");
    {
        let mut w =
            StillImageWriter::new(MediaSink::path(&out), MediaFormat::Png, &WriterOpts::default())
                .unwrap();
        w.write_image_frame(frame([5, 6, 7, 255])).unwrap();
    }
    let decoded = image::open(&out).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(2, 1).0, [5, 6, 7, 255]);
}

#[test]
fn animated_format_is_rejected() {
    let err = StillImageWriter::new(
        MediaSink::stream(SharedBuf::default()),
        MediaFormat::Gif,
        &WriterOpts::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
}
