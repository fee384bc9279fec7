use super::*;

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::foundation::error::MediaError;
use crate::frame::TimedFrame;

/// Stream that counts how many live handles exist.
struct Tracked {
    inner: Cursor<Vec<u8>>,
    live: Arc<AtomicUsize>,
}

impl Tracked {
    fn new(bytes: Vec<u8>, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: Cursor::new(bytes),
            live: live.clone(),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for Tracked {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn default_opts_are_stereo_48k() {
    let o = ReaderOpts::new();
    assert_eq!(o.audio_sample_rate, 48_000);
    assert_eq!(o.audio_channels, 2);
    assert_eq!(o.audio_block_samples, 1024);
}

#[test]
fn png_opens_image_reader() {
    let factory = MediaReaderFactory::default();
    let mut r = factory
        .open::<ImageTrack>(MediaSource::bytes(png_bytes()), "png")
        .unwrap();
    assert!(matches!(r, ImageReader::Still(_)));
    assert_eq!(r.dimensions(), Some((2, 2)));
    let f = r.next_frame().unwrap().unwrap();
    assert_eq!(f.timestamp(), std::time::Duration::ZERO);
}

#[test]
fn unknown_format_releases_the_stream() {
    let live = Arc::new(AtomicUsize::new(0));
    let factory = MediaReaderFactory::default();
    let src = MediaSource::stream(Tracked::new(png_bytes(), &live));
    assert_eq!(live.load(Ordering::SeqCst), 1);

    let err = factory.image_reader(src, "unknown-format").unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn decode_failure_releases_the_stream() {
    let live = Arc::new(AtomicUsize::new(0));
    let factory = MediaReaderFactory::default();
    let src = MediaSource::stream(Tracked::new(b"nope".to_vec(), &live));

    let err = factory.image_reader(src, "png").unwrap_err();
    assert!(matches!(err, MediaError::Decode(_)));
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn image_only_format_has_no_audio_track() {
    let factory = MediaReaderFactory::default();
    let err = factory
        .audio_reader(MediaSource::bytes(png_bytes()), "png")
        .unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
    assert!(err.to_string().contains("audio"));
}

#[test]
fn audio_only_format_has_no_image_track() {
    let factory = MediaReaderFactory::default();
    let err = factory
        .image_reader(MediaSource::bytes(Vec::new()), "f32le")
        .unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
}

#[test]
fn raw_pcm_uses_configured_layout() {
    let factory = MediaReaderFactory::new(ReaderOpts {
        audio_sample_rate: 8_000,
        audio_channels: 1,
        audio_block_samples: 4,
        ..ReaderOpts::default()
    });
    let bytes: Vec<u8> = [0.5f32; 6].iter().flat_map(|s| s.to_le_bytes()).collect();
    let mut r = factory
        .open::<AudioTrack>(MediaSource::bytes(bytes), "pcm")
        .unwrap();
    assert_eq!(r.layout(), (8_000, 1));
    assert_eq!(r.next_frame().unwrap().unwrap().sample_frames(), 4);
    assert_eq!(r.next_frame().unwrap().unwrap().sample_frames(), 2);
    assert!(r.next_frame().unwrap().is_none());
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn container_without_backend_is_unsupported_format() {
    let factory = MediaReaderFactory::default();
    let err = factory
        .image_reader(MediaSource::bytes(Vec::new()), "mp4")
        .unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
    assert!(err.to_string().contains("media-ffmpeg"));
}
