use super::*;

use std::collections::VecDeque;
use std::time::Duration;

use image::RgbaImage;

use crate::foundation::error::MediaError;
use crate::write::InMemoryWriter;

struct Scripted<F> {
    frames: VecDeque<F>,
    pulled: usize,
    ended: bool,
}

impl<F> Scripted<F> {
    fn new(frames: Vec<F>) -> Self {
        Self {
            frames: frames.into(),
            pulled: 0,
            ended: false,
        }
    }

    fn pop(&mut self) -> Option<F> {
        let f = self.frames.pop_front();
        match f {
            Some(_) => self.pulled += 1,
            None => self.ended = true,
        }
        f
    }
}

impl MediaReader<ImageTrack> for Scripted<ImageFrame> {
    fn format(&self) -> MediaFormat {
        MediaFormat::Gif
    }
    fn duration(&self) -> Option<Duration> {
        None
    }
    fn frame_count(&self) -> Option<u64> {
        None
    }
    fn position(&self) -> Duration {
        Duration::ZERO
    }
    fn is_finished(&self) -> bool {
        self.ended
    }
    fn next_frame(&mut self) -> MediaResult<Option<ImageFrame>> {
        Ok(self.pop())
    }
}

impl MediaReader<AudioTrack> for Scripted<AudioFrame> {
    fn format(&self) -> MediaFormat {
        MediaFormat::F32le
    }
    fn duration(&self) -> Option<Duration> {
        None
    }
    fn frame_count(&self) -> Option<u64> {
        None
    }
    fn position(&self) -> Duration {
        Duration::ZERO
    }
    fn is_finished(&self) -> bool {
        self.ended
    }
    fn next_frame(&mut self) -> MediaResult<Option<AudioFrame>> {
        Ok(self.pop())
    }
}

fn images(ts_ms: &[u64]) -> Scripted<ImageFrame> {
    Scripted::new(
        ts_ms
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                ImageFrame::new(
                    RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255])),
                    Duration::from_millis(*ms),
                    Some(Duration::from_millis(10)),
                    i as u64,
                )
                .unwrap()
            })
            .collect(),
    )
}

fn audio(ts_ms: &[u64]) -> Scripted<AudioFrame> {
    Scripted::new(
        ts_ms
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                AudioFrame::new(vec![0.0; 2], Duration::from_millis(*ms), 100, 1, i as u64)
                    .unwrap()
            })
            .collect(),
    )
}

#[test]
fn interleaves_tracks_by_timestamp() {
    let mut img = images(&[0, 20, 40]);
    let mut aud = audio(&[0, 10, 30, 50]);
    let mut writer = InMemoryWriter::new();

    let stats = run_pipeline(&mut img, Some(&mut aud), &mut Identity, &mut writer).unwrap();
    assert_eq!(
        stats,
        PipelineStats {
            image_frames: 3,
            audio_frames: 4
        }
    );
    assert!(writer.is_finished());
    assert_eq!(writer.images().len(), 3);
    assert_eq!(writer.audio().len(), 4);
}

#[test]
fn static_writer_gets_one_frame_and_stops_pulling() {
    let mut img = images(&[0, 10, 20, 30]);
    let mut writer = InMemoryWriter::still();
    let stats = run_pipeline(&mut img, None, &mut Identity, &mut writer).unwrap();
    assert_eq!(stats.image_frames, 1);
    assert_eq!(img.pulled, 1);
    assert!(writer.is_finished());
}

#[test]
fn audio_reaches_silent_writer_without_errors() {
    let mut img = images(&[0]);
    let mut aud = audio(&[0, 10, 20]);
    let mut writer = InMemoryWriter::still();
    let stats = run_pipeline(&mut img, Some(&mut aud), &mut Identity, &mut writer).unwrap();
    assert_eq!(stats.audio_frames, 3);
    assert!(writer.audio().is_empty());
    assert_eq!(writer.images().len(), 1);
}

#[test]
fn transform_is_applied_and_keeps_timing() {
    struct Invert;
    impl FrameTransform for Invert {
        fn apply(&mut self, frame: ImageFrame) -> MediaResult<ImageFrame> {
            let mut img = frame.image().clone();
            image::imageops::invert(&mut img);
            frame.with_image(img)
        }
    }

    let mut img = images(&[0, 25]);
    let mut writer = InMemoryWriter::silent();
    run_pipeline(&mut img, None, &mut Invert, &mut writer).unwrap();
    let out = writer.images();
    assert_eq!(out[0].image().get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(out[1].timestamp(), Duration::from_millis(25));
}

#[test]
fn transform_errors_propagate() {
    struct Fail;
    impl FrameTransform for Fail {
        fn apply(&mut self, _frame: ImageFrame) -> MediaResult<ImageFrame> {
            Err(MediaError::validation("nope"))
        }
    }
    let mut img = images(&[0]);
    let mut writer = InMemoryWriter::new();
    let err = run_pipeline(&mut img, None, &mut Fail, &mut writer).unwrap_err();
    assert!(matches!(err, MediaError::Validation(_)));
    assert!(!writer.is_finished());
}

#[test]
fn overlay_stage_composes_each_frame() {
    let overlay = ImageFrame::still(RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]))).unwrap();
    let mut stage = OverlayStage::new(overlay, OverlayData::new(2, 2).with_overlay_at(1, 1));
    let mut img = images(&[0, 10]);
    let mut writer = InMemoryWriter::silent();
    run_pipeline(&mut img, None, &mut stage, &mut writer).unwrap();
    for f in writer.images() {
        assert_eq!(f.image().get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(f.image().get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut out = Vec::new();
    RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[test]
fn transcode_png_to_gif_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("out.gif");
    let stats = transcode(
        &MediaReaderFactory::default(),
        MediaSource::bytes(png_bytes(4, 2)),
        "png",
        MediaSink::path(&out),
        "gif",
        &mut Identity,
        &WriterOpts::new(),
    )
    .unwrap();
    assert_eq!(stats.image_frames, 1);
    assert_eq!(stats.audio_frames, 0);

    let decoded = image::open(&out).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 2));
}

#[test]
fn transcode_to_still_reads_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    std::fs::write(&input, png_bytes(3, 3)).unwrap();
    let out = dir.path().join("out.bmp");
    let stats = transcode(
        &MediaReaderFactory::default(),
        MediaSource::path(&input),
        "png",
        MediaSink::path(&out),
        "bmp",
        &mut Identity,
        &WriterOpts::new(),
    )
    .unwrap();
    assert_eq!(stats.image_frames, 1);
    let decoded = image::open(&out).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(1, 1).0, [10, 20, 30, 255]);
}

#[test]
fn transcode_rejects_unknown_output_format() {
    let err = transcode(
        &MediaReaderFactory::default(),
        MediaSource::bytes(png_bytes(2, 2)),
        "png",
        MediaSink::stream(std::io::sink()),
        "tiffany",
        &mut Identity,
        &WriterOpts::new(),
    )
    .unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
}
