//! Reader → transform → writer driver.

use crate::compose::{OverlayData, TextDrawData, compose_overlay, compose_text};
use crate::format::MediaFormat;
use crate::foundation::error::{MediaErrorKind, MediaResult};
use crate::frame::{AudioFrame, AudioTrack, ImageFrame, ImageTrack, TimedFrame};
use crate::io::{MediaSink, MediaSource};
use crate::read::{MediaReader, MediaReaderFactory};
use crate::write::{AudioCapability, MediaWriter, WriterOpts, open_writer};

/// Stage that rewrites image frames on their way to the writer.
///
/// Implementations return a new frame and keep the input's timing.
pub trait FrameTransform {
    /// Rewrite one frame.
    fn apply(&mut self, frame: ImageFrame) -> MediaResult<ImageFrame>;
}

/// Passes frames through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl FrameTransform for Identity {
    fn apply(&mut self, frame: ImageFrame) -> MediaResult<ImageFrame> {
        Ok(frame)
    }
}

/// Composites a fixed overlay image onto every frame.
#[derive(Clone, Debug)]
pub struct OverlayStage {
    /// Image placed on top.
    pub overlay: ImageFrame,
    /// Canvas and placement.
    pub data: OverlayData,
}

impl OverlayStage {
    /// Stage compositing `overlay` as laid out by `data`.
    pub fn new(overlay: ImageFrame, data: OverlayData) -> Self {
        Self { overlay, data }
    }
}

impl FrameTransform for OverlayStage {
    fn apply(&mut self, frame: ImageFrame) -> MediaResult<ImageFrame> {
        compose_overlay(&frame, &self.overlay, &self.data)
    }
}

/// Draws a text block onto every frame.
#[derive(Clone, Debug)]
pub struct TextStage {
    /// Glyphs and their anchor.
    pub text: TextDrawData,
}

impl TextStage {
    /// Stage drawing `text`.
    pub fn new(text: TextDrawData) -> Self {
        Self { text }
    }
}

impl FrameTransform for TextStage {
    fn apply(&mut self, frame: ImageFrame) -> MediaResult<ImageFrame> {
        compose_text(&frame, &self.text)
    }
}

/// Frame counts handed to the writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineStats {
    /// Image frames accepted by the writer.
    pub image_frames: u64,
    /// Audio frames passed to the writer, including ones it dropped.
    pub audio_frames: u64,
}

/// Stream `image` (and `audio`, when given) through `transform` into `writer`, then finish it.
///
/// Frames from both tracks reach the writer in timestamp order; on a tie the image frame goes
/// first. Audio is forwarded as is; writers without audio drop it. A static writer receives only
/// the first image frame.
#[tracing::instrument(skip_all)]
pub fn run_pipeline(
    image: &mut dyn MediaReader<ImageTrack>,
    mut audio: Option<&mut dyn MediaReader<AudioTrack>>,
    transform: &mut dyn FrameTransform,
    writer: &mut dyn MediaWriter,
) -> MediaResult<PipelineStats> {
    let mut stats = PipelineStats::default();
    let mut next_image: Option<ImageFrame> = None;
    let mut next_audio: Option<AudioFrame> = None;
    let mut image_done = false;
    let mut audio_done = audio.is_none();

    loop {
        if next_image.is_none() && !image_done {
            if writer.is_static() && stats.image_frames > 0 {
                image_done = true;
            } else {
                next_image = image.next_frame()?;
                image_done = next_image.is_none();
            }
        }
        if next_audio.is_none() && !audio_done {
            next_audio = match audio.as_deref_mut() {
                Some(reader) => reader.next_frame()?,
                None => None,
            };
            audio_done = next_audio.is_none();
        }

        let audio_first = match (&next_image, &next_audio) {
            (None, None) => break,
            (Some(i), Some(a)) => a.timestamp() < i.timestamp(),
            (None, Some(_)) => true,
            (Some(_), None) => false,
        };
        if audio_first {
            if let Some(frame) = next_audio.take() {
                writer.write_audio_frame(frame)?;
                stats.audio_frames += 1;
            }
        } else if let Some(frame) = next_image.take() {
            writer.write_image_frame(transform.apply(frame)?)?;
            stats.image_frames += 1;
        }
    }

    writer.finish()?;
    tracing::debug!(
        image_frames = stats.image_frames,
        audio_frames = stats.audio_frames,
        "pipeline finished"
    );
    Ok(stats)
}

/// Read `input`, apply `transform`, and write `output`.
///
/// The audio track is read only when the input format carries one, the input can be opened a
/// second time (a path), and the output writer supports audio.
pub fn transcode(
    factory: &MediaReaderFactory,
    input: MediaSource,
    in_format: &str,
    output: MediaSink,
    out_format: &str,
    transform: &mut dyn FrameTransform,
    opts: &WriterOpts,
) -> MediaResult<PipelineStats> {
    let in_fmt = MediaFormat::parse(in_format)?;
    let audio_source = if in_fmt.has_audio_track() {
        input.try_clone()
    } else {
        None
    };

    let mut image = factory.image_reader(input, in_format)?;
    let mut writer = open_writer(output, out_format, opts)?;

    let mut audio = match audio_source {
        Some(src) if writer.supports_audio() => match factory.audio_reader(src, in_format) {
            Ok(reader) => Some(reader),
            Err(e) if e.kind() == MediaErrorKind::UnsupportedFormat => {
                tracing::debug!("input has no audio track: {e}");
                None
            }
            Err(e) => return Err(e),
        },
        _ => None,
    };

    run_pipeline(
        &mut image,
        audio
            .as_mut()
            .map(|a| a as &mut dyn MediaReader<AudioTrack>),
        transform,
        &mut writer,
    )
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
