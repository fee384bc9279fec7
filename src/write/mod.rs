//! Frame writers.
//!
//! A writer is bound to one output sink and consumes image frames (and, when it supports audio,
//! audio frames) in non-decreasing timestamp order. [`MediaWriter::finish`] finalizes the output
//! exactly once; a writer dropped without finishing finalizes itself.

use std::time::Duration;

use crate::ffmpeg::FfmpegConfig;
use crate::format::{Backend, MediaFormat, ensure_available};
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{AudioFrame, ImageFrame};
use crate::io::MediaSink;

/// Video and audio containers encoded by `ffmpeg`.
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg;
/// Animated GIF encoding.
pub mod gif;
/// Frame capture in memory.
pub mod memory;
/// Single-frame still images.
pub mod still;

pub use gif::GifWriter;
pub use memory::InMemoryWriter;
pub use still::StillImageWriter;

/// Audio side of a writer.
///
/// Writers that cannot emit audio get this for free by implementing [`NoAudioWriter`].
pub trait AudioCapability {
    /// `false` means every [`AudioCapability::write_audio_frame`] call is silently dropped.
    fn supports_audio(&self) -> bool;

    /// Append one audio block.
    fn write_audio_frame(&mut self, frame: AudioFrame) -> MediaResult<()>;
}

/// Marker for writers without an audio path.
///
/// Implementing it provides [`AudioCapability`] with `supports_audio() == false` and a
/// `write_audio_frame` that always returns `Ok(())` and leaves the output untouched.
pub trait NoAudioWriter {}

impl<W: NoAudioWriter + ?Sized> AudioCapability for W {
    fn supports_audio(&self) -> bool {
        false
    }

    fn write_audio_frame(&mut self, _frame: AudioFrame) -> MediaResult<()> {
        Ok(())
    }
}

/// Consumer of timed frames that produces one output container.
pub trait MediaWriter: AudioCapability {
    /// The output can only ever hold one image frame.
    fn is_static(&self) -> bool;

    /// Append one image frame. Static writers accept exactly one.
    fn write_image_frame(&mut self, frame: ImageFrame) -> MediaResult<()>;

    /// Flush buffered frames, write trailers and release the sink. A second call is
    /// `InvalidState`.
    fn finish(&mut self) -> MediaResult<()>;

    /// Whether [`MediaWriter::finish`] has run.
    fn is_finished(&self) -> bool;
}

/// Write-protocol bookkeeping shared by all writers.
#[derive(Debug)]
pub struct WriteState {
    is_static: bool,
    images: u64,
    last_image_ts: Option<Duration>,
    last_audio_ts: Option<Duration>,
    finished: bool,
}

impl WriteState {
    /// Fresh state. `is_static` limits the writer to one image frame.
    pub fn new(is_static: bool) -> Self {
        Self {
            is_static,
            images: 0,
            last_image_ts: None,
            last_audio_ts: None,
            finished: false,
        }
    }

    /// Whether [`WriteState::begin_finish`] has succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Image frames admitted so far.
    pub fn images_written(&self) -> u64 {
        self.images
    }

    /// Check and record an image write at `ts`.
    pub fn admit_image(&mut self, ts: Duration) -> MediaResult<()> {
        self.ensure_open()?;
        if self.is_static && self.images > 0 {
            return Err(MediaError::invalid_state(
                "static writer already finalized its single frame",
            ));
        }
        if let Some(last) = self.last_image_ts
            && ts < last
        {
            return Err(MediaError::invalid_state(format!(
                "image frame at {ts:?} written after frame at {last:?}"
            )));
        }
        self.images += 1;
        self.last_image_ts = Some(ts);
        Ok(())
    }

    /// Check and record an audio write at `ts`.
    pub fn admit_audio(&mut self, ts: Duration) -> MediaResult<()> {
        self.ensure_open()?;
        if let Some(last) = self.last_audio_ts
            && ts < last
        {
            return Err(MediaError::invalid_state(format!(
                "audio frame at {ts:?} written after frame at {last:?}"
            )));
        }
        self.last_audio_ts = Some(ts);
        Ok(())
    }

    /// Mark the writer finished. Fails on the second call.
    pub fn begin_finish(&mut self) -> MediaResult<()> {
        self.ensure_open()?;
        self.finished = true;
        Ok(())
    }

    pub(crate) fn ensure_open(&self) -> MediaResult<()> {
        if self.finished {
            return Err(MediaError::invalid_state("writer already finished"));
        }
        Ok(())
    }
}

/// GIF loop behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GifRepeat {
    /// Loop forever.
    #[default]
    Infinite,
    /// Play this many extra times after the first pass.
    Finite(u16),
}

/// Options for [`open_writer`].
#[derive(Clone, Debug)]
pub struct WriterOpts {
    /// Tool locations for ffmpeg-backed formats.
    pub ffmpeg: FfmpegConfig,
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Background that transparent pixels are flattened onto for opaque outputs.
    pub bg_rgba: [u8; 4],
    /// Constant output frame rate for video. `None` derives it from the first frame.
    pub fps: Option<f64>,
    /// Loop behaviour of GIF output.
    pub gif_repeat: GifRepeat,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
}

impl WriterOpts {
    /// Defaults: overwrite, black background, infinite GIF loop, JPEG quality 90.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn validate(&self) -> MediaResult<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(MediaError::validation(format!(
                "jpeg quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if let Some(fps) = self.fps
            && !(fps.is_finite() && fps > 0.0)
        {
            return Err(MediaError::validation(format!(
                "fps must be finite and > 0, got {fps}"
            )));
        }
        Ok(())
    }
}

impl Default for WriterOpts {
    fn default() -> Self {
        Self {
            ffmpeg: FfmpegConfig::default(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            fps: None,
            gif_repeat: GifRepeat::Infinite,
            jpeg_quality: 90,
        }
    }
}

/// Writer over every built-in backend, as returned by [`open_writer`].
#[derive(Debug)]
pub enum Writer {
    /// Single still image.
    Still(StillImageWriter),
    /// Animated GIF.
    Gif(GifWriter),
    /// Container encoded by `ffmpeg`.
    #[cfg(feature = "media-ffmpeg")]
    Ffmpeg(ffmpeg::FfmpegWriter),
}

macro_rules! dispatch_writer {
    ($self:expr, $w:ident => $body:expr) => {
        match $self {
            Writer::Still($w) => $body,
            Writer::Gif($w) => $body,
            #[cfg(feature = "media-ffmpeg")]
            Writer::Ffmpeg($w) => $body,
        }
    };
}

impl AudioCapability for Writer {
    fn supports_audio(&self) -> bool {
        dispatch_writer!(self, w => w.supports_audio())
    }

    fn write_audio_frame(&mut self, frame: AudioFrame) -> MediaResult<()> {
        dispatch_writer!(self, w => w.write_audio_frame(frame))
    }
}

impl MediaWriter for Writer {
    fn is_static(&self) -> bool {
        dispatch_writer!(self, w => w.is_static())
    }

    fn write_image_frame(&mut self, frame: ImageFrame) -> MediaResult<()> {
        dispatch_writer!(self, w => w.write_image_frame(frame))
    }

    fn finish(&mut self) -> MediaResult<()> {
        dispatch_writer!(self, w => w.finish())
    }

    fn is_finished(&self) -> bool {
        dispatch_writer!(self, w => w.is_finished())
    }
}

/// Open a writer for `format` bound to `sink`.
#[tracing::instrument(skip(sink, opts), fields(sink = ?sink))]
pub fn open_writer(sink: MediaSink, format: &str, opts: &WriterOpts) -> MediaResult<Writer> {
    let fmt = MediaFormat::parse(format)?;
    if !fmt.is_writable() {
        return Err(MediaError::unsupported_format(format!(
            "format '{fmt}' cannot be written"
        )));
    }
    ensure_available(fmt)?;
    opts.validate()?;
    sink.prepare(opts.overwrite)?;

    let writer = match fmt.backend() {
        Backend::Still => Writer::Still(StillImageWriter::new(sink, fmt, opts)?),
        Backend::Gif => Writer::Gif(GifWriter::new(sink, opts.gif_repeat)),
        #[cfg(feature = "media-ffmpeg")]
        Backend::Ffmpeg => Writer::Ffmpeg(ffmpeg::FfmpegWriter::new(sink, fmt, opts)?),
        _ => {
            return Err(MediaError::unsupported_format(format!(
                "no writer backend for '{fmt}'"
            )));
        }
    };
    tracing::debug!(
        format = %fmt,
        is_static = writer.is_static(),
        supports_audio = writer.supports_audio(),
        "opened writer"
    );
    Ok(writer)
}

#[cfg(test)]
#[path = "../../tests/unit/write/mod.rs"]
mod tests;
