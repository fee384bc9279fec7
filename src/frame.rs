//! Timed samples flowing between readers, transform stages and writers.
//!
//! Frames own their buffers and are moved from stage to stage. A stage that changes pixels builds
//! a new [`ImageFrame`] (see [`ImageFrame::with_image`]) instead of mutating the one it received.

use std::time::Duration;

use image::RgbaImage;

use crate::foundation::error::{MediaError, MediaResult};

/// Common timing accessors shared by image and audio frames.
pub trait TimedFrame {
    /// Presentation timestamp relative to the start of the track.
    fn timestamp(&self) -> Duration;
    /// Zero-based position of the frame within its track.
    fn index(&self) -> u64;
}

/// One decoded visual sample, straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFrame {
    image: RgbaImage,
    timestamp: Duration,
    duration: Option<Duration>,
    index: u64,
}

impl ImageFrame {
    /// Build a frame.
    ///
    /// `duration == None` marks a frame with unbounded display time (the single frame of a static
    /// stream). A zero duration is rejected.
    pub fn new(
        image: RgbaImage,
        timestamp: Duration,
        duration: Option<Duration>,
        index: u64,
    ) -> MediaResult<Self> {
        if duration.is_some_and(|d| d.is_zero()) {
            return Err(MediaError::validation("image frame duration must be > 0"));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(MediaError::validation("image frame must not be empty"));
        }
        Ok(Self {
            image,
            timestamp,
            duration,
            index,
        })
    }

    /// Single frame at t=0 with unbounded duration.
    pub fn still(image: RgbaImage) -> MediaResult<Self> {
        Self::new(image, Duration::ZERO, None, 0)
    }

    /// Pixels of the frame.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Take the pixel buffer, dropping the timing.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Display time, `None` when unbounded.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// New frame carrying this frame's timing with different pixels.
    pub fn with_image(&self, image: RgbaImage) -> MediaResult<Self> {
        Self::new(image, self.timestamp, self.duration, self.index)
    }
}

impl TimedFrame for ImageFrame {
    fn timestamp(&self) -> Duration {
        self.timestamp
    }

    fn index(&self) -> u64 {
        self.index
    }
}

/// One block of decoded audio as interleaved `f32` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    timestamp: Duration,
    sample_rate: u32,
    channels: u16,
    index: u64,
}

impl AudioFrame {
    /// Build a block of `channels`-channel interleaved samples at `sample_rate`.
    pub fn new(
        samples: Vec<f32>,
        timestamp: Duration,
        sample_rate: u32,
        channels: u16,
        index: u64,
    ) -> MediaResult<Self> {
        if sample_rate == 0 {
            return Err(MediaError::validation("audio sample_rate must be non-zero"));
        }
        if channels == 0 {
            return Err(MediaError::validation("audio channels must be non-zero"));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(MediaError::validation(
                "interleaved sample count must be a multiple of the channel count",
            ));
        }
        Ok(Self {
            samples,
            timestamp,
            sample_rate,
            channels,
            index,
        })
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Take the sample buffer.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Samples per second per channel.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples per channel.
    pub fn sample_frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Playback time covered by the block.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.sample_frames() as f64 / f64::from(self.sample_rate))
    }
}

impl TimedFrame for AudioFrame {
    fn timestamp(&self) -> Duration {
        self.timestamp
    }

    fn index(&self) -> u64 {
        self.index
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ImageTrack {}
    impl Sealed for super::AudioTrack {}
}

/// Track kind tag. Only [`ImageTrack`] and [`AudioTrack`] exist.
pub trait Track: sealed::Sealed + 'static {
    /// Frame type carried by tracks of this kind.
    type Frame: TimedFrame;
    /// Lower-case name used in logs and error messages.
    const NAME: &'static str;
}

/// Visual track kind.
#[derive(Clone, Copy, Debug)]
pub enum ImageTrack {}

/// Audio track kind.
#[derive(Clone, Copy, Debug)]
pub enum AudioTrack {}

impl Track for ImageTrack {
    type Frame = ImageFrame;
    const NAME: &'static str = "image";
}

impl Track for AudioTrack {
    type Frame = AudioFrame;
    const NAME: &'static str = "audio";
}

#[cfg(test)]
#[path = "../tests/unit/frame.rs"]
mod tests;
