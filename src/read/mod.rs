//! Frame readers.
//!
//! A reader is bound to one open source and produces the frames of one track lazily, in
//! non-decreasing timestamp order. Readers are not rewound in place: to read a track again, ask
//! the [`MediaReaderFactory`] for a new reader. End-of-stream is terminal for an instance.

use std::marker::PhantomData;
use std::time::Duration;

use crate::format::MediaFormat;
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{AudioFrame, AudioTrack, ImageFrame, ImageTrack, Track};
use crate::io::MediaSource;

/// Format resolution and reader construction.
pub mod factory;
/// Readers backed by a system `ffmpeg` process.
#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg;
/// Animated GIF decoding.
pub mod gif;
/// Raw PCM sample streams.
pub mod pcm;
/// Single-frame still images.
pub mod still;

pub use factory::{MediaReaderFactory, ReaderOpts};

/// Producer of the frames of one track.
pub trait MediaReader<T: Track> {
    /// Format the reader was resolved for.
    fn format(&self) -> MediaFormat;

    /// Total track duration, when known. Some backends only learn it after a full pass.
    fn duration(&self) -> Option<Duration>;

    /// Number of frames in the track, when known.
    fn frame_count(&self) -> Option<u64>;

    /// End time of the last frame produced (or the seek target).
    fn position(&self) -> Duration;

    /// Whether end-of-stream has been signaled.
    fn is_finished(&self) -> bool;

    /// Next frame, or `Ok(None)` at end-of-stream. Once `None` is returned it is returned forever.
    fn next_frame(&mut self) -> MediaResult<Option<T::Frame>>;

    /// Move to the nearest frame at or before `target`.
    fn seek(&mut self, target: Duration) -> MediaResult<()> {
        let _ = target;
        Err(MediaError::unsupported_operation(format!(
            "{} reader for '{}' cannot seek",
            T::NAME,
            self.format()
        )))
    }

    /// Iterate remaining frames. Fused after end-of-stream or the first error.
    fn frames(&mut self) -> Frames<'_, T, Self>
    where
        Self: Sized,
    {
        Frames {
            reader: self,
            done: false,
            _track: PhantomData,
        }
    }
}

/// Iterator returned by [`MediaReader::frames`].
pub struct Frames<'a, T: Track, R: MediaReader<T> + ?Sized> {
    reader: &'a mut R,
    done: bool,
    _track: PhantomData<T>,
}

impl<T: Track, R: MediaReader<T> + ?Sized> Iterator for Frames<'_, T, R> {
    type Item = MediaResult<T::Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_frame() {
            Ok(Some(f)) => Some(Ok(f)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Track kinds the factory can open readers for.
pub trait ReadableTrack: Track + Sized {
    /// Reader produced for this track kind.
    type Reader: MediaReader<Self>;

    /// Resolve `format` and open a reader for this track of `source`.
    fn open(
        factory: &MediaReaderFactory,
        source: MediaSource,
        format: &str,
    ) -> MediaResult<Self::Reader>;
}

impl ReadableTrack for ImageTrack {
    type Reader = ImageReader;

    fn open(
        factory: &MediaReaderFactory,
        source: MediaSource,
        format: &str,
    ) -> MediaResult<ImageReader> {
        factory.image_reader(source, format)
    }
}

impl ReadableTrack for AudioTrack {
    type Reader = AudioReader;

    fn open(
        factory: &MediaReaderFactory,
        source: MediaSource,
        format: &str,
    ) -> MediaResult<AudioReader> {
        factory.audio_reader(source, format)
    }
}

/// Image-track reader over every built-in backend.
#[derive(Debug)]
pub enum ImageReader {
    /// Single decoded still image.
    Still(still::StillImageReader),
    /// Animated GIF.
    Gif(gif::GifReader),
    /// Video decoded by `ffmpeg`.
    #[cfg(feature = "media-ffmpeg")]
    Video(ffmpeg::FfmpegVideoReader),
}

impl ImageReader {
    /// Frame dimensions, when known before decoding.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Still(r) => Some(r.dimensions()),
            Self::Gif(r) => Some(r.dimensions()),
            #[cfg(feature = "media-ffmpeg")]
            Self::Video(r) => Some(r.dimensions()),
        }
    }
}

macro_rules! dispatch_image {
    ($self:expr, $r:ident => $body:expr) => {
        match $self {
            ImageReader::Still($r) => $body,
            ImageReader::Gif($r) => $body,
            #[cfg(feature = "media-ffmpeg")]
            ImageReader::Video($r) => $body,
        }
    };
}

impl MediaReader<ImageTrack> for ImageReader {
    fn format(&self) -> MediaFormat {
        dispatch_image!(self, r => r.format())
    }

    fn duration(&self) -> Option<Duration> {
        dispatch_image!(self, r => r.duration())
    }

    fn frame_count(&self) -> Option<u64> {
        dispatch_image!(self, r => r.frame_count())
    }

    fn position(&self) -> Duration {
        dispatch_image!(self, r => r.position())
    }

    fn is_finished(&self) -> bool {
        dispatch_image!(self, r => r.is_finished())
    }

    fn next_frame(&mut self) -> MediaResult<Option<ImageFrame>> {
        dispatch_image!(self, r => r.next_frame())
    }

    fn seek(&mut self, target: Duration) -> MediaResult<()> {
        dispatch_image!(self, r => r.seek(target))
    }
}

/// Audio-track reader over every built-in backend.
#[derive(Debug)]
pub enum AudioReader {
    /// Raw interleaved `f32` samples.
    Pcm(pcm::PcmReader),
    /// Audio decoded by `ffmpeg`.
    #[cfg(feature = "media-ffmpeg")]
    Ffmpeg(ffmpeg::FfmpegAudioReader),
}

impl AudioReader {
    /// `(sample_rate, channels)` of produced frames.
    pub fn layout(&self) -> (u32, u16) {
        match self {
            Self::Pcm(r) => r.layout(),
            #[cfg(feature = "media-ffmpeg")]
            Self::Ffmpeg(r) => r.layout(),
        }
    }
}

macro_rules! dispatch_audio {
    ($self:expr, $r:ident => $body:expr) => {
        match $self {
            AudioReader::Pcm($r) => $body,
            #[cfg(feature = "media-ffmpeg")]
            AudioReader::Ffmpeg($r) => $body,
        }
    };
}

impl MediaReader<AudioTrack> for AudioReader {
    fn format(&self) -> MediaFormat {
        dispatch_audio!(self, r => r.format())
    }

    fn duration(&self) -> Option<Duration> {
        dispatch_audio!(self, r => r.duration())
    }

    fn frame_count(&self) -> Option<u64> {
        dispatch_audio!(self, r => r.frame_count())
    }

    fn position(&self) -> Duration {
        dispatch_audio!(self, r => r.position())
    }

    fn is_finished(&self) -> bool {
        dispatch_audio!(self, r => r.is_finished())
    }

    fn next_frame(&mut self) -> MediaResult<Option<AudioFrame>> {
        dispatch_audio!(self, r => r.next_frame())
    }

    fn seek(&mut self, target: Duration) -> MediaResult<()> {
        dispatch_audio!(self, r => r.seek(target))
    }
}

/// Bookkeeping shared by all backends: frame indices, ordering and terminal end-of-stream.
#[derive(Debug, Default)]
pub(crate) struct ReadState {
    next_index: u64,
    last_ts: Option<Duration>,
    position: Duration,
    ended: bool,
}

impl ReadState {
    pub(crate) fn is_ended(&self) -> bool {
        self.ended
    }

    pub(crate) fn position(&self) -> Duration {
        self.position
    }

    pub(crate) fn frames_read(&self) -> u64 {
        self.next_index
    }

    pub(crate) fn end(&mut self) {
        self.ended = true;
    }

    /// Register a frame about to be emitted and return its index.
    pub(crate) fn accept(&mut self, ts: Duration, end: Duration) -> MediaResult<u64> {
        if self.ended {
            return Err(MediaError::invalid_state(
                "reader produced a frame after end-of-stream",
            ));
        }
        if let Some(last) = self.last_ts
            && ts < last
        {
            self.ended = true;
            return Err(MediaError::decode(format!(
                "backend produced out-of-order timestamp {ts:?} after {last:?}"
            )));
        }
        let idx = self.next_index;
        self.next_index += 1;
        self.last_ts = Some(ts);
        self.position = end.max(ts);
        Ok(idx)
    }

    /// Reposition after a seek. Ordering restarts from the new position.
    pub(crate) fn rewind(&mut self, next_index: u64, position: Duration) -> MediaResult<()> {
        self.ensure_seekable()?;
        self.next_index = next_index;
        self.last_ts = None;
        self.position = position;
        Ok(())
    }

    pub(crate) fn ensure_seekable(&self) -> MediaResult<()> {
        if self.ended {
            return Err(MediaError::invalid_state(
                "cannot seek after end-of-stream; open a new reader",
            ));
        }
        Ok(())
    }
}

/// Exact sample-count to time conversion.
pub(crate) fn samples_to_duration(samples: u64, sample_rate: u32) -> Duration {
    let rate = u64::from(sample_rate.max(1));
    let sub = (samples % rate) * 1_000_000_000 / rate;
    Duration::from_secs(samples / rate) + Duration::from_nanos(sub)
}

/// Whole samples elapsed at `at`, rounded down and saturating at `u64::MAX`.
pub(crate) fn duration_to_samples(at: Duration, sample_rate: u32) -> u64 {
    let samples = at.as_nanos().saturating_mul(u128::from(sample_rate)) / 1_000_000_000;
    u64::try_from(samples).unwrap_or(u64::MAX)
}

/// Fill `buf` as far as the stream allows. Returns the number of bytes read (short only at EOF).
pub(crate) fn read_full(r: &mut impl std::io::Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub(crate) fn no_track(fmt: MediaFormat, track: &str) -> MediaError {
    MediaError::unsupported_format(format!("format '{fmt}' has no {track} track"))
}

#[cfg(test)]
#[path = "../../tests/unit/read/mod.rs"]
mod tests;
