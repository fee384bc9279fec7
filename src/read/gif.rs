use std::fmt;
use std::io::BufReader;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder as _, ImageDecoder as _};

use crate::format::MediaFormat;
use crate::foundation::error::MediaResult;
use crate::frame::{ImageFrame, ImageTrack};
use crate::io::MediaSource;
use crate::read::{MediaReader, ReadState};

/// Zero GIF delays are shown as 10 ms by browsers; frames get that duration instead of zero.
pub const MIN_GIF_DELAY: Duration = Duration::from_millis(10);

/// Lazy animated-GIF reader.
///
/// Frames are composited onto the logical screen by the decoder, so every frame has the full
/// GIF dimensions. The decoder cannot rewind, so seeking is unsupported.
pub struct GifReader {
    frames: image::Frames<'static>,
    width: u32,
    height: u32,
    state: ReadState,
    elapsed: Duration,
    duration: Option<Duration>,
    frame_count: Option<u64>,
}

impl fmt::Debug for GifReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GifReader")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("elapsed", &self.elapsed)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl GifReader {
    /// Read the header. The stream stays open inside the reader until it is dropped.
    pub fn open(source: MediaSource) -> MediaResult<Self> {
        let stream = source.open()?;
        let decoder = GifDecoder::new(BufReader::new(stream))?;
        let (width, height) = decoder.dimensions();
        Ok(Self {
            frames: decoder.into_frames(),
            width,
            height,
            state: ReadState::default(),
            elapsed: Duration::ZERO,
            duration: None,
            frame_count: None,
        })
    }

    /// Logical screen size shared by every frame.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub(crate) fn delay_to_duration(delay: image::Delay) -> Duration {
    let (numer, denom) = delay.numer_denom_ms();
    let micros = u64::from(numer) * 1_000 / u64::from(denom.max(1));
    Duration::from_micros(micros).max(MIN_GIF_DELAY)
}

impl MediaReader<ImageTrack> for GifReader {
    fn format(&self) -> MediaFormat {
        MediaFormat::Gif
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn position(&self) -> Duration {
        self.state.position()
    }

    fn is_finished(&self) -> bool {
        self.state.is_ended()
    }

    fn next_frame(&mut self) -> MediaResult<Option<ImageFrame>> {
        if self.state.is_ended() {
            return Ok(None);
        }
        let frame = match self.frames.next() {
            None => {
                self.state.end();
                self.duration = Some(self.elapsed);
                self.frame_count = Some(self.state.frames_read());
                return Ok(None);
            }
            Some(Err(e)) => {
                self.state.end();
                return Err(e.into());
            }
            Some(Ok(frame)) => frame,
        };

        let dur = delay_to_duration(frame.delay());
        let ts = self.elapsed;
        self.elapsed += dur;
        let idx = self.state.accept(ts, self.elapsed)?;
        ImageFrame::new(frame.into_buffer(), ts, Some(dur), idx).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/read/gif.rs"]
mod tests;
