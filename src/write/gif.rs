use std::time::Duration;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{ImageFrame, TimedFrame};
use crate::io::MediaSink;
use crate::write::{GifRepeat, MediaWriter, NoAudioWriter, WriteState};

/// Delay of a last frame that carries no duration of its own and has no predecessor.
pub const DEFAULT_LAST_DELAY: Duration = Duration::from_millis(100);

/// Animated GIF writer.
///
/// Frames are buffered because a frame's delay is the gap to the next frame's timestamp; the file
/// is encoded on finish.
#[derive(Debug)]
pub struct GifWriter {
    sink: MediaSink,
    repeat: GifRepeat,
    frames: Vec<ImageFrame>,
    state: WriteState,
}

impl NoAudioWriter for GifWriter {}

impl GifWriter {
    /// Writer delivering to `sink` with the given loop behaviour.
    pub fn new(sink: MediaSink, repeat: GifRepeat) -> Self {
        Self {
            sink,
            repeat,
            frames: Vec::new(),
            state: WriteState::new(false),
        }
    }

    fn encode(&self) -> MediaResult<Vec<u8>> {
        let delays = frame_delays(&self.frames);
        let mut out = Vec::new();
        {
            let mut enc = GifEncoder::new(&mut out);
            enc.set_repeat(match self.repeat {
                GifRepeat::Infinite => Repeat::Infinite,
                GifRepeat::Finite(n) => Repeat::Finite(n),
            })?;
            for (frame, delay) in self.frames.iter().zip(delays) {
                enc.encode_frame(Frame::from_parts(
                    frame.image().clone(),
                    0,
                    0,
                    Delay::from_saturating_duration(delay),
                ))?;
            }
        }
        Ok(out)
    }
}

/// Delay of each frame: gap to the next timestamp; the last frame uses its own duration, else the
/// previous delay, else [`DEFAULT_LAST_DELAY`].
pub(crate) fn frame_delays(frames: &[ImageFrame]) -> Vec<Duration> {
    let mut delays: Vec<Duration> = frames
        .windows(2)
        .map(|w| w[1].timestamp().saturating_sub(w[0].timestamp()))
        .collect();
    if let Some(last) = frames.last() {
        let d = last
            .duration()
            .or_else(|| delays.last().copied())
            .unwrap_or(DEFAULT_LAST_DELAY);
        delays.push(d);
    }
    delays
}

impl MediaWriter for GifWriter {
    fn is_static(&self) -> bool {
        false
    }

    fn write_image_frame(&mut self, frame: ImageFrame) -> MediaResult<()> {
        if let Some(first) = self.frames.first()
            && (first.width(), first.height()) != (frame.width(), frame.height())
        {
            return Err(MediaError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                first.width(),
                first.height()
            )));
        }
        self.state.admit_image(frame.timestamp())?;
        self.frames.push(frame);
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.state.begin_finish()?;
        if self.frames.is_empty() {
            return Err(MediaError::invalid_state("no frame written"));
        }
        let bytes = self.encode()?;
        self.sink.deliver(&bytes)?;
        tracing::debug!(
            frames = self.frames.len(),
            bytes = bytes.len(),
            "finished gif"
        );
        self.frames.clear();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

impl Drop for GifWriter {
    fn drop(&mut self) {
        if self.state.is_finished() || self.frames.is_empty() {
            return;
        }
        if let Err(e) = self.finish() {
            tracing::warn!("failed to finalize abandoned gif writer: {e}");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/write/gif.rs"]
mod tests;
