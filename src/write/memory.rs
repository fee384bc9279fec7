use crate::foundation::error::MediaResult;
use crate::frame::{AudioFrame, ImageFrame, TimedFrame};
use crate::write::{AudioCapability, MediaWriter, WriteState};

/// Writer that keeps every accepted frame in memory. Useful for tests and inspection.
#[derive(Debug)]
pub struct InMemoryWriter {
    is_static: bool,
    supports_audio: bool,
    images: Vec<ImageFrame>,
    audio: Vec<AudioFrame>,
    state: WriteState,
}

impl InMemoryWriter {
    /// Multi-frame writer that accepts audio.
    pub fn new() -> Self {
        Self::with_capabilities(false, true)
    }

    /// Single-frame writer without audio.
    pub fn still() -> Self {
        Self::with_capabilities(true, false)
    }

    /// Multi-frame writer without audio.
    pub fn silent() -> Self {
        Self::with_capabilities(false, false)
    }

    fn with_capabilities(is_static: bool, supports_audio: bool) -> Self {
        Self {
            is_static,
            supports_audio,
            images: Vec::new(),
            audio: Vec::new(),
            state: WriteState::new(is_static),
        }
    }

    /// Accepted image frames, in write order.
    pub fn images(&self) -> &[ImageFrame] {
        &self.images
    }

    /// Accepted audio frames, in write order.
    pub fn audio(&self) -> &[AudioFrame] {
        &self.audio
    }

    /// Take both frame lists.
    pub fn into_frames(self) -> (Vec<ImageFrame>, Vec<AudioFrame>) {
        (self.images, self.audio)
    }
}

impl Default for InMemoryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCapability for InMemoryWriter {
    fn supports_audio(&self) -> bool {
        self.supports_audio
    }

    fn write_audio_frame(&mut self, frame: AudioFrame) -> MediaResult<()> {
        if !self.supports_audio {
            return Ok(());
        }
        self.state.admit_audio(frame.timestamp())?;
        self.audio.push(frame);
        Ok(())
    }
}

impl MediaWriter for InMemoryWriter {
    fn is_static(&self) -> bool {
        self.is_static
    }

    fn write_image_frame(&mut self, frame: ImageFrame) -> MediaResult<()> {
        self.state.admit_image(frame.timestamp())?;
        self.images.push(frame);
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.state.begin_finish()
    }

    fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/write/memory.rs"]
mod tests;
