use std::time::Duration;

use image::RgbaImage;

use crate::format::MediaFormat;
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{ImageFrame, ImageTrack};
use crate::io::MediaSource;
use crate::read::{MediaReader, ReadState};

/// Reader for single-image formats: exactly one frame at t=0 with unbounded duration.
#[derive(Debug)]
pub struct StillImageReader {
    format: MediaFormat,
    image: RgbaImage,
    state: ReadState,
    emitted: bool,
}

impl StillImageReader {
    /// Decode the whole source. The source handle is released before this returns.
    pub fn open(source: MediaSource, format: MediaFormat) -> MediaResult<Self> {
        let image_format = format.image_format().ok_or_else(|| {
            MediaError::unsupported_format(format!("'{format}' is not a still image format"))
        })?;
        let bytes = source.read_all()?;
        let image = decode_still(&bytes, image_format)?;
        Ok(Self {
            format,
            image,
            state: ReadState::default(),
            emitted: false,
        })
    }

    /// Size of the decoded image.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Decode encoded image bytes into straight-alpha RGBA8.
pub(crate) fn decode_still(bytes: &[u8], format: image::ImageFormat) -> MediaResult<RgbaImage> {
    let dyn_img = image::load_from_memory_with_format(bytes, format)?;
    Ok(dyn_img.to_rgba8())
}

impl MediaReader<ImageTrack> for StillImageReader {
    fn format(&self) -> MediaFormat {
        self.format
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn frame_count(&self) -> Option<u64> {
        Some(1)
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
        if self.emitted {
            self.state.end();
            return Ok(None);
        }
        let idx = self.state.accept(Duration::ZERO, Duration::ZERO)?;
        self.emitted = true;
        ImageFrame::new(self.image.clone(), Duration::ZERO, None, idx).map(Some)
    }

    /// Every target maps back to the single frame.
    fn seek(&mut self, _target: Duration) -> MediaResult<()> {
        self.state.rewind(0, Duration::ZERO)?;
        self.emitted = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/read/still.rs"]
mod tests;
