use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::compose::blend::flatten_to_rgb;
use crate::format::MediaFormat;
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{ImageFrame, TimedFrame};
use crate::io::MediaSink;
use crate::write::{MediaWriter, NoAudioWriter, WriteState, WriterOpts};

/// Writer for single-image formats. The frame is encoded when the writer is finished.
#[derive(Debug)]
pub struct StillImageWriter {
    sink: MediaSink,
    format: MediaFormat,
    image_format: ImageFormat,
    bg_rgba: [u8; 4],
    jpeg_quality: u8,
    frame: Option<ImageFrame>,
    state: WriteState,
}

impl NoAudioWriter for StillImageWriter {}

impl StillImageWriter {
    /// Writer encoding `format`, which must be a still image format.
    pub fn new(sink: MediaSink, format: MediaFormat, opts: &WriterOpts) -> MediaResult<Self> {
        let image_format = format
            .image_format()
            .filter(|_| format.is_static())
            .ok_or_else(|| {
                MediaError::unsupported_format(format!("'{format}' is not a still image format"))
            })?;
        Ok(Self {
            sink,
            format,
            image_format,
            bg_rgba: opts.bg_rgba,
            jpeg_quality: opts.jpeg_quality,
            frame: None,
            state: WriteState::new(true),
        })
    }

    /// Output format.
    pub fn format(&self) -> MediaFormat {
        self.format
    }

    fn encode(&self, frame: &ImageFrame) -> MediaResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        match self.image_format {
            ImageFormat::Jpeg => {
                let rgb = flatten_to_rgb(frame.image(), self.bg_rgba)?;
                JpegEncoder::new_with_quality(&mut out, self.jpeg_quality).encode_image(&rgb)?;
            }
            ImageFormat::Bmp => {
                let rgb = flatten_to_rgb(frame.image(), self.bg_rgba)?;
                DynamicImage::ImageRgb8(rgb).write_to(&mut out, ImageFormat::Bmp)?;
            }
            other => frame.image().write_to(&mut out, other)?,
        }
        Ok(out.into_inner())
    }
}

impl MediaWriter for StillImageWriter {
    fn is_static(&self) -> bool {
        true
    }

    fn write_image_frame(&mut self, frame: ImageFrame) -> MediaResult<()> {
        self.state.admit_image(frame.timestamp())?;
        self.frame = Some(frame);
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.state.begin_finish()?;
        let frame = self
            .frame
            .take()
            .ok_or_else(|| MediaError::invalid_state("no frame written"))?;
        let bytes = self.encode(&frame)?;
        self.sink.deliver(&bytes)?;
        tracing::debug!(format = %self.format, bytes = bytes.len(), "finished still image");
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

impl Drop for StillImageWriter {
    fn drop(&mut self) {
        if self.state.is_finished() || self.frame.is_none() {
            return;
        }
        if let Err(e) = self.finish() {
            tracing::warn!("failed to finalize abandoned {} writer: {e}", self.format);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/write/still.rs"]
mod tests;
