use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{MediaError, MediaResult};

/// Container/codec identifiers understood by the reader factory and [`crate::open_writer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// PNG still image.
    Png,
    /// JPEG still image.
    Jpeg,
    /// BMP still image.
    Bmp,
    /// TIFF still image.
    Tiff,
    /// WebP still image.
    Webp,
    /// Animated or single-frame GIF.
    Gif,
    /// MPEG-4 container.
    Mp4,
    /// WebM container.
    Webm,
    /// QuickTime container.
    Mov,
    /// Matroska container.
    Mkv,
    /// MP3 audio.
    Mp3,
    /// WAVE audio.
    Wav,
    /// Ogg audio.
    Ogg,
    /// FLAC audio.
    Flac,
    /// AAC audio.
    Aac,
    /// Raw interleaved little-endian `f32` PCM.
    F32le,
}

/// Which backend family handles a format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Single-image codecs from the `image` crate.
    Still,
    /// Animated GIF via the `image` crate.
    Gif,
    /// Built-in raw PCM.
    Pcm,
    /// System `ffmpeg`/`ffprobe` subprocesses (feature `media-ffmpeg`).
    Ffmpeg,
}

impl MediaFormat {
    /// Every known format.
    pub const ALL: [MediaFormat; 16] = [
        Self::Png,
        Self::Jpeg,
        Self::Bmp,
        Self::Tiff,
        Self::Webp,
        Self::Gif,
        Self::Mp4,
        Self::Webm,
        Self::Mov,
        Self::Mkv,
        Self::Mp3,
        Self::Wav,
        Self::Ogg,
        Self::Flac,
        Self::Aac,
        Self::F32le,
    ];

    /// Resolve a format identifier (case-insensitive, optional leading dot, common aliases).
    pub fn parse(id: &str) -> MediaResult<Self> {
        let norm = id.trim().trim_start_matches('.').to_ascii_lowercase();
        let fmt = match norm.as_str() {
            "png" => Self::Png,
            "jpeg" | "jpg" => Self::Jpeg,
            "bmp" => Self::Bmp,
            "tiff" | "tif" => Self::Tiff,
            "webp" => Self::Webp,
            "gif" => Self::Gif,
            "mp4" | "m4v" => Self::Mp4,
            "webm" => Self::Webm,
            "mov" => Self::Mov,
            "mkv" | "matroska" => Self::Mkv,
            "mp3" => Self::Mp3,
            "wav" => Self::Wav,
            "ogg" | "opus" => Self::Ogg,
            "flac" => Self::Flac,
            "aac" | "m4a" => Self::Aac,
            "f32le" | "pcm" | "raw" => Self::F32le,
            _ => {
                return Err(MediaError::unsupported_format(format!(
                    "unknown format identifier '{id}'"
                )));
            }
        };
        Ok(fmt)
    }

    /// Canonical lower-case identifier.
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Aac => "aac",
            Self::F32le => "f32le",
        }
    }

    /// Backend family that reads and writes this format.
    pub fn backend(self) -> Backend {
        match self {
            Self::Png | Self::Jpeg | Self::Bmp | Self::Tiff | Self::Webp => Backend::Still,
            Self::Gif => Backend::Gif,
            Self::F32le => Backend::Pcm,
            Self::Mp4
            | Self::Webm
            | Self::Mov
            | Self::Mkv
            | Self::Mp3
            | Self::Wav
            | Self::Ogg
            | Self::Flac
            | Self::Aac => Backend::Ffmpeg,
        }
    }

    /// Whether the format carries visual frames.
    pub fn has_image_track(self) -> bool {
        matches!(self.backend(), Backend::Still | Backend::Gif)
            || matches!(self, Self::Mp4 | Self::Webm | Self::Mov | Self::Mkv)
    }

    /// Whether the format can carry audio.
    pub fn has_audio_track(self) -> bool {
        matches!(
            self,
            Self::Mp4
                | Self::Webm
                | Self::Mov
                | Self::Mkv
                | Self::Mp3
                | Self::Wav
                | Self::Ogg
                | Self::Flac
                | Self::Aac
                | Self::F32le
        )
    }

    /// Output can only ever represent one visual frame.
    pub fn is_static(self) -> bool {
        self.backend() == Backend::Still
    }

    /// A writer exists for this format (ignoring whether its backend is compiled in).
    pub fn is_writable(self) -> bool {
        self.has_image_track()
    }

    /// Whether this build carries the backend for the format.
    pub fn is_available(self) -> bool {
        match self.backend() {
            Backend::Still | Backend::Gif | Backend::Pcm => true,
            Backend::Ffmpeg => cfg!(feature = "media-ffmpeg"),
        }
    }

    pub(crate) fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            Self::Png => Some(image::ImageFormat::Png),
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Bmp => Some(image::ImageFormat::Bmp),
            Self::Tiff => Some(image::ImageFormat::Tiff),
            Self::Webp => Some(image::ImageFormat::WebP),
            Self::Gif => Some(image::ImageFormat::Gif),
            _ => None,
        }
    }

    /// `ffmpeg -f` muxer name for writable container formats.
    pub(crate) fn ffmpeg_muxer(self) -> Option<&'static str> {
        match self {
            Self::Mp4 => Some("mp4"),
            Self::Webm => Some("webm"),
            Self::Mov => Some("mov"),
            Self::Mkv => Some("matroska"),
            _ => None,
        }
    }
}

impl FromStr for MediaFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fail with `UnsupportedFormat` when the backend for `fmt` is not compiled in.
pub(crate) fn ensure_available(fmt: MediaFormat) -> MediaResult<()> {
    if fmt.is_available() {
        return Ok(());
    }
    Err(backend_missing(fmt))
}

pub(crate) fn backend_missing(fmt: MediaFormat) -> MediaError {
    MediaError::unsupported_format(format!(
        "format '{fmt}' requires the 'media-ffmpeg' feature"
    ))
}

#[cfg(test)]
#[path = "../tests/unit/format.rs"]
mod tests;
