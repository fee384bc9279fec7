use crate::ffmpeg::FfmpegConfig;
use crate::format::{Backend, MediaFormat};
use crate::foundation::error::MediaResult;
use crate::frame::{AudioTrack, ImageTrack, Track};
use crate::io::MediaSource;
use crate::read::gif::GifReader;
use crate::read::pcm::PcmReader;
use crate::read::still::StillImageReader;
use crate::read::{AudioReader, ImageReader, MediaReader, ReadableTrack, no_track};

/// Options for [`MediaReaderFactory`].
#[derive(Clone, Debug)]
pub struct ReaderOpts {
    /// Tool locations for ffmpeg-backed formats.
    pub ffmpeg: FfmpegConfig,
    /// Sample rate of produced audio frames (raw PCM input is assumed to use it too).
    pub audio_sample_rate: u32,
    /// Channel count of produced audio frames.
    pub audio_channels: u16,
    /// Samples per channel in each audio frame.
    pub audio_block_samples: usize,
}

impl ReaderOpts {
    /// Defaults: 48 kHz stereo audio in blocks of 1024 samples.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for ReaderOpts {
    fn default() -> Self {
        Self {
            ffmpeg: FfmpegConfig::default(),
            audio_sample_rate: 48_000,
            audio_channels: 2,
            audio_block_samples: 1024,
        }
    }
}

/// Resolves a reader backend from a format identifier and binds it to a source.
///
/// The source moves into the returned reader. On failure it is dropped before returning, so no
/// handle outlives a failed call.
#[derive(Clone, Debug, Default)]
pub struct MediaReaderFactory {
    opts: ReaderOpts,
}

impl MediaReaderFactory {
    /// Factory using `opts` for every reader it opens.
    pub fn new(opts: ReaderOpts) -> Self {
        Self { opts }
    }

    /// Options in effect.
    pub fn opts(&self) -> &ReaderOpts {
        &self.opts
    }

    /// Open a reader for track kind `T`.
    pub fn open<T: ReadableTrack>(&self, source: MediaSource, format: &str) -> MediaResult<T::Reader> {
        T::open(self, source, format)
    }

    /// Open the image track of `source` as `format`.
    #[tracing::instrument(skip(self, source), fields(source = ?source))]
    pub fn image_reader(&self, source: MediaSource, format: &str) -> MediaResult<ImageReader> {
        let fmt = MediaFormat::parse(format)?;
        let reader = match fmt.backend() {
            Backend::Still => ImageReader::Still(StillImageReader::open(source, fmt)?),
            Backend::Gif => ImageReader::Gif(GifReader::open(source)?),
            #[cfg(feature = "media-ffmpeg")]
            Backend::Ffmpeg if fmt.has_image_track() => ImageReader::Video(
                crate::read::ffmpeg::FfmpegVideoReader::open(source, fmt, &self.opts.ffmpeg)?,
            ),
            #[cfg(not(feature = "media-ffmpeg"))]
            Backend::Ffmpeg if fmt.has_image_track() => {
                return Err(crate::format::backend_missing(fmt));
            }
            _ => return Err(no_track(fmt, ImageTrack::NAME)),
        };
        tracing::debug!(
            format = %fmt,
            dimensions = ?reader.dimensions(),
            frame_count = ?reader.frame_count(),
            "opened image reader"
        );
        Ok(reader)
    }

    /// Open the audio track of `source` as `format`.
    #[tracing::instrument(skip(self, source), fields(source = ?source))]
    pub fn audio_reader(&self, source: MediaSource, format: &str) -> MediaResult<AudioReader> {
        let fmt = MediaFormat::parse(format)?;
        let o = &self.opts;
        let reader = match fmt.backend() {
            Backend::Pcm => AudioReader::Pcm(PcmReader::open(
                source,
                o.audio_sample_rate,
                o.audio_channels,
                o.audio_block_samples,
            )?),
            #[cfg(feature = "media-ffmpeg")]
            Backend::Ffmpeg if fmt.has_audio_track() => {
                AudioReader::Ffmpeg(crate::read::ffmpeg::FfmpegAudioReader::open(
                    source,
                    fmt,
                    &o.ffmpeg,
                    o.audio_sample_rate,
                    o.audio_channels,
                    o.audio_block_samples,
                )?)
            }
            #[cfg(not(feature = "media-ffmpeg"))]
            Backend::Ffmpeg if fmt.has_audio_track() => {
                return Err(crate::format::backend_missing(fmt));
            }
            _ => return Err(no_track(fmt, AudioTrack::NAME)),
        };
        tracing::debug!(format = %fmt, layout = ?reader.layout(), "opened audio reader");
        Ok(reader)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/read/factory.rs"]
mod tests;
