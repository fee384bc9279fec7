//! mediaframe is a frame-based media I/O library.
//!
//! Media is handled as a stream of timed frames:
//!
//! - Open a [`MediaReader`] for a source through the [`MediaReaderFactory`]
//! - Transform [`ImageFrame`]s with the compositors in [`compose`]
//! - Hand frames to a [`MediaWriter`] from [`open_writer`] and finish it
//!
//! Still images and GIF are decoded and encoded in-process. Video containers need the
//! `media-ffmpeg` feature and system `ffmpeg`/`ffprobe` binaries.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Named arguments for edit commands.
pub mod command;
/// Overlay and text composition.
pub mod compose;
/// System ffmpeg integration.
pub mod ffmpeg;
/// Format identifiers and backend resolution.
pub mod format;
/// Frame types and track kinds.
pub mod frame;
/// Sources and sinks.
pub mod io;
/// Reader to writer driver.
pub mod pipeline;
/// Frame readers.
pub mod read;
/// Frame writers.
pub mod write;

pub use crate::foundation::error::{MediaError, MediaErrorKind, MediaResult};

pub use crate::command::EditArgs;
pub use crate::compose::{
    DrawRegion, Drawable, FontDescriptor, FontStyle, GlyphSource, OverlayData, PixelFormat, Rect,
    SvgDrawable, TextDrawData, compose_overlay, compose_text, text_glyphs,
};
pub use crate::ffmpeg::FfmpegConfig;
pub use crate::format::{Backend, MediaFormat};
pub use crate::frame::{AudioFrame, AudioTrack, ImageFrame, ImageTrack, TimedFrame, Track};
pub use crate::io::{MediaSink, MediaSource, MediaStream};
pub use crate::pipeline::{
    FrameTransform, Identity, OverlayStage, PipelineStats, TextStage, run_pipeline, transcode,
};
pub use crate::read::{
    AudioReader, Frames, ImageReader, MediaReader, MediaReaderFactory, ReadableTrack, ReaderOpts,
};
pub use crate::write::{
    AudioCapability, GifRepeat, InMemoryWriter, MediaWriter, NoAudioWriter, WriteState, Writer,
    WriterOpts, open_writer,
};
