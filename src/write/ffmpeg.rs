use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

use crate::compose::blend::flatten_to_opaque_rgba8;
use crate::ffmpeg::FfmpegConfig;
use crate::ffmpeg::process::{FfmpegProcess, run_to_completion};
use crate::format::MediaFormat;
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{AudioFrame, ImageFrame, TimedFrame};
use crate::io::MediaSink;
use crate::write::{AudioCapability, MediaWriter, WriteState, WriterOpts};

/// Frame rate used when neither the options nor the first frame give one.
pub const DEFAULT_FPS: f64 = 30.0;

struct VideoEncode {
    process: FfmpegProcess,
    width: u32,
    height: u32,
    scratch: Vec<u8>,
}

struct AudioSpool {
    out: BufWriter<File>,
    sample_rate: u32,
    channels: u16,
}

/// Video container writer driving `ffmpeg`.
///
/// Image frames are flattened onto the background and piped as raw RGBA into an encoder started
/// by the first frame; frames are placed at a constant rate. Audio is spooled as `f32le` and muxed
/// in on finish.
pub struct FfmpegWriter {
    sink: MediaSink,
    format: MediaFormat,
    cfg: FfmpegConfig,
    fps: Option<f64>,
    bg_rgba: [u8; 4],
    workdir: tempfile::TempDir,
    video: Option<VideoEncode>,
    audio: Option<AudioSpool>,
    state: WriteState,
}

impl fmt::Debug for FfmpegWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfmpegWriter")
            .field("sink", &self.sink)
            .field("format", &self.format)
            .field("fps", &self.fps)
            .field("video_started", &self.video.is_some())
            .field("audio_spooled", &self.audio.is_some())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn check_video_size(width: u32, height: u32) -> MediaResult<()> {
    if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
        return Err(MediaError::validation(format!(
            "video width/height must be even (yuv420p output), got {width}x{height}"
        )));
    }
    Ok(())
}

impl FfmpegWriter {
    /// Writer for the video container `format`. The encoder starts with the first frame.
    pub fn new(sink: MediaSink, format: MediaFormat, opts: &WriterOpts) -> MediaResult<Self> {
        if format.ffmpeg_muxer().is_none() {
            return Err(MediaError::unsupported_format(format!(
                "'{format}' is not a writable video container"
            )));
        }
        Ok(Self {
            sink,
            format,
            cfg: opts.ffmpeg.clone(),
            fps: opts.fps,
            bg_rgba: opts.bg_rgba,
            workdir: tempfile::tempdir()?,
            video: None,
            audio: None,
            state: WriteState::new(false),
        })
    }

    fn video_path(&self) -> PathBuf {
        self.workdir.path().join(format!("video.{}", self.format))
    }

    fn audio_path(&self) -> PathBuf {
        self.workdir.path().join("audio.f32le")
    }

    fn output_path(&self) -> PathBuf {
        self.workdir.path().join(format!("out.{}", self.format))
    }

    fn muxer(&self) -> &'static str {
        self.format.ffmpeg_muxer().unwrap_or("matroska")
    }

    fn video_codec(&self) -> &'static str {
        match self.format {
            MediaFormat::Webm => "libvpx-vp9",
            _ => "libx264",
        }
    }

    fn audio_codec(&self) -> &'static str {
        match self.format {
            MediaFormat::Webm => "libopus",
            _ => "aac",
        }
    }

    fn start_video(&mut self, first: &ImageFrame) -> MediaResult<()> {
        let (width, height) = (first.width(), first.height());
        check_video_size(width, height)?;
        let fps = self
            .fps
            .or_else(|| {
                first
                    .duration()
                    .filter(|d| !d.is_zero())
                    .map(|d| 1.0 / d.as_secs_f64())
            })
            .unwrap_or(DEFAULT_FPS);

        let mut cmd = self.cfg.ffmpeg_command();
        cmd.args([
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &format!("{fps}"),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            self.video_codec(),
            "-pix_fmt",
            "yuv420p",
        ]);
        if matches!(self.format, MediaFormat::Mp4 | MediaFormat::Mov) {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.args(["-f", self.muxer()]).arg(self.video_path());

        let process = FfmpegProcess::spawn_writer(cmd, "video encode")?;
        tracing::debug!(width, height, fps, format = %self.format, "started video encoder");
        self.video = Some(VideoEncode {
            process,
            width,
            height,
            scratch: vec![0u8; width as usize * height as usize * 4],
        });
        Ok(())
    }

    fn mux(&self, audio: AudioSpool) -> MediaResult<PathBuf> {
        let AudioSpool {
            out,
            sample_rate,
            channels,
        } = audio;
        let file = out
            .into_inner()
            .map_err(|e| MediaError::Io(e.into_error()))?;
        file.sync_all()?;
        drop(file);

        let output = self.output_path();
        let mut cmd = self.cfg.ffmpeg_command();
        cmd.arg("-y")
            .arg("-i")
            .arg(self.video_path())
            .args([
                "-f",
                "f32le",
                "-ar",
                &sample_rate.to_string(),
                "-ac",
                &channels.to_string(),
            ])
            .arg("-i")
            .arg(self.audio_path())
            .args([
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                self.audio_codec(),
                "-shortest",
                "-f",
                self.muxer(),
            ])
            .arg(&output);
        run_to_completion(cmd, "mux", true)?;
        Ok(output)
    }
}

impl AudioCapability for FfmpegWriter {
    fn supports_audio(&self) -> bool {
        true
    }

    fn write_audio_frame(&mut self, frame: AudioFrame) -> MediaResult<()> {
        self.state.ensure_open()?;
        let layout = (frame.sample_rate(), frame.channels());
        if let Some(spool) = &self.audio
            && (spool.sample_rate, spool.channels) != layout
        {
            return Err(MediaError::validation(format!(
                "audio layout changed from {} Hz x{} to {} Hz x{}",
                spool.sample_rate, spool.channels, layout.0, layout.1
            )));
        }
        self.state.admit_audio(frame.timestamp())?;
        if self.audio.is_none() {
            self.audio = Some(AudioSpool {
                out: BufWriter::new(File::create(self.audio_path())?),
                sample_rate: layout.0,
                channels: layout.1,
            });
        }
        let spool = self
            .audio
            .as_mut()
            .ok_or_else(|| MediaError::invalid_state("audio spool not open"))?;
        for s in frame.samples() {
            spool.out.write_all(&s.to_le_bytes())?;
        }
        Ok(())
    }
}

impl MediaWriter for FfmpegWriter {
    fn is_static(&self) -> bool {
        false
    }

    fn write_image_frame(&mut self, frame: ImageFrame) -> MediaResult<()> {
        self.state.ensure_open()?;
        if let Some(v) = &self.video
            && (v.width, v.height) != (frame.width(), frame.height())
        {
            return Err(MediaError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                v.width,
                v.height
            )));
        }
        // the first frame fixes the encoder size and can never be out of order
        if self.video.is_none() {
            self.start_video(&frame)?;
        }
        self.state.admit_image(frame.timestamp())?;
        let bg = self.bg_rgba;
        let video = self
            .video
            .as_mut()
            .ok_or_else(|| MediaError::invalid_state("video encoder not started"))?;
        flatten_to_opaque_rgba8(&mut video.scratch, frame.image().as_raw(), bg)?;
        video.process.stdin()?.write_all(&video.scratch)?;
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.state.begin_finish()?;
        let mut video = self
            .video
            .take()
            .ok_or_else(|| MediaError::invalid_state("no frame written"))?;
        video.process.finish()?;

        let encoded = match self.audio.take() {
            Some(audio) => self.mux(audio)?,
            None => self.video_path(),
        };
        self.sink.deliver_file(&encoded)?;
        tracing::debug!(
            format = %self.format,
            frames = self.state.images_written(),
            "finished video"
        );
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if self.state.is_finished() || self.video.is_none() {
            return;
        }
        if let Err(e) = self.finish() {
            tracing::warn!("failed to finalize abandoned {} writer: {e}", self.format);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/write/ffmpeg.rs"]
mod tests;
