use std::fmt;
use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use image::RgbaImage;

use crate::ffmpeg::FfmpegConfig;
use crate::ffmpeg::probe::probe;
use crate::ffmpeg::process::FfmpegProcess;
use crate::format::MediaFormat;
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{AudioFrame, AudioTrack, ImageFrame, ImageTrack, Track};
use crate::io::{MediaSource, annotate};
use crate::read::{
    MediaReader, ReadState, duration_to_samples, no_track, read_full, samples_to_duration,
};

/// Input file handed to `ffmpeg`. Stream sources are spooled to a temp file owned by the reader.
struct InputFile {
    path: PathBuf,
    _spool: Option<tempfile::NamedTempFile>,
}

impl InputFile {
    fn from_source(source: MediaSource) -> MediaResult<Self> {
        match source {
            MediaSource::Path(path) => {
                File::open(&path).map_err(|e| annotate(e, "open", &path))?;
                Ok(Self { path, _spool: None })
            }
            MediaSource::Stream(mut stream) => {
                let mut spool = tempfile::NamedTempFile::new()?;
                std::io::copy(&mut stream, &mut spool)?;
                spool.flush()?;
                Ok(Self {
                    path: spool.path().to_path_buf(),
                    _spool: Some(spool),
                })
            }
        }
    }
}

fn decode_command(cfg: &FfmpegConfig, input: &InputFile, start_sec: f64) -> Command {
    let mut cmd = cfg.ffmpeg_command();
    if start_sec > 0.0 {
        cmd.args(["-ss", &format!("{start_sec:.9}")]);
    }
    cmd.arg("-i").arg(&input.path);
    cmd
}

/// Video track of a container, decoded by `ffmpeg` to raw RGBA8 frames at a constant rate.
pub struct FfmpegVideoReader {
    format: MediaFormat,
    cfg: FfmpegConfig,
    input: InputFile,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: Option<u64>,
    duration: Option<Duration>,
    process: Option<FfmpegProcess>,
    next_index: u64,
    state: ReadState,
}

impl fmt::Debug for FfmpegVideoReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfmpegVideoReader")
            .field("format", &self.format)
            .field("input", &self.input.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FfmpegVideoReader {
    /// Read the stream layout with `ffprobe`. Decoding starts on the first [`MediaReader::next_frame`].
    #[tracing::instrument(skip(source, cfg))]
    pub fn open(source: MediaSource, format: MediaFormat, cfg: &FfmpegConfig) -> MediaResult<Self> {
        let input = InputFile::from_source(source)?;
        let info = probe(cfg, &input.path)?;
        let video = info.video.ok_or_else(|| no_track(format, ImageTrack::NAME))?;
        if video.width == 0 || video.height == 0 {
            return Err(MediaError::decode("video stream has zero dimensions"));
        }
        Ok(Self {
            format,
            cfg: cfg.clone(),
            input,
            width: video.width,
            height: video.height,
            fps: video.fps,
            frame_count: video.frame_count,
            duration: video.duration.or(info.duration),
            process: None,
            next_index: 0,
            state: ReadState::default(),
        })
    }

    /// `(width, height)` of decoded frames.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Constant output frame rate.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_time(&self, index: u64) -> Duration {
        Duration::from_secs_f64(index as f64 / self.fps)
    }

    fn spawn_decoder(&mut self) -> MediaResult<()> {
        let start = self.frame_time(self.next_index).as_secs_f64();
        let mut cmd = decode_command(&self.cfg, &self.input, start);
        cmd.args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"]);
        self.process = Some(FfmpegProcess::spawn_reader(cmd, "video decode")?);
        Ok(())
    }

    fn end_of_stream(&mut self) -> MediaResult<Option<ImageFrame>> {
        self.state.end();
        if self.frame_count.is_none() {
            self.frame_count = Some(self.next_index);
        }
        if self.duration.is_none() {
            self.duration = Some(self.frame_time(self.next_index));
        }
        if let Some(mut process) = self.process.take() {
            process.finish()?;
        }
        Ok(None)
    }
}

impl MediaReader<ImageTrack> for FfmpegVideoReader {
    fn format(&self) -> MediaFormat {
        self.format
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
        if self.process.is_none() {
            self.spawn_decoder()?;
        }

        let frame_len = self.width as usize * self.height as usize * 4;
        let mut buf = vec![0u8; frame_len];
        let n = match self.process.as_mut() {
            Some(p) => read_full(p.stdout()?, &mut buf)?,
            None => 0,
        };
        if n == 0 {
            return self.end_of_stream();
        }
        if n < frame_len {
            self.state.end();
            return Err(MediaError::decode(format!(
                "decoded video frame truncated: got {n} bytes, expected {frame_len}"
            )));
        }

        let index = self.next_index;
        self.next_index += 1;
        let ts = self.frame_time(index);
        let end = self.frame_time(index + 1);
        let idx = self.state.accept(ts, end)?;
        let image = RgbaImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| MediaError::decode("decoded frame does not match dimensions"))?;
        ImageFrame::new(image, ts, Some(end.saturating_sub(ts)), idx).map(Some)
    }

    /// Restarts the decoder at the frame covering `target`.
    fn seek(&mut self, target: Duration) -> MediaResult<()> {
        self.state.ensure_seekable()?;
        let mut index = (target.as_secs_f64() * self.fps).floor() as u64;
        if let Some(count) = self.frame_count {
            index = index.min(count.saturating_sub(1));
        }
        self.process = None;
        self.next_index = index;
        self.state.rewind(index, self.frame_time(index))
    }
}

/// Audio track of any container, decoded and resampled by `ffmpeg` to interleaved `f32`.
pub struct FfmpegAudioReader {
    format: MediaFormat,
    cfg: FfmpegConfig,
    input: InputFile,
    sample_rate: u32,
    channels: u16,
    block_samples: usize,
    duration: Option<Duration>,
    process: Option<FfmpegProcess>,
    sample_pos: u64,
    scratch: Vec<u8>,
    state: ReadState,
}

impl fmt::Debug for FfmpegAudioReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfmpegAudioReader")
            .field("format", &self.format)
            .field("input", &self.input.path)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("sample_pos", &self.sample_pos)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FfmpegAudioReader {
    /// Output layout is fixed by the caller; ffmpeg resamples/remixes to it.
    #[tracing::instrument(skip(source, cfg))]
    pub fn open(
        source: MediaSource,
        format: MediaFormat,
        cfg: &FfmpegConfig,
        sample_rate: u32,
        channels: u16,
        block_samples: usize,
    ) -> MediaResult<Self> {
        if sample_rate == 0 || channels == 0 || block_samples == 0 {
            return Err(MediaError::validation(
                "audio sample_rate, channels and block size must be non-zero",
            ));
        }
        let input = InputFile::from_source(source)?;
        let info = probe(cfg, &input.path)?;
        let audio = info.audio.ok_or_else(|| no_track(format, AudioTrack::NAME))?;
        Ok(Self {
            format,
            cfg: cfg.clone(),
            input,
            sample_rate,
            channels,
            block_samples,
            duration: audio.duration.or(info.duration),
            process: None,
            sample_pos: 0,
            scratch: vec![0u8; block_samples * usize::from(channels) * 4],
            state: ReadState::default(),
        })
    }

    /// `(sample_rate, channels)` of produced frames.
    pub fn layout(&self) -> (u32, u16) {
        (self.sample_rate, self.channels)
    }

    fn spawn_decoder(&mut self) -> MediaResult<()> {
        let start = samples_to_duration(self.sample_pos, self.sample_rate).as_secs_f64();
        let mut cmd = decode_command(&self.cfg, &self.input, start);
        cmd.args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &self.channels.to_string(),
            "-ar",
            &self.sample_rate.to_string(),
            "pipe:1",
        ]);
        self.process = Some(FfmpegProcess::spawn_reader(cmd, "audio decode")?);
        Ok(())
    }
}

impl MediaReader<AudioTrack> for FfmpegAudioReader {
    fn format(&self) -> MediaFormat {
        self.format
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn frame_count(&self) -> Option<u64> {
        None
    }

    fn position(&self) -> Duration {
        self.state.position()
    }

    fn is_finished(&self) -> bool {
        self.state.is_ended()
    }

    fn next_frame(&mut self) -> MediaResult<Option<AudioFrame>> {
        if self.state.is_ended() {
            return Ok(None);
        }
        if self.process.is_none() {
            self.spawn_decoder()?;
        }

        let n = match self.process.as_mut() {
            Some(p) => read_full(p.stdout()?, &mut self.scratch)?,
            None => 0,
        };
        if n == 0 {
            self.state.end();
            if let Some(mut process) = self.process.take() {
                process.finish()?;
            }
            return Ok(None);
        }
        let frame_bytes = usize::from(self.channels) * 4;
        if !n.is_multiple_of(frame_bytes) {
            self.state.end();
            return Err(MediaError::decode("decoded audio ended mid sample frame"));
        }

        let samples: Vec<f32> = self.scratch[..n]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let ts = samples_to_duration(self.sample_pos, self.sample_rate);
        self.sample_pos += (n / frame_bytes) as u64;
        let end = samples_to_duration(self.sample_pos, self.sample_rate);
        let idx = self.state.accept(ts, end)?;
        AudioFrame::new(samples, ts, self.sample_rate, self.channels, idx).map(Some)
    }

    fn seek(&mut self, target: Duration) -> MediaResult<()> {
        self.state.ensure_seekable()?;
        let mut pos = duration_to_samples(target, self.sample_rate);
        if let Some(total) = self.duration {
            pos = pos.min(duration_to_samples(total, self.sample_rate));
        }
        self.process = None;
        self.sample_pos = pos;
        self.state.rewind(
            pos / self.block_samples as u64,
            samples_to_duration(pos, self.sample_rate),
        )
    }
}
