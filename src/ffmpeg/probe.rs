use std::path::Path;
use std::time::Duration;

use crate::ffmpeg::FfmpegConfig;
use crate::ffmpeg::process::run_to_completion;
use crate::foundation::error::{MediaError, MediaResult};

/// What `ffprobe` reports about the first video and first audio stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ProbeInfo {
    pub(crate) video: Option<VideoStreamInfo>,
    pub(crate) audio: Option<AudioStreamInfo>,
    pub(crate) duration: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VideoStreamInfo {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) fps: f64,
    pub(crate) frame_count: Option<u64>,
    pub(crate) duration: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AudioStreamInfo {
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
    pub(crate) duration: Option<Duration>,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Fallback when a stream reports no usable frame rate.
const DEFAULT_FPS: f64 = 30.0;

/// Probe stream metadata through `ffprobe`.
#[tracing::instrument(skip(cfg))]
pub(crate) fn probe(cfg: &FfmpegConfig, source_path: &Path) -> MediaResult<ProbeInfo> {
    let mut cmd = std::process::Command::new(&cfg.ffprobe);
    cmd.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_streams",
        "-show_format",
    ])
    .arg(source_path);
    let stdout = run_to_completion(cmd, "ffprobe", false)?;
    parse_probe_json(&stdout)
}

pub(crate) fn parse_probe_json(json: &[u8]) -> MediaResult<ProbeInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| MediaError::decode(format!("ffprobe json parse failed: {e}")))?;

    let video = match parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
    {
        Some(s) => {
            let width = s
                .width
                .ok_or_else(|| MediaError::decode("missing video width from ffprobe"))?;
            let height = s
                .height
                .ok_or_else(|| MediaError::decode("missing video height from ffprobe"))?;
            let fps = s
                .avg_frame_rate
                .as_deref()
                .and_then(parse_rational)
                .or_else(|| s.r_frame_rate.as_deref().and_then(parse_rational))
                .unwrap_or(DEFAULT_FPS);
            Some(VideoStreamInfo {
                width,
                height,
                fps,
                frame_count: s.nb_frames.as_deref().and_then(|n| n.parse().ok()),
                duration: s.duration.as_deref().and_then(parse_secs),
            })
        }
        None => None,
    };

    let audio = match parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
    {
        Some(s) => Some(AudioStreamInfo {
            sample_rate: s
                .sample_rate
                .as_deref()
                .and_then(|r| r.parse().ok())
                .ok_or_else(|| MediaError::decode("missing audio sample_rate from ffprobe"))?,
            channels: s
                .channels
                .ok_or_else(|| MediaError::decode("missing audio channels from ffprobe"))?,
            duration: s.duration.as_deref().and_then(parse_secs),
        }),
        None => None,
    };

    Ok(ProbeInfo {
        video,
        audio,
        duration: parsed
            .format
            .and_then(|f| f.duration)
            .as_deref()
            .and_then(parse_secs),
    })
}

/// Parse `"30000/1001"`; `"0/0"` and garbage give `None`.
fn parse_rational(s: &str) -> Option<f64> {
    let (n, d) = s.split_once('/').unwrap_or((s, "1"));
    let n: f64 = n.trim().parse().ok()?;
    let d: f64 = d.trim().parse().ok()?;
    let v = n / d;
    (v.is_finite() && v > 0.0).then_some(v)
}

fn parse_secs(s: &str) -> Option<Duration> {
    let v: f64 = s.trim().parse().ok()?;
    (v.is_finite() && v >= 0.0).then(|| Duration::from_secs_f64(v))
}

#[cfg(test)]
#[path = "../../tests/unit/ffmpeg/probe.rs"]
mod tests;
