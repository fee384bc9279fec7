//! System `ffmpeg`/`ffprobe` integration.
//!
//! The binaries are driven as subprocesses exchanging raw RGBA8 / `f32le` PCM over pipes.
//! Everything except [`FfmpegConfig`] requires the `media-ffmpeg` feature.

use std::path::PathBuf;
use std::process::{Command, Stdio};

#[cfg(feature = "media-ffmpeg")]
pub(crate) mod probe;
#[cfg(feature = "media-ffmpeg")]
pub(crate) mod process;

/// Locations of the `ffmpeg` and `ffprobe` executables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegConfig {
    /// Decoder and encoder binary.
    pub ffmpeg: PathBuf,
    /// Stream inspection binary.
    pub ffprobe: PathBuf,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegConfig {
    /// Tools at explicit locations.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Return `true` when both tools can be invoked.
    pub fn tools_available(&self) -> bool {
        runs_ok(Command::new(&self.ffmpeg).arg("-version"))
            && runs_ok(Command::new(&self.ffprobe).arg("-version"))
    }

    #[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
    pub(crate) fn ffmpeg_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-v", "error"]);
        cmd
    }
}

fn runs_ok(cmd: &mut Command) -> bool {
    cmd.stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
