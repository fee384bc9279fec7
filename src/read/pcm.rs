use std::fmt;
use std::io::{Seek, SeekFrom};
use std::time::Duration;

use crate::format::MediaFormat;
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::{AudioFrame, AudioTrack};
use crate::io::{MediaSource, MediaStream};
use crate::read::{
    MediaReader, ReadState, duration_to_samples, read_full, samples_to_duration,
};

/// Raw interleaved little-endian `f32` PCM reader.
///
/// Raw PCM carries no header, so the layout comes from [`crate::ReaderOpts`].
pub struct PcmReader {
    stream: Box<dyn MediaStream>,
    sample_rate: u32,
    channels: u16,
    block_samples: usize,
    total_samples: u64,
    sample_pos: u64,
    state: ReadState,
    scratch: Vec<u8>,
}

impl fmt::Debug for PcmReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmReader")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("total_samples", &self.total_samples)
            .field("sample_pos", &self.sample_pos)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PcmReader {
    /// Open `source` as `channels`-channel interleaved samples at `sample_rate`, yielding
    /// `block_samples` sample frames per [`AudioFrame`].
    pub fn open(
        source: MediaSource,
        sample_rate: u32,
        channels: u16,
        block_samples: usize,
    ) -> MediaResult<Self> {
        if sample_rate == 0 || channels == 0 || block_samples == 0 {
            return Err(MediaError::validation(
                "pcm sample_rate, channels and block size must be non-zero",
            ));
        }
        let mut stream = source.open()?;
        let len = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;

        let frame_bytes = u64::from(channels) * 4;
        if !len.is_multiple_of(frame_bytes) {
            return Err(MediaError::decode(format!(
                "pcm stream length {len} is not a multiple of {frame_bytes} bytes per sample frame"
            )));
        }

        Ok(Self {
            stream,
            sample_rate,
            channels,
            block_samples,
            total_samples: len / frame_bytes,
            sample_pos: 0,
            state: ReadState::default(),
            scratch: vec![0u8; block_samples * usize::from(channels) * 4],
        })
    }

    /// `(sample_rate, channels)` of produced frames.
    pub fn layout(&self) -> (u32, u16) {
        (self.sample_rate, self.channels)
    }

    fn frame_bytes(&self) -> u64 {
        u64::from(self.channels) * 4
    }
}

impl MediaReader<AudioTrack> for PcmReader {
    fn format(&self) -> MediaFormat {
        MediaFormat::F32le
    }

    fn duration(&self) -> Option<Duration> {
        Some(samples_to_duration(self.total_samples, self.sample_rate))
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.total_samples.div_ceil(self.block_samples as u64))
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
        let n = read_full(&mut self.stream, &mut self.scratch)?;
        if n == 0 {
            self.state.end();
            return Ok(None);
        }
        let frame_bytes = self.frame_bytes() as usize;
        if !n.is_multiple_of(frame_bytes) {
            self.state.end();
            return Err(MediaError::decode("pcm stream ended mid sample frame"));
        }

        let samples: Vec<f32> = self.scratch[..n]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let frames = (n / frame_bytes) as u64;
        let ts = samples_to_duration(self.sample_pos, self.sample_rate);
        self.sample_pos += frames;
        let end = samples_to_duration(self.sample_pos, self.sample_rate);

        let idx = self.state.accept(ts, end)?;
        AudioFrame::new(samples, ts, self.sample_rate, self.channels, idx).map(Some)
    }

    fn seek(&mut self, target: Duration) -> MediaResult<()> {
        self.state.ensure_seekable()?;
        let pos = duration_to_samples(target, self.sample_rate).min(self.total_samples);
        self.stream.seek(SeekFrom::Start(pos * self.frame_bytes()))?;
        self.sample_pos = pos;
        self.state.rewind(
            pos / self.block_samples as u64,
            samples_to_duration(pos, self.sample_rate),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/read/pcm.rs"]
mod tests;
