use std::io::Read;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use crate::foundation::error::{MediaError, MediaResult};

/// A spawned `ffmpeg` with piped stdout/stdin and a thread draining stderr.
///
/// Dropping an unfinished process kills and reaps it.
pub(crate) struct FfmpegProcess {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    what: &'static str,
    encodes: bool,
}

impl FfmpegProcess {
    /// Spawn with stdout piped (decoders).
    pub(crate) fn spawn_reader(cmd: Command, what: &'static str) -> MediaResult<Self> {
        Self::spawn(cmd, what, false)
    }

    /// Spawn with stdin piped (encoders).
    pub(crate) fn spawn_writer(cmd: Command, what: &'static str) -> MediaResult<Self> {
        Self::spawn(cmd, what, true)
    }

    fn spawn(mut cmd: Command, what: &'static str, pipe_stdin: bool) -> MediaResult<Self> {
        if pipe_stdin {
            cmd.stdin(Stdio::piped()).stdout(Stdio::null());
        } else {
            cmd.stdin(Stdio::null()).stdout(Stdio::piped());
        }
        cmd.stderr(Stdio::piped());

        tracing::debug!(?cmd, "spawning ffmpeg for {what}");
        let mut child = cmd.spawn().map_err(|e| {
            MediaError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to spawn ffmpeg for {what} (is it installed and on PATH?): {e}"),
            ))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::invalid_state("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            child: Some(child),
            stdin,
            stdout,
            stderr_drain: Some(stderr_drain),
            what,
            encodes: pipe_stdin,
        })
    }

    pub(crate) fn stdout(&mut self) -> MediaResult<&mut ChildStdout> {
        self.stdout
            .as_mut()
            .ok_or_else(|| MediaError::invalid_state("ffmpeg stdout already closed"))
    }

    pub(crate) fn stdin(&mut self) -> MediaResult<&mut ChildStdin> {
        self.stdin
            .as_mut()
            .ok_or_else(|| MediaError::invalid_state("ffmpeg stdin already closed"))
    }

    /// Close pipes, wait for exit, and turn a failed exit into an error carrying stderr.
    pub(crate) fn finish(&mut self) -> MediaResult<()> {
        drop(self.stdin.take());
        drop(self.stdout.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MediaError::invalid_state("ffmpeg process already finished"))?;
        let status = child.wait()?;
        let stderr = self.join_stderr()?;
        check_status(status, &stderr, self.what, self.encodes)
    }

    fn join_stderr(&mut self) -> MediaResult<Vec<u8>> {
        match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MediaError::invalid_state("ffmpeg stderr drain thread panicked"))?
                .map_err(MediaError::from),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        drop(self.stdin.take());
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("ffmpeg {} already exited: {e}", self.what);
            }
            if let Err(e) = child.wait() {
                tracing::warn!("failed to reap ffmpeg {}: {e}", self.what);
            }
        }
        let _ = self.join_stderr();
    }
}

/// Run a short-lived command to completion, capturing stdout.
pub(crate) fn run_to_completion(
    mut cmd: Command,
    what: &'static str,
    encodes: bool,
) -> MediaResult<Vec<u8>> {
    tracing::debug!(?cmd, "running {what}");
    let out = cmd.stdin(Stdio::null()).output().map_err(|e| {
        MediaError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to run {what}: {e}"),
        ))
    })?;
    check_status(out.status, &out.stderr, what, encodes)?;
    Ok(out.stdout)
}

/// A failing decoder means the input is bad; a failing encoder is reported as a wrapped error.
fn check_status(status: ExitStatus, stderr: &[u8], what: &str, encodes: bool) -> MediaResult<()> {
    if status.success() {
        return Ok(());
    }
    let msg = format!(
        "{what} exited with status {status}: {}",
        String::from_utf8_lossy(stderr).trim()
    );
    if encodes {
        Err(MediaError::Other(anyhow::anyhow!(msg)))
    } else {
        Err(MediaError::decode(msg))
    }
}
