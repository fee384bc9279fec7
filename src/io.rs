use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::foundation::error::{MediaError, MediaResult};

/// An opened, seekable byte stream a reader can own.
pub trait MediaStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> MediaStream for T {}

/// Where a reader pulls encoded bytes from.
pub enum MediaSource {
    /// A file opened by the reader itself.
    Path(PathBuf),
    /// A stream opened by the caller; ownership moves into the reader.
    Stream(Box<dyn MediaStream>),
}

impl MediaSource {
    /// File at `path`, opened lazily by the reader.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Caller-opened seekable stream.
    pub fn stream(stream: impl MediaStream + 'static) -> Self {
        Self::Stream(Box::new(stream))
    }

    /// In-memory encoded bytes.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Stream(Box::new(Cursor::new(bytes.into())))
    }

    /// Filesystem path, for path sources.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Stream(_) => None,
        }
    }

    /// A second handle on the same media, when one can be made without consuming this one.
    pub fn try_clone(&self) -> Option<Self> {
        self.as_path().map(|p| Self::Path(p.to_path_buf()))
    }

    /// Open the underlying handle.
    pub fn open(self) -> MediaResult<Box<dyn MediaStream>> {
        match self {
            Self::Path(p) => {
                let f = File::open(&p).map_err(|e| annotate(e, "open", &p))?;
                Ok(Box::new(f))
            }
            Self::Stream(s) => Ok(s),
        }
    }

    /// Read the whole source into memory, releasing the handle afterwards.
    pub fn read_all(self) -> MediaResult<Vec<u8>> {
        let mut stream = self.open()?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Where a writer delivers the finalized output.
pub enum MediaSink {
    /// File written on finish. Missing parent directories are created.
    Path(PathBuf),
    /// Caller-owned writer that receives the encoded bytes on finish.
    Stream(Box<dyn Write + Send>),
}

impl MediaSink {
    /// File at `path`.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Caller-owned writer.
    pub fn stream(stream: impl Write + Send + 'static) -> Self {
        Self::Stream(Box::new(stream))
    }

    /// Filesystem path, for path sinks.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Stream(_) => None,
        }
    }

    /// Validate a path sink before any encoding work starts.
    pub(crate) fn prepare(&self, overwrite: bool) -> MediaResult<()> {
        let Self::Path(p) = self else {
            return Ok(());
        };
        ensure_parent_dir(p)?;
        if !overwrite && p.exists() {
            return Err(MediaError::validation(format!(
                "output file '{}' already exists",
                p.display()
            )));
        }
        Ok(())
    }

    /// Deliver fully encoded bytes and flush.
    pub(crate) fn deliver(&mut self, bytes: &[u8]) -> MediaResult<()> {
        match self {
            Self::Path(p) => {
                std::fs::write(&*p, bytes).map_err(|e| annotate(e, "write", p.as_path()))?;
            }
            Self::Stream(s) => {
                s.write_all(bytes)?;
                s.flush()?;
            }
        }
        Ok(())
    }

    /// Deliver the contents of an already encoded file.
    #[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
    pub(crate) fn deliver_file(&mut self, path: &Path) -> MediaResult<()> {
        match self {
            Self::Path(p) => {
                std::fs::copy(path, &*p).map_err(|e| annotate(e, "write", p.as_path()))?;
            }
            Self::Stream(s) => {
                let mut f = File::open(path)?;
                std::io::copy(&mut f, s)?;
                s.flush()?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MediaSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| annotate(e, "create output directory", parent))?;
    }
    Ok(())
}

/// Keep the error kind, add the path to the message.
pub(crate) fn annotate(e: std::io::Error, what: &str, path: &Path) -> std::io::Error {
    std::io::Error::new(e.kind(), format!("{what} '{}': {e}", path.display()))
}

#[cfg(test)]
#[path = "../tests/unit/io.rs"]
mod tests;
