/// Convenience result type used across mediaframe.
pub type MediaResult<T> = Result<T, MediaError>;

/// Top-level error taxonomy shared by readers, writers, composition and the command layer.
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    /// The format identifier does not resolve to a backend (unknown, or known but not built in).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The source was recognized but is malformed or corrupt.
    #[error("decode error: {0}")]
    Decode(String),

    /// Underlying read/write failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol violation by the caller (out-of-order write, write after finish, ...).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The backend does not offer this capability (e.g. seeking).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A required edit-command argument was not supplied.
    #[error("missing argument '{name}': {description}")]
    MissingArgument {
        /// Argument name as the command layer knows it.
        name: String,
        /// Human-readable description of what the argument is for.
        description: String,
    },

    /// Invalid caller-provided values (dimensions, placements, buffer sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Copyable discriminant of [`MediaError`], for mapping errors to user-facing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaErrorKind {
    /// See [`MediaError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`MediaError::Decode`].
    Decode,
    /// See [`MediaError::Io`].
    Io,
    /// See [`MediaError::InvalidState`].
    InvalidState,
    /// See [`MediaError::UnsupportedOperation`].
    UnsupportedOperation,
    /// See [`MediaError::MissingArgument`].
    MissingArgument,
    /// See [`MediaError::Validation`].
    Validation,
    /// See [`MediaError::Other`].
    Other,
}

impl MediaError {
    /// Build a [`MediaError::UnsupportedFormat`] value.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`MediaError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MediaError::InvalidState`] value.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Build a [`MediaError::UnsupportedOperation`] value.
    pub fn unsupported_operation(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Build a [`MediaError::MissingArgument`] value.
    pub fn missing_argument(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::MissingArgument {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Build a [`MediaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Discriminant of this error.
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            Self::UnsupportedFormat(_) => MediaErrorKind::UnsupportedFormat,
            Self::Decode(_) => MediaErrorKind::Decode,
            Self::Io(_) => MediaErrorKind::Io,
            Self::InvalidState(_) => MediaErrorKind::InvalidState,
            Self::UnsupportedOperation(_) => MediaErrorKind::UnsupportedOperation,
            Self::MissingArgument { .. } => MediaErrorKind::MissingArgument,
            Self::Validation(_) => MediaErrorKind::Validation,
            Self::Other(_) => MediaErrorKind::Other,
        }
    }

    /// Protocol violations point at a bug in the caller and are not worth retrying.
    pub fn is_caller_bug(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

impl From<image::ImageError> for MediaError {
    fn from(e: image::ImageError) -> Self {
        use image::ImageError;
        match e {
            ImageError::Decoding(_) | ImageError::Limits(_) => Self::Decode(e.to_string()),
            ImageError::Unsupported(_) => Self::UnsupportedFormat(e.to_string()),
            ImageError::IoError(io) => Self::Io(io),
            ImageError::Encoding(_) | ImageError::Parameter(_) => {
                Self::Other(anyhow::Error::new(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
