use std::fmt;
use std::path::PathBuf;

/// Crate-wide error type.
///
/// `Setup` is fatal and aborts a run before any file is touched; the other
/// variants are per-image and end up as `Error` rows in the run report
/// instead of propagating.
#[derive(Debug)]
pub enum AppError {
    /// Missing or unreadable source directory, unwritable destination parent.
    Setup(String),
    /// The image file could not be decoded (corrupt, truncated, zero-byte,
    /// or unsupported format).
    ImageDecode { path: PathBuf, message: String },
    /// The labeling oracle was unavailable or returned malformed output.
    Oracle(String),
    /// A single move failed; the source file is left untouched.
    FileMove { path: PathBuf, message: String },
    Io(std::io::Error),
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Setup(msg) => write!(f, "setup error: {}", msg),
            AppError::ImageDecode { path, message } => {
                write!(f, "failed to decode {}: {}", path.display(), message)
            }
            AppError::Oracle(msg) => write!(f, "oracle error: {}", msg),
            AppError::FileMove { path, message } => {
                write!(f, "failed to move {}: {}", path.display(), message)
            }
            AppError::Io(err) => write!(f, "{}", err),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::Oracle(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
