//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = TfidfLinearError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum TfidfLinearError {
    InvalidModel(InvalidModelError),
    InvalidArgument(InvalidArgumentError),
    JSONError(serde_json::Error),
    IOError(std::io::Error),
}

impl TfidfLinearError {
    pub(crate) fn invalid_model<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidModel(InvalidModelError { msg: msg.into() })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }
}

impl fmt::Display for TfidfLinearError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidModel(e) => e.fmt(f),
            Self::InvalidArgument(e) => e.fmt(f),
            Self::JSONError(e) => write!(f, "JSONError: {}", e),
            Self::IOError(e) => write!(f, "IOError: {}", e),
        }
    }
}

impl Error for TfidfLinearError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::JSONError(e) => Some(e),
            Self::IOError(e) => Some(e),
            _ => None,
        }
    }
}

/// Error used when the model is structurally inconsistent.
#[derive(Debug)]
pub struct InvalidModelError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidModelError: {}", self.msg)
    }
}

impl Error for InvalidModelError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

impl From<serde_json::Error> for TfidfLinearError {
    fn from(error: serde_json::Error) -> Self {
        // serde_json wraps reader failures; keep them classified as I/O.
        if error.is_io() {
            Self::IOError(error.into())
        } else {
            Self::JSONError(error)
        }
    }
}

impl From<std::io::Error> for TfidfLinearError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}
