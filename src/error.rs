//! Error types.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::{error, io};

use crate::parser::ParseError;

/// Convenience result wrapper.
pub type Result<T> = std::result::Result<T, Error>;

/// Ossuary errors.
#[derive(Debug)]
pub enum Error {
    /// Unable to read a file.
    Io { path: PathBuf, source: io::Error },
    /// Malformed action list.
    Parse(ParseError),
    /// Malformed JSON document.
    Json(serde_json::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse(err) => write!(f, "parse error at {err}"),
            Self::Json(err) => write!(f, "invalid JSON: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
