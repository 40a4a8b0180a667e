//! Errors raised while reading the varquery config.
//!

use std::{io, result};

use thiserror::Error;

/// The result type for config.
pub type Result<T> = result::Result<T, Error>;

/// The error type for config.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("reading config: {0}")]
  IoError(String),

  #[error("invalid command line arguments: {0}")]
  ArgParseError(String),

  #[error("installing the tracing subscriber: {0}")]
  TracingError(String),

  #[error("writing the default config: {0}")]
  ParseError(String),
}

impl From<Error> for io::Error {
  fn from(error: Error) -> Self {
    io::Error::other(error.to_string())
  }
}

impl From<io::Error> for Error {
  fn from(error: io::Error) -> Self {
    Error::IoError(error.to_string())
  }
}

impl From<toml::ser::Error> for Error {
  fn from(err: toml::ser::Error) -> Self {
    Error::ParseError(err.to_string())
  }
}
