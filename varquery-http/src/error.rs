use http::StatusCode;
use thiserror::Error;

use varquery_search::LookupError;

pub type Result<T> = core::result::Result<T, HttpError>;

/// The errors a request can end in. The display text is the response body, the wrapped
/// message is only logged.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HttpError {
  #[error("Bad request")]
  BadRequest(String),
  #[error("Server error occurred")]
  InternalError(String),
}

impl HttpError {
  /// Create a bad request error.
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::BadRequest(message.into())
  }

  /// Create an internal error.
  pub fn internal_error(message: impl Into<String>) -> Self {
    Self::InternalError(message.into())
  }

  /// The status code of the response.
  pub fn status_code(&self) -> StatusCode {
    match self {
      HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
      HttpError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// The logged message.
  pub fn message(&self) -> &str {
    match self {
      HttpError::BadRequest(message) | HttpError::InternalError(message) => message,
    }
  }
}

impl From<LookupError> for HttpError {
  fn from(error: LookupError) -> Self {
    match error {
      LookupError::InvalidInput(_) | LookupError::InvalidRange(_) => {
        Self::bad_request(error.to_string())
      }
      error => Self::internal_error(error.to_string()),
    }
  }
}

impl From<serde_json::Error> for HttpError {
  fn from(error: serde_json::Error) -> Self {
    Self::internal_error(error.to_string())
  }
}
