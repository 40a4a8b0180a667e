use http::StatusCode;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub use error::{HttpError, Result};
pub use seqpeek_data::{GENE_ARGUMENT, seqpeek_data};
pub use tabix_lookup::{LookupResponse, tabix_lookup};
pub use variant_summary::{REQUIRED_ARGUMENTS, SummaryResponse, variant_summary};
pub use varquery_config::config::Config;

use varquery_search::TabixRunner;

mod error;
mod seqpeek_data;
mod tabix_lookup;
mod variant_summary;

/// A response body serialized as JSON. Keys are written in sorted order so that equal bodies
/// always give equal text.
pub trait JsonBody: Serialize {
  /// Serialize the body.
  fn to_json_string(&self) -> Result<String> {
    let mut value = serde_json::to_value(self)?;
    value.sort_all_objects();

    Ok(serde_json::to_string(&value)?)
  }
}

impl<T: Serialize> JsonBody for T {}

/// A finished response: a status code and a body, JSON for successful requests and plain text
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  status: StatusCode,
  body: String,
}

impl Response {
  /// Create a response.
  pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }

  /// Create the response of a handler result.
  pub fn from_result<T: JsonBody>(result: Result<T>) -> Self {
    match result.and_then(|body| body.to_json_string()) {
      Ok(body) => Self::new(StatusCode::OK, body),
      Err(error) => Self::new(error.status_code(), error.to_string()),
    }
  }

  /// Get the status code.
  pub fn status(&self) -> StatusCode {
    self.status
  }

  /// Get the body.
  pub fn body(&self) -> &str {
    &self.body
  }

  /// Whether the request succeeded.
  pub fn is_success(&self) -> bool {
    self.status.is_success()
  }
}

/// The runner for the tabix processes of a request.
pub fn tabix_runner(config: &Config) -> TabixRunner {
  TabixRunner::new(config.tabix_timeout()).with_log_output(config.log_tabix_output())
}

pub(crate) fn serialize_empty_object<S: Serializer>(
  serializer: S,
) -> core::result::Result<S::Ok, S::Error> {
  serializer.serialize_map(Some(0))?.end()
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use serde_json::json;

  use super::*;

  #[test]
  fn response_from_ok() {
    let response = Response::from_result(Ok(json!({"b": 1, "a": 2})));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), r#"{"a":2,"b":1}"#);
    assert!(response.is_success());
  }

  #[test]
  fn json_body_sorts_nested_keys() {
    let body = json!({"values": [{"end": "2", "chr": "1"}], "alt": "", "chr": "1"});
    assert_eq!(
      body.to_json_string().unwrap(),
      r#"{"alt":"","chr":"1","values":[{"chr":"1","end":"2"}]}"#
    );
  }

  #[test]
  fn response_from_error() {
    let response = Response::from_result::<()>(Err(HttpError::bad_request("missing argument")));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.body(), "Bad request");
    assert!(!response.is_success());
  }

  #[test]
  fn runner_from_config() {
    let config = Config::default().with_tabix_timeout(5);
    assert_eq!(tabix_runner(&config).timeout(), Some(Duration::from_secs(5)));

    let config = Config::default().with_tabix_timeout(0);
    assert_eq!(tabix_runner(&config).timeout(), None);
  }
}
