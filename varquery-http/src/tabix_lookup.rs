use serde::{Serialize, Serializer};
use tracing::{error, info, instrument};

use varquery_search::{CoordinateQuery, LookupRecord, TabixLookup, Values};

use crate::{Config, HttpError, Result, serialize_empty_object, tabix_runner};

/// The body of a tabix lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResponse {
  alt: String,
  chr: String,
  end: u64,
  #[serde(serialize_with = "serialize_info")]
  info: Option<String>,
  #[serde(rename = "ref")]
  reference: String,
  snpid: String,
  start: u64,
  values: Values,
}

impl LookupResponse {
  /// The response for a coordinate without data.
  pub fn empty(chromosome: impl Into<String>, start: u64, end: u64) -> Self {
    Self {
      alt: String::new(),
      chr: chromosome.into(),
      end,
      info: None,
      reference: String::new(),
      snpid: String::new(),
      start,
      values: Values::default(),
    }
  }

  /// Get the chromosome.
  pub fn chr(&self) -> &str {
    &self.chr
  }

  /// Get the values.
  pub fn values(&self) -> &Values {
    &self.values
  }
}

impl From<LookupRecord> for LookupResponse {
  fn from(record: LookupRecord) -> Self {
    Self {
      alt: record.alternate().to_string(),
      chr: record.chromosome().to_string(),
      end: record.end(),
      info: record.info().map(ToString::to_string),
      reference: record.reference().to_string(),
      snpid: record.snpid().to_string(),
      start: record.start(),
      values: record.into_values(),
    }
  }
}

fn serialize_info<S: Serializer>(
  info: &Option<String>,
  serializer: S,
) -> core::result::Result<S::Ok, S::Error> {
  match info {
    Some(info) => serializer.serialize_str(info),
    None => serialize_empty_object(serializer),
  }
}

/// Look up `chromosome:start-end` in the tabix file configured under `lookup_id`. The end
/// defaults to the start. A coordinate without data gives an empty response.
#[instrument(level = "debug", skip(config))]
pub async fn tabix_lookup(
  config: &Config,
  lookup_id: &str,
  chromosome: &str,
  start: u64,
  end: Option<u64>,
) -> Result<LookupResponse> {
  let end = end.unwrap_or(start);

  let Some(dataset) = config.tabix_lookup(lookup_id) else {
    error!(lookup_id, "unknown tabix lookup id");
    return Err(HttpError::bad_request(format!(
      "unknown tabix lookup id {lookup_id}"
    )));
  };

  let query = CoordinateQuery::new(chromosome, start, end)?;
  let lookup = TabixLookup::new(dataset.executable(), tabix_runner(config));

  match lookup
    .lookup(dataset.format(), dataset.path(), &query)
    .await
  {
    Ok(record) => Ok(record.into()),
    Err(err) if err.is_empty_result() => {
      info!(%err, "returning empty lookup response");
      Ok(LookupResponse::empty(chromosome, start, end))
    }
    Err(err) => {
      error!(%err, format = %dataset.format(), "running tabix failed");
      Err(err.into())
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use http::StatusCode;
  use serde_json::{Value, json};

  use varquery_config::config::dataset::TabixLookupDataset;
  use varquery_search::Format;
  use varquery_test::util::FakeTabix;

  use crate::{JsonBody, Response};

  use super::*;

  fn config(tabix: &FakeTabix, format: Format) -> Config {
    Config::new(
      BTreeMap::from([(
        "dataset".to_string(),
        TabixLookupDataset::new("data.gz", format),
      )]),
      BTreeMap::new(),
    )
    .with_tabix_executable(tabix.executable())
  }

  fn body(response: &LookupResponse) -> Value {
    serde_json::from_str(&response.to_json_string().unwrap()).unwrap()
  }

  #[tokio::test]
  async fn lookup_vcf_line() {
    let tabix = FakeTabix::new("chr1\t1000\trs1\tA\tT\t.\t.\tDP=10\tGT\t0/1\t1/1\n");
    let response = tabix_lookup(&config(&tabix, Format::Vcf), "dataset", "1", 1000, None)
      .await
      .unwrap();

    assert_eq!(
      body(&response),
      json!({
        "alt": "T",
        "chr": "chr1",
        "end": 1000,
        "info": "DP=10",
        "ref": "A",
        "snpid": "rs1",
        "start": 1000,
        "values": ["0/1", "1/1"]
      })
    );
  }

  #[tokio::test]
  async fn lookup_keys_are_sorted() {
    let tabix = FakeTabix::new("chr1\t1000\t12\n");
    let response = tabix_lookup(&config(&tabix, Format::Trio), "dataset", "1", 1000, None)
      .await
      .unwrap();

    assert_eq!(
      response.to_json_string().unwrap(),
      r#"{"alt":"","chr":"chr1","end":1000,"info":{},"ref":"","snpid":"","start":1000,"values":["12"]}"#
    );
  }

  #[tokio::test]
  async fn lookup_region_rows() {
    let tabix = FakeTabix::new("#chr\tstart\tend\n1\t100\t200\n");
    let response = tabix_lookup(
      &config(&tabix, Format::Tsv),
      "dataset",
      "1",
      100,
      Some(300),
    )
    .await
    .unwrap();

    assert_eq!(
      body(&response)["values"],
      json!([{"chr": "1", "start": "100", "end": "200"}])
    );
    assert_eq!(body(&response)["end"], json!(300));
  }

  #[tokio::test]
  async fn lookup_empty_coordinate() {
    let tabix = FakeTabix::new("");
    let response = tabix_lookup(&config(&tabix, Format::Trio), "dataset", "7", 55, None)
      .await
      .unwrap();

    assert_eq!(response, LookupResponse::empty("7", 55, 55));
    assert_eq!(
      body(&response),
      json!({
        "alt": "",
        "chr": "7",
        "end": 55,
        "info": {},
        "ref": "",
        "snpid": "",
        "start": 55,
        "values": []
      })
    );
  }

  #[tokio::test]
  async fn lookup_unknown_id() {
    let tabix = FakeTabix::new("");
    let result = tabix_lookup(&config(&tabix, Format::Vcf), "other", "1", 1000, None).await;

    assert!(matches!(result, Err(HttpError::BadRequest(_))));
  }

  #[tokio::test]
  async fn lookup_wrong_line() {
    let tabix = FakeTabix::new("chr1\t999\t12\n");
    let result = tabix_lookup(&config(&tabix, Format::Trio), "dataset", "1", 1000, None).await;

    assert!(matches!(result, Err(HttpError::InternalError(_))));
  }

  #[tokio::test]
  async fn lookup_execution_failure() {
    let tabix = FakeTabix::failing("[tabix] the index file is missing\n", 1);
    let response = Response::from_result(
      tabix_lookup(&config(&tabix, Format::Vcf), "dataset", "1", 1000, None).await,
    );

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), "Server error occurred");
  }

  #[tokio::test]
  async fn lookup_end_before_start() {
    let tabix = FakeTabix::new("");
    let result = tabix_lookup(&config(&tabix, Format::Tsv), "dataset", "1", 10, Some(5)).await;

    assert!(matches!(result, Err(HttpError::BadRequest(_))));
  }
}
