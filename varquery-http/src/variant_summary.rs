use std::collections::HashMap;

use serde::{Serialize, Serializer};
use tracing::{debug, error, info, instrument};

use varquery_search::{LookupError, TabixLookup, VariantSummary, VariantSummaryQuery};

use crate::{Config, HttpError, Result, serialize_empty_object, tabix_runner};

/// The arguments of a variant summary request. All of them are required and no others are
/// allowed.
pub const REQUIRED_ARGUMENTS: [&str; 3] = ["chromosome", "coordinate", "feature_id"];

/// The body of a variant summary response, an empty object if there is nothing to summarize.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResponse(Option<VariantSummary>);

impl SummaryResponse {
  /// The response without a summary.
  pub fn empty() -> Self {
    Self(None)
  }

  /// Get the summary.
  pub fn summary(&self) -> Option<&VariantSummary> {
    self.0.as_ref()
  }
}

impl From<VariantSummary> for SummaryResponse {
  fn from(summary: VariantSummary) -> Self {
    Self(Some(summary))
  }
}

impl Serialize for SummaryResponse {
  fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
    match &self.0 {
      Some(summary) => summary.serialize(serializer),
      None => serialize_empty_object(serializer),
    }
  }
}

fn argument<'a>(arguments: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
  arguments
    .get(name)
    .map(String::as_str)
    .ok_or_else(|| HttpError::bad_request(format!("missing argument {name}")))
}

/// Summarize the variant described by `arguments` for the dataset configured under `data_id`.
/// An unknown feature or a coordinate without data gives an empty response.
#[instrument(level = "debug", skip(config))]
pub async fn variant_summary(
  config: &Config,
  data_id: &str,
  arguments: &HashMap<String, String>,
) -> Result<SummaryResponse> {
  let Some(dataset) = config.variant_summary(data_id) else {
    error!(data_id, "unknown variant summary id");
    return Err(HttpError::bad_request(format!(
      "unknown variant summary id {data_id}"
    )));
  };

  if let Some(name) = arguments
    .keys()
    .find(|name| !REQUIRED_ARGUMENTS.contains(&name.as_str()))
  {
    error!(%name, "invalid variant summary argument");
    return Err(HttpError::bad_request(format!("invalid argument {name}")));
  }

  let chromosome = argument(arguments, "chromosome")?;
  let coordinate = argument(arguments, "coordinate")?
    .parse::<u64>()
    .map_err(|err| HttpError::bad_request(format!("invalid coordinate: {err}")))?;
  let feature_id = argument(arguments, "feature_id")?;

  debug!(chromosome, coordinate, feature_id, "querying variant summary");

  let query = VariantSummaryQuery::new(
    TabixLookup::new(config.summary_executable(dataset), tabix_runner(config)),
    config.trio_types().to_vec(),
  );

  match query
    .query(dataset, chromosome, coordinate, feature_id)
    .await
  {
    Ok(summary) => Ok(summary.into()),
    Err(err @ LookupError::FeatureNotFound(_)) => {
      info!(%err, "returning empty variant summary");
      Ok(SummaryResponse::empty())
    }
    Err(err) if err.is_empty_result() => {
      info!(%err, "returning empty variant summary");
      Ok(SummaryResponse::empty())
    }
    Err(err) => {
      error!(%err, "running variant summary failed");
      Err(err.into())
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use serde_json::{Value, json};
  use tempfile::TempDir;

  use varquery_config::config::dataset::VariantSummaryDataset;
  use varquery_config::config::feature_matrix::{FeatureMatrix, JsonFeatureMatrix};
  use varquery_test::util::{FakeTabix, write_feature_matrix};

  use crate::JsonBody;

  use super::*;

  const TRIO_OUTPUT: &str = "#CHR\tPOS\tFAM1-1\tFAM2-1\nchr1\t1000\t12\t21\n";
  const VCF_OUTPUT: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tFAM1-1-M\tFAM2-1-M\nchr1\t1000\trs1\tA\tT\t.\t.\t.\tGT\t0/1\t1/0\n";

  struct Fixture {
    _tmp: TempDir,
    config: Config,
  }

  fn fixture(tabix: &FakeTabix) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("features.json");
    write_feature_matrix(
      &path,
      &["FAM1-1", "FAM2-1"],
      &[("B:CLIN:affected", vec![json!(true), json!(true)])],
    );

    let dataset = VariantSummaryDataset::new(
      "calls.vcf.gz",
      "triotypes.tsv.gz",
      FeatureMatrix::Json(JsonFeatureMatrix::new(path)),
    )
    .with_tabix_executable(tabix.executable());

    Fixture {
      config: Config::new(
        BTreeMap::new(),
        BTreeMap::from([("cohort".to_string(), dataset)]),
      ),
      _tmp: tmp,
    }
  }

  fn arguments(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect()
  }

  fn valid_arguments() -> HashMap<String, String> {
    arguments(&[
      ("chromosome", "1"),
      ("coordinate", "1000"),
      ("feature_id", "B:CLIN:affected"),
    ])
  }

  fn summary_tabix() -> FakeTabix {
    FakeTabix::by_data_file([
      ("triotypes.tsv.gz", TRIO_OUTPUT),
      ("calls.vcf.gz", VCF_OUTPUT),
    ])
  }

  #[tokio::test]
  async fn summary() {
    let tabix = summary_tabix();
    let fixture = fixture(&tabix);

    let response = variant_summary(&fixture.config, "cohort", &valid_arguments())
      .await
      .unwrap();
    let body: Value = serde_json::from_str(&response.to_json_string().unwrap()).unwrap();

    assert_eq!(body["triotypes"]["category_sizes"], json!({"true": 2}));
    assert_eq!(body["triotypes"]["plot_data"].as_array().unwrap().len(), 12);
    assert_eq!(
      body["triotypes"]["plot_data"][0],
      json!({
        "categories": [
          {"count": 0, "name": "false", "value": 0},
          {"count": 1, "name": "true", "value": 0.5}
        ],
        "trio_type": "12"
      })
    );
    assert_eq!(
      body["vcf"]["m"]["plot_data"][1],
      json!({
        "categories": [
          {"count": 0, "name": "false", "value": 0},
          {"count": 2, "name": "true", "value": 1.0}
        ],
        "trio_type": "0/1"
      })
    );
  }

  #[tokio::test]
  async fn summary_unknown_feature_is_empty() {
    let tabix = summary_tabix();
    let fixture = fixture(&tabix);
    let mut arguments = valid_arguments();
    arguments.insert("feature_id".to_string(), "B:CLIN:missing".to_string());

    let response = variant_summary(&fixture.config, "cohort", &arguments)
      .await
      .unwrap();

    assert_eq!(response, SummaryResponse::empty());
    assert_eq!(response.to_json_string().unwrap(), "{}");
  }

  #[tokio::test]
  async fn summary_empty_coordinate_is_empty() {
    let tabix = FakeTabix::new("");
    let fixture = fixture(&tabix);

    let response = variant_summary(&fixture.config, "cohort", &valid_arguments())
      .await
      .unwrap();

    assert!(response.summary().is_none());
  }

  #[tokio::test]
  async fn summary_unknown_id() {
    let tabix = summary_tabix();
    let fixture = fixture(&tabix);

    let result = variant_summary(&fixture.config, "other", &valid_arguments()).await;

    assert!(matches!(result, Err(HttpError::BadRequest(_))));
  }

  #[tokio::test]
  async fn summary_unexpected_argument() {
    let tabix = summary_tabix();
    let fixture = fixture(&tabix);
    let mut arguments = valid_arguments();
    arguments.insert("gene".to_string(), "TP53".to_string());

    let result = variant_summary(&fixture.config, "cohort", &arguments).await;

    assert!(matches!(result, Err(HttpError::BadRequest(_))));
  }

  #[tokio::test]
  async fn summary_missing_argument() {
    let tabix = summary_tabix();
    let fixture = fixture(&tabix);

    let result = variant_summary(
      &fixture.config,
      "cohort",
      &arguments(&[("chromosome", "1"), ("coordinate", "1000")]),
    )
    .await;

    assert_eq!(
      result,
      Err(HttpError::bad_request("missing argument feature_id"))
    );
  }

  #[tokio::test]
  async fn summary_invalid_coordinate() {
    let tabix = summary_tabix();
    let fixture = fixture(&tabix);
    let mut arguments = valid_arguments();
    arguments.insert("coordinate".to_string(), "one".to_string());

    let result = variant_summary(&fixture.config, "cohort", &arguments).await;

    assert!(matches!(result, Err(HttpError::BadRequest(_))));
  }

  #[tokio::test]
  async fn summary_tabix_failure() {
    let tabix = FakeTabix::failing("[tabix] could not load index\n", 1);
    let fixture = fixture(&tabix);

    let result = variant_summary(&fixture.config, "cohort", &valid_arguments()).await;

    assert!(matches!(result, Err(HttpError::InternalError(_))));
  }
}
