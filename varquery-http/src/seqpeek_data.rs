use std::collections::HashMap;

use tracing::{debug, error, info, instrument};

use varquery_search::{LookupError, SeqPeekData, SeqPeekQuery, TabixLookup};

use crate::{Config, HttpError, Result, tabix_runner};

/// The argument naming the gene of a SeqPeek request.
pub const GENE_ARGUMENT: &str = "gene";

/// Count the variants of the gene named by the `gene` argument in the SeqPeek dataset
/// configured under `data_id`. A gene without regions gives an empty response.
#[instrument(level = "debug", skip(config))]
pub async fn seqpeek_data(
  config: &Config,
  data_id: &str,
  arguments: &HashMap<String, String>,
) -> Result<SeqPeekData> {
  let Some(dataset) = config.seqpeek_dataset(data_id) else {
    error!(data_id, "unknown SeqPeek data id");
    return Err(HttpError::bad_request(format!(
      "unknown SeqPeek data id {data_id}"
    )));
  };

  let Some(gene) = arguments.get(GENE_ARGUMENT) else {
    error!(?arguments, "gene missing in request arguments");
    return Err(HttpError::bad_request("missing argument gene"));
  };

  debug!(%gene, "querying SeqPeek data");

  let query = SeqPeekQuery::new(TabixLookup::new(
    config.seqpeek_executable(dataset),
    tabix_runner(config),
  ));

  match query.gene(dataset, gene).await {
    Ok(data) => Ok(data),
    Err(err @ LookupError::RegionNotFound(_)) => {
      info!(%err, "returning empty SeqPeek data");
      Ok(SeqPeekData::new())
    }
    Err(err) => {
      error!(%err, "running SeqPeek data service failed");
      Err(err.into())
    }
  }
}

#[cfg(test)]
mod tests {
  use http::StatusCode;
  use serde_json::{Value, json};
  use tempfile::TempDir;

  use varquery_config::config::dataset::SeqPeekDataset;
  use varquery_config::config::feature_matrix::{FeatureMatrix, JsonFeatureMatrix};
  use varquery_config::config::region_data::{JsonRegionData, RegionData};
  use varquery_test::util::{FakeTabix, write_feature_matrix, write_region_data};

  use crate::{JsonBody, Response};

  use super::*;

  const VARIANTS: &str = "#chr\tcoordinate\tgene\ttranscript\tvariant\tsample_id\ttype\tuniprot_id\tprotein_change\tgenotype\n\
    1\t69511\tOR4F5\tNM_001005484\tA->G\tFAM1-1-NB\tSUBSTITUTION\tQ8NH21\tT141A\t0/1\n\
    1\t69511\tOR4F5\tNM_001005484\tA->G\tFAM2-1-NB\tSUBSTITUTION\tQ8NH21\tT141A\t1/1\n";

  struct Fixture {
    _tmp: TempDir,
    config: Config,
  }

  fn fixture(tabix: &FakeTabix) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let features = tmp.path().join("features.json");
    write_feature_matrix(
      &features,
      &["FAM1-1", "FAM2-1"],
      &[("B:MRGE:Uterine_Related:NB::::", vec![json!("true"), json!("false")])],
    );
    let regions = tmp.path().join("regions.json");
    write_region_data(
      &regions,
      &[json!({"gene": "OR4F5", "mrna": "NM_001005484", "chr": "1", "strand": "+",
               "txstart": 69000, "txend": 70100, "exonstart": 69090, "exonend": 70008})],
    );

    let dataset = SeqPeekDataset::new(
      "variants.tsv.gz",
      RegionData::Json(JsonRegionData::new(regions)),
      FeatureMatrix::Json(JsonFeatureMatrix::new(features)),
    );

    Fixture {
      config: Config::default()
        .with_tabix_executable(tabix.executable())
        .with_seqpeek_dataset("genes", dataset),
      _tmp: tmp,
    }
  }

  fn gene(name: &str) -> HashMap<String, String> {
    HashMap::from([(GENE_ARGUMENT.to_string(), name.to_string())])
  }

  #[tokio::test]
  async fn seqpeek_gene() {
    let tabix = FakeTabix::by_data_file([("variants.tsv.gz", VARIANTS)]);
    let fixture = fixture(&tabix);

    let data = seqpeek_data(&fixture.config, "genes", &gene("OR4F5"))
      .await
      .unwrap();
    let body: Value = serde_json::from_str(&data.to_json_string().unwrap()).unwrap();

    assert_eq!(body["OR4F5"]["strand"], json!("+"));
    assert_eq!(
      body["OR4F5"]["transcripts"]["NM_001005484"]["variants"],
      json!([{
        "base_change": "A->G",
        "coordinate": 69511,
        "protein_change": "T141A",
        "statistics": {"B:MRGE:Uterine_Related:NB::::": {"false": 1, "true": 1}},
        "uniprot_id": "Q8NH21",
        "variant_type": "SUBSTITUTION"
      }])
    );
  }

  #[tokio::test]
  async fn seqpeek_unknown_gene_is_empty() {
    let tabix = FakeTabix::new(VARIANTS);
    let fixture = fixture(&tabix);

    let response = Response::from_result(
      seqpeek_data(&fixture.config, "genes", &gene("TP53")).await,
    );

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "{}");
  }

  #[tokio::test]
  async fn seqpeek_missing_gene() {
    let tabix = FakeTabix::new(VARIANTS);
    let fixture = fixture(&tabix);

    let response = Response::from_result(
      seqpeek_data(&fixture.config, "genes", &HashMap::new()).await,
    );

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.body(), "Bad request");
  }

  #[tokio::test]
  async fn seqpeek_unknown_id() {
    let tabix = FakeTabix::new(VARIANTS);
    let fixture = fixture(&tabix);

    let result = seqpeek_data(&fixture.config, "cohort", &gene("OR4F5")).await;

    assert!(matches!(result, Err(HttpError::BadRequest(_))));
  }

  #[tokio::test]
  async fn seqpeek_tabix_failure() {
    let tabix = FakeTabix::failing("[tabix] could not load index\n", 1);
    let fixture = fixture(&tabix);

    let response = Response::from_result(
      seqpeek_data(&fixture.config, "genes", &gene("OR4F5")).await,
    );

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), "Server error occurred");
  }
}
