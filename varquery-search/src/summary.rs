//! Variant summaries: trio classification and genotype statistics at one coordinate.
//!

use serde::Serialize;
use tracing::{info, instrument};

use varquery_config::config::dataset::VariantSummaryDataset;
use varquery_config::types::{CoordinateQuery, LookupError, Result};

use crate::feature::FeatureSource;
use crate::lookup::TabixLookup;
use crate::record::{LookupRecord, SampleValues};
use crate::statistics::{
  AggregationResult, DelimitedSampleId, RoleExtractor, VcfSummary, aggregate_trio_classifications,
  aggregate_vcf_genotypes,
};

/// The statistics of a variant summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSummary {
  triotypes: AggregationResult,
  vcf: VcfSummary,
}

impl VariantSummary {
  /// Get the trio classification statistics.
  pub fn triotypes(&self) -> &AggregationResult {
    &self.triotypes
  }

  /// Get the genotype statistics.
  pub fn vcf(&self) -> &VcfSummary {
    &self.vcf
  }
}

/// Runs the lookups of a variant summary and aggregates them against a feature.
#[derive(Debug, Clone)]
pub struct VariantSummaryQuery<R = DelimitedSampleId> {
  lookup: TabixLookup,
  trio_types: Vec<String>,
  extractor: R,
}

impl VariantSummaryQuery {
  /// Create a query reading pedigree roles from `-` delimited sample identifiers.
  pub fn new(lookup: TabixLookup, trio_types: Vec<String>) -> Self {
    Self::with_extractor(lookup, trio_types, DelimitedSampleId::default())
  }
}

impl<R: RoleExtractor> VariantSummaryQuery<R> {
  /// Create a query with a role extractor.
  pub fn with_extractor(lookup: TabixLookup, trio_types: Vec<String>, extractor: R) -> Self {
    Self {
      lookup,
      trio_types,
      extractor,
    }
  }

  /// Get the trio classification codes.
  pub fn trio_types(&self) -> &[String] {
    &self.trio_types
  }

  /// Summarize the variant at `coordinate` for the feature with `feature_id`.
  #[instrument(level = "debug", skip(self, dataset))]
  pub async fn query(
    &self,
    dataset: &VariantSummaryDataset,
    chromosome: &str,
    coordinate: u64,
    feature_id: &str,
  ) -> Result<VariantSummary> {
    let query = CoordinateQuery::point(chromosome, coordinate)?;
    let feature = dataset.feature_matrix().feature_by_id(feature_id).await?;

    let triotypes = self
      .lookup
      .trio_line_with_header(dataset.triotype_file(), &query)
      .await?;
    let triotypes =
      aggregate_trio_classifications(samples(&triotypes)?, &feature, self.trio_types.as_slice());

    let vcf = self
      .lookup
      .vcf_line_with_header(dataset.vcf_file(), &query)
      .await?;
    let vcf = aggregate_vcf_genotypes(samples(&vcf)?, &feature, chromosome, &self.extractor);

    info!(%query, feature_id, "summarized variant");

    Ok(VariantSummary { triotypes, vcf })
  }
}

fn samples(record: &LookupRecord) -> Result<&SampleValues> {
  record
    .values()
    .as_samples()
    .ok_or_else(|| LookupError::parse_error("expected values keyed by sample identifier"))
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::TempDir;

  use varquery_config::config::DEFAULT_TRIO_TYPES;
  use varquery_config::config::feature_matrix::{FeatureMatrix, JsonFeatureMatrix};
  use varquery_test::util::{FakeTabix, write_feature_matrix};

  use super::*;
  use crate::process::TabixRunner;

  const TRIO_OUTPUT: &str = "#CHR\tPOS\tFAM1-1\tFAM2-1\nchr1\t1000\t12\t21\n";
  const VCF_OUTPUT: &str = "##fileformat=VCFv4.1\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tFAM1-1-F\tFAM1-1-M\tFAM1-1-NB1\tFAM2-1-F\nchr1\t1000\trs1\tA\tT\t.\t.\t.\tGT\t0/0\t0/1\t1/0\t1/1\n";

  struct Fixture {
    _tmp: TempDir,
    dataset: VariantSummaryDataset,
  }

  fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("features.json");
    write_feature_matrix(
      &path,
      &["FAM1-1", "FAM2-1"],
      &[("B:CLIN:affected", vec![json!("true"), json!("false")])],
    );

    Fixture {
      dataset: VariantSummaryDataset::new(
        "calls.vcf.gz",
        "triotypes.tsv.gz",
        FeatureMatrix::Json(JsonFeatureMatrix::new(path)),
      ),
      _tmp: tmp,
    }
  }

  fn summary_query(tabix: &FakeTabix) -> VariantSummaryQuery {
    VariantSummaryQuery::new(
      TabixLookup::new(tabix.executable(), TabixRunner::default()),
      DEFAULT_TRIO_TYPES.iter().map(ToString::to_string).collect(),
    )
  }

  #[tokio::test]
  async fn variant_summary() {
    let fixture = fixture();
    let tabix = FakeTabix::by_data_file([
      ("triotypes.tsv.gz", TRIO_OUTPUT),
      ("calls.vcf.gz", VCF_OUTPUT),
    ]);

    let summary = summary_query(&tabix)
      .query(&fixture.dataset, "1", 1000, "B:CLIN:affected")
      .await
      .unwrap();

    let triotypes = summary.triotypes();
    assert_eq!(triotypes.plot_data().len(), DEFAULT_TRIO_TYPES.len());
    assert_eq!(
      triotypes.bucket("12").unwrap().category("true").unwrap().count(),
      1
    );
    assert_eq!(
      triotypes.bucket("21").unwrap().category("false").unwrap().count(),
      1
    );

    let vcf = summary.vcf();
    assert_eq!(
      vcf.father().bucket("0/0").unwrap().category("true").unwrap().count(),
      1
    );
    assert_eq!(
      vcf.father().bucket("1/1").unwrap().category("false").unwrap().count(),
      1
    );
    assert_eq!(
      vcf.mother().bucket("0/1").unwrap().category("true").unwrap().count(),
      1
    );
    assert_eq!(
      vcf.newborn().bucket("0/1").unwrap().category("true").unwrap().count(),
      1
    );
  }

  #[tokio::test]
  async fn variant_summary_feature_not_found() {
    let fixture = fixture();
    let tabix = FakeTabix::new(TRIO_OUTPUT);

    let result = summary_query(&tabix)
      .query(&fixture.dataset, "1", 1000, "B:CLIN:missing")
      .await;

    assert_eq!(
      result,
      Err(LookupError::feature_not_found("B:CLIN:missing"))
    );
  }

  #[tokio::test]
  async fn variant_summary_empty_coordinate() {
    let fixture = fixture();
    let tabix = FakeTabix::new("#CHR\tPOS\tFAM1-1\tFAM2-1\n");

    let result = summary_query(&tabix)
      .query(&fixture.dataset, "1", 1000, "B:CLIN:affected")
      .await;

    assert!(result.unwrap_err().is_empty_result());
  }

  #[test]
  fn variant_summary_json_keys() {
    let summary = VariantSummary {
      triotypes: AggregationResult::default(),
      vcf: VcfSummary::default(),
    };

    let empty = json!({"category_sizes": {}, "plot_data": []});
    assert_eq!(
      serde_json::to_value(summary).unwrap(),
      json!({"triotypes": empty, "vcf": {"f": empty, "m": empty, "nb": empty}})
    );
  }
}
