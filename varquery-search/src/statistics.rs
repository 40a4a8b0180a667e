//! Genotype and trio classification statistics, split by the categories of a feature.
//!

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::feature::FeatureData;
use crate::record::SampleValues;

/// The feature categories statistics are reported for, in output order.
pub const FEATURE_CATEGORIES: [&str; 2] = ["false", "true"];

/// Chromosomes where fathers carry a single copy.
pub const SEX_CHROMOSOMES: [&str; 3] = ["X", "Y", "M"];

/// One bar of the output: the normalized token it counts and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarGroup {
  match_type: String,
  label: String,
}

impl BarGroup {
  /// Create a bar group.
  pub fn new(match_type: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      match_type: match_type.into(),
      label: label.into(),
    }
  }

  /// Get the normalized token.
  pub fn match_type(&self) -> &str {
    &self.match_type
  }

  /// Get the label.
  pub fn label(&self) -> &str {
    &self.label
  }
}

/// The bar groups a value can be counted in, and how raw tokens map to them. The order of the
/// groups is the order of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSet {
  groups: Vec<BarGroup>,
  count_map: BTreeMap<String, String>,
}

impl BucketSet {
  /// Create a bucket set. Tokens missing from `count_map` are counted as themselves.
  pub fn new(groups: Vec<BarGroup>, count_map: BTreeMap<String, String>) -> Self {
    Self { groups, count_map }
  }

  /// Diploid genotypes, with both heterozygous orders counted together.
  pub fn genotypes() -> Self {
    let heterozygous = "0/1 1/0";

    Self::new(
      vec![
        BarGroup::new("0/0", "0/0"),
        BarGroup::new(heterozygous, "0/1"),
        BarGroup::new("1/1", "1/1"),
        BarGroup::new("./.", "./."),
      ],
      BTreeMap::from([
        ("0/1".to_string(), heterozygous.to_string()),
        ("1/0".to_string(), heterozygous.to_string()),
      ]),
    )
  }

  /// Haploid genotypes.
  pub fn haploid_genotypes() -> Self {
    Self::new(
      vec![
        BarGroup::new("0", "Reference"),
        BarGroup::new("1", "Non-Reference"),
        BarGroup::new(".", "Missing data"),
      ],
      BTreeMap::new(),
    )
  }

  /// One group per trio classification code.
  pub fn trio_types<S: AsRef<str>>(trio_types: &[S]) -> Self {
    Self::new(
      trio_types
        .iter()
        .map(|trio_type| BarGroup::new(trio_type.as_ref(), trio_type.as_ref()))
        .collect(),
      BTreeMap::new(),
    )
  }

  /// Get the groups.
  pub fn groups(&self) -> &[BarGroup] {
    &self.groups
  }

  /// Map a raw token to the token it is counted as.
  pub fn normalize<'a>(&'a self, token: &'a str) -> &'a str {
    self
      .count_map
      .get(token)
      .map(String::as_str)
      .unwrap_or(token)
  }
}

/// The share of a category taken by one bar group. An empty category has no share and is
/// written as the integer `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Share {
  EmptyCategory,
  Fraction(f64),
}

impl Serialize for Share {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      Share::EmptyCategory => serializer.serialize_u64(0),
      Share::Fraction(value) => serializer.serialize_f64(*value),
    }
  }
}

/// The count of one bar group within one category, and its share of the category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatistic {
  count: u64,
  name: String,
  value: Share,
}

impl CategoryStatistic {
  /// Create a statistic, with `value` the share of `count` in a category of `category_size`.
  pub fn new(name: impl Into<String>, count: u64, category_size: u64) -> Self {
    let value = if category_size > 0 {
      Share::Fraction(count as f64 / category_size as f64)
    } else {
      Share::EmptyCategory
    };

    Self {
      count,
      name: name.into(),
      value,
    }
  }

  /// Get the category name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Get the count.
  pub fn count(&self) -> u64 {
    self.count
  }

  /// Get the share of the category.
  pub fn value(&self) -> f64 {
    match self.value {
      Share::EmptyCategory => 0.0,
      Share::Fraction(value) => value,
    }
  }
}

/// The statistics of one bar group, one per feature category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStatistics {
  categories: Vec<CategoryStatistic>,
  trio_type: String,
}

impl BucketStatistics {
  /// Get the bar group label.
  pub fn trio_type(&self) -> &str {
    &self.trio_type
  }

  /// Get the statistics per category.
  pub fn categories(&self) -> &[CategoryStatistic] {
    &self.categories
  }

  /// Get the statistic of one category.
  pub fn category(&self, name: &str) -> Option<&CategoryStatistic> {
    self.categories.iter().find(|category| category.name == name)
  }
}

/// The statistics of every bar group, in bucket set order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct AggregationResult {
  category_sizes: BTreeMap<String, u64>,
  plot_data: Vec<BucketStatistics>,
}

impl AggregationResult {
  /// Get the number of samples in each feature category.
  pub fn category_sizes(&self) -> &BTreeMap<String, u64> {
    &self.category_sizes
  }

  /// Get the statistics.
  pub fn plot_data(&self) -> &[BucketStatistics] {
    &self.plot_data
  }

  /// Get the statistics of one bar group.
  pub fn bucket(&self, label: &str) -> Option<&BucketStatistics> {
    self.plot_data.iter().find(|bucket| bucket.trio_type == label)
  }
}

/// Count `(feature key, value)` pairs into the bar groups of `buckets`, per feature category.
/// Values that do not match a group are not counted. Pairs whose key has no category are skipped.
pub fn aggregate<'a, I>(values: I, feature: &FeatureData, buckets: &BucketSet) -> AggregationResult
where
  I: IntoIterator<Item = (&'a str, &'a str)>,
{
  let mut counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();
  for (key, value) in values {
    match feature.category(key) {
      Some(category) => *counts.entry((category, buckets.normalize(value))).or_default() += 1,
      None => debug!(key, feature_id = feature.id(), "no feature value, skipping sample"),
    }
  }

  let plot_data = buckets
    .groups()
    .iter()
    .map(|group| BucketStatistics {
      categories: FEATURE_CATEGORIES
        .iter()
        .map(|category| {
          let count = counts
            .get(&(*category, group.match_type()))
            .copied()
            .unwrap_or_default();
          CategoryStatistic::new(*category, count, feature.category_size(category))
        })
        .collect(),
      trio_type: group.label().to_string(),
    })
    .collect();

  AggregationResult {
    category_sizes: feature.aggregate().clone(),
    plot_data,
  }
}

/// Aggregate trio classification codes, keyed by family, into one bar group per code.
#[instrument(level = "debug", skip_all, fields(feature_id = feature.id()))]
pub fn aggregate_trio_classifications<S: AsRef<str>>(
  samples: &SampleValues,
  feature: &FeatureData,
  trio_types: &[S],
) -> AggregationResult {
  aggregate(
    samples
      .iter()
      .map(|(family_id, code)| (family_id.as_str(), code.as_str())),
    feature,
    &BucketSet::trio_types(trio_types),
  )
}

/// The role of a sample within its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PedigreeRole {
  Father,
  Mother,
  Newborn,
}

/// Reads the pedigree role and the family of a sample from its identifier.
pub trait RoleExtractor {
  /// The role of the sample, if it has one.
  fn role(&self, sample_id: &str) -> Option<PedigreeRole>;

  /// The identifier of the family of the sample.
  fn family_id<'a>(&self, sample_id: &'a str) -> &'a str;
}

/// Sample identifiers made of delimited tokens, such as `FAM01-1-NB1`, where the token at
/// `role_position` is `F`, `M` or starts with `NB`. The family is everything before the last
/// delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedSampleId {
  delimiter: char,
  role_position: usize,
}

impl DelimitedSampleId {
  /// Create an extractor.
  pub fn new(delimiter: char, role_position: usize) -> Self {
    Self {
      delimiter,
      role_position,
    }
  }
}

impl Default for DelimitedSampleId {
  fn default() -> Self {
    Self::new('-', 2)
  }
}

impl RoleExtractor for DelimitedSampleId {
  fn role(&self, sample_id: &str) -> Option<PedigreeRole> {
    match sample_id.split(self.delimiter).nth(self.role_position)? {
      "F" => Some(PedigreeRole::Father),
      "M" => Some(PedigreeRole::Mother),
      token if token.starts_with("NB") => Some(PedigreeRole::Newborn),
      _ => None,
    }
  }

  fn family_id<'a>(&self, sample_id: &'a str) -> &'a str {
    sample_id
      .rsplit_once(self.delimiter)
      .map_or(sample_id, |(family_id, _)| family_id)
  }
}

/// Genotype statistics per pedigree role.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct VcfSummary {
  f: AggregationResult,
  m: AggregationResult,
  nb: AggregationResult,
}

impl VcfSummary {
  /// Get the statistics of the fathers.
  pub fn father(&self) -> &AggregationResult {
    &self.f
  }

  /// Get the statistics of the mothers.
  pub fn mother(&self) -> &AggregationResult {
    &self.m
  }

  /// Get the statistics of the newborns.
  pub fn newborn(&self) -> &AggregationResult {
    &self.nb
  }
}

/// The bucket set used for a role on a chromosome.
pub fn genotype_buckets(role: PedigreeRole, chromosome: &str) -> BucketSet {
  match role {
    PedigreeRole::Father if SEX_CHROMOSOMES.contains(&chromosome) => BucketSet::haploid_genotypes(),
    _ => BucketSet::genotypes(),
  }
}

/// Aggregate the genotypes of every sample, separately for each pedigree role. Samples are
/// matched with the feature through their family.
#[instrument(level = "debug", skip(samples, feature, extractor), fields(feature_id = feature.id()))]
pub fn aggregate_vcf_genotypes<R: RoleExtractor>(
  samples: &SampleValues,
  feature: &FeatureData,
  chromosome: &str,
  extractor: &R,
) -> VcfSummary {
  let mut by_role: BTreeMap<PedigreeRole, Vec<(&str, &str)>> = BTreeMap::new();
  for (sample_id, genotype) in samples {
    match extractor.role(sample_id) {
      Some(role) => by_role
        .entry(role)
        .or_default()
        .push((extractor.family_id(sample_id), genotype.as_str())),
      None => debug!(%sample_id, "no pedigree role, skipping sample"),
    }
  }

  let mut aggregate_role = |role: PedigreeRole| {
    aggregate(
      by_role.remove(&role).unwrap_or_default(),
      feature,
      &genotype_buckets(role, chromosome),
    )
  };

  VcfSummary {
    f: aggregate_role(PedigreeRole::Father),
    m: aggregate_role(PedigreeRole::Mother),
    nb: aggregate_role(PedigreeRole::Newborn),
  }
}
