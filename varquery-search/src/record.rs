//! The typed result of a tabix lookup.
//!

use std::collections::BTreeMap;

use serde::Serialize;

/// Sample values keyed by the sample identifiers found in the header line.
pub type SampleValues = BTreeMap<String, String>;

/// One row of a region table, keyed by column name.
pub type Row = BTreeMap<String, String>;

/// The values of a lookup record. Their shape depends on the line format and on whether a
/// header line was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Values {
  /// Sample values in column order, when no header was available.
  List(Vec<String>),
  /// Sample values keyed by sample identifier.
  Samples(SampleValues),
  /// Every row of a region table.
  Rows(Vec<Row>),
}

impl Values {
  /// Get the sample values if they are keyed by sample identifier.
  pub fn as_samples(&self) -> Option<&SampleValues> {
    match self {
      Values::Samples(samples) => Some(samples),
      _ => None,
    }
  }

  /// Get the rows if the values are a region table.
  pub fn as_rows(&self) -> Option<&[Row]> {
    match self {
      Values::Rows(rows) => Some(rows),
      _ => None,
    }
  }

  /// The number of values or rows.
  pub fn len(&self) -> usize {
    match self {
      Values::List(values) => values.len(),
      Values::Samples(samples) => samples.len(),
      Values::Rows(rows) => rows.len(),
    }
  }

  /// Whether there are no values.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for Values {
  fn default() -> Self {
    Self::List(Vec::new())
  }
}

/// A parsed tabix lookup result. Records are built by the parser and not changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupRecord {
  chromosome: String,
  start: u64,
  end: u64,
  values: Values,
  snpid: String,
  reference: String,
  alternate: String,
  info: Option<String>,
}

impl LookupRecord {
  /// Create a record with empty snpid, ref, alt and info.
  pub fn new(chromosome: impl Into<String>, start: u64, end: u64, values: Values) -> Self {
    Self {
      chromosome: chromosome.into(),
      start,
      end,
      values,
      ..Default::default()
    }
  }

  /// Set the variant id.
  pub fn with_snpid(mut self, snpid: impl Into<String>) -> Self {
    self.snpid = snpid.into();
    self
  }

  /// Set the reference allele.
  pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
    self.reference = reference.into();
    self
  }

  /// Set the alternate allele.
  pub fn with_alt(mut self, alternate: impl Into<String>) -> Self {
    self.alternate = alternate.into();
    self
  }

  /// Set the info field.
  pub fn with_info(mut self, info: impl Into<String>) -> Self {
    self.info = Some(info.into());
    self
  }

  /// Chromosome as printed by tabix, e.g. `chr1`.
  pub fn chromosome(&self) -> &str {
    &self.chromosome
  }

  /// Start position.
  pub fn start(&self) -> u64 {
    self.start
  }

  /// End position.
  pub fn end(&self) -> u64 {
    self.end
  }

  /// Values.
  pub fn values(&self) -> &Values {
    &self.values
  }

  /// Consume the record, returning its values.
  pub fn into_values(self) -> Values {
    self.values
  }

  /// Variant id.
  pub fn snpid(&self) -> &str {
    &self.snpid
  }

  /// Reference allele.
  pub fn reference(&self) -> &str {
    &self.reference
  }

  /// Alternate allele.
  pub fn alternate(&self) -> &str {
    &self.alternate
  }

  /// Info field, if the line format has one.
  pub fn info(&self) -> Option<&str> {
    self.info.as_deref()
  }
}
