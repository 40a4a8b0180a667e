//! Types related to tabix lookups like formats, coordinate queries and lookup errors.
//!

use std::fmt::{Display, Formatter};
use std::{fmt, io, result};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The result type returning a `LookupError`.
pub type Result<T> = result::Result<T, LookupError>;

/// The line formats of the files that can be queried with tabix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
pub enum Format {
  /// VCF lines: fixed columns followed by one genotype column per sample.
  #[default]
  #[serde(alias = "VCF", alias = "Vcf")]
  Vcf,
  /// Trio classification lines: chromosome, position and one code per family.
  #[serde(alias = "TRIO", alias = "Trio")]
  Trio,
  /// Tab separated region tables with a header row.
  #[serde(alias = "TSV", alias = "Tsv")]
  Tsv,
}

impl Display for Format {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Format::Vcf => write!(f, "vcf"),
      Format::Trio => write!(f, "trio"),
      Format::Tsv => write!(f, "tsv"),
    }
  }
}

/// A chromosome and an inclusive coordinate range to look up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateQuery {
  chromosome: String,
  start: u64,
  end: u64,
}

impl CoordinateQuery {
  /// Create a new query, checking that the chromosome is set and that `start <= end`.
  pub fn new(chromosome: impl Into<String>, start: u64, end: u64) -> Result<Self> {
    let chromosome = chromosome.into();
    if chromosome.trim().is_empty() {
      return Err(LookupError::invalid_input("chromosome must not be empty"));
    }
    if start > end {
      return Err(LookupError::invalid_range(format!(
        "end({end}) is smaller than start({start})"
      )));
    }

    Ok(Self {
      chromosome,
      start,
      end,
    })
  }

  /// Create a query for a single coordinate.
  pub fn point(chromosome: impl Into<String>, coordinate: u64) -> Result<Self> {
    Self::new(chromosome, coordinate, coordinate)
  }

  /// The chromosome, without any `chr` prefix.
  pub fn chromosome(&self) -> &str {
    &self.chromosome
  }

  /// Start coordinate.
  pub fn start(&self) -> u64 {
    self.start
  }

  /// End coordinate.
  pub fn end(&self) -> u64 {
    self.end
  }

  /// The same chromosome and start, collapsed to a single coordinate.
  pub fn to_point(&self) -> Self {
    Self {
      chromosome: self.chromosome.clone(),
      start: self.start,
      end: self.start,
    }
  }
}

/// Formats the query as a tabix region, e.g. `chr1:1000-1000`.
impl Display for CoordinateQuery {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "chr{}:{}-{}", self.chromosome, self.start, self.end)
  }
}

/// Lookup specific errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
  #[error("tabix - empty result. Query {query}. Info: {context}")]
  CoordinateRangeEmpty {
    query: CoordinateQuery,
    context: String,
  },

  #[error("tabix - wrong line found. Query {query}. Info: {diagnostic}")]
  WrongLineFound {
    query: CoordinateQuery,
    diagnostic: String,
  },

  #[error("tabix - unexpected output: {0}")]
  UnexpectedOutput(String),

  #[error("tabix - execution failed: `{command}`: {output}")]
  Execution { command: String, output: String },

  #[error("feature not found: {0}")]
  FeatureNotFound(String),

  #[error("feature source error: {0}")]
  FeatureSource(String),

  #[error("no gene regions found: {0}")]
  RegionNotFound(String),

  #[error("region source error: {0}")]
  RegionSource(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("invalid range: {0}")]
  InvalidRange(String),

  #[error("parsing error: {0}")]
  ParseError(String),

  #[error("io error: {0}")]
  IoError(String),
}

impl LookupError {
  /// Create a `CoordinateRangeEmpty` error.
  pub fn coordinate_range_empty<S: Into<String>>(query: &CoordinateQuery, context: S) -> Self {
    Self::CoordinateRangeEmpty {
      query: query.clone(),
      context: context.into(),
    }
  }

  /// Create a `WrongLineFound` error.
  pub fn wrong_line_found<S: Into<String>>(query: &CoordinateQuery, diagnostic: S) -> Self {
    Self::WrongLineFound {
      query: query.clone(),
      diagnostic: diagnostic.into(),
    }
  }

  /// Create an `UnexpectedOutput` error.
  pub fn unexpected_output<S: Into<String>>(message: S) -> Self {
    Self::UnexpectedOutput(message.into())
  }

  /// Create an `Execution` error.
  pub fn execution<C: Into<String>, O: Into<String>>(command: C, output: O) -> Self {
    Self::Execution {
      command: command.into(),
      output: output.into(),
    }
  }

  /// Create a `FeatureNotFound` error.
  pub fn feature_not_found<S: Into<String>>(feature_id: S) -> Self {
    Self::FeatureNotFound(feature_id.into())
  }

  /// Create a `FeatureSource` error.
  pub fn feature_source<S: Into<String>>(message: S) -> Self {
    Self::FeatureSource(message.into())
  }

  /// Create a `RegionNotFound` error.
  pub fn region_not_found<S: Into<String>>(message: S) -> Self {
    Self::RegionNotFound(message.into())
  }

  /// Create a `RegionSource` error.
  pub fn region_source<S: Into<String>>(message: S) -> Self {
    Self::RegionSource(message.into())
  }

  /// Create an `InvalidInput` error.
  pub fn invalid_input<S: Into<String>>(message: S) -> Self {
    Self::InvalidInput(message.into())
  }

  /// Create an `InvalidRange` error.
  pub fn invalid_range<S: Into<String>>(message: S) -> Self {
    Self::InvalidRange(message.into())
  }

  /// Create a `ParseError` error.
  pub fn parse_error<S: Into<String>>(message: S) -> Self {
    Self::ParseError(message.into())
  }

  /// Create an `IoError` error.
  pub fn io_error<S: Into<String>>(message: S) -> Self {
    Self::IoError(message.into())
  }

  /// Whether the error means there is simply no data at the queried coordinate.
  pub fn is_empty_result(&self) -> bool {
    matches!(self, Self::CoordinateRangeEmpty { .. })
  }
}

impl From<LookupError> for io::Error {
  fn from(error: LookupError) -> Self {
    Self::other(error)
  }
}

impl From<io::Error> for LookupError {
  fn from(err: io::Error) -> Self {
    Self::io_error(err.to_string())
  }
}

impl From<serde_json::Error> for LookupError {
  fn from(err: serde_json::Error) -> Self {
    Self::feature_source(err.to_string())
  }
}
