//! Tabix lookups for single coordinates and regions.
//!

use std::path::Path;

use tracing::{debug, instrument};

use varquery_config::types::{CoordinateQuery, Format, LookupError, Result};

use crate::command::TabixCommand;
use crate::parser::{
  DEFAULT_HEADER_MARKER, DEFAULT_METADATA_PREFIX, TRIO_VALUE_START, VCF_VALUE_START,
  extract_header_identifiers, header_and_line, parse_region_table, parse_trio_line,
  parse_vcf_line, single_line, split_output,
};
use crate::process::TabixRunner;
use crate::record::{LookupRecord, Values};

/// The number of characters removed from the chromosome printed by tabix before comparing it
/// with the requested one, i.e. the length of the `chr` prefix.
pub const CHROMOSOME_PREFIX_LEN: usize = 3;

/// Runs tabix against a data file and turns its output into lookup records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabixLookup {
  executable: String,
  runner: TabixRunner,
}

impl TabixLookup {
  /// Create a lookup using the tabix `executable`.
  pub fn new(executable: impl Into<String>, runner: TabixRunner) -> Self {
    Self {
      executable: executable.into(),
      runner,
    }
  }

  /// Get the executable.
  pub fn executable(&self) -> &str {
    &self.executable
  }

  /// Get the runner.
  pub fn runner(&self) -> &TabixRunner {
    &self.runner
  }

  /// Look up a query using the line format of the data file.
  pub async fn lookup(
    &self,
    format: Format,
    data_file: &Path,
    query: &CoordinateQuery,
  ) -> Result<LookupRecord> {
    match format {
      Format::Vcf => self.vcf_line(data_file, query).await,
      Format::Trio => self.trio_line(data_file, query).await,
      Format::Tsv => self.region(data_file, query).await,
    }
  }

  /// Look up the VCF line at the start of the query. Sample values are returned in column order.
  #[instrument(level = "debug", skip(self))]
  pub async fn vcf_line(&self, data_file: &Path, query: &CoordinateQuery) -> Result<LookupRecord> {
    let query = query.to_point();
    let output = self.output(data_file, &query, false).await?;
    let lines = split_output(&output, None);
    let line = single_line(&lines, &query, "vcf lookup")?;

    verify(parse_vcf_line(line, None)?, &query, line)
  }

  /// Look up the VCF line at the start of the query. Sample values are keyed by the sample
  /// identifiers of the header line.
  #[instrument(level = "debug", skip(self))]
  pub async fn vcf_line_with_header(
    &self,
    data_file: &Path,
    query: &CoordinateQuery,
  ) -> Result<LookupRecord> {
    let query = query.to_point();
    let output = self.output(data_file, &query, true).await?;
    let lines = split_output(&output, Some(DEFAULT_METADATA_PREFIX));
    let (header, line) = header_and_line(&lines, &query, "vcf lookup")?;

    let sample_ids = extract_header_identifiers(header, VCF_VALUE_START);
    verify(parse_vcf_line(line, Some(&sample_ids))?, &query, line)
  }

  /// Look up the trio classification line at the start of the query.
  #[instrument(level = "debug", skip(self))]
  pub async fn trio_line(&self, data_file: &Path, query: &CoordinateQuery) -> Result<LookupRecord> {
    let query = query.to_point();
    let output = self.output(data_file, &query, false).await?;
    let lines = split_output(&output, None);
    let line = single_line(&lines, &query, "triotype lookup")?;

    verify(parse_trio_line(line, None)?, &query, line)
  }

  /// Look up the trio classification line at the start of the query, with values keyed by the
  /// family identifiers of the header line.
  #[instrument(level = "debug", skip(self))]
  pub async fn trio_line_with_header(
    &self,
    data_file: &Path,
    query: &CoordinateQuery,
  ) -> Result<LookupRecord> {
    let query = query.to_point();
    let output = self.output(data_file, &query, true).await?;
    let lines = split_output(&output, Some(DEFAULT_METADATA_PREFIX));
    let (header, line) = header_and_line(&lines, &query, "triotype lookup")?;

    let sample_ids = extract_header_identifiers(header, TRIO_VALUE_START);
    verify(parse_trio_line(line, Some(&sample_ids))?, &query, line)
  }

  /// Look up every row of a region table overlapping the query. The result may have no rows.
  #[instrument(level = "debug", skip(self))]
  pub async fn region(&self, data_file: &Path, query: &CoordinateQuery) -> Result<LookupRecord> {
    let output = self.output(data_file, query, true).await?;
    let rows = parse_region_table(&output, DEFAULT_HEADER_MARKER)?;

    Ok(LookupRecord::new(
      query.chromosome(),
      query.start(),
      query.end(),
      Values::Rows(rows),
    ))
  }

  async fn output(
    &self,
    data_file: &Path,
    query: &CoordinateQuery,
    include_header: bool,
  ) -> Result<String> {
    let command = TabixCommand::new(&self.executable, data_file, query, include_header)?;
    self.runner.run(&command).await
  }
}

/// Check that tabix returned the line that was asked for.
fn verify(record: LookupRecord, query: &CoordinateQuery, line: &str) -> Result<LookupRecord> {
  let chromosome = record
    .chromosome()
    .get(CHROMOSOME_PREFIX_LEN..)
    .unwrap_or_default();

  if chromosome != query.chromosome() || record.start() != query.start() {
    debug!(chromosome = record.chromosome(), start = record.start(), "wrong line found");
    return Err(LookupError::wrong_line_found(
      query,
      format!(
        "got {}:{}, full line '{line}'",
        record.chromosome(),
        record.start()
      ),
    ));
  }

  Ok(record)
}
