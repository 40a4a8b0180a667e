//! Parsing of tabix output into lookup records.
//!
//! Three line formats are supported:
//!
//! * VCF lines: `CHROM POS ID REF ALT QUAL FILTER INFO FORMAT <samples...>`.
//! * Trio classification lines: `CHROM POS <family codes...>`.
//! * Region tables: any tab separated table whose first line is a header row.
//!

use csv::ReaderBuilder;
use tracing::{debug, instrument};

use varquery_config::types::{CoordinateQuery, LookupError, Result};

use crate::record::{LookupRecord, Row, Values};

pub const VCF_SNP_ID_COLUMN: usize = 2;
pub const VCF_REF_COLUMN: usize = 3;
pub const VCF_ALT_COLUMN: usize = 4;
pub const VCF_INFO_COLUMN: usize = 7;
pub const VCF_VALUE_START: usize = 9;

pub const TRIO_VALUE_START: usize = 2;

/// Lines starting with this prefix are metadata, not part of the header or data.
pub const DEFAULT_METADATA_PREFIX: &str = "##";

/// Stripped from the start of region table column names.
pub const DEFAULT_HEADER_MARKER: char = '#';

/// Split tabix output into its non-empty lines, dropping metadata lines if a prefix is given.
pub fn split_output<'a>(output: &'a str, metadata_prefix: Option<&str>) -> Vec<&'a str> {
  output
    .lines()
    .filter(|line| !line.trim().is_empty())
    .filter(|line| metadata_prefix.is_none_or(|prefix| !line.starts_with(prefix)))
    .collect()
}

/// Expect exactly one data line.
pub fn single_line<'a>(
  lines: &[&'a str],
  query: &CoordinateQuery,
  context: &str,
) -> Result<&'a str> {
  match lines {
    [] => Err(LookupError::coordinate_range_empty(query, context)),
    [line] => Ok(line),
    _ => Err(LookupError::unexpected_output(format!(
      "expected 1 line, found {}",
      lines.len()
    ))),
  }
}

/// Expect exactly one header line followed by one data line. A lone header line means the
/// coordinate is outside of the regions covered by the file.
pub fn header_and_line<'a>(
  lines: &[&'a str],
  query: &CoordinateQuery,
  context: &str,
) -> Result<(&'a str, &'a str)> {
  match lines {
    [] | [_] => Err(LookupError::coordinate_range_empty(query, context)),
    [header, line] => Ok((header, line)),
    _ => Err(LookupError::unexpected_output(format!(
      "expected 2 lines, found {}",
      lines.len()
    ))),
  }
}

/// Get the sample identifiers from a header line, starting at `value_start`.
pub fn extract_header_identifiers(header_line: &str, value_start: usize) -> Vec<String> {
  header_line
    .split('\t')
    .map(|field| field.trim().to_string())
    .skip(value_start)
    .collect()
}

/// Parse a VCF line. Sample values are keyed by `sample_ids` when they are given.
pub fn parse_vcf_line(line: &str, sample_ids: Option<&[String]>) -> Result<LookupRecord> {
  let fields = split_fields(line, VCF_INFO_COLUMN + 1)?;
  let position = parse_position(fields[1], line)?;

  Ok(
    LookupRecord::new(
      fields[0],
      position,
      position,
      values_from(fields.get(VCF_VALUE_START..).unwrap_or_default(), sample_ids),
    )
    .with_snpid(fields[VCF_SNP_ID_COLUMN])
    .with_ref(fields[VCF_REF_COLUMN])
    .with_alt(fields[VCF_ALT_COLUMN])
    .with_info(fields[VCF_INFO_COLUMN]),
  )
}

/// Parse a trio classification line. Sample values are keyed by `sample_ids` when they are
/// given.
pub fn parse_trio_line(line: &str, sample_ids: Option<&[String]>) -> Result<LookupRecord> {
  let fields = split_fields(line, TRIO_VALUE_START)?;
  let position = parse_position(fields[1], line)?;

  Ok(LookupRecord::new(
    fields[0],
    position,
    position,
    values_from(&fields[TRIO_VALUE_START..], sample_ids),
  ))
}

/// Parse a tab separated table with a header row. `marker` characters are removed from the
/// start of the column names but never from the values. Rows keep their order; short rows
/// are padded with empty values and extra fields are ignored.
#[instrument(level = "trace", skip(data))]
pub fn parse_region_table(data: &str, marker: char) -> Result<Vec<Row>> {
  let mut reader = ReaderBuilder::new()
    .delimiter(b'\t')
    .has_headers(true)
    .flexible(true)
    .quoting(false)
    .from_reader(data.as_bytes());

  let columns: Vec<String> = reader
    .headers()
    .map_err(|err| LookupError::parse_error(format!("reading region table header: {err}")))?
    .iter()
    .map(|column| column.trim_start_matches(marker).to_string())
    .collect();

  let rows = reader
    .records()
    .map(|record| {
      let record = record
        .map_err(|err| LookupError::parse_error(format!("reading region table row: {err}")))?;
      Ok(
        columns
          .iter()
          .enumerate()
          .map(|(index, column)| (column.clone(), record.get(index).unwrap_or_default().to_string()))
          .collect(),
      )
    })
    .collect::<Result<Vec<Row>>>()?;

  debug!(columns = columns.len(), rows = rows.len(), "parsed region table");

  Ok(rows)
}

fn split_fields(line: &str, min_fields: usize) -> Result<Vec<&str>> {
  let fields: Vec<&str> = line.split('\t').collect();
  if fields.len() < min_fields {
    return Err(LookupError::parse_error(format!(
      "expected at least {min_fields} columns, found {}: {line:?}",
      fields.len()
    )));
  }

  Ok(fields)
}

fn parse_position(field: &str, line: &str) -> Result<u64> {
  field
    .trim()
    .parse()
    .map_err(|err| LookupError::parse_error(format!("invalid position {field:?} in {line:?}: {err}")))
}

fn values_from(fields: &[&str], sample_ids: Option<&[String]>) -> Values {
  let values = fields.iter().map(|value| value.trim().to_string());

  match sample_ids {
    Some(sample_ids) => {
      if sample_ids.len() != fields.len() {
        debug!(
          samples = sample_ids.len(),
          values = fields.len(),
          "header and line have a different number of samples"
        );
      }
      Values::Samples(sample_ids.iter().cloned().zip(values).collect())
    }
    None => Values::List(values.collect()),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;

  const VCF_LINE: &str = "1\t1000\trs1\tA\tT\t.\t.\tINFO\tGT\t0/1\t1/1";
  const VCF_HEADER: &str =
    "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample1\tsample2";

  fn query() -> CoordinateQuery {
    CoordinateQuery::point("1", 1000).unwrap()
  }

  #[test]
  fn vcf_line_without_header() {
    let record = parse_vcf_line(VCF_LINE, None).unwrap();
    assert_eq!(record.chromosome(), "1");
    assert_eq!(record.start(), 1000);
    assert_eq!(record.end(), 1000);
    assert_eq!(record.snpid(), "rs1");
    assert_eq!(record.reference(), "A");
    assert_eq!(record.alternate(), "T");
    assert_eq!(record.info(), Some("INFO"));
    assert_eq!(
      record.values(),
      &Values::List(vec!["0/1".to_string(), "1/1".to_string()])
    );
  }

  #[test]
  fn vcf_line_with_header() {
    let sample_ids = extract_header_identifiers(VCF_HEADER, VCF_VALUE_START);
    let record = parse_vcf_line(VCF_LINE, Some(&sample_ids)).unwrap();
    assert_eq!(
      record.values(),
      &Values::Samples(BTreeMap::from([
        ("sample1".to_string(), "0/1".to_string()),
        ("sample2".to_string(), "1/1".to_string()),
      ]))
    );
  }

  #[test]
  fn vcf_line_trims_values() {
    let record = parse_vcf_line("chr1\t5\t.\tG\tC\t.\t.\t.\tGT\t0/0\r", None).unwrap();
    assert_eq!(record.values(), &Values::List(vec!["0/0".to_string()]));
  }

  #[test]
  fn vcf_line_without_samples() {
    let record = parse_vcf_line("1\t5\t.\tG\tC\t.\t.\tDP=3", None).unwrap();
    assert!(record.values().is_empty());
  }

  #[test]
  fn vcf_line_too_few_columns() {
    assert!(matches!(
      parse_vcf_line("1\t1000\trs1", None),
      Err(LookupError::ParseError(_))
    ));
  }

  #[test]
  fn vcf_line_invalid_position() {
    assert!(matches!(
      parse_vcf_line("1\tabc\trs1\tA\tT\t.\t.\tINFO", None),
      Err(LookupError::ParseError(_))
    ));
  }

  #[test]
  fn trio_line() {
    let record = parse_trio_line("chr1\t1000\t12\t21", None).unwrap();
    assert_eq!(record.chromosome(), "chr1");
    assert_eq!(record.start(), 1000);
    assert_eq!(record.snpid(), "");
    assert_eq!(record.info(), None);
    assert_eq!(
      record.values(),
      &Values::List(vec!["12".to_string(), "21".to_string()])
    );
  }

  #[test]
  fn trio_line_with_header() {
    let sample_ids = extract_header_identifiers("#CHR\tPOS\tfamA\tfamB", TRIO_VALUE_START);
    let record = parse_trio_line("chr1\t1000\t12\t21", Some(&sample_ids)).unwrap();
    assert_eq!(
      record.values().as_samples().unwrap().get("famB"),
      Some(&"21".to_string())
    );
  }

  #[test]
  fn header_identifiers_are_trimmed() {
    assert_eq!(
      extract_header_identifiers("#CHR\tPOS\t famA \tfamB\n", 2),
      vec!["famA".to_string(), "famB".to_string()]
    );
  }

  #[test]
  fn reparsing_gives_equal_records() {
    let sample_ids = extract_header_identifiers(VCF_HEADER, VCF_VALUE_START);
    assert_eq!(
      parse_vcf_line(VCF_LINE, Some(&sample_ids)).unwrap(),
      parse_vcf_line(VCF_LINE, Some(&sample_ids)).unwrap()
    );
  }

  #[test]
  fn split_output_removes_metadata_and_empty_lines() {
    let output = "##fileformat=VCFv4.2\n\n#CHROM\tPOS\n1\t1000\n  \n";
    assert_eq!(
      split_output(output, Some(DEFAULT_METADATA_PREFIX)),
      vec!["#CHROM\tPOS", "1\t1000"]
    );
    assert_eq!(split_output(output, None).len(), 3);
  }

  #[test]
  fn single_line_counts() {
    assert!(matches!(
      single_line(&[], &query(), "vcf lookup"),
      Err(LookupError::CoordinateRangeEmpty { .. })
    ));
    assert_eq!(single_line(&["a"], &query(), "vcf lookup"), Ok("a"));
    assert_eq!(
      single_line(&["a", "b"], &query(), "vcf lookup"),
      Err(LookupError::unexpected_output("expected 1 line, found 2"))
    );
  }

  #[test]
  fn header_and_line_counts() {
    assert!(matches!(
      header_and_line(&[], &query(), "vcf lookup"),
      Err(LookupError::CoordinateRangeEmpty { .. })
    ));
    assert!(matches!(
      header_and_line(&["#CHROM"], &query(), "vcf lookup"),
      Err(LookupError::CoordinateRangeEmpty { .. })
    ));
    assert_eq!(
      header_and_line(&["#CHROM", "1"], &query(), "vcf lookup"),
      Ok(("#CHROM", "1"))
    );
    assert_eq!(
      header_and_line(&["#CHROM", "1", "2"], &query(), "vcf lookup"),
      Err(LookupError::unexpected_output("expected 2 lines, found 3"))
    );
  }

  #[test]
  fn region_table_strips_marker_from_header_only() {
    let data = "#chr\tstart\tend\tname\n1\t100\t200\t#first\n1\t150\t300\tsecond\n";
    let rows = parse_region_table(data, DEFAULT_HEADER_MARKER).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
      rows[0],
      BTreeMap::from([
        ("chr".to_string(), "1".to_string()),
        ("start".to_string(), "100".to_string()),
        ("end".to_string(), "200".to_string()),
        ("name".to_string(), "#first".to_string()),
      ])
    );
    assert_eq!(rows[1].get("name"), Some(&"second".to_string()));
  }

  #[test]
  fn region_table_header_only() {
    let rows = parse_region_table("#chr\tstart\tend\n", DEFAULT_HEADER_MARKER).unwrap();
    assert!(rows.is_empty());
  }

  #[test]
  fn region_table_empty() {
    assert!(
      parse_region_table("", DEFAULT_HEADER_MARKER)
        .unwrap()
        .is_empty()
    );
  }

  #[test]
  fn region_table_short_and_long_rows() {
    let rows = parse_region_table("#a\tb\n1\n2\t3\t4\n", DEFAULT_HEADER_MARKER).unwrap();
    assert_eq!(rows[0].get("b"), Some(&"".to_string()));
    assert_eq!(rows[1].len(), 2);
    assert_eq!(rows[1].get("b"), Some(&"3".to_string()));
  }

  #[test]
  fn region_table_quotes_are_kept() {
    let rows = parse_region_table("#a\n\"quoted value\n", DEFAULT_HEADER_MARKER).unwrap();
    assert_eq!(rows[0].get("a"), Some(&"\"quoted value".to_string()));
  }
}
