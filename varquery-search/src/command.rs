//! Building tabix invocations.
//!

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use varquery_config::types::{CoordinateQuery, LookupError, Result};

/// The flag that makes tabix print the header lines before the matching lines.
pub const HEADER_FLAG: &str = "-h";

/// A tabix invocation such as `tabix -h calls.vcf.gz chr1:1000-1000`.
///
/// The command is kept as a single line because the line itself is what gets reported in
/// errors. The program and its arguments are the whitespace separated parts of that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabixCommand {
  line: String,
}

impl TabixCommand {
  /// Build the command for looking up `query` in `data_file`. The header flag is attached to
  /// the executable because it changes the format of the output.
  pub fn new(
    executable: &str,
    data_file: &Path,
    query: &CoordinateQuery,
    include_header: bool,
  ) -> Result<Self> {
    let executable = executable.trim();
    if executable.is_empty() {
      return Err(LookupError::invalid_input("tabix executable must not be empty"));
    }

    let data_file = data_file.to_string_lossy();
    if data_file.trim().is_empty() {
      return Err(LookupError::invalid_input("data file path must not be empty"));
    }

    let executable = if include_header {
      format!("{executable} {HEADER_FLAG}")
    } else {
      executable.to_string()
    };

    Ok(Self {
      line: format!("{executable} {data_file} {query}"),
    })
  }

  /// The program to run.
  pub fn program(&self) -> &str {
    self.line.split_whitespace().next().unwrap_or_default()
  }

  /// The arguments passed to the program.
  pub fn args(&self) -> impl Iterator<Item = &str> {
    self.line.split_whitespace().skip(1)
  }

  /// The full command line.
  pub fn as_str(&self) -> &str {
    &self.line
  }
}

impl Display for TabixCommand {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(&self.line)
  }
}
