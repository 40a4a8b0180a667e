use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args as ClapArgs, Command, FromArgMatches, Parser};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing::subscriber::set_global_default;
use tracing_subscriber::fmt::{format, layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::FormattingStyle::{Compact, Full, Json, Pretty};
use crate::config::dataset::{
  ResolvedTabixLookup, SeqPeekDataset, TabixLookupDataset, VariantSummaryDataset,
};
use crate::error::Error::{ArgParseError, IoError, TracingError};
use crate::error::Result;

pub mod dataset;
pub mod feature_matrix;
pub mod region_data;

/// Represents a usage string for varquery.
pub const USAGE: &str = "To configure varquery use a config file or environment variables. \
See the documentation of the varquery-config crate for more information.";

const ENVIRONMENT_VARIABLE_PREFIX: &str = "VARQUERY_";

/// The trio classification codes reported by the variant summary, in output order.
pub const DEFAULT_TRIO_TYPES: [&str; 12] = [
  "12", "21", "22", "31", "40", "41", "42", "50", "51", "60", "NA", "MIE",
];

fn default_tabix_executable() -> &'static str {
  "tabix"
}

fn default_tabix_timeout() -> u64 {
  30
}

/// The command line arguments allowed for the varquery executables.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = USAGE)]
pub struct Args {
  #[arg(
    short,
    long,
    env = "VARQUERY_CONFIG",
    help = "Set the location of the config file"
  )]
  config: Option<PathBuf>,
  #[arg(short, long, exclusive = true, help = "Print a default config file")]
  print_default_config: bool,
}

/// Determines which tracing formatting style to use.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum FormattingStyle {
  #[default]
  Full,
  Compact,
  Pretty,
  Json,
}

/// Configuration for varquery.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
  formatting_style: FormattingStyle,
  tabix_executable: String,
  /// Seconds to wait for a tabix process, 0 waits forever.
  tabix_timeout: u64,
  log_tabix_output: bool,
  trio_types: Vec<String>,
  tabix_lookups: BTreeMap<String, TabixLookupDataset>,
  variant_summaries: BTreeMap<String, VariantSummaryDataset>,
  seqpeek_data: BTreeMap<String, SeqPeekDataset>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      formatting_style: Full,
      tabix_executable: default_tabix_executable().to_string(),
      tabix_timeout: default_tabix_timeout(),
      log_tabix_output: false,
      trio_types: DEFAULT_TRIO_TYPES.iter().map(ToString::to_string).collect(),
      tabix_lookups: BTreeMap::new(),
      variant_summaries: BTreeMap::new(),
      seqpeek_data: BTreeMap::new(),
    }
  }
}

impl Config {
  /// Create a new config with default settings and the given datasets.
  pub fn new(
    tabix_lookups: BTreeMap<String, TabixLookupDataset>,
    variant_summaries: BTreeMap<String, VariantSummaryDataset>,
  ) -> Self {
    Self {
      tabix_lookups,
      variant_summaries,
      ..Default::default()
    }
  }

  /// Set the tabix executable.
  pub fn with_tabix_executable(mut self, tabix_executable: impl Into<String>) -> Self {
    self.tabix_executable = tabix_executable.into();
    self
  }

  /// Add a SeqPeek dataset under `id`.
  pub fn with_seqpeek_dataset(mut self, id: impl Into<String>, dataset: SeqPeekDataset) -> Self {
    self.seqpeek_data.insert(id.into(), dataset);
    self
  }

  /// Set the tabix timeout in seconds.
  pub fn with_tabix_timeout(mut self, tabix_timeout: u64) -> Self {
    self.tabix_timeout = tabix_timeout;
    self
  }

  /// Parse the command line arguments. Returns the config path, or prints the default config.
  /// Augment the `Command` args from the `clap` parser. Returns an error if the arguments
  /// could not be parsed.
  pub fn parse_args_with_command(augment_args: Command) -> Result<Option<PathBuf>> {
    Self::parse_with_args(
      &Args::from_arg_matches(&Args::augment_args(augment_args).get_matches())
        .map_err(|err| ArgParseError(err.to_string()))?,
    )
  }

  /// Parse the command line arguments. Returns the config path, or prints the default config.
  pub fn parse_args() -> Result<Option<PathBuf>> {
    Self::parse_with_args(&Args::parse())
  }

  /// Returns the config path from already parsed arguments, or prints the default config.
  pub fn parse_with_args(args: &Args) -> Result<Option<PathBuf>> {
    if args.print_default_config {
      println!("{}", toml::ser::to_string_pretty(&Config::default())?);
      Ok(None)
    } else {
      Ok(Some(args.config.clone().unwrap_or_else(|| "".into())))
    }
  }

  /// Read a config struct from a TOML file, with environment variables taking precedence.
  pub fn from_path(path: &Path) -> Result<Self> {
    Self::extract(Toml::file(path))
  }

  /// Read a config struct from a TOML string, with environment variables taking precedence.
  pub fn from_toml_str(contents: &str) -> Result<Self> {
    Self::extract(Toml::string(contents))
  }

  fn extract<P: figment::Provider>(provider: P) -> Result<Self> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
      .merge(provider)
      .merge(Env::prefixed(ENVIRONMENT_VARIABLE_PREFIX).filter(|k| k != "config"))
      .extract()
      .map_err(|err| IoError(err.to_string()))?;

    info!(
      tabix_lookups = config.tabix_lookups.len(),
      variant_summaries = config.variant_summaries.len(),
      seqpeek_data = config.seqpeek_data.len(),
      "config created"
    );

    Ok(config)
  }

  /// Setup tracing, using a global subscriber.
  pub fn setup_tracing(&self) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default().with(env_filter);

    match self.formatting_style() {
      Full => set_global_default(subscriber.with(layer())),
      Compact => set_global_default(subscriber.with(layer().event_format(format().compact()))),
      Pretty => set_global_default(subscriber.with(layer().event_format(format().pretty()))),
      Json => set_global_default(subscriber.with(layer().event_format(format().json()))),
    }
    .map_err(|err| TracingError(err.to_string()))?;

    Ok(())
  }

  /// Get the formatting style.
  pub fn formatting_style(&self) -> FormattingStyle {
    self.formatting_style
  }

  /// Get the default tabix executable.
  pub fn tabix_executable(&self) -> &str {
    &self.tabix_executable
  }

  /// Get the tabix timeout, `None` if tabix may run forever.
  pub fn tabix_timeout(&self) -> Option<Duration> {
    Some(self.tabix_timeout)
      .filter(|timeout| *timeout > 0)
      .map(Duration::from_secs)
  }

  /// Whether raw tabix output should be logged.
  pub fn log_tabix_output(&self) -> bool {
    self.log_tabix_output
  }

  /// Get the trio classification codes.
  pub fn trio_types(&self) -> &[String] {
    &self.trio_types
  }

  /// Get the tabix lookup datasets.
  pub fn tabix_lookups(&self) -> &BTreeMap<String, TabixLookupDataset> {
    &self.tabix_lookups
  }

  /// Get the variant summary datasets.
  pub fn variant_summaries(&self) -> &BTreeMap<String, VariantSummaryDataset> {
    &self.variant_summaries
  }

  /// Get the SeqPeek datasets.
  pub fn seqpeek_data(&self) -> &BTreeMap<String, SeqPeekDataset> {
    &self.seqpeek_data
  }

  /// Resolve a tabix lookup id into the executable, file and format to query.
  pub fn tabix_lookup(&self, id: &str) -> Option<ResolvedTabixLookup<'_>> {
    self.tabix_lookups.get(id).map(|dataset| {
      ResolvedTabixLookup::new(
        dataset
          .tabix_executable()
          .unwrap_or(self.tabix_executable()),
        dataset.path(),
        dataset.format(),
      )
    })
  }

  /// Resolve a variant summary id.
  pub fn variant_summary(&self, id: &str) -> Option<&VariantSummaryDataset> {
    self.variant_summaries.get(id)
  }

  /// The tabix executable used for a variant summary dataset.
  pub fn summary_executable<'a>(&'a self, dataset: &'a VariantSummaryDataset) -> &'a str {
    dataset
      .tabix_executable()
      .unwrap_or(self.tabix_executable())
  }

  /// Resolve a SeqPeek dataset id.
  pub fn seqpeek_dataset(&self, id: &str) -> Option<&SeqPeekDataset> {
    self.seqpeek_data.get(id)
  }

  /// The tabix executable used for a SeqPeek dataset.
  pub fn seqpeek_executable<'a>(&'a self, dataset: &'a SeqPeekDataset) -> &'a str {
    dataset
      .tabix_executable()
      .unwrap_or(self.tabix_executable())
  }
}
