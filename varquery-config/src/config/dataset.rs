//! Datasets that can be queried, addressed by a symbolic id in requests.
//!

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::feature_matrix::FeatureMatrix;
use crate::config::region_data::RegionData;
use crate::types::Format;

/// A tabix indexed file that can be queried directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TabixLookupDataset {
  path: PathBuf,
  format: Format,
  #[serde(skip_serializing_if = "Option::is_none")]
  tabix_executable: Option<String>,
}

impl TabixLookupDataset {
  /// Create a new tabix lookup dataset.
  pub fn new(path: impl Into<PathBuf>, format: Format) -> Self {
    Self {
      path: path.into(),
      format,
      tabix_executable: None,
    }
  }

  /// Override the tabix executable for this dataset.
  pub fn with_tabix_executable(mut self, tabix_executable: impl Into<String>) -> Self {
    self.tabix_executable = Some(tabix_executable.into());
    self
  }

  /// Get the path of the indexed file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Get the line format of the file.
  pub fn format(&self) -> Format {
    self.format
  }

  /// Get the executable override.
  pub fn tabix_executable(&self) -> Option<&str> {
    self.tabix_executable.as_deref()
  }
}

/// The files needed to compute a variant summary: a VCF file, a trio classification file
/// and the feature matrix the samples are joined against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct VariantSummaryDataset {
  vcf_file: PathBuf,
  triotype_file: PathBuf,
  feature_matrix: FeatureMatrix,
  #[serde(skip_serializing_if = "Option::is_none")]
  tabix_executable: Option<String>,
}

impl VariantSummaryDataset {
  /// Create a new variant summary dataset.
  pub fn new(
    vcf_file: impl Into<PathBuf>,
    triotype_file: impl Into<PathBuf>,
    feature_matrix: FeatureMatrix,
  ) -> Self {
    Self {
      vcf_file: vcf_file.into(),
      triotype_file: triotype_file.into(),
      feature_matrix,
      tabix_executable: None,
    }
  }

  /// Override the tabix executable for this dataset.
  pub fn with_tabix_executable(mut self, tabix_executable: impl Into<String>) -> Self {
    self.tabix_executable = Some(tabix_executable.into());
    self
  }

  /// Get the VCF file path.
  pub fn vcf_file(&self) -> &Path {
    &self.vcf_file
  }

  /// Get the trio classification file path.
  pub fn triotype_file(&self) -> &Path {
    &self.triotype_file
  }

  /// Get the feature matrix config.
  pub fn feature_matrix(&self) -> &FeatureMatrix {
    &self.feature_matrix
  }

  /// Get the executable override.
  pub fn tabix_executable(&self) -> Option<&str> {
    self.tabix_executable.as_deref()
  }
}

/// The files needed to count gene variants: a tabix indexed variant table, the gene regions
/// and the feature matrix the variant families are joined against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SeqPeekDataset {
  variant_file: PathBuf,
  region_data: RegionData,
  feature_matrix: FeatureMatrix,
  #[serde(skip_serializing_if = "Option::is_none")]
  tabix_executable: Option<String>,
}

impl SeqPeekDataset {
  /// Create a new SeqPeek dataset.
  pub fn new(
    variant_file: impl Into<PathBuf>,
    region_data: RegionData,
    feature_matrix: FeatureMatrix,
  ) -> Self {
    Self {
      variant_file: variant_file.into(),
      region_data,
      feature_matrix,
      tabix_executable: None,
    }
  }

  /// Override the tabix executable for this dataset.
  pub fn with_tabix_executable(mut self, tabix_executable: impl Into<String>) -> Self {
    self.tabix_executable = Some(tabix_executable.into());
    self
  }

  /// Get the variant table path.
  pub fn variant_file(&self) -> &Path {
    &self.variant_file
  }

  /// Get the gene region config.
  pub fn region_data(&self) -> &RegionData {
    &self.region_data
  }

  /// Get the feature matrix config.
  pub fn feature_matrix(&self) -> &FeatureMatrix {
    &self.feature_matrix
  }

  /// Get the executable override.
  pub fn tabix_executable(&self) -> Option<&str> {
    self.tabix_executable.as_deref()
  }
}

/// A tabix lookup id resolved against the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTabixLookup<'a> {
  executable: &'a str,
  path: &'a Path,
  format: Format,
}

impl<'a> ResolvedTabixLookup<'a> {
  /// Create a new resolved lookup.
  pub fn new(executable: &'a str, path: &'a Path, format: Format) -> Self {
    Self {
      executable,
      path,
      format,
    }
  }

  /// The tabix executable to run.
  pub fn executable(&self) -> &'a str {
    self.executable
  }

  /// The indexed file to query.
  pub fn path(&self) -> &'a Path {
    self.path
  }

  /// The line format of the file.
  pub fn format(&self) -> Format {
    self.format
  }
}
