//! Gene region configuration.
//!

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the transcript and exon coordinates of genes are read from. Every entry describes one
/// exon of one transcript.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RegionData {
  #[serde(rename = "json", alias = "Json", alias = "JSON")]
  Json(JsonRegionData),
  #[serde(rename = "mongodb", alias = "MongoDb", alias = "MONGODB")]
  MongoDb(MongoRegionData),
}

impl Default for RegionData {
  fn default() -> Self {
    Self::MongoDb(Default::default())
  }
}

/// Region entries stored as a JSON array in a file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct JsonRegionData {
  path: PathBuf,
}

impl JsonRegionData {
  /// Create a new JSON region data config.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the path of the JSON file.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

/// Region entries stored in a MongoDB collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MongoRegionData {
  host: String,
  database: String,
  collection: String,
}

impl MongoRegionData {
  /// Create a new MongoDB region data config.
  pub fn new(
    host: impl Into<String>,
    database: impl Into<String>,
    collection: impl Into<String>,
  ) -> Self {
    Self {
      host: host.into(),
      database: database.into(),
      collection: collection.into(),
    }
  }

  /// Get the connection uri.
  pub fn host(&self) -> &str {
    &self.host
  }

  /// Get the database name.
  pub fn database(&self) -> &str {
    &self.database
  }

  /// Get the collection name.
  pub fn collection(&self) -> &str {
    &self.collection
  }
}

impl Default for MongoRegionData {
  fn default() -> Self {
    Self {
      host: "mongodb://localhost:27017".to_string(),
      database: "seqpeek_data_service".to_string(),
      collection: "region_data".to_string(),
    }
  }
}
