//! Feature matrix configuration.
//!

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the per sample feature values used by the variant summary are read from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum FeatureMatrix {
  #[serde(rename = "json", alias = "Json", alias = "JSON")]
  Json(JsonFeatureMatrix),
  #[serde(rename = "mongodb", alias = "MongoDb", alias = "MONGODB")]
  MongoDb(MongoFeatureMatrix),
}

impl Default for FeatureMatrix {
  fn default() -> Self {
    Self::Json(Default::default())
  }
}

/// A feature matrix stored as a single JSON file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct JsonFeatureMatrix {
  path: PathBuf,
}

impl JsonFeatureMatrix {
  /// Create a new JSON feature matrix config.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the path of the JSON file.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

/// A feature matrix stored in a MongoDB collection, one document per feature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MongoFeatureMatrix {
  host: String,
  database: String,
  collection: String,
}

impl MongoFeatureMatrix {
  /// Create a new MongoDB feature matrix config.
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

impl Default for MongoFeatureMatrix {
  fn default() -> Self {
    Self {
      host: "mongodb://localhost:27017".to_string(),
      database: "variant_summary".to_string(),
      collection: "feature_matrix".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::config::tests::test_config_from_file;

  use super::*;

  #[test]
  fn config_feature_matrix_json_file() {
    test_config_from_file(
      r#"
      [variant_summaries.cohort]
      vcf_file = "calls.vcf.gz"
      triotype_file = "triotypes.tsv.gz"

      [variant_summaries.cohort.feature_matrix]
      type = "json"
      path = "features.json"
      "#,
      |config| {
        let dataset = config.variant_summary("cohort").unwrap();
        assert_eq!(
          dataset.feature_matrix(),
          &FeatureMatrix::Json(JsonFeatureMatrix::new("features.json"))
        );
      },
    );
  }

  #[test]
  fn config_feature_matrix_mongodb_file() {
    test_config_from_file(
      r#"
      [variant_summaries.cohort]
      vcf_file = "calls.vcf.gz"
      triotype_file = "triotypes.tsv.gz"

      [variant_summaries.cohort.feature_matrix]
      type = "mongodb"
      host = "mongodb://db:27017"
      database = "summaries"
      "#,
      |config| {
        let dataset = config.variant_summary("cohort").unwrap();
        assert!(matches!(
          dataset.feature_matrix(),
          FeatureMatrix::MongoDb(mongo) if mongo.host() == "mongodb://db:27017"
            && mongo.database() == "summaries"
            && mongo.collection() == "feature_matrix"
        ));
      },
    );
  }
}
