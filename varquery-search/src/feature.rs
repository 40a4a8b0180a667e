//! Per sample feature values read from a feature matrix.
//!

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, instrument};

use varquery_config::config::feature_matrix::{FeatureMatrix, JsonFeatureMatrix, MongoFeatureMatrix};
use varquery_config::types::{LookupError, Result};

/// The values of one feature, keyed by sample or family identifier, together with the number of
/// samples in each category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureData {
  id: String,
  values: BTreeMap<String, String>,
  aggregate: BTreeMap<String, u64>,
}

impl FeatureData {
  /// Create the feature data, counting the samples in each category.
  pub fn new(id: impl Into<String>, values: BTreeMap<String, String>) -> Self {
    let aggregate = values
      .values()
      .fold(BTreeMap::new(), |mut aggregate, category| {
        *aggregate.entry(category.clone()).or_insert(0) += 1;
        aggregate
      });

    Self {
      id: id.into(),
      values,
      aggregate,
    }
  }

  /// Get the feature id.
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Get the category of every sample.
  pub fn values(&self) -> &BTreeMap<String, String> {
    &self.values
  }

  /// Get the number of samples in every category.
  pub fn aggregate(&self) -> &BTreeMap<String, u64> {
    &self.aggregate
  }

  /// The category of a sample.
  pub fn category(&self, sample_id: &str) -> Option<&str> {
    self.values.get(sample_id).map(String::as_str)
  }

  /// The number of samples in a category, zero if there are none.
  pub fn category_size(&self, category: &str) -> u64 {
    self.aggregate.get(category).copied().unwrap_or_default()
  }
}

/// Convert a feature value into a category label. Values that cannot be a category, such as
/// null or nested values, have no label.
pub fn category_label(value: &Value) -> Option<String> {
  match value {
    Value::String(value) => Some(value.clone()),
    Value::Bool(value) => Some(value.to_string()),
    Value::Number(value) => Some(value.to_string()),
    _ => None,
  }
}

fn feature_data<I>(feature_id: &str, values: I) -> FeatureData
where
  I: IntoIterator<Item = (String, Value)>,
{
  let values = values
    .into_iter()
    .filter_map(|(sample_id, value)| match category_label(&value) {
      Some(category) => Some((sample_id, category)),
      None => {
        debug!(feature_id, %sample_id, %value, "skipping feature value without a category");
        None
      }
    })
    .collect();

  FeatureData::new(feature_id, values)
}

/// A source of feature data.
#[async_trait]
pub trait FeatureSource {
  /// Get the feature with the id, returning a `FeatureNotFound` error if there is no such feature.
  async fn feature_by_id(&self, feature_id: &str) -> Result<FeatureData>;

  /// Get every feature, keyed by feature id.
  async fn features(&self) -> Result<BTreeMap<String, FeatureData>>;
}

/// The layout of a JSON feature matrix file. The nth entry of `ordered_list` is
/// `[feature_id, text_name]` and its values are the nth array of `feature_value_array`, in the
/// order of `sample_id_array`.
#[derive(Debug, Deserialize)]
struct FeatureMatrixFile {
  sample_id_array: Vec<String>,
  feature_value_array: Vec<Vec<Value>>,
  ordered_list: Vec<(String, String)>,
}

/// Reads features from a JSON feature matrix file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFeatureSource {
  path: PathBuf,
}

impl JsonFeatureSource {
  /// Create a source reading the file at `path`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the path.
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl JsonFeatureSource {
  async fn read(&self) -> Result<FeatureMatrixFile> {
    let contents = fs::read(&self.path).await.map_err(|err| {
      LookupError::feature_source(format!("reading {}: {err}", self.path.display()))
    })?;

    Ok(serde_json::from_slice(&contents)?)
  }
}

impl From<&JsonFeatureMatrix> for JsonFeatureSource {
  fn from(config: &JsonFeatureMatrix) -> Self {
    Self::new(config.path())
  }
}

#[async_trait]
impl FeatureSource for JsonFeatureSource {
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  async fn feature_by_id(&self, feature_id: &str) -> Result<FeatureData> {
    let matrix = self.read().await?;

    // Later entries replace earlier ones with the same id.
    let index = matrix
      .ordered_list
      .iter()
      .rposition(|(id, _)| id == feature_id)
      .ok_or_else(|| LookupError::feature_not_found(feature_id))?;

    let values = matrix
      .feature_value_array
      .into_iter()
      .nth(index)
      .ok_or_else(|| {
        LookupError::feature_source(format!(
          "feature {feature_id} has no values at index {index}"
        ))
      })?;

    Ok(feature_data(
      feature_id,
      matrix.sample_id_array.into_iter().zip(values),
    ))
  }

  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  async fn features(&self) -> Result<BTreeMap<String, FeatureData>> {
    let matrix = self.read().await?;
    let sample_ids = &matrix.sample_id_array;

    Ok(
      matrix
        .ordered_list
        .into_iter()
        .zip(matrix.feature_value_array)
        .map(|((feature_id, _), values)| {
          let feature = feature_data(&feature_id, sample_ids.iter().cloned().zip(values));
          (feature_id, feature)
        })
        .collect(),
    )
  }
}

/// A feature matrix document, `{id, v: {sample: value}}`.
#[derive(Debug, Deserialize)]
struct FeatureDocument {
  id: String,
  v: BTreeMap<String, Value>,
}

/// Reads features from a MongoDB collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoFeatureSource {
  config: MongoFeatureMatrix,
}

impl MongoFeatureSource {
  /// Create a source from the connection config.
  pub fn new(config: MongoFeatureMatrix) -> Self {
    Self { config }
  }

  /// Get the config.
  pub fn config(&self) -> &MongoFeatureMatrix {
    &self.config
  }
}

impl From<&MongoFeatureMatrix> for MongoFeatureSource {
  fn from(config: &MongoFeatureMatrix) -> Self {
    Self::new(config.clone())
  }
}

fn mongo_error(err: mongodb::error::Error) -> LookupError {
  LookupError::feature_source(err.to_string())
}

impl MongoFeatureSource {
  async fn collection(&self) -> Result<Collection<FeatureDocument>> {
    let client = Client::with_uri_str(self.config.host())
      .await
      .map_err(mongo_error)?;

    Ok(
      client
        .database(self.config.database())
        .collection::<FeatureDocument>(self.config.collection()),
    )
  }
}

#[async_trait]
impl FeatureSource for MongoFeatureSource {
  #[instrument(level = "debug", skip(self), fields(database = self.config.database(), collection = self.config.collection()))]
  async fn feature_by_id(&self, feature_id: &str) -> Result<FeatureData> {
    let mut cursor = self
      .collection()
      .await?
      .find(doc! { "id": feature_id })
      .await
      .map_err(mongo_error)?;

    // Later documents replace earlier ones with the same id.
    let mut found = None;
    while let Some(document) = cursor.try_next().await.map_err(mongo_error)? {
      if document.id == feature_id {
        found = Some(document.v);
      }
    }

    let values = found.ok_or_else(|| LookupError::feature_not_found(feature_id))?;
    Ok(feature_data(feature_id, values))
  }

  #[instrument(level = "debug", skip(self), fields(database = self.config.database(), collection = self.config.collection()))]
  async fn features(&self) -> Result<BTreeMap<String, FeatureData>> {
    let mut cursor = self
      .collection()
      .await?
      .find(doc! {})
      .await
      .map_err(mongo_error)?;

    let mut features = BTreeMap::new();
    while let Some(document) = cursor.try_next().await.map_err(mongo_error)? {
      let feature = feature_data(&document.id, document.v);
      features.insert(document.id, feature);
    }

    Ok(features)
  }
}

#[async_trait]
impl FeatureSource for FeatureMatrix {
  async fn feature_by_id(&self, feature_id: &str) -> Result<FeatureData> {
    match self {
      FeatureMatrix::Json(config) => {
        JsonFeatureSource::from(config)
          .feature_by_id(feature_id)
          .await
      }
      FeatureMatrix::MongoDb(config) => {
        MongoFeatureSource::from(config)
          .feature_by_id(feature_id)
          .await
      }
    }
  }

  async fn features(&self) -> Result<BTreeMap<String, FeatureData>> {
    match self {
      FeatureMatrix::Json(config) => JsonFeatureSource::from(config).features().await,
      FeatureMatrix::MongoDb(config) => MongoFeatureSource::from(config).features().await,
    }
  }
}
