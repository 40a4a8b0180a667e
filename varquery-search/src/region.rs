//! Transcript and exon coordinates of genes, read from a region data source.
//!

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, instrument};

use varquery_config::config::region_data::{JsonRegionData, MongoRegionData, RegionData};
use varquery_config::types::{CoordinateQuery, LookupError, Result};

/// One exon of one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
  gene: String,
  mrna: String,
  chr: String,
  strand: String,
  txstart: u64,
  txend: u64,
  exonstart: u64,
  exonend: u64,
}

impl Region {
  /// Create a region from the transcript and exon bounds.
  pub fn new(
    gene: impl Into<String>,
    mrna: impl Into<String>,
    chr: impl Into<String>,
    strand: impl Into<String>,
    transcript: (u64, u64),
    exon: (u64, u64),
  ) -> Self {
    Self {
      gene: gene.into(),
      mrna: mrna.into(),
      chr: chr.into(),
      strand: strand.into(),
      txstart: transcript.0,
      txend: transcript.1,
      exonstart: exon.0,
      exonend: exon.1,
    }
  }

  /// Get the gene name.
  pub fn gene(&self) -> &str {
    &self.gene
  }

  /// Get the transcript id.
  pub fn mrna(&self) -> &str {
    &self.mrna
  }

  /// Get the chromosome.
  pub fn chromosome(&self) -> &str {
    &self.chr
  }

  /// Get the strand.
  pub fn strand(&self) -> &str {
    &self.strand
  }

  /// Get the transcript start.
  pub fn transcript_start(&self) -> u64 {
    self.txstart
  }

  /// Get the transcript end.
  pub fn transcript_end(&self) -> u64 {
    self.txend
  }

  /// Get the exon start.
  pub fn exon_start(&self) -> u64 {
    self.exonstart
  }

  /// Get the exon end.
  pub fn exon_end(&self) -> u64 {
    self.exonend
  }

  /// Whether the region lies on the queried chromosome and overlaps the query.
  pub fn overlaps(&self, query: &CoordinateQuery, overlap: RegionOverlap) -> bool {
    let (start, end) = (query.start(), query.end());

    self.chr == query.chromosome()
      && match overlap {
        RegionOverlap::Exon => {
          (start < self.exonstart && self.exonstart < end)
            || (start < self.exonend && self.exonend < end)
        }
        RegionOverlap::Transcript => {
          (start..end).contains(&self.txstart) || (start..end).contains(&self.txend)
        }
      }
  }
}

/// How a region is matched against a coordinate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionOverlap {
  /// An exon bound falls strictly inside the range.
  #[default]
  Exon,
  /// A transcript bound falls inside the range, end excluded. Selects whole genes that
  /// partially overlap the range.
  Transcript,
}

/// The chromosome and range spanned by every transcript of a gene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneExtent {
  chromosome: String,
  start: u64,
  end: u64,
}

impl GeneExtent {
  /// The extent of the regions of one gene, `None` if there are none. The chromosome is the one
  /// of the first region.
  pub fn from_regions(regions: &[Region]) -> Option<Self> {
    let first = regions.first()?;

    Some(regions.iter().fold(
      Self {
        chromosome: first.chr.clone(),
        start: first.txstart,
        end: first.txend,
      },
      |extent, region| Self {
        start: extent.start.min(region.txstart),
        end: extent.end.max(region.txend),
        ..extent
      },
    ))
  }

  /// The coordinate query covering the extent.
  pub fn to_query(&self) -> Result<CoordinateQuery> {
    CoordinateQuery::new(&self.chromosome, self.start, self.end)
  }
}

/// A source of gene regions. Results are ordered by exon start.
#[async_trait]
pub trait RegionSource {
  /// Get every region of a gene.
  async fn gene_regions(&self, gene: &str) -> Result<Vec<Region>>;

  /// Get every region overlapping the query.
  async fn overlapping_regions(
    &self,
    query: &CoordinateQuery,
    overlap: RegionOverlap,
  ) -> Result<Vec<Region>>;
}

fn sorted_by_exon(mut regions: Vec<Region>) -> Vec<Region> {
  regions.sort_by_key(Region::exon_start);
  regions
}

/// Reads regions from a JSON array of region entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRegionSource {
  path: PathBuf,
}

impl JsonRegionSource {
  /// Create a source reading the file at `path`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the path.
  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn filtered<F>(&self, predicate: F) -> Result<Vec<Region>>
  where
    F: Fn(&Region) -> bool + Send,
  {
    let contents = fs::read(&self.path).await.map_err(|err| {
      LookupError::region_source(format!("reading {}: {err}", self.path.display()))
    })?;
    let regions: Vec<Region> = serde_json::from_slice(&contents)
      .map_err(|err| LookupError::region_source(format!("{}: {err}", self.path.display())))?;

    Ok(sorted_by_exon(
      regions.into_iter().filter(|region| predicate(region)).collect(),
    ))
  }
}

impl From<&JsonRegionData> for JsonRegionSource {
  fn from(config: &JsonRegionData) -> Self {
    Self::new(config.path())
  }
}

#[async_trait]
impl RegionSource for JsonRegionSource {
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  async fn gene_regions(&self, gene: &str) -> Result<Vec<Region>> {
    self.filtered(|region| region.gene == gene).await
  }

  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  async fn overlapping_regions(
    &self,
    query: &CoordinateQuery,
    overlap: RegionOverlap,
  ) -> Result<Vec<Region>> {
    self
      .filtered(|region| region.overlaps(query, overlap))
      .await
  }
}

/// Reads regions from a MongoDB collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoRegionSource {
  config: MongoRegionData,
}

impl MongoRegionSource {
  /// Create a source from the connection config.
  pub fn new(config: MongoRegionData) -> Self {
    Self { config }
  }

  /// Get the config.
  pub fn config(&self) -> &MongoRegionData {
    &self.config
  }

  async fn find(&self, filter: Document) -> Result<Vec<Region>> {
    let client = Client::with_uri_str(self.config.host())
      .await
      .map_err(mongo_error)?;
    let collection: Collection<Region> = client
      .database(self.config.database())
      .collection(self.config.collection());

    debug!(%filter, "finding regions");

    collection
      .find(filter)
      .sort(doc! { "exonstart": 1 })
      .await
      .map_err(mongo_error)?
      .try_collect()
      .await
      .map_err(mongo_error)
  }
}

impl From<&MongoRegionData> for MongoRegionSource {
  fn from(config: &MongoRegionData) -> Self {
    Self::new(config.clone())
  }
}

fn mongo_error(err: mongodb::error::Error) -> LookupError {
  LookupError::region_source(err.to_string())
}

fn bson_coordinate(coordinate: u64) -> Result<i64> {
  i64::try_from(coordinate)
    .map_err(|_| LookupError::invalid_range(format!("coordinate {coordinate} is too large")))
}

fn overlap_filter(query: &CoordinateQuery, overlap: RegionOverlap) -> Result<Document> {
  let (start, end) = (bson_coordinate(query.start())?, bson_coordinate(query.end())?);

  let (start_field, end_field, bounds) = match overlap {
    RegionOverlap::Exon => ("exonstart", "exonend", doc! { "$gt": start, "$lt": end }),
    RegionOverlap::Transcript => ("txstart", "txend", doc! { "$gte": start, "$lt": end }),
  };

  let bounded = |field: &str| {
    let mut document = Document::new();
    document.insert(field, bounds.clone());
    document
  };

  Ok(doc! {
    "chr": query.chromosome(),
    "$or": [bounded(start_field), bounded(end_field)],
  })
}

#[async_trait]
impl RegionSource for MongoRegionSource {
  #[instrument(level = "debug", skip(self), fields(database = self.config.database(), collection = self.config.collection()))]
  async fn gene_regions(&self, gene: &str) -> Result<Vec<Region>> {
    self.find(doc! { "gene": gene }).await
  }

  #[instrument(level = "debug", skip(self), fields(database = self.config.database(), collection = self.config.collection()))]
  async fn overlapping_regions(
    &self,
    query: &CoordinateQuery,
    overlap: RegionOverlap,
  ) -> Result<Vec<Region>> {
    self.find(overlap_filter(query, overlap)?).await
  }
}

#[async_trait]
impl RegionSource for RegionData {
  async fn gene_regions(&self, gene: &str) -> Result<Vec<Region>> {
    match self {
      RegionData::Json(config) => JsonRegionSource::from(config).gene_regions(gene).await,
      RegionData::MongoDb(config) => MongoRegionSource::from(config).gene_regions(gene).await,
    }
  }

  async fn overlapping_regions(
    &self,
    query: &CoordinateQuery,
    overlap: RegionOverlap,
  ) -> Result<Vec<Region>> {
    match self {
      RegionData::Json(config) => {
        JsonRegionSource::from(config)
          .overlapping_regions(query, overlap)
          .await
      }
      RegionData::MongoDb(config) => {
        MongoRegionSource::from(config)
          .overlapping_regions(query, overlap)
          .await
      }
    }
  }
}
