//! Gene variant counts for SeqPeek: the variants of a gene, grouped by transcript, with the
//! number of variant samples in every category of every feature.
//!

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, instrument};

use varquery_config::config::dataset::SeqPeekDataset;
use varquery_config::types::{CoordinateQuery, LookupError, Result};

use crate::feature::{FeatureData, FeatureSource};
use crate::lookup::TabixLookup;
use crate::record::Row;
use crate::region::{GeneExtent, Region, RegionOverlap, RegionSource};
use crate::statistics::{DelimitedSampleId, RoleExtractor};

const VARIANT_KEY_LEN: usize = 8;

/// The variant table columns that together identify one variant.
pub const VARIANT_KEY_COLUMNS: [&str; VARIANT_KEY_LEN] = [
  "chr",
  "coordinate",
  "gene",
  "transcript",
  "variant",
  "type",
  "uniprot_id",
  "protein_change",
];

/// The variant table column holding the sample a variant was called in.
pub const SAMPLE_ID_COLUMN: &str = "sample_id";

/// The exon layout of one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptRegion {
  chromosome: String,
  exon_starts: Vec<u64>,
  exon_stops: Vec<u64>,
  start: u64,
  stop: u64,
  strand: String,
}

impl TranscriptRegion {
  /// Get the chromosome.
  pub fn chromosome(&self) -> &str {
    &self.chromosome
  }

  /// Get the start of the first exon.
  pub fn start(&self) -> u64 {
    self.start
  }

  /// Get the end of the last exon.
  pub fn stop(&self) -> u64 {
    self.stop
  }

  /// Get the strand.
  pub fn strand(&self) -> &str {
    &self.strand
  }

  /// Get the exon starts.
  pub fn exon_starts(&self) -> &[u64] {
    &self.exon_starts
  }

  /// Get the exon ends.
  pub fn exon_stops(&self) -> &[u64] {
    &self.exon_stops
  }

  fn add_exon(&mut self, region: &Region) {
    self.start = self.start.min(region.exon_start());
    self.stop = self.stop.max(region.exon_end());
    self.exon_starts.push(region.exon_start());
    self.exon_stops.push(region.exon_end());
  }
}

impl From<&Region> for TranscriptRegion {
  fn from(region: &Region) -> Self {
    Self {
      chromosome: region.chromosome().to_string(),
      exon_starts: vec![region.exon_start()],
      exon_stops: vec![region.exon_end()],
      start: region.exon_start(),
      stop: region.exon_end(),
      strand: region.strand().to_string(),
    }
  }
}

/// Transcript layouts keyed by gene name and transcript id.
pub type GeneRegions = BTreeMap<String, BTreeMap<String, TranscriptRegion>>;

/// Group exons by gene and transcript. Exons keep the order of `regions`.
pub fn gene_regions(regions: &[Region]) -> GeneRegions {
  regions
    .iter()
    .fold(GeneRegions::new(), |mut genes, region| {
      genes
        .entry(region.gene().to_string())
        .or_default()
        .entry(region.mrna().to_string())
        .and_modify(|transcript| transcript.add_exon(region))
        .or_insert_with(|| TranscriptRegion::from(region));
      genes
    })
}

/// Sample counts keyed by feature id and then by category.
pub type FeatureCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// One variant and the categories of the samples it was called in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantStatistics {
  base_change: String,
  coordinate: u64,
  protein_change: String,
  statistics: FeatureCounts,
  uniprot_id: String,
  variant_type: String,
}

impl VariantStatistics {
  /// Get the base change, e.g. `C->T`.
  pub fn base_change(&self) -> &str {
    &self.base_change
  }

  /// Get the coordinate.
  pub fn coordinate(&self) -> u64 {
    self.coordinate
  }

  /// Get the sample counts per feature and category.
  pub fn statistics(&self) -> &FeatureCounts {
    &self.statistics
  }
}

/// The variants of one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptVariants {
  id: String,
  variants: Vec<VariantStatistics>,
}

impl TranscriptVariants {
  /// Get the transcript id.
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Get the variants, in the order they were first seen.
  pub fn variants(&self) -> &[VariantStatistics] {
    &self.variants
  }
}

/// The variants of one gene with the layout of the gene, when it is known.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GeneVariants {
  #[serde(flatten)]
  region: Option<TranscriptRegion>,
  transcripts: BTreeMap<String, TranscriptVariants>,
}

impl GeneVariants {
  /// Get the layout of the gene.
  pub fn region(&self) -> Option<&TranscriptRegion> {
    self.region.as_ref()
  }

  /// Get the variants of every transcript.
  pub fn transcripts(&self) -> &BTreeMap<String, TranscriptVariants> {
    &self.transcripts
  }
}

/// The variants of every gene, keyed by gene name.
pub type SeqPeekData = BTreeMap<String, GeneVariants>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VariantKey([String; VARIANT_KEY_LEN]);

impl VariantKey {
  fn from_row(row: &Row) -> Result<Self> {
    let mut fields: [String; VARIANT_KEY_LEN] = Default::default();
    for (field, name) in fields.iter_mut().zip(VARIANT_KEY_COLUMNS) {
      *field = column(row, name)?.to_string();
    }

    Ok(Self(fields))
  }

  fn chromosome(&self) -> &str {
    &self.0[0]
  }

  fn coordinate(&self) -> Result<u64> {
    self.0[1]
      .parse()
      .map_err(|err| LookupError::parse_error(format!("variant coordinate {:?}: {err}", self.0[1])))
  }

  fn gene(&self) -> &str {
    &self.0[2]
  }

  fn transcript(&self) -> &str {
    &self.0[3]
  }

  fn into_statistics(self, statistics: FeatureCounts) -> Result<VariantStatistics> {
    let coordinate = self.coordinate()?;
    let [_, _, _, _, base_change, variant_type, uniprot_id, protein_change] = self.0;

    Ok(VariantStatistics {
      base_change,
      coordinate,
      protein_change,
      statistics,
      uniprot_id,
      variant_type,
    })
  }
}

fn column<'a>(row: &'a Row, name: &str) -> Result<&'a str> {
  row
    .get(name)
    .map(String::as_str)
    .ok_or_else(|| LookupError::parse_error(format!("variant table has no {name} column")))
}

/// Count the samples of every variant in `rows` per feature category. Samples are matched with
/// the features through their family, samples of families without a value are not counted.
#[instrument(level = "debug", skip_all, fields(rows = rows.len(), features = features.len()))]
pub fn aggregate_gene_variants<R: RoleExtractor>(
  rows: &[Row],
  features: &BTreeMap<String, FeatureData>,
  regions: &GeneRegions,
  extractor: &R,
) -> Result<SeqPeekData> {
  let mut counted: Vec<(VariantKey, FeatureCounts)> = Vec::new();
  let mut positions: HashMap<VariantKey, usize> = HashMap::new();

  for row in rows {
    let key = VariantKey::from_row(row)?;
    let sample_id = column(row, SAMPLE_ID_COLUMN)?;
    let family_id = extractor.family_id(sample_id);

    let index = *positions.entry(key.clone()).or_insert_with(|| {
      let statistics = features
        .keys()
        .map(|feature_id| (feature_id.clone(), BTreeMap::new()))
        .collect();
      counted.push((key, statistics));
      counted.len() - 1
    });

    for (feature_id, feature) in features {
      let Some(category) = feature.category(family_id) else {
        debug!(%feature_id, sample_id, family_id, "skipping sample without a feature value");
        continue;
      };

      *counted[index]
        .1
        .entry(feature_id.clone())
        .or_default()
        .entry(category.to_string())
        .or_insert(0) += 1;
    }
  }

  let mut genes = SeqPeekData::new();
  for (key, statistics) in counted {
    let gene = genes.entry(key.gene().to_string()).or_default();
    if gene.region.is_none() {
      gene.region = regions
        .get(key.gene())
        .and_then(|transcripts| transcripts.get(key.transcript()))
        .cloned();
    }

    debug!(
      chromosome = key.chromosome(),
      gene = key.gene(),
      transcript = key.transcript(),
      "adding variant"
    );

    let transcript = key.transcript().to_string();
    gene
      .transcripts
      .entry(transcript.clone())
      .or_insert_with(|| TranscriptVariants {
        id: transcript,
        variants: Vec::new(),
      })
      .variants
      .push(key.into_statistics(statistics)?);
  }

  Ok(genes)
}

/// Collects the variants of a gene or region and counts them against every feature.
#[derive(Debug, Clone)]
pub struct SeqPeekQuery<R = DelimitedSampleId> {
  lookup: TabixLookup,
  overlap: RegionOverlap,
  extractor: R,
}

impl SeqPeekQuery {
  /// Create a query matching exons, with families read from `-` delimited sample identifiers.
  pub fn new(lookup: TabixLookup) -> Self {
    Self::with_extractor(lookup, DelimitedSampleId::default())
  }
}

impl<R: RoleExtractor> SeqPeekQuery<R> {
  /// Create a query with a family extractor.
  pub fn with_extractor(lookup: TabixLookup, extractor: R) -> Self {
    Self {
      lookup,
      overlap: RegionOverlap::default(),
      extractor,
    }
  }

  /// Set how gene regions are matched against the queried range.
  pub fn with_overlap(mut self, overlap: RegionOverlap) -> Self {
    self.overlap = overlap;
    self
  }

  /// Get the region overlap.
  pub fn overlap(&self) -> RegionOverlap {
    self.overlap
  }

  /// Count the variants within the range spanned by every transcript of `gene`.
  #[instrument(level = "debug", skip(self, dataset))]
  pub async fn gene(&self, dataset: &SeqPeekDataset, gene: &str) -> Result<SeqPeekData> {
    let regions = dataset.region_data().gene_regions(gene).await?;
    let extent = GeneExtent::from_regions(&regions)
      .ok_or_else(|| LookupError::region_not_found(format!("gene {gene}")))?;

    self.region(dataset, &extent.to_query()?).await
  }

  /// Count the variants within `query`.
  #[instrument(level = "debug", skip(self, dataset))]
  pub async fn region(&self, dataset: &SeqPeekDataset, query: &CoordinateQuery) -> Result<SeqPeekData> {
    let regions = gene_regions(
      &dataset
        .region_data()
        .overlapping_regions(query, self.overlap)
        .await?,
    );
    if regions.is_empty() {
      return Err(LookupError::region_not_found(query.to_string()));
    }

    let features = dataset.feature_matrix().features().await?;
    let record = self.lookup.region(dataset.variant_file(), query).await?;
    let rows = record
      .values()
      .as_rows()
      .ok_or_else(|| LookupError::parse_error("expected the rows of a variant table"))?;

    let data = aggregate_gene_variants(rows, &features, &regions, &self.extractor)?;
    info!(%query, genes = data.len(), "counted gene variants");

    Ok(data)
  }
}
