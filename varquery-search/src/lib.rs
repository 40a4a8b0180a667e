pub use varquery_config::config::Config;
pub use varquery_config::types::{CoordinateQuery, Format, LookupError, Result};

pub use feature::{FeatureData, FeatureSource};
pub use lookup::TabixLookup;
pub use process::TabixRunner;
pub use record::{LookupRecord, Values};
pub use region::{RegionOverlap, RegionSource};
pub use seqpeek::{SeqPeekData, SeqPeekQuery};
pub use statistics::AggregationResult;
pub use summary::{VariantSummary, VariantSummaryQuery};

pub mod command;
pub mod feature;
pub mod lookup;
pub mod parser;
pub mod process;
pub mod record;
pub mod region;
pub mod seqpeek;
pub mod statistics;
pub mod summary;
