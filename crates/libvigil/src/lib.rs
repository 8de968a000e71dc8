mod batch;
mod config;
mod error;
mod index;
mod matching;
mod model;
mod prepare;
mod refresh;
mod scoring;
mod search;
mod trace;
mod vigil;

/// Warm the lazily initialized embedded dictionaries.
pub(crate) fn init() {
  prepare::init();
}

pub mod prelude {
  pub use crate::vigil::{ListInfo, SourceListInfo, Vigil, VigilConfig};

  pub use crate::batch::{BatchItem, BatchJob, BatchOptions, BatchOutcome, BatchStatistics, ItemOutcome, ItemStatus, JobStatus, MAX_BATCH_SIZE};
  pub use crate::config::{ScoreConfig, ScorePhases, SimilarityConfig, WeightConfig};
  pub use crate::error::VigilError;
  pub use crate::model::{
    Address, Contact, CryptoAddress, Entity, EntityType, GovernmentId, PersonInfo, QueryEntity, ScoreBreakdown, SearchResult, Source,
  };
  pub use crate::prepare::{PreparePipeline, language::Lang};
  pub use crate::refresh::{HttpListSource, ListSource, RefreshState, RefreshStatus, SourceBatch, SourceRefresh, StaticSource};
  pub use crate::scoring::EntityScorer;
  pub use crate::search::{SearchParams, SearchService};
  pub use crate::trace::{SearchTrace, TraceEvent};
}

pub use crate::prelude::*;
