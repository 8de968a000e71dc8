use std::{
  sync::{Arc, RwLock},
  time::Duration,
};

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
  batch::{BatchExecutor, BatchItem, BatchJob, BatchOptions, BatchOutcome, JobStore},
  config::{ScoreConfig, SimilarityConfig, WeightConfig},
  error::VigilError,
  index::EntityIndex,
  model::{QueryEntity, SearchResult, Source},
  prepare::PreparePipeline,
  refresh::{ListSource, RefreshCoordinator, RefreshState},
  search::{SearchParams, SearchService},
  trace::SearchTrace,
};

/// Construction-time settings for the engine.
#[derive(Clone, Copy, Debug)]
pub struct VigilConfig {
  pub score: ScoreConfig,
  /// Number of batch items screened concurrently.
  pub batch_workers: usize,
  /// How long finished async batch jobs stay queryable.
  pub job_ttl: Duration,
}

impl Default for VigilConfig {
  fn default() -> VigilConfig {
    VigilConfig {
      score: ScoreConfig::default(),
      batch_workers: 6,
      job_ttl: Duration::from_secs(24 * 60 * 60),
    }
  }
}

/// The main entrypoint for using the vigil library.
///
/// Bundles the in-memory entity index, the search pipeline, the batch
/// executor and the refresh orchestration behind one handle. It can be
/// cloned cheaply and sent across thread boundaries; every clone shares the
/// same index and configuration.
#[derive(Clone, Debug)]
pub struct Vigil<S: ListSource> {
  config: Arc<RwLock<ScoreConfig>>,
  index: Arc<EntityIndex>,
  search: SearchService,
  executor: BatchExecutor,
  jobs: JobStore,
  coordinator: RefreshCoordinator<S>,
}

impl<S: ListSource> Vigil<S> {
  pub fn new(source: S, config: VigilConfig) -> Vigil<S> {
    crate::init();

    let index = Arc::new(EntityIndex::new());
    let search = SearchService::new(Arc::clone(&index));

    Vigil {
      config: Arc::new(RwLock::new(config.score)),
      executor: BatchExecutor::new(search.clone(), config.batch_workers),
      jobs: JobStore::new(config.job_ttl),
      coordinator: RefreshCoordinator::new(source, Arc::clone(&index)),
      search,
      index,
    }
  }

  /// Consistent copy of the live scoring configuration.
  pub fn score_config(&self) -> ScoreConfig {
    match self.config.read() {
      Ok(guard) => *guard,
      Err(poisoned) => *poisoned.into_inner(),
    }
  }

  pub fn update_similarity(&self, similarity: SimilarityConfig) -> Result<(), VigilError> {
    similarity.validate().map_err(|errs| VigilError::InvalidInput(errs.to_string()))?;

    self.write_config(|config| config.similarity = similarity);

    Ok(())
  }

  pub fn update_weights(&self, weights: WeightConfig) -> Result<(), VigilError> {
    weights.validate().map_err(|errs| VigilError::InvalidInput(errs.to_string()))?;

    self.write_config(|config| config.weights = weights);

    Ok(())
  }

  pub fn reset_config(&self) {
    self.write_config(|config| *config = ScoreConfig::default());
  }

  fn write_config(&self, update: impl FnOnce(&mut ScoreConfig)) {
    match self.config.write() {
      Ok(mut guard) => update(&mut guard),
      Err(poisoned) => update(&mut poisoned.into_inner()),
    }
  }

  /// Single search against the current index snapshot.
  pub fn search(&self, query: &QueryEntity, params: &SearchParams, trace: &SearchTrace) -> Result<Vec<SearchResult>, VigilError> {
    let config = self.score_config();

    self.search.search(query, params, &config, trace)
  }

  /// Synchronous batch screening.
  pub async fn screen(&self, items: Vec<BatchItem>, options: BatchOptions) -> Result<BatchOutcome, VigilError> {
    self.executor.screen(items, options, self.score_config()).await
  }

  /// Submit a batch for background screening; results stay queryable until
  /// the job TTL runs out.
  pub async fn submit_batch(&self, items: Vec<BatchItem>, options: BatchOptions) -> Result<BatchJob, VigilError> {
    self.jobs.submit(self.executor.clone(), items, options, self.score_config()).await
  }

  pub async fn batch_job(&self, id: Uuid) -> Result<BatchJob, VigilError> {
    self.jobs.get(id).await
  }

  pub async fn cancel_batch_job(&self, id: Uuid) -> Result<BatchJob, VigilError> {
    self.jobs.cancel(id).await
  }

  pub async fn sweep_jobs(&self) {
    self.jobs.sweep().await
  }

  /// Kick off a refresh in the background.
  ///
  /// Fails with [`VigilError::RefreshInProgress`] when one is already
  /// running; the existing index keeps serving either way.
  pub fn start_refresh(&self) -> Result<Timestamp, VigilError> {
    self.coordinator.try_begin()?;

    let started_at = Timestamp::now();

    tokio::spawn({
      let coordinator = self.coordinator.clone();
      let pipeline = self.pipeline();

      async move {
        if let Err(err) = coordinator.run_claimed(pipeline).await {
          tracing::error!(error = err.to_string(), "background refresh failed");
        }
      }
    });

    Ok(started_at)
  }

  /// Fetch and swap synchronously; used at startup and by the scheduler.
  pub async fn refresh(&self) -> Result<(), VigilError> {
    self.coordinator.refresh(self.pipeline()).await
  }

  pub async fn refresh_state(&self) -> RefreshState {
    self.coordinator.state().await
  }

  pub async fn set_next_scheduled_refresh(&self, at: Timestamp) {
    self.coordinator.set_next_scheduled(at).await
  }

  pub fn entity_count(&self) -> usize {
    self.index.len()
  }

  pub fn is_ready(&self) -> bool {
    !self.index.is_empty()
  }

  /// Per-source corpus statistics for the list info surface.
  pub fn list_info(&self) -> ListInfo {
    let snapshot = self.index.snapshot();

    let sources = Source::ALL
      .into_iter()
      .map(|source| {
        let info = snapshot.sources.get(&source);

        SourceListInfo {
          name: source.as_str(),
          entity_count: info.map(|info| info.entity_count).unwrap_or_default(),
          last_updated: info.map(|info| info.last_updated),
        }
      })
      .collect();

    ListInfo {
      sources,
      last_updated: snapshot.built_at,
      total_entities: snapshot.entities.len(),
    }
  }

  fn pipeline(&self) -> PreparePipeline {
    PreparePipeline::new(self.score_config().similarity.keep_stopwords)
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct ListInfo {
  pub sources: Vec<SourceListInfo>,
  pub last_updated: Option<Timestamp>,
  pub total_entities: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SourceListInfo {
  pub name: &'static str,
  pub entity_count: usize,
  pub last_updated: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
  use crate::{
    model::{Entity, EntityType, QueryEntity, Source},
    refresh::{SourceBatch, StaticSource},
    search::SearchParams,
    trace::SearchTrace,
    vigil::{Vigil, VigilConfig},
  };

  fn engine() -> Vigil<StaticSource> {
    Vigil::new(
      StaticSource {
        batches: vec![SourceBatch {
          source: Source::OfacSdn,
          entities: vec![Entity::new("ofac-1", Source::OfacSdn, EntityType::Person, "NICOLAS MADURO MOROS")],
        }],
      },
      VigilConfig::default(),
    )
  }

  #[tokio::test]
  async fn end_to_end_search() {
    let vigil = engine();

    assert!(!vigil.is_ready());

    vigil.refresh().await.unwrap();

    assert!(vigil.is_ready());

    let results = vigil
      .search(
        &QueryEntity::named("Nicolas Maduro"),
        &SearchParams {
          min_match: 0.85,
          ..SearchParams::default()
        },
        &SearchTrace::disabled(),
      )
      .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entity.id, "ofac-1");
  }

  #[tokio::test]
  async fn config_updates_are_atomic_snapshots() {
    let vigil = engine();
    let mut weights = vigil.score_config().weights;

    weights.name_weight = 60.0;
    vigil.update_weights(weights).unwrap();

    assert_eq!(vigil.score_config().weights.name_weight, 60.0);

    vigil.reset_config();

    assert_eq!(vigil.score_config().weights.name_weight, 35.0);
  }

  #[tokio::test]
  async fn invalid_config_updates_are_rejected() {
    let vigil = engine();
    let mut weights = vigil.score_config().weights;

    weights.minimum_score = 7.0;

    assert!(vigil.update_weights(weights).is_err());
    assert_eq!(vigil.score_config().weights.minimum_score, 0.88);
  }

  #[tokio::test]
  async fn list_info_reports_all_sources() {
    let vigil = engine();

    vigil.refresh().await.unwrap();

    let info = vigil.list_info();

    assert_eq!(info.sources.len(), 4);
    assert_eq!(info.total_entities, 1);
    assert_eq!(info.sources.iter().find(|source| source.name == "ofac_sdn").unwrap().entity_count, 1);
    assert_eq!(info.sources.iter().find(|source| source.name == "uk_csl").unwrap().entity_count, 0);
  }
}
