use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use ahash::RandomState;
use jiff::Timestamp;
use metrics::histogram;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

use crate::{
  config::ScoreConfig,
  error::VigilError,
  model::{EntityType, QueryEntity, SearchResult, Source},
  search::{SearchParams, SearchService},
  trace::SearchTrace,
};

pub const MAX_BATCH_SIZE: usize = 1000;

const HIGH_CONFIDENCE: f64 = 0.95;
const MEDIUM_CONFIDENCE: f64 = 0.85;

/// One name to screen within a batch.
#[derive(Clone, Debug, Deserialize)]
pub struct BatchItem {
  pub request_id: String,
  pub name: String,
  #[serde(default)]
  pub entity_type: Option<EntityType>,
  #[serde(default)]
  pub source: Option<Source>,
}

/// Batch-wide options; item-level type and source take precedence.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
  pub min_match: Option<f64>,
  pub limit: Option<usize>,
  pub source_filter: Option<Source>,
  pub type_filter: Option<EntityType>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
  Queued,
  Running,
  Success,
  Failed,
}

/// Terminal outcome of one batch item.
#[derive(Clone, Debug, Serialize)]
pub struct ItemOutcome {
  pub request_id: String,
  pub original_query: String,
  pub status: ItemStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_message: Option<String>,
  pub matches: Vec<SearchResult>,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct BatchStatistics {
  pub total_items: usize,
  pub items_with_matches: usize,
  pub items_without_matches: usize,
  pub items_with_errors: usize,
  pub total_matches_found: usize,
  pub average_match_score: f64,
  pub high_confidence_matches: usize,
  pub medium_confidence_matches: usize,
  pub low_confidence_matches: usize,
  pub success_rate: f64,
  pub match_rate: f64,
  pub processing_time_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchOutcome {
  pub items: Vec<ItemOutcome>,
  pub statistics: BatchStatistics,
}

/// Bounded parallel batch screener.
///
/// A fixed number of items run concurrently; each item is isolated, so one
/// failure never aborts the rest of the batch, and per-item results are
/// emitted in input order regardless of completion order.
#[derive(Clone, Debug)]
pub struct BatchExecutor {
  search: SearchService,
  workers: usize,
}

impl BatchExecutor {
  pub fn new(search: SearchService, workers: usize) -> BatchExecutor {
    BatchExecutor { search, workers: workers.max(1) }
  }

  pub async fn screen(&self, items: Vec<BatchItem>, options: BatchOptions, config: ScoreConfig) -> Result<BatchOutcome, VigilError> {
    self.screen_with_cancel(items, options, config, Arc::new(AtomicBool::new(false))).await
  }

  pub(crate) async fn screen_with_cancel(&self, items: Vec<BatchItem>, options: BatchOptions, config: ScoreConfig, cancel: Arc<AtomicBool>) -> Result<BatchOutcome, VigilError> {
    if items.len() > MAX_BATCH_SIZE {
      return Err(VigilError::BatchTooLarge(MAX_BATCH_SIZE));
    }

    let then = std::time::Instant::now();
    let semaphore = Arc::new(Semaphore::new(self.workers));

    // Kept outside the tasks so an aborted task still yields an attributable
    // failure outcome.
    let metas = items.iter().map(|item| (item.request_id.clone(), item.name.clone())).collect::<Vec<_>>();

    let tasks = items
      .into_iter()
      .map(|item| {
        let search = self.search.clone();
        let semaphore = Arc::clone(&semaphore);
        let cancel = Arc::clone(&cancel);

        tokio::spawn(async move {
          let _permit = semaphore.acquire_owned().await;

          // Cooperative cancellation: items that have not started yet fail
          // fast, in-flight ones run to completion.
          if cancel.load(Ordering::Relaxed) {
            return ItemOutcome {
              request_id: item.request_id,
              original_query: item.name,
              status: ItemStatus::Failed,
              error_message: Some("batch was cancelled".to_string()),
              matches: Vec::new(),
            };
          }

          run_item(&search, item, &options, &config)
        })
      })
      .collect::<Vec<_>>();

    let mut outcomes = Vec::with_capacity(tasks.len());

    for (task, (request_id, name)) in tasks.into_iter().zip(metas) {
      match task.await {
        Ok(outcome) => outcomes.push(outcome),

        Err(err) => {
          tracing::error!(error = err.to_string(), request_id = request_id, "batch item task aborted");

          outcomes.push(ItemOutcome {
            request_id,
            original_query: name,
            status: ItemStatus::Failed,
            error_message: Some("item processing aborted unexpectedly".to_string()),
            matches: Vec::new(),
          });
        }
      }
    }

    let statistics = statistics(&outcomes, then.elapsed());

    histogram!("vigil_batch_items").record(statistics.total_items as f64);

    Ok(BatchOutcome { items: outcomes, statistics })
  }
}

fn run_item(search: &SearchService, item: BatchItem, options: &BatchOptions, config: &ScoreConfig) -> ItemOutcome {
  let params = SearchParams {
    source: item.source.or(options.source_filter),
    entity_type: item.entity_type.or(options.type_filter),
    limit: options.limit.unwrap_or(10),
    min_match: options.min_match.unwrap_or(config.weights.minimum_score),
  };

  let query = QueryEntity::named(&item.name);

  match search.search(&query, &params, config, &SearchTrace::disabled()) {
    Ok(matches) => ItemOutcome {
      request_id: item.request_id,
      original_query: item.name,
      status: ItemStatus::Success,
      error_message: None,
      matches,
    },

    Err(err) => ItemOutcome {
      request_id: item.request_id,
      original_query: item.name,
      status: ItemStatus::Failed,
      error_message: Some(err.to_string()),
      matches: Vec::new(),
    },
  }
}

fn statistics(outcomes: &[ItemOutcome], elapsed: Duration) -> BatchStatistics {
  let total_items = outcomes.len();
  let items_with_errors = outcomes.iter().filter(|outcome| outcome.status == ItemStatus::Failed).count();
  let items_with_matches = outcomes.iter().filter(|outcome| !outcome.matches.is_empty()).count();

  let scores = outcomes.iter().flat_map(|outcome| outcome.matches.iter().map(|result| result.score)).collect::<Vec<_>>();

  let average_match_score = if scores.is_empty() { 0.0 } else { scores.iter().sum::<f64>() / scores.len() as f64 };

  BatchStatistics {
    total_items,
    items_with_matches,
    items_without_matches: total_items - items_with_matches - items_with_errors,
    items_with_errors,
    total_matches_found: scores.len(),
    average_match_score,
    high_confidence_matches: scores.iter().filter(|score| **score >= HIGH_CONFIDENCE).count(),
    medium_confidence_matches: scores.iter().filter(|score| **score >= MEDIUM_CONFIDENCE && **score < HIGH_CONFIDENCE).count(),
    low_confidence_matches: scores.iter().filter(|score| **score < MEDIUM_CONFIDENCE).count(),
    success_rate: if total_items == 0 { 0.0 } else { (total_items - items_with_errors) as f64 / total_items as f64 },
    match_rate: if total_items == 0 { 0.0 } else { items_with_matches as f64 / total_items as f64 },
    processing_time_ms: elapsed.as_millis() as u64,
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
  Pending,
  Running,
  Completed,
  Failed,
}

/// An asynchronous batch job held in memory until its TTL expires.
#[derive(Clone, Debug)]
pub struct BatchJob {
  pub id: Uuid,
  pub status: JobStatus,
  pub item_count: usize,
  pub submitted_at: Timestamp,
  pub finished_at: Option<Timestamp>,
  pub outcome: Option<BatchOutcome>,
  pub error: Option<String>,
  cancel: Arc<AtomicBool>,
  expires_at: Timestamp,
}

/// In-memory store for asynchronous batch jobs.
#[derive(Clone, Debug)]
pub struct JobStore {
  jobs: Arc<RwLock<HashMap<Uuid, BatchJob, RandomState>>>,
  ttl: Duration,
}

impl JobStore {
  pub fn new(ttl: Duration) -> JobStore {
    JobStore {
      jobs: Arc::new(RwLock::new(HashMap::default())),
      ttl,
    }
  }

  pub async fn submit(&self, executor: BatchExecutor, items: Vec<BatchItem>, options: BatchOptions, config: ScoreConfig) -> Result<BatchJob, VigilError> {
    if items.len() > MAX_BATCH_SIZE {
      return Err(VigilError::BatchTooLarge(MAX_BATCH_SIZE));
    }

    let now = Timestamp::now();
    let cancel = Arc::new(AtomicBool::new(false));

    let job = BatchJob {
      id: Uuid::new_v4(),
      status: JobStatus::Pending,
      item_count: items.len(),
      submitted_at: now,
      finished_at: None,
      outcome: None,
      error: None,
      cancel: Arc::clone(&cancel),
      expires_at: now + jiff::SignedDuration::from_secs(self.ttl.as_secs() as i64),
    };

    self.jobs.write().await.insert(job.id, job.clone());

    tokio::spawn({
      let store = self.clone();
      let job_id = job.id;

      async move {
        store.transition(job_id, JobStatus::Running).await;

        match executor.screen_with_cancel(items, options, config, cancel).await {
          Ok(outcome) => store.complete(job_id, outcome).await,
          Err(err) => store.fail(job_id, err.to_string()).await,
        }
      }
    });

    Ok(job)
  }

  pub async fn get(&self, id: Uuid) -> Result<BatchJob, VigilError> {
    let jobs = self.jobs.read().await;
    let job = jobs.get(&id).ok_or(VigilError::NotFound)?;

    if job.expires_at < Timestamp::now() {
      return Err(VigilError::NotFound);
    }

    Ok(job.clone())
  }

  /// Request cooperative cancellation: in-flight items finish, queued items
  /// fail fast. Terminal jobs are left untouched.
  pub async fn cancel(&self, id: Uuid) -> Result<BatchJob, VigilError> {
    let jobs = self.jobs.read().await;
    let job = jobs.get(&id).ok_or(VigilError::NotFound)?;

    job.cancel.store(true, Ordering::Relaxed);

    Ok(job.clone())
  }

  /// Drop expired jobs. Meant to be called periodically by the host.
  pub async fn sweep(&self) {
    let now = Timestamp::now();

    self.jobs.write().await.retain(|_, job| job.expires_at >= now);
  }

  async fn transition(&self, id: Uuid, status: JobStatus) {
    if let Some(job) = self.jobs.write().await.get_mut(&id) {
      job.status = status;
    }
  }

  async fn complete(&self, id: Uuid, outcome: BatchOutcome) {
    if let Some(job) = self.jobs.write().await.get_mut(&id) {
      job.status = JobStatus::Completed;
      job.finished_at = Some(Timestamp::now());
      job.outcome = Some(outcome);
    }
  }

  async fn fail(&self, id: Uuid, error: String) {
    if let Some(job) = self.jobs.write().await.get_mut(&id) {
      job.status = JobStatus::Failed;
      job.finished_at = Some(Timestamp::now());
      job.error = Some(error);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use crate::{
    batch::{BatchExecutor, BatchItem, BatchOptions, ItemStatus, JobStatus, JobStore, MAX_BATCH_SIZE},
    config::ScoreConfig,
    error::VigilError,
    index::EntityIndex,
    model::{Entity, EntityType, Source},
    prepare::PreparePipeline,
    search::SearchService,
  };

  fn executor() -> BatchExecutor {
    let index = Arc::new(EntityIndex::new());

    index.replace(
      &PreparePipeline::new(false),
      vec![
        Entity::new("ofac-1", Source::OfacSdn, EntityType::Person, "NICOLAS MADURO MOROS"),
        Entity::new("ofac-2", Source::OfacSdn, EntityType::Person, "PUTIN, Vladimir Vladimirovich"),
      ],
    );

    BatchExecutor::new(SearchService::new(index), 4)
  }

  fn item(id: &str, name: &str) -> BatchItem {
    BatchItem {
      request_id: id.to_string(),
      name: name.to_string(),
      entity_type: None,
      source: None,
    }
  }

  #[tokio::test]
  async fn failures_are_isolated_and_order_is_preserved() {
    let items = vec![item("r1", "Nicolas Maduro"), item("r2", ""), item("r3", "Vladimir Putin")];

    let outcome = executor()
      .screen(
        items,
        BatchOptions {
          min_match: Some(0.85),
          ..BatchOptions::default()
        },
        ScoreConfig::default(),
      )
      .await
      .unwrap();

    assert_eq!(outcome.items.len(), 3);
    assert_eq!(outcome.items[0].request_id, "r1");
    assert_eq!(outcome.items[1].request_id, "r2");
    assert_eq!(outcome.items[2].request_id, "r3");

    assert_eq!(outcome.items[0].status, ItemStatus::Success);
    assert_eq!(outcome.items[1].status, ItemStatus::Failed);
    assert!(outcome.items[1].error_message.as_deref().is_some_and(|message| !message.is_empty()));
    assert_eq!(outcome.items[2].status, ItemStatus::Success);
  }

  #[tokio::test]
  async fn statistics_add_up() {
    let items = vec![item("r1", "Nicolas Maduro"), item("r2", ""), item("r3", "Unmatchable Zebra Quixote")];

    let outcome = executor()
      .screen(
        items,
        BatchOptions {
          min_match: Some(0.85),
          ..BatchOptions::default()
        },
        ScoreConfig::default(),
      )
      .await
      .unwrap();

    let statistics = outcome.statistics;

    assert_eq!(statistics.total_items, 3);
    assert_eq!(statistics.items_with_errors, 1);
    assert_eq!(statistics.items_with_matches, 1);
    assert_eq!(statistics.items_without_matches, 1);
    assert_eq!(statistics.total_matches_found, 1);
    assert!(statistics.average_match_score >= 0.85);
    assert!((statistics.success_rate - 2.0 / 3.0).abs() < 1e-9);
  }

  #[tokio::test]
  async fn oversized_batches_are_rejected() {
    let items = (0..=MAX_BATCH_SIZE).map(|i| item(&format!("r{i}"), "name")).collect::<Vec<_>>();
    let result = executor().screen(items, BatchOptions::default(), ScoreConfig::default()).await;

    assert!(matches!(result, Err(VigilError::BatchTooLarge(_))));
  }

  #[tokio::test]
  async fn async_jobs_reach_a_terminal_state() {
    let store = JobStore::new(Duration::from_secs(60));

    let job = store
      .submit(executor(), vec![item("r1", "Nicolas Maduro")], BatchOptions::default(), ScoreConfig::default())
      .await
      .unwrap();

    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.item_count, 1);

    let mut status = job.status;

    for _ in 0..100 {
      status = store.get(job.id).await.unwrap().status;

      if status == JobStatus::Completed {
        break;
      }

      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(status, JobStatus::Completed);
    assert!(store.get(job.id).await.unwrap().outcome.is_some());
  }

  #[tokio::test]
  async fn unknown_jobs_are_not_found() {
    let store = JobStore::new(Duration::from_secs(60));

    assert!(matches!(store.get(uuid::Uuid::new_v4()).await, Err(VigilError::NotFound)));
  }

  #[tokio::test]
  async fn sweep_drops_expired_jobs() {
    let store = JobStore::new(Duration::ZERO);

    let job = store
      .submit(executor(), vec![item("r1", "Nicolas Maduro")], BatchOptions::default(), ScoreConfig::default())
      .await
      .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    store.sweep().await;

    assert!(matches!(store.get(job.id).await, Err(VigilError::NotFound)));
  }
}
