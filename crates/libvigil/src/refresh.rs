use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use anyhow::Context;
use jiff::Timestamp;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
  error::VigilError,
  index::EntityIndex,
  model::{Entity, Source},
  prepare::PreparePipeline,
};

/// Entities delivered by one watchlist, already parsed into typed records.
#[derive(Clone, Debug)]
pub struct SourceBatch {
  pub source: Source,
  pub entities: Vec<Entity>,
}

/// Ingestion boundary: downloaders and parsers live behind this trait and
/// deliver fully populated raw entities. Preparation stays on this side.
pub trait ListSource: Clone + Send + Sync + 'static {
  fn fetch(&self) -> impl Future<Output = anyhow::Result<Vec<SourceBatch>>> + Send;
}

/// Fetches pre-parsed entity feeds over HTTP, one endpoint per watchlist.
#[derive(Clone, Debug)]
pub struct HttpListSource {
  client: reqwest::Client,
  endpoints: Vec<(Source, String)>,
}

impl HttpListSource {
  pub fn new(endpoints: Vec<(Source, String)>, timeout: Duration) -> anyhow::Result<HttpListSource> {
    let client = reqwest::Client::builder().timeout(timeout).build().context("could not build list source client")?;

    Ok(HttpListSource { client, endpoints })
  }
}

impl ListSource for HttpListSource {
  async fn fetch(&self) -> anyhow::Result<Vec<SourceBatch>> {
    let mut batches = Vec::with_capacity(self.endpoints.len());

    for (source, url) in &self.endpoints {
      let entities = self
        .client
        .get(url)
        .send()
        .await
        .with_context(|| format!("could not reach {source} feed"))?
        .error_for_status()
        .with_context(|| format!("{source} feed returned an error"))?
        .json::<Vec<Entity>>()
        .await
        .with_context(|| format!("invalid {source} feed payload"))?;

      tracing::info!(source = source.as_str(), entities = entities.len(), "fetched list");

      batches.push(SourceBatch { source: *source, entities });
    }

    Ok(batches)
  }
}

/// Fixed in-memory source, used by tests and local development.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
  pub batches: Vec<SourceBatch>,
}

impl ListSource for StaticSource {
  async fn fetch(&self) -> anyhow::Result<Vec<SourceBatch>> {
    Ok(self.batches.clone())
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshStatus {
  Idle,
  Refreshing,
  Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct SourceRefresh {
  pub source: Source,
  pub entity_count: usize,
  pub last_updated: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefreshState {
  pub status: RefreshStatus,
  pub last_refresh: Option<Timestamp>,
  pub next_scheduled_refresh: Option<Timestamp>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_error: Option<String>,
  pub sources: Vec<SourceRefresh>,
}

impl Default for RefreshState {
  fn default() -> RefreshState {
    RefreshState {
      status: RefreshStatus::Idle,
      last_refresh: None,
      next_scheduled_refresh: None,
      last_error: None,
      sources: Vec::new(),
    }
  }
}

/// Drives fetch, preparation and the atomic index swap.
///
/// The live index stays untouched until a refresh fully succeeds; a failing
/// source leaves the previous corpus serving and flags the error on the
/// status surface.
#[derive(Clone, Debug)]
pub struct RefreshCoordinator<S: ListSource> {
  source: S,
  index: Arc<EntityIndex>,
  state: Arc<RwLock<RefreshState>>,
  running: Arc<AtomicBool>,
}

impl<S: ListSource> RefreshCoordinator<S> {
  pub fn new(source: S, index: Arc<EntityIndex>) -> RefreshCoordinator<S> {
    RefreshCoordinator {
      source,
      index,
      state: Arc::new(RwLock::new(RefreshState::default())),
      running: Arc::new(AtomicBool::new(false)),
    }
  }

  pub async fn state(&self) -> RefreshState {
    self.state.read().await.clone()
  }

  pub async fn set_next_scheduled(&self, at: Timestamp) {
    self.state.write().await.next_scheduled_refresh = Some(at);
  }

  /// Claim the single refresh slot.
  ///
  /// Returns [`VigilError::RefreshInProgress`] when another refresh holds
  /// it. The claim must be consumed by [`RefreshCoordinator::run_claimed`].
  pub fn try_begin(&self) -> Result<(), VigilError> {
    if self.running.swap(true, Ordering::AcqRel) {
      return Err(VigilError::RefreshInProgress);
    }

    Ok(())
  }

  /// Fetch every list and atomically swap the index.
  pub async fn refresh(&self, pipeline: PreparePipeline) -> Result<(), VigilError> {
    self.try_begin()?;
    self.run_claimed(pipeline).await
  }

  /// Run a refresh for which [`RefreshCoordinator::try_begin`] already
  /// claimed the slot; always releases it.
  pub async fn run_claimed(&self, pipeline: PreparePipeline) -> Result<(), VigilError> {
    self.state.write().await.status = RefreshStatus::Refreshing;

    let result = self.source.fetch().await;
    let now = Timestamp::now();

    match result {
      Ok(batches) => {
        let sources = batches
          .iter()
          .map(|batch| SourceRefresh {
            source: batch.source,
            entity_count: batch.entities.len(),
            last_updated: Some(now),
          })
          .collect::<Vec<_>>();

        let entities = batches.into_iter().flat_map(|batch| batch.entities).collect::<Vec<_>>();

        self.index.replace(&pipeline, entities);

        let mut state = self.state.write().await;

        state.status = RefreshStatus::Idle;
        state.last_refresh = Some(now);
        state.last_error = None;
        state.sources = sources;

        self.running.store(false, Ordering::Release);

        Ok(())
      }

      Err(err) => {
        tracing::error!(error = err.to_string(), "refresh failed, keeping previous index");

        let timed_out = err.downcast_ref::<reqwest::Error>().is_some_and(reqwest::Error::is_timeout);

        let mut state = self.state.write().await;

        state.status = RefreshStatus::Error;
        state.last_error = Some(err.to_string());

        self.running.store(false, Ordering::Release);

        if timed_out { Err(VigilError::UpstreamTimeout) } else { Err(VigilError::Internal(err)) }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crate::{
    error::VigilError,
    index::EntityIndex,
    model::{Entity, EntityType, Source},
    prepare::PreparePipeline,
    refresh::{RefreshCoordinator, RefreshStatus, SourceBatch, StaticSource},
  };

  fn source() -> StaticSource {
    StaticSource {
      batches: vec![
        SourceBatch {
          source: Source::OfacSdn,
          entities: vec![Entity::new("a", Source::OfacSdn, EntityType::Person, "MADURO MOROS, Nicolas")],
        },
        SourceBatch {
          source: Source::UkCsl,
          entities: vec![Entity::new("b", Source::UkCsl, EntityType::Business, "Acme Ltd")],
        },
      ],
    }
  }

  #[tokio::test]
  async fn refresh_swaps_the_index() {
    let index = Arc::new(EntityIndex::new());
    let coordinator = RefreshCoordinator::new(source(), Arc::clone(&index));

    coordinator.refresh(PreparePipeline::new(false)).await.unwrap();

    assert_eq!(index.len(), 2);

    let state = coordinator.state().await;

    assert_eq!(state.status, RefreshStatus::Idle);
    assert!(state.last_refresh.is_some());
    assert_eq!(state.sources.len(), 2);
    assert_eq!(state.sources[0].entity_count, 1);
  }

  #[tokio::test]
  async fn concurrent_refreshes_are_rejected() {
    #[derive(Clone)]
    struct SlowSource;

    impl super::ListSource for SlowSource {
      async fn fetch(&self) -> anyhow::Result<Vec<super::SourceBatch>> {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        Ok(Vec::new())
      }
    }

    let coordinator = RefreshCoordinator::new(SlowSource, Arc::new(EntityIndex::new()));

    let first = tokio::spawn({
      let coordinator = coordinator.clone();

      async move { coordinator.refresh(PreparePipeline::new(false)).await }
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(matches!(coordinator.refresh(PreparePipeline::new(false)).await, Err(VigilError::RefreshInProgress)));

    first.await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn failed_refresh_keeps_previous_index() {
    #[derive(Clone)]
    struct BrokenSource;

    impl super::ListSource for BrokenSource {
      async fn fetch(&self) -> anyhow::Result<Vec<super::SourceBatch>> {
        anyhow::bail!("parser exploded")
      }
    }

    let index = Arc::new(EntityIndex::new());

    index.replace(
      &PreparePipeline::new(false),
      vec![Entity::new("keep", Source::OfacSdn, EntityType::Person, "Somebody")],
    );

    let coordinator = RefreshCoordinator::new(BrokenSource, Arc::clone(&index));

    assert!(coordinator.refresh(PreparePipeline::new(false)).await.is_err());
    assert_eq!(index.len(), 1);

    let state = coordinator.state().await;

    assert_eq!(state.status, RefreshStatus::Error);
    assert!(state.last_error.is_some());
  }
}
