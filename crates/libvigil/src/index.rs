use std::{
  collections::HashMap,
  sync::{Arc, RwLock},
};

use ahash::RandomState;
use jiff::Timestamp;
use serde::Serialize;

use crate::{
  model::{Entity, Source},
  prepare::PreparePipeline,
};

/// In-memory store of prepared entities.
///
/// Readers grab an [`IndexSnapshot`] and keep it for the duration of one
/// search; refreshes publish a fully built snapshot through a single atomic
/// swap, so an in-flight search never observes a partially refreshed index.
#[derive(Debug, Default)]
pub struct EntityIndex {
  inner: RwLock<Arc<IndexSnapshot>>,
}

#[derive(Debug, Default)]
pub struct IndexSnapshot {
  pub entities: Vec<Arc<Entity>>,
  pub built_at: Option<Timestamp>,
  pub sources: HashMap<Source, SourceInfo, RandomState>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SourceInfo {
  pub entity_count: usize,
  pub last_updated: Timestamp,
}

impl EntityIndex {
  pub fn new() -> EntityIndex {
    EntityIndex::default()
  }

  /// Current immutable view of the corpus.
  pub fn snapshot(&self) -> Arc<IndexSnapshot> {
    match self.inner.read() {
      Ok(guard) => Arc::clone(&guard),
      Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
  }

  pub fn len(&self) -> usize {
    self.snapshot().entities.len()
  }

  pub fn is_empty(&self) -> bool {
    self.snapshot().entities.is_empty()
  }

  /// Prepare every entity and atomically swap the live index.
  ///
  /// Parsers never need to know normalization rules; this is the single
  /// place where [`PreparePipeline`] runs.
  pub fn replace(&self, pipeline: &PreparePipeline, mut entities: Vec<Entity>) {
    let now = Timestamp::now();
    let mut sources: HashMap<Source, SourceInfo, RandomState> = HashMap::default();

    for entity in &mut entities {
      pipeline.prepare(entity);

      sources
        .entry(entity.source)
        .and_modify(|info| info.entity_count += 1)
        .or_insert(SourceInfo { entity_count: 1, last_updated: now });
    }

    let snapshot = Arc::new(IndexSnapshot {
      entities: entities.into_iter().map(Arc::new).collect(),
      built_at: Some(now),
      sources,
    });

    match self.inner.write() {
      Ok(mut guard) => *guard = snapshot,
      Err(poisoned) => *poisoned.into_inner() = snapshot,
    }

    tracing::info!(entities = self.len(), "published new entity index");
  }
}
