use std::sync::Arc;

use bumpalo::Bump;
use metrics::histogram;
use rayon::prelude::*;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use tracing::instrument;

use crate::{
  config::ScoreConfig,
  error::VigilError,
  index::EntityIndex,
  model::{EntityType, QueryEntity, SearchResult, Source},
  prepare::PreparePipeline,
  scoring::EntityScorer,
  trace::SearchTrace,
};

/// Settings for a single search.
#[serde_inline_default]
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SearchParams {
  pub source: Option<Source>,
  pub entity_type: Option<EntityType>,
  /// Maximum number of results to return.
  #[serde_inline_default(10)]
  pub limit: usize,
  /// Minimum score to be considered a match.
  #[serde_inline_default(0.88)]
  pub min_match: f64,
}

impl Default for SearchParams {
  fn default() -> SearchParams {
    SearchParams {
      source: None,
      entity_type: None,
      limit: 10,
      min_match: 0.88,
    }
  }
}

/// Candidate enumeration, scoring, ranking and truncation over one index
/// snapshot.
#[derive(Clone, Debug)]
pub struct SearchService {
  index: Arc<EntityIndex>,
}

impl SearchService {
  pub fn new(index: Arc<EntityIndex>) -> SearchService {
    SearchService { index }
  }

  /// Score the query against every matching candidate in the current
  /// snapshot, keep results at or above `min_match`, and return them sorted
  /// by descending score with a stable id tie-break.
  #[instrument(name = "search", skip_all, fields(query = query.name))]
  pub fn search(&self, query: &QueryEntity, params: &SearchParams, config: &ScoreConfig, trace: &SearchTrace) -> Result<Vec<SearchResult>, VigilError> {
    if query.name.trim().is_empty() {
      return Err(VigilError::InvalidInput("query name must not be empty".to_string()));
    }

    if !(0.0..=1.0).contains(&params.min_match) {
      return Err(VigilError::InvalidInput("min_match must be within [0, 1]".to_string()));
    }

    if params.limit == 0 {
      return Err(VigilError::InvalidInput("limit must be positive".to_string()));
    }

    let snapshot = self.index.snapshot();

    if snapshot.entities.is_empty() {
      return Err(VigilError::StillLoading);
    }

    let mut query = query.clone();

    PreparePipeline::new(config.similarity.keep_stopwords).prepare_query(&mut query);

    trace.record("prepare", || format!("normalized query to {:?}", query.prepared.normalized_name));

    let scorer = EntityScorer::new(config);
    let then = std::time::Instant::now();

    let mut results = snapshot
      .entities
      .par_iter()
      .filter(|entity| params.source.is_none_or(|source| entity.source == source))
      .filter(|entity| params.entity_type.is_none_or(|entity_type| entity.entity_type == entity_type))
      .map_init(
        || Bump::with_capacity(1024),
        |bump, entity| {
          let breakdown = scorer.score(bump, &query, entity, trace);

          bump.reset();

          histogram!("vigil_scoring_scores").record(breakdown.total_weighted_score);

          SearchResult {
            entity: Arc::clone(entity),
            score: breakdown.total_weighted_score,
            breakdown,
          }
        },
      )
      .filter(|result| result.score >= params.min_match)
      .collect::<Vec<_>>();

    histogram!("vigil_scoring_latency_seconds").record(then.elapsed().as_secs_f64());

    results.sort_unstable_by(|lhs, rhs| lhs.score.total_cmp(&rhs.score).reverse().then_with(|| lhs.entity.id.cmp(&rhs.entity.id)));
    results.truncate(params.limit);

    trace.record("rank", || format!("{} result(s) at or above {}", results.len(), params.min_match));

    Ok(results)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use float_cmp::approx_eq;

  use crate::{
    config::ScoreConfig,
    error::VigilError,
    index::EntityIndex,
    model::{Entity, EntityType, QueryEntity, Source},
    prepare::PreparePipeline,
    search::{SearchParams, SearchService},
    trace::SearchTrace,
  };

  fn service() -> SearchService {
    let index = Arc::new(EntityIndex::new());

    index.replace(
      &PreparePipeline::new(false),
      vec![
        Entity::new("ofac-1", Source::OfacSdn, EntityType::Person, "NICOLAS MADURO MOROS"),
        Entity::new("ofac-2", Source::OfacSdn, EntityType::Person, "PUTIN, Vladimir Vladimirovich"),
        Entity::new("eu-1", Source::EuCsl, EntityType::Business, "Acme Trading LLC"),
      ],
    );

    SearchService::new(index)
  }

  fn params(min_match: f64) -> SearchParams {
    SearchParams {
      min_match,
      ..SearchParams::default()
    }
  }

  #[test]
  fn finds_close_names() {
    let results = service()
      .search(&QueryEntity::named("Nicolas Maduro"), &params(0.85), &ScoreConfig::default(), &SearchTrace::disabled())
      .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entity.id, "ofac-1");
    assert!(results[0].score >= 0.85);
  }

  #[test]
  fn source_filter_excludes() {
    let results = service()
      .search(
        &QueryEntity::named("Nicolas Maduro"),
        &SearchParams {
          source: Some(Source::EuCsl),
          min_match: 0.5,
          ..SearchParams::default()
        },
        &ScoreConfig::default(),
        &SearchTrace::disabled(),
      )
      .unwrap();

    assert!(results.iter().all(|result| result.entity.source == Source::EuCsl));
    assert!(!results.iter().any(|result| result.entity.id == "ofac-1"));
  }

  #[test]
  fn results_are_sorted_and_truncated() {
    let results = service()
      .search(
        &QueryEntity::named("Nicolas Maduro"),
        &SearchParams {
          min_match: 0.0,
          limit: 2,
          ..SearchParams::default()
        },
        &ScoreConfig::default(),
        &SearchTrace::disabled(),
      )
      .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].score >= results[1].score);
  }

  #[test]
  fn empty_name_is_invalid() {
    let result = service().search(&QueryEntity::named("  "), &params(0.88), &ScoreConfig::default(), &SearchTrace::disabled());

    assert!(matches!(result, Err(VigilError::InvalidInput(_))));
  }

  #[test]
  fn out_of_range_min_match_is_invalid() {
    let result = service().search(&QueryEntity::named("Maduro"), &params(1.5), &ScoreConfig::default(), &SearchTrace::disabled());

    assert!(matches!(result, Err(VigilError::InvalidInput(_))));
  }

  #[test]
  fn empty_index_is_still_loading() {
    let search = SearchService::new(Arc::new(EntityIndex::new()));
    let result = search.search(&QueryEntity::named("Maduro"), &params(0.88), &ScoreConfig::default(), &SearchTrace::disabled());

    assert!(matches!(result, Err(VigilError::StillLoading)));
  }

  #[test]
  fn scores_equal_breakdown_totals() {
    let results = service()
      .search(
        &QueryEntity::named("Nicolas Maduro"),
        &SearchParams {
          min_match: 0.0,
          ..SearchParams::default()
        },
        &ScoreConfig::default(),
        &SearchTrace::disabled(),
      )
      .unwrap();

    for result in results {
      assert!(approx_eq!(f64, result.score, result.breakdown.total_weighted_score));
    }
  }

  #[test]
  fn trace_captures_phases() {
    let trace = SearchTrace::new(true);

    service().search(&QueryEntity::named("Nicolas Maduro"), &params(0.85), &ScoreConfig::default(), &trace).unwrap();

    let events = trace.into_events().unwrap();

    assert!(events.iter().any(|event| event.phase == "prepare"));
    assert!(events.iter().any(|event| event.phase == "rank"));
  }
}
