use jiff::Timestamp;
use libvigil::prelude::*;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use uuid::Uuid;
use validator::Validate;

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchQueryParams {
  #[serde(default)]
  pub name: String,
  #[serde_inline_default(10)]
  pub limit: usize,
  #[serde_inline_default(0.88)]
  pub min_match: f64,
  pub source: Option<String>,
  #[serde(rename = "type")]
  pub entity_type: Option<String>,
  #[serde_inline_default(false)]
  pub trace: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
  pub entities: Vec<EntityHit>,
  pub total_results: usize,
  #[serde(rename = "requestID")]
  pub request_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub trace: Option<Vec<TraceEvent>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntityHit {
  pub id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub entity_type: EntityType,
  pub source: Source,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub source_id: String,
  pub score: f64,
  pub alt_names: Vec<String>,
  pub programs: Vec<String>,
  pub breakdown: ScoreBreakdown,
}

impl From<&SearchResult> for EntityHit {
  fn from(result: &SearchResult) -> EntityHit {
    EntityHit {
      id: result.entity.id.clone(),
      name: result.entity.primary_name.clone(),
      entity_type: result.entity.entity_type,
      source: result.entity.source,
      source_id: result.entity.source_id.clone(),
      score: result.score,
      alt_names: result.entity.alt_names.clone(),
      programs: result.entity.sanctions_info.programs.clone(),
      breakdown: result.breakdown,
    }
  }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchPayload {
  #[validate(length(min = 1, message = "at least one item must be provided"))]
  pub items: Vec<BatchItemPayload>,
  #[serde(default)]
  pub min_match: Option<f64>,
  #[serde(default)]
  pub limit: Option<usize>,
  #[serde(default)]
  pub source_filter: Option<String>,
  #[serde(default)]
  pub type_filter: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchItemPayload {
  pub request_id: String,
  pub name: String,
  #[serde(default)]
  pub entity_type: Option<String>,
  #[serde(default)]
  pub source: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchResponse {
  pub items: Vec<BatchItemResponse>,
  pub statistics: BatchStatisticsResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchItemResponse {
  pub request_id: String,
  pub original_query: String,
  pub status: ItemStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_message: Option<String>,
  pub matches: Vec<EntityHit>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchStatisticsResponse {
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

impl From<BatchOutcome> for BatchResponse {
  fn from(outcome: BatchOutcome) -> BatchResponse {
    let statistics = outcome.statistics;

    BatchResponse {
      items: outcome
        .items
        .into_iter()
        .map(|item| BatchItemResponse {
          request_id: item.request_id,
          original_query: item.original_query,
          status: item.status,
          error_message: item.error_message,
          matches: item.matches.iter().map(EntityHit::from).collect(),
        })
        .collect(),
      statistics: BatchStatisticsResponse {
        total_items: statistics.total_items,
        items_with_matches: statistics.items_with_matches,
        items_without_matches: statistics.items_without_matches,
        items_with_errors: statistics.items_with_errors,
        total_matches_found: statistics.total_matches_found,
        average_match_score: statistics.average_match_score,
        high_confidence_matches: statistics.high_confidence_matches,
        medium_confidence_matches: statistics.medium_confidence_matches,
        low_confidence_matches: statistics.low_confidence_matches,
        success_rate: statistics.success_rate,
        match_rate: statistics.match_rate,
        processing_time_ms: statistics.processing_time_ms,
      },
    }
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchSubmitted {
  pub job_id: Uuid,
  pub status: JobStatus,
  pub item_count: usize,
  pub submitted_at: Timestamp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchJobResponse {
  pub job_id: Uuid,
  pub status: JobStatus,
  pub item_count: usize,
  pub submitted_at: Timestamp,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub finished_at: Option<Timestamp>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub results: Option<BatchResponse>,
}

impl From<BatchJob> for BatchJobResponse {
  fn from(job: BatchJob) -> BatchJobResponse {
    BatchJobResponse {
      job_id: job.id,
      status: job.status,
      item_count: job.item_count,
      submitted_at: job.submitted_at,
      finished_at: job.finished_at,
      error: job.error,
      results: job.outcome.map(BatchResponse::from),
    }
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchCapabilities {
  pub max_batch_size: usize,
  pub default_min_match: f64,
  pub default_limit: usize,
  pub supported_sources: Vec<&'static str>,
  pub supported_types: Vec<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListInfoResponse {
  pub sources: Vec<ListInfoSource>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<Timestamp>,
  pub total_entities: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListInfoSource {
  pub name: &'static str,
  pub entity_count: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<Timestamp>,
}

impl From<ListInfo> for ListInfoResponse {
  fn from(info: ListInfo) -> ListInfoResponse {
    ListInfoResponse {
      sources: info
        .sources
        .into_iter()
        .map(|source| ListInfoSource {
          name: source.name,
          entity_count: source.entity_count,
          last_updated: source.last_updated,
        })
        .collect(),
      last_updated: info.last_updated,
      total_entities: info.total_entities,
    }
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshAccepted {
  pub status: RefreshStatus,
  pub started_at: Timestamp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshStatusResponse {
  pub status: RefreshStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_refresh: Option<Timestamp>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_scheduled_refresh: Option<Timestamp>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_error: Option<String>,
  pub sources: Vec<RefreshStatusSource>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshStatusSource {
  pub source: Source,
  pub entity_count: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<Timestamp>,
}

impl From<RefreshState> for RefreshStatusResponse {
  fn from(state: RefreshState) -> RefreshStatusResponse {
    RefreshStatusResponse {
      status: state.status,
      last_refresh: state.last_refresh,
      next_scheduled_refresh: state.next_scheduled_refresh,
      last_error: state.last_error,
      sources: state
        .sources
        .into_iter()
        .map(|source| RefreshStatusSource {
          source: source.source,
          entity_count: source.entity_count,
          last_updated: source.last_updated,
        })
        .collect(),
    }
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Health {
  pub status: &'static str,
  pub entity_count: usize,
}

#[derive(Serialize)]
pub(crate) struct AdminConfig {
  pub similarity: SimilarityConfig,
  pub weights: WeightConfig,
}
