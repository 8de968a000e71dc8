use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use libvigil::prelude::*;
use tracing::instrument;
use uuid::Uuid;

use crate::api::{
  AppState,
  dto::{BatchCapabilities, BatchItemPayload, BatchJobResponse, BatchPayload, BatchResponse, BatchSubmitted},
  errors::AppError,
  handlers::search::parse_filter,
  middlewares::json_rejection::TypedJson,
};

#[instrument(skip_all, fields(items = body.items.len()))]
pub async fn screen_batch<S: ListSource>(State(state): State<AppState<S>>, TypedJson(body): TypedJson<BatchPayload>) -> Result<impl IntoResponse, AppError> {
  let (items, options) = convert(&body)?;
  let outcome = state.vigil.screen(items, options).await?;

  Ok(Json(BatchResponse::from(outcome)))
}

#[instrument(skip_all, fields(items = body.items.len()))]
pub async fn submit_batch<S: ListSource>(State(state): State<AppState<S>>, TypedJson(body): TypedJson<BatchPayload>) -> Result<impl IntoResponse, AppError> {
  let (items, options) = convert(&body)?;
  let job = state.vigil.submit_batch(items, options).await?;

  let response = BatchSubmitted {
    job_id: job.id,
    status: job.status,
    item_count: job.item_count,
    submitted_at: job.submitted_at,
  };

  Ok((StatusCode::ACCEPTED, Json(response)))
}

pub async fn get_batch_job<S: ListSource>(State(state): State<AppState<S>>, Path(job_id): Path<String>) -> Result<impl IntoResponse, AppError> {
  let job = state.vigil.batch_job(parse_job_id(&job_id)?).await?;

  Ok(Json(BatchJobResponse::from(job)))
}

/// Cooperative cancellation: in-flight items finish, queued items never
/// start.
pub async fn cancel_batch_job<S: ListSource>(State(state): State<AppState<S>>, Path(job_id): Path<String>) -> Result<impl IntoResponse, AppError> {
  let job = state.vigil.cancel_batch_job(parse_job_id(&job_id)?).await?;

  Ok(Json(BatchJobResponse::from(job)))
}

pub async fn batch_capabilities() -> Json<BatchCapabilities> {
  Json(BatchCapabilities {
    max_batch_size: MAX_BATCH_SIZE,
    default_min_match: 0.88,
    default_limit: 10,
    supported_sources: Source::ALL.iter().map(Source::as_str).collect(),
    supported_types: vec!["person", "business", "organization", "vessel", "aircraft"],
  })
}

fn parse_job_id(value: &str) -> Result<Uuid, AppError> {
  Uuid::parse_str(value).map_err(|_| AppError::ResourceNotFound)
}

fn convert(body: &BatchPayload) -> Result<(Vec<BatchItem>, BatchOptions), AppError> {
  let items = body.items.iter().map(convert_item).collect::<Result<Vec<_>, _>>()?;

  let options = BatchOptions {
    min_match: body.min_match,
    limit: body.limit,
    source_filter: parse_filter::<Source>(body.source_filter.as_deref())?,
    type_filter: parse_filter::<EntityType>(body.type_filter.as_deref())?,
  };

  if let Some(min_match) = options.min_match
    && !(0.0..=1.0).contains(&min_match)
  {
    return Err(AppError::BadRequest("minMatch must be within [0, 1]".to_string()));
  }

  Ok((items, options))
}

fn convert_item(item: &BatchItemPayload) -> Result<BatchItem, AppError> {
  Ok(BatchItem {
    request_id: item.request_id.clone(),
    name: item.name.clone(),
    entity_type: parse_filter::<EntityType>(item.entity_type.as_deref())?,
    source: parse_filter::<Source>(item.source.as_deref())?,
  })
}
