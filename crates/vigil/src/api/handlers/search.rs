use axum::{
  Extension, Json,
  extract::State,
  response::IntoResponse,
};
use axum_extra::extract::{Query, WithRejection};
use libvigil::prelude::*;
use tracing::instrument;

use crate::api::{
  AppState,
  dto::{EntityHit, SearchQueryParams, SearchResponse},
  errors::AppError,
  middlewares::RequestId,
};

#[instrument(skip_all)]
pub async fn search<S: ListSource>(
  State(state): State<AppState<S>>,
  Extension(request_id): Extension<RequestId>,
  WithRejection(Query(params), _): WithRejection<Query<SearchQueryParams>, AppError>,
) -> Result<impl IntoResponse, AppError> {
  if params.name.trim().is_empty() {
    return Err(AppError::BadRequest("the name parameter is required".to_string()));
  }

  let source = parse_filter::<Source>(params.source.as_deref())?;
  let entity_type = parse_filter::<EntityType>(params.entity_type.as_deref())?;

  let search_params = SearchParams {
    source,
    entity_type,
    limit: params.limit,
    min_match: params.min_match,
  };

  let trace = SearchTrace::new(params.trace);
  let results = state.vigil.search(&QueryEntity::named(&params.name), &search_params, &trace)?;

  let response = SearchResponse {
    total_results: results.len(),
    entities: results.iter().map(EntityHit::from).collect(),
    request_id: request_id.0.to_string(),
    trace: trace.into_events(),
  };

  Ok(Json(response))
}

pub(crate) fn parse_filter<T: std::str::FromStr<Err = String>>(value: Option<&str>) -> Result<Option<T>, AppError> {
  value.map(|value| value.parse::<T>().map_err(AppError::BadRequest)).transpose()
}
