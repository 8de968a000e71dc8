use axum::{Json, extract::State, response::IntoResponse};
use libvigil::prelude::*;

use crate::api::{AppState, dto::AdminConfig, errors::AppError, middlewares::json_rejection::TypedJson};

pub async fn get_config<S: ListSource>(State(state): State<AppState<S>>) -> Json<AdminConfig> {
  let config = state.vigil.score_config();

  Json(AdminConfig {
    similarity: config.similarity,
    weights: config.weights,
  })
}

pub async fn update_similarity<S: ListSource>(State(state): State<AppState<S>>, TypedJson(similarity): TypedJson<SimilarityConfig>) -> Result<impl IntoResponse, AppError> {
  state.vigil.update_similarity(similarity)?;

  tracing::info!("similarity configuration updated");

  Ok(get_config(State(state)).await)
}

pub async fn update_weights<S: ListSource>(State(state): State<AppState<S>>, TypedJson(weights): TypedJson<WeightConfig>) -> Result<impl IntoResponse, AppError> {
  state.vigil.update_weights(weights)?;

  tracing::info!("weight configuration updated");

  Ok(get_config(State(state)).await)
}

pub async fn reset_config<S: ListSource>(State(state): State<AppState<S>>) -> impl IntoResponse {
  state.vigil.reset_config();

  tracing::info!("scoring configuration reset to defaults");

  get_config(State(state)).await
}
