use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use libvigil::prelude::*;

use crate::api::{
  AppState,
  dto::{ListInfoResponse, RefreshAccepted, RefreshStatusResponse},
  errors::AppError,
};

pub async fn list_info<S: ListSource>(State(state): State<AppState<S>>) -> Json<ListInfoResponse> {
  Json(ListInfoResponse::from(state.vigil.list_info()))
}

/// Kick off a background refresh; 429 when one is already running. The live
/// index keeps serving until the new corpus is fully prepared.
pub async fn trigger_refresh<S: ListSource>(State(state): State<AppState<S>>) -> Result<impl IntoResponse, AppError> {
  let started_at = state.vigil.start_refresh()?;

  Ok((
    StatusCode::OK,
    Json(RefreshAccepted {
      status: RefreshStatus::Refreshing,
      started_at,
    }),
  ))
}

pub async fn download_status<S: ListSource>(State(state): State<AppState<S>>) -> Json<RefreshStatusResponse> {
  Json(RefreshStatusResponse::from(state.vigil.refresh_state().await))
}
