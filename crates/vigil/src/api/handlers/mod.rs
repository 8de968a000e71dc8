mod admin;
mod batch;
mod lists;
mod search;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use libvigil::prelude::*;

use crate::api::{AppState, dto::Health, errors::AppError};

pub use self::admin::{get_config, reset_config, update_similarity, update_weights};
pub use self::batch::{batch_capabilities, cancel_batch_job, get_batch_job, screen_batch, submit_batch};
pub use self::lists::{download_status, list_info, trigger_refresh};
pub use self::search::search;

pub async fn not_found() -> impl IntoResponse {
  AppError::ResourceNotFound
}

pub async fn health<S: ListSource>(State(state): State<AppState<S>>) -> Json<Health> {
  let ready = state.vigil.is_ready();

  Json(Health {
    status: if ready { "healthy" } else { "starting" },
    entity_count: state.vigil.entity_count(),
  })
}

pub async fn prometheus<S: ListSource>(State(state): State<AppState<S>>) -> (StatusCode, String) {
  let Some(prometheus) = state.prometheus else {
    return (StatusCode::NOT_FOUND, String::default());
  };

  (StatusCode::OK, prometheus.render())
}
