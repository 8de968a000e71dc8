use std::time::Duration;

use axum::{
  Router,
  middleware,
  routing::{get, post, put},
};
use jiff::Timestamp;
use libvigil::prelude::*;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::api::config::Config;

pub mod config;
pub mod dto;
pub mod errors;

pub mod handlers;
mod middlewares;

#[derive(Clone)]
pub struct AppState<S: ListSource> {
  pub config: Config,
  pub prometheus: Option<PrometheusHandle>,
  pub vigil: Vigil<S>,
}

pub async fn routes<S: ListSource>(config: &Config, source: S) -> anyhow::Result<Router> {
  let vigil = Vigil::new(
    source,
    VigilConfig {
      batch_workers: config.batch_workers,
      job_ttl: config.job_ttl,
      ..VigilConfig::default()
    },
  );

  // Initial load plus the periodic refresh and job expiry loops.
  tokio::spawn({
    let vigil = vigil.clone();
    let interval = config.refresh_interval;

    async move {
      loop {
        if let Err(err) = vigil.refresh().await {
          tracing::warn!(error = err.to_string(), "scheduled refresh failed");
        }

        vigil.set_next_scheduled_refresh(Timestamp::now() + jiff::SignedDuration::from_secs(interval.as_secs() as i64)).await;

        tokio::time::sleep(interval).await;
      }
    }
  });

  tokio::spawn({
    let vigil = vigil.clone();

    async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60 * 60)).await;

        vigil.sweep_jobs().await;
      }
    }
  });

  let prometheus = match config.enable_prometheus {
    true => Some(crate::trace::build_prometheus()?),
    false => None,
  };

  let state = AppState {
    config: config.clone(),
    prometheus,
    vigil,
  };

  Ok(
    Router::new()
      .route("/v1/search", get(handlers::search))
      .route("/v1/search/batch", post(handlers::screen_batch))
      .route("/v1/search/batch/async", post(handlers::submit_batch))
      .route("/v1/search/batch/async/{job_id}", get(handlers::get_batch_job).delete(handlers::cancel_batch_job))
      .route("/v1/search/batch/config", get(handlers::batch_capabilities))
      .route("/v1/listinfo", get(handlers::list_info))
      .route("/v1/download/refresh", post(handlers::trigger_refresh))
      .route("/v1/download/status", get(handlers::download_status))
      .route("/admin/config", get(handlers::get_config))
      .route("/admin/config/similarity", put(handlers::update_similarity))
      .route("/admin/config/weights", put(handlers::update_weights))
      .route("/admin/config/reset", post(handlers::reset_config))
      .fallback(handlers::not_found)
      .layer(middleware::from_fn(middlewares::metrics))
      .layer(TraceLayer::new_for_http().make_span_with(middlewares::create_request_span))
      .layer(middleware::from_fn(middlewares::accept_json))
      // The routes below skip the observability middlewares above
      .route("/health", get(handlers::health))
      .route("/metrics", get(handlers::prometheus))
      .layer(middleware::from_fn(middlewares::logging::api_logger))
      .layer(middleware::from_fn(middlewares::error_envelope))
      .layer(middleware::from_fn(middlewares::request_id))
      .with_state(state),
  )
}
