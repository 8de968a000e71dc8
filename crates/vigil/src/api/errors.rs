use std::error::Error;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use libvigil::prelude::*;
use serde_json::json;
use tracing::error;

/// Pieces of the error envelope known at the point of failure. The envelope
/// middleware completes them with the request path, id and timestamp.
#[derive(Clone, Debug)]
pub(crate) struct ErrorParts {
  pub code: &'static str,
  pub message: String,
  pub status: StatusCode,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("{0}")]
  BadRequest(String),
  #[error("resource not found")]
  ResourceNotFound,
  #[error("requested representation is not available")]
  NotAcceptable,
  #[error("batch exceeds the maximum of {0} items")]
  BatchTooLarge(usize),
  #[error("a refresh is already in progress")]
  RefreshInProgress,
  #[error("watchlist data is still loading")]
  StillLoading,
  #[error("upstream list source timed out")]
  UpstreamTimeout,
  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("server error, please check the logs for more information")]
  ServerError,
  #[error(transparent)]
  OtherError(#[from] anyhow::Error),

  #[error("invalid query parameter")]
  InvalidQuery(#[from] axum_extra::extract::QueryRejection),
}

impl From<VigilError> for AppError {
  fn from(value: VigilError) -> Self {
    match value {
      VigilError::InvalidInput(message) => AppError::BadRequest(message),
      VigilError::NotFound => AppError::ResourceNotFound,
      VigilError::StillLoading => AppError::StillLoading,
      VigilError::UpstreamTimeout => AppError::UpstreamTimeout,
      VigilError::RefreshInProgress => AppError::RefreshInProgress,
      VigilError::BatchTooLarge(limit) => AppError::BatchTooLarge(limit),
      VigilError::Internal(err) => AppError::OtherError(err),
    }
  }
}

impl AppError {
  fn status(&self) -> StatusCode {
    match self {
      AppError::BadRequest(_) | AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
      AppError::ResourceNotFound => StatusCode::NOT_FOUND,
      AppError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
      AppError::BatchTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      AppError::RefreshInProgress => StatusCode::TOO_MANY_REQUESTS,
      AppError::StillLoading | AppError::UpstreamTimeout => StatusCode::SERVICE_UNAVAILABLE,
      AppError::ConfigError(_) | AppError::ServerError | AppError::OtherError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn code(&self) -> &'static str {
    match self {
      AppError::BadRequest(_) => "invalid_input",
      AppError::InvalidQuery(_) => "invalid_query",
      AppError::ResourceNotFound => "not_found",
      AppError::NotAcceptable => "not_acceptable",
      AppError::BatchTooLarge(_) => "batch_too_large",
      AppError::RefreshInProgress => "refresh_in_progress",
      AppError::StillLoading => "still_loading",
      AppError::UpstreamTimeout => "upstream_timeout",
      AppError::ConfigError(_) => "invalid_configuration",
      AppError::ServerError | AppError::OtherError(_) => "internal",
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    error!(error = self.source(), "{}", self.to_string());

    ErrorParts {
      code: self.code(),
      message: self.to_string(),
      status: self.status(),
    }
    .into_response()
  }
}

impl IntoResponse for ErrorParts {
  fn into_response(self) -> Response {
    let mut response = (
      self.status,
      Json(json!({
          "error": self.code,
          "message": self.message,
          "status": self.status.as_u16(),
      })),
    )
      .into_response();

    response.extensions_mut().insert(self);
    response
  }
}
