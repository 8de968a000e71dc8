use axum::{
  Json,
  body::Body,
  http::{Request, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use jiff::Timestamp;
use metrics::counter;
use opentelemetry::global;
use opentelemetry_http::HeaderExtractor;
use serde_json::json;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::api::errors::{AppError, ErrorParts};

pub(crate) mod json_rejection;
pub(crate) mod logging;

#[derive(Clone, Debug)]
pub(crate) struct RequestId(pub Uuid);

/// Attach a request id, honoring a caller-supplied `X-Request-Id` when it is
/// a valid UUID.
pub(crate) async fn request_id(request: Request<Body>, next: Next) -> Result<Response, StatusCode> {
  let (mut parts, body) = request.into_parts();

  let request_id = parts
    .headers
    .get("x-request-id")
    .and_then(|value| value.to_str().ok())
    .and_then(|value| Uuid::parse_str(value).ok())
    .map(RequestId)
    .unwrap_or_else(|| RequestId(Uuid::new_v4()));

  parts.extensions.insert(request_id.clone());

  let mut response = next.run(Request::from_parts(parts, body)).await;

  if let Ok(value) = request_id.0.to_string().parse() {
    response.headers_mut().insert("x-request-id", value);
  }

  response.extensions_mut().insert::<RequestId>(request_id);

  Ok(response)
}

/// Every error leaves through the same JSON envelope, completed here with
/// the request path, id and timestamp.
pub(crate) async fn error_envelope(request: Request<Body>, next: Next) -> Result<Response, StatusCode> {
  let path = request.uri().path().to_string();
  let request_id = request.extensions().get::<RequestId>().map(|id| id.0.to_string()).unwrap_or_default();

  let response = next.run(request).await;

  let Some(parts) = response.extensions().get::<ErrorParts>().cloned() else {
    return Ok(response);
  };

  let envelope = (
    parts.status,
    Json(json!({
        "error": parts.code,
        "message": parts.message,
        "status": parts.status.as_u16(),
        "path": path,
        "requestId": request_id,
        "timestamp": Timestamp::now().to_string(),
    })),
  )
    .into_response();

  Ok(envelope)
}

/// The API only ever produces JSON.
pub(crate) async fn accept_json(request: Request<Body>, next: Next) -> Result<Response, StatusCode> {
  let acceptable = match request.headers().get(header::ACCEPT).and_then(|value| value.to_str().ok()) {
    Some(accept) => accept.split(',').any(|media| {
      let media = media.split(';').next().unwrap_or_default().trim();

      media == "*/*" || media == "application/*" || media == "application/json"
    }),

    None => true,
  };

  if !acceptable {
    return Ok(AppError::NotAcceptable.into_response());
  }

  Ok(next.run(request).await)
}

pub(super) async fn metrics(request: Request<Body>, next: Next) -> Result<Response, StatusCode> {
  let response = next.run(request).await;

  counter!("http_requests_total", "status" => response.status().as_u16().to_string()).increment(1);

  Ok(response)
}

pub(crate) fn create_request_span(req: &axum::extract::Request) -> Span {
  let parent = global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(req.headers())));
  let request_id = req.extensions().get::<RequestId>().map(|id| id.0.to_string()).unwrap_or_default();

  let span = tracing::info_span!("request", request_id = request_id);

  span.set_parent(parent);
  span
}
