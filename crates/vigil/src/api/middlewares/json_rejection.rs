use std::borrow::Cow;

use axum::{
  Json, RequestExt,
  body::Body,
  extract::{FromRequest, rejection::JsonRejection},
  http::{Request, StatusCode},
  response::IntoResponse,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::api::errors::ErrorParts;

/// JSON extractor that validates the payload and rejects through the shared
/// error envelope.
pub struct TypedJson<T>(pub T);

pub enum TypedJsonRejection {
  JsonRejection(JsonRejection),
  ValidationFailed(ValidationErrors),
}

impl IntoResponse for TypedJsonRejection {
  fn into_response(self) -> axum::response::Response {
    match self {
      TypedJsonRejection::JsonRejection(err) => match err {
        JsonRejection::JsonSyntaxError(_) => ErrorParts {
          code: "invalid_input",
          message: "invalid payload format".to_string(),
          status: StatusCode::BAD_REQUEST,
        }
        .into_response(),

        JsonRejection::JsonDataError(err) => ErrorParts {
          code: "invalid_input",
          message: format!("payload does not match expected format: {err}"),
          status: StatusCode::BAD_REQUEST,
        }
        .into_response(),

        JsonRejection::MissingJsonContentType(_) => ErrorParts {
          code: "unsupported_media_type",
          message: "invalid media type, expected application/json".to_string(),
          status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
        .into_response(),

        err => ErrorParts {
          code: "invalid_input",
          message: format!("invalid payload: {err}"),
          status: StatusCode::BAD_REQUEST,
        }
        .into_response(),
      },

      TypedJsonRejection::ValidationFailed(errs) => {
        let messages = errs
          .field_errors()
          .into_iter()
          .flat_map(|(_, field)| field.clone())
          .filter_map(|field| field.message.map(Cow::into_owned))
          .collect::<Vec<_>>();

        ErrorParts {
          code: "invalid_input",
          message: format!("payload failed validation: {}", messages.join(", ")),
          status: StatusCode::BAD_REQUEST,
        }
        .into_response()
      }
    }
  }
}

impl<T, S> FromRequest<S> for TypedJson<T>
where
  T: DeserializeOwned + Validate + 'static,
  S: Send + Sync,
{
  type Rejection = TypedJsonRejection;

  async fn from_request(request: Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
    match request.extract::<Json<T>, _>().await {
      Ok(Json(dto)) => match dto.validate() {
        Ok(()) => Ok(TypedJson(dto)),
        Err(errs) => Err(TypedJsonRejection::ValidationFailed(errs)),
      },

      Err(err) => Err(TypedJsonRejection::JsonRejection(err)),
    }
  }
}
