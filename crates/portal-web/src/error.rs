//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use portal_core::guard::Access;
use serde_json::json;
use thiserror::Error;

pub const LOGIN_FAILED: &str = "Failed to log in. Please check your credentials.";

#[derive(Debug, Error)]
pub enum Error {
  /// The route guard did not grant access.
  #[error("route guard: {0:?}")]
  Guard(Access),

  #[error("Failed to log in. Please check your credentials.")]
  LoginFailed,

  /// A destructive action was requested without `?confirm=true`.
  #[error("{0}")]
  ConfirmationRequired(&'static str),

  #[error(transparent)]
  Core(#[from] portal_core::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Guard(Access::Pending) => {
        (StatusCode::ACCEPTED, Json(json!({ "status": "pending" }))).into_response()
      }
      Error::Guard(Access::Redirect(route)) => Redirect::to(route.path()).into_response(),
      Error::Guard(Access::Granted) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
      Error::LoginFailed => {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": LOGIN_FAILED }))).into_response()
      }
      Error::ConfirmationRequired(prompt) => (
        StatusCode::PRECONDITION_REQUIRED,
        Json(json!({ "error": prompt, "confirm": true })),
      )
        .into_response(),
      Error::Core(e) => {
        let status = if e.is_validation() {
          StatusCode::UNPROCESSABLE_ENTITY
        } else {
          StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": e.to_string() }))).into_response()
      }
    }
  }
}
