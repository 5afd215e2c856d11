//! Route handlers.
//!
//! Pages are JSON view models: the navigation bar, the signed-in user, an
//! optional error line and the page's own state flattened alongside.

pub mod admin;
pub mod feedback;
pub mod root;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use portal_core::{
  guard::{Nav, nav},
  model::Identity,
  session::SessionState,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Page<T> {
  pub nav:   Nav,
  pub user:  Option<Identity>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(flatten)]
  pub view:  T,
}

impl<T: Serialize> Page<T> {
  pub fn new(session: &SessionState, view: T) -> Self {
    Self { nav: nav(session), user: session.identity.clone(), error: None, view }
  }

  pub fn with_error(mut self, error: Option<String>) -> Self {
    self.error = error;
    self
  }

  pub fn respond(self, status: StatusCode) -> Response { (status, Json(self)).into_response() }
}
