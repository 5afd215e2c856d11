//! Handlers for `/admin` endpoints.
//!
//! Every response carries the refreshed admin snapshot. A store failure is
//! logged by the view and answered with the snapshot as it stood before.

use axum::{
  Json,
  extract::{Path, Query},
  http::StatusCode,
  response::Response,
};
use portal_core::{
  admin::{AdminOutcome, AdminSnapshot, AdminView, DELETE_FORM_PROMPT, DELETE_QUESTION_PROMPT},
  role::Role,
};
use serde::{Deserialize, Serialize};
use tokio::sync::MutexGuard;
use uuid::Uuid;

use crate::{
  Backend,
  error::Error,
  handlers::Page,
  session::{ClientSession, CurrentSession},
};

#[derive(Debug, Serialize)]
pub struct AdminPage {
  #[serde(flatten)]
  pub snapshot: AdminSnapshot,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result:   Option<AdminOutcome>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Confirm {
  #[serde(default)]
  pub confirm: bool,
}

fn render<S: Backend>(
  current: &CurrentSession<S>,
  snapshot: AdminSnapshot,
  result: Option<AdminOutcome>,
  status: StatusCode,
) -> Response {
  Page::new(&current.state(), AdminPage { snapshot, result }).respond(status)
}

/// Map a mutation result onto a response.
fn finish<S: Backend>(
  current: &CurrentSession<S>,
  snapshot: AdminSnapshot,
  result: portal_core::Result<AdminOutcome>,
) -> Result<Response, Error> {
  match result {
    Ok(outcome @ AdminOutcome::Created { .. }) => {
      Ok(render(current, snapshot, Some(outcome), StatusCode::CREATED))
    }
    Ok(outcome) => Ok(render(current, snapshot, Some(outcome), StatusCode::OK)),
    Err(e) if e.is_validation() => Err(e.into()),
    Err(_) => Ok(render(current, snapshot, None, StatusCode::OK)),
  }
}

/// An unconfirmed delete asks the client to repeat with `?confirm=true`.
fn require_confirmed(
  result: &portal_core::Result<AdminOutcome>,
  prompt: &'static str,
) -> Result<(), Error> {
  match result {
    Ok(AdminOutcome::Cancelled) => Err(Error::ConfirmationRequired(prompt)),
    _ => Ok(()),
  }
}

/// Mutations check ids against the fetched lists, so a view that has never
/// been refreshed is refreshed first.
async fn lock_loaded<S: Backend>(client: &ClientSession<S>) -> MutexGuard<'_, AdminView<S>> {
  let mut view = client.admin.lock().await;
  if view.is_loading() {
    let _ = view.refresh().await;
  }
  view
}

/// `GET /admin`
pub async fn page<S: Backend>(current: CurrentSession<S>) -> Result<Response, Error> {
  let client = current.require(Role::Admin)?;
  let mut view = client.admin.lock().await;
  let _ = view.refresh().await;
  Ok(render(&current, view.snapshot(), None, StatusCode::OK))
}

#[derive(Debug, Deserialize)]
pub struct CreateFormBody {
  pub name: String,
}

/// `POST /admin/forms`, body: `{"name":"Course X"}`
pub async fn create_form<S: Backend>(
  current: CurrentSession<S>,
  Json(body): Json<CreateFormBody>,
) -> Result<Response, Error> {
  let client = current.require(Role::Admin)?;
  let mut view = lock_loaded(&client).await;
  let result = view.create_form(&body.name).await;
  finish(&current, view.snapshot(), result)
}

/// `DELETE /admin/forms/{id}?confirm=true`
pub async fn delete_form<S: Backend>(
  current: CurrentSession<S>,
  Path(id): Path<Uuid>,
  Query(q): Query<Confirm>,
) -> Result<Response, Error> {
  let client = current.require(Role::Admin)?;
  let mut view = lock_loaded(&client).await;
  let result = view.delete_form(id, q.confirm).await;
  require_confirmed(&result, DELETE_FORM_PROMPT)?;
  finish(&current, view.snapshot(), result)
}

#[derive(Debug, Deserialize)]
pub struct SelectBody {
  pub form_id: Option<Uuid>,
}

/// `PUT /admin/selection`, body: `{"form_id":"…"}` or `{"form_id":null}`
pub async fn select_form<S: Backend>(
  current: CurrentSession<S>,
  Json(body): Json<SelectBody>,
) -> Result<Response, Error> {
  let client = current.require(Role::Admin)?;
  let mut view = lock_loaded(&client).await;
  view.select_form(body.form_id)?;
  Ok(render(&current, view.snapshot(), None, StatusCode::OK))
}

#[derive(Debug, Deserialize)]
pub struct CreateQuestionBody {
  pub text:    String,
  /// Defaults to the selected form.
  #[serde(default)]
  pub form_id: Option<Uuid>,
}

/// `POST /admin/questions`, body: `{"text":"…","form_id":"…"}`
pub async fn create_question<S: Backend>(
  current: CurrentSession<S>,
  Json(body): Json<CreateQuestionBody>,
) -> Result<Response, Error> {
  let client = current.require(Role::Admin)?;
  let mut view = lock_loaded(&client).await;
  let result = view.create_question(&body.text, body.form_id).await;
  finish(&current, view.snapshot(), result)
}

/// `DELETE /admin/questions/{id}?confirm=true`
pub async fn delete_question<S: Backend>(
  current: CurrentSession<S>,
  Path(id): Path<Uuid>,
  Query(q): Query<Confirm>,
) -> Result<Response, Error> {
  let client = current.require(Role::Admin)?;
  let mut view = lock_loaded(&client).await;
  let result = view.delete_question(id, q.confirm).await;
  require_confirmed(&result, DELETE_QUESTION_PROMPT)?;
  finish(&current, view.snapshot(), result)
}
