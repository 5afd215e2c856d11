//! Handlers for `/feedback` endpoints.

use axum::{Json, extract::State, http::StatusCode, response::Response};
use portal_core::{
  error::SubmitError,
  feedback::{FeedbackSnapshot, fetch_questions},
  guard::{Access, Route},
  role::Role,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, Backend, error::Error, handlers::Page, session::CurrentSession};

#[derive(Debug, Serialize)]
pub struct FeedbackPage {
  #[serde(flatten)]
  pub snapshot:    FeedbackSnapshot,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub feedback_id: Option<Uuid>,
}

fn render<S: Backend>(
  current: &CurrentSession<S>,
  snapshot: FeedbackSnapshot,
  feedback_id: Option<Uuid>,
  error: Option<String>,
  status: StatusCode,
) -> Response {
  Page::new(&current.state(), FeedbackPage { snapshot, feedback_id })
    .with_error(error)
    .respond(status)
}

/// `GET /feedback`
pub async fn page<S: Backend>(current: CurrentSession<S>) -> Result<Response, Error> {
  let client = current.require(Role::User)?;
  let mut view = client.feedback.lock().await;
  let _ = view.load_forms().await;
  Ok(render(&current, view.snapshot(), None, None, StatusCode::OK))
}

#[derive(Debug, Deserialize)]
pub struct SelectBody {
  pub form_id: Option<Uuid>,
}

/// `PUT /feedback/selection`, body: `{"form_id":"…"}` or `{"form_id":null}`
///
/// The view is unlocked while questions are fetched; a fetch overtaken by a
/// newer selection is discarded.
pub async fn select_form<S: Backend>(
  State(state): State<AppState<S>>,
  current: CurrentSession<S>,
  Json(body): Json<SelectBody>,
) -> Result<Response, Error> {
  let client = current.require(Role::User)?;

  let ticket = {
    let mut view = client.feedback.lock().await;
    if let Some(id) = body.form_id
      && !view.forms().iter().any(|f| f.form_id == id)
    {
      let _ = view.load_forms().await;
    }
    view.begin_selection(body.form_id)?
  };

  if let Some(ticket) = ticket {
    let fetched = fetch_questions(state.store.as_ref(), ticket).await;
    client.feedback.lock().await.finish_selection(ticket, fetched);
  }

  let view = client.feedback.lock().await;
  Ok(render(&current, view.snapshot(), None, None, StatusCode::OK))
}

#[derive(Debug, Deserialize)]
pub struct RateBody {
  pub question_id: Uuid,
  pub subject:     String,
  pub rating:      u8,
}

/// `PUT /feedback/ratings`, body: `{"question_id":"…","subject":"Subject 1","rating":5}`
pub async fn set_rating<S: Backend>(
  current: CurrentSession<S>,
  Json(body): Json<RateBody>,
) -> Result<Response, Error> {
  let client = current.require(Role::User)?;
  let mut view = client.feedback.lock().await;
  view.set_rating(body.question_id, &body.subject, body.rating)?;
  Ok(render(&current, view.snapshot(), None, None, StatusCode::OK))
}

/// `POST /feedback/submit`
///
/// A store failure answers 502 with the grid intact and the view's failure
/// message set.
pub async fn submit<S: Backend>(current: CurrentSession<S>) -> Result<Response, Error> {
  let client = current.require(Role::User)?;
  let identity = current
    .state()
    .identity
    .ok_or(Error::Guard(Access::Redirect(Route::Login)))?;

  let mut view = client.feedback.lock().await;
  let (status, feedback_id, error) = match view.submit(&identity).await {
    Ok(record) => (StatusCode::OK, Some(record.feedback_id), None),
    Err(
      e @ (SubmitError::Incomplete { .. } | SubmitError::NoFormSelected | SubmitError::NoQuestions),
    ) => (StatusCode::UNPROCESSABLE_ENTITY, None, Some(e.to_string())),
    Err(e @ SubmitError::Busy) => (StatusCode::CONFLICT, None, Some(e.to_string())),
    Err(SubmitError::Store(_)) => (StatusCode::BAD_GATEWAY, None, None),
  };
  Ok(render(&current, view.snapshot(), feedback_id, error, status))
}
