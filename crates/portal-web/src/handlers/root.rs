//! `/`, `/login` and `/logout`.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{StatusCode, header},
  response::{IntoResponse, Redirect, Response},
};
use portal_core::{
  auth::PasswordAuth,
  guard::{Access, PORTAL_TITLE, Route, root_redirect},
  session::Session,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState, Backend,
  error::Error,
  handlers::Page,
  session::{ClientSession, CurrentSession, expired_cookie, session_cookie},
};

/// `GET /`: send the caller to the page for their role.
pub async fn index<S: Backend>(current: CurrentSession<S>) -> Response {
  Error::Guard(root_redirect(&current.state())).into_response()
}

#[derive(Debug, Serialize)]
pub struct LoginView {
  pub title: &'static str,
}

/// `GET /login`. Already signed-in callers go to their landing page.
pub async fn login_page<S: Backend>(current: CurrentSession<S>) -> Response {
  let state = current.state();
  if state.identity.is_some() {
    return Error::Guard(Access::Redirect(Route::landing(state.role))).into_response();
  }
  Page::new(&state, LoginView { title: PORTAL_TITLE }).respond(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /login`, body: `{"email":"…","password":"…"}`
///
/// On success a new session replaces any previous one for this client.
pub async fn login<S: Backend>(
  State(state): State<AppState<S>>,
  current: CurrentSession<S>,
  Json(body): Json<LoginBody>,
) -> Result<Response, Error> {
  let provider = Arc::new(PasswordAuth::new(state.store.clone()));
  let session = Session::new(provider, state.config.admin_email.clone());
  let signed_in = session
    .sign_in(&body.email, &body.password)
    .await
    .map_err(|_| Error::LoginFailed)?;

  if let Some(old) = &current.token {
    state.sessions.remove(old).await;
  }
  let client = ClientSession::new(state.store.clone(), &state.config.subjects, session)?;
  let token = state.sessions.insert(client).await;

  let landing = Route::landing(signed_in.role);
  Ok(
    (
      [(header::SET_COOKIE, session_cookie(&state.config.cookie_name, &token))],
      Redirect::to(landing.path()),
    )
      .into_response(),
  )
}

/// `POST /logout`
pub async fn logout<S: Backend>(
  State(state): State<AppState<S>>,
  current: CurrentSession<S>,
) -> Response {
  if let Some(client) = &current.client
    && let Err(e) = client.session.logout().await
  {
    tracing::warn!(error = %e, "sign-out failed");
  }
  if let Some(token) = &current.token {
    state.sessions.remove(token).await;
  }
  (
    [(header::SET_COOKIE, expired_cookie(&state.config.cookie_name))],
    Redirect::to(Route::Login.path()),
  )
    .into_response()
}
