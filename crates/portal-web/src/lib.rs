//! HTTP front end for the feedback portal.
//!
//! Exposes an axum [`Router`] serving the login, admin and feedback pages as
//! JSON view models. Each browser client is tracked by a session cookie that
//! maps to a server-side [`session::ClientSession`].

pub mod error;
pub mod handlers;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use portal_core::{auth::CredentialStore, feedback::default_subjects, store::PortalStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{admin, feedback, root};
use session::SessionRegistry;

/// A storage backend that also holds the account table.
pub trait Backend: PortalStore + CredentialStore + Clone + Send + Sync + 'static {}

impl<T> Backend for T where T: PortalStore + CredentialStore + Clone + Send + Sync + 'static {}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PORTAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  /// The one account that resolves to the admin role.
  pub admin_email: String,
  #[serde(default = "default_cookie_name")]
  pub cookie_name: String,
  #[serde(default = "default_subjects")]
  pub subjects:    Vec<String>,
  /// Seconds a session may sit unused before it is dropped.
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs: u64,
}

fn default_cookie_name() -> String { "portal_session".to_owned() }

fn default_session_ttl_secs() -> u64 { 8 * 60 * 60 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub sessions: Arc<SessionRegistry<S>>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let ttl = Duration::from_secs(config.session_ttl_secs);
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      sessions: Arc::new(SessionRegistry::new(ttl)),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the portal's axum [`Router`].
///
/// | Method   | Path                     | Access |
/// |----------|--------------------------|--------|
/// | `GET`    | `/`                      | redirect by role |
/// | `GET`    | `/login`                 | public |
/// | `POST`   | `/login`                 | public |
/// | `POST`   | `/logout`                | any |
/// | `GET`    | `/admin`                 | admin |
/// | `POST`   | `/admin/forms`           | admin |
/// | `DELETE` | `/admin/forms/{id}`      | admin, `?confirm=true` |
/// | `PUT`    | `/admin/selection`       | admin |
/// | `POST`   | `/admin/questions`       | admin |
/// | `DELETE` | `/admin/questions/{id}`  | admin, `?confirm=true` |
/// | `GET`    | `/feedback`              | user |
/// | `PUT`    | `/feedback/selection`    | user |
/// | `PUT`    | `/feedback/ratings`      | user |
/// | `POST`   | `/feedback/submit`       | user |
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/",                       get(root::index::<S>))
    .route("/login",                  get(root::login_page::<S>).post(root::login::<S>))
    .route("/logout",                 post(root::logout::<S>))
    .route("/admin",                  get(admin::page::<S>))
    .route("/admin/forms",            post(admin::create_form::<S>))
    .route("/admin/forms/{id}",       delete(admin::delete_form::<S>))
    .route("/admin/selection",        put(admin::select_form::<S>))
    .route("/admin/questions",        post(admin::create_question::<S>))
    .route("/admin/questions/{id}",   delete(admin::delete_question::<S>))
    .route("/feedback",               get(feedback::page::<S>))
    .route("/feedback/selection",     put(feedback::select_form::<S>))
    .route("/feedback/ratings",       put(feedback::set_rating::<S>))
    .route("/feedback/submit",        post(feedback::submit::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
