//! Cookie-keyed client sessions.
//!
//! A successful sign-in creates one [`ClientSession`] holding the signed-in
//! [`Session`] and that client's admin and feedback views. The registry maps
//! an opaque random token, carried in a cookie, to the session. A session
//! left idle for longer than the registry's TTL is dropped.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::Arc,
  time::{Duration, Instant},
};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use portal_core::{
  admin::AdminView,
  auth::PasswordAuth,
  feedback::FeedbackView,
  guard::{Access, Route, guard},
  role::Role,
  session::{Session, SessionState},
};
use rand_core::{OsRng, RngCore as _};
use tokio::sync::{Mutex, RwLock};

use crate::{AppState, Backend, error::Error};

const TOKEN_BYTES: usize = 32;

// ─── Client session ──────────────────────────────────────────────────────────

pub struct ClientSession<S> {
  pub session:  Session<PasswordAuth<S>>,
  pub admin:    Mutex<AdminView<S>>,
  pub feedback: Mutex<FeedbackView<S>>,
}

impl<S: Backend> ClientSession<S> {
  pub fn new(
    store: Arc<S>,
    subjects: &[String],
    session: Session<PasswordAuth<S>>,
  ) -> Result<Self, Error> {
    let feedback = FeedbackView::new(store.clone(), subjects.to_vec())?;
    Ok(Self {
      session,
      admin: Mutex::new(AdminView::new(store)),
      feedback: Mutex::new(feedback),
    })
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

struct Entry<S> {
  client:    Arc<ClientSession<S>>,
  last_seen: Instant,
}

impl<S> Entry<S> {
  fn is_idle(&self, ttl: Duration) -> bool { self.last_seen.elapsed() >= ttl }
}

pub struct SessionRegistry<S> {
  ttl:      Duration,
  sessions: RwLock<HashMap<String, Entry<S>>>,
}

impl<S> SessionRegistry<S> {
  pub fn new(ttl: Duration) -> Self { Self { ttl, sessions: RwLock::new(HashMap::new()) } }

  /// Store `client` under a fresh token and return the token. Idle sessions
  /// are swept first.
  pub async fn insert(&self, client: ClientSession<S>) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_idle(self.ttl));
    let evicted = before - sessions.len();
    if evicted > 0 {
      tracing::debug!(evicted, "dropped idle sessions");
    }

    sessions.insert(token.clone(), Entry { client: Arc::new(client), last_seen: Instant::now() });
    token
  }

  /// The live session for `token`, marked as used. An idle session is
  /// removed and reported as absent.
  pub async fn get(&self, token: &str) -> Option<Arc<ClientSession<S>>> {
    let mut sessions = self.sessions.write().await;
    let entry = sessions.get_mut(token)?;
    if entry.is_idle(self.ttl) {
      sessions.remove(token);
      return None;
    }
    entry.last_seen = Instant::now();
    Some(entry.client.clone())
  }

  pub async fn remove(&self, token: &str) -> Option<Arc<ClientSession<S>>> {
    self.sessions.write().await.remove(token).map(|entry| entry.client)
  }

  #[cfg(test)]
  pub(crate) async fn len(&self) -> usize { self.sessions.read().await.len() }
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// Find the value of cookie `name` in the request's `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v.to_owned())
}

pub fn session_cookie(name: &str, token: &str) -> String {
  format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_cookie(name: &str) -> String {
  format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The caller's session, if its cookie names a live one.
pub struct CurrentSession<S> {
  pub token:  Option<String>,
  pub client: Option<Arc<ClientSession<S>>>,
}

impl<S: Backend> CurrentSession<S> {
  pub fn state(&self) -> SessionState {
    self
      .client
      .as_ref()
      .map_or_else(SessionState::anonymous, |c| c.session.state())
  }

  /// Apply the route guard for `role`, returning the session on success.
  pub fn require(&self, role: Role) -> Result<Arc<ClientSession<S>>, Error> {
    match guard(&self.state(), Some(role)) {
      Access::Granted => self
        .client
        .clone()
        .ok_or(Error::Guard(Access::Redirect(Route::Login))),
      access => Err(Error::Guard(access)),
    }
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for CurrentSession<S> {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = cookie_value(&parts.headers, &state.config.cookie_name);
    let client = match &token {
      Some(t) => state.sessions.get(t).await,
      None => None,
    };
    Ok(Self { token, client })
  }
}
