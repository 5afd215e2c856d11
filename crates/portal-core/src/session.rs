//! The client session: current identity, its role, and a loading flag.
//!
//! A [`Session`] is constructed explicitly around one provider and holds the
//! only subscription to that provider's identity notifications. Everything
//! else reads the derived [`SessionState`].

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::{
  auth::{AuthProvider, AuthState},
  error::AuthError,
  model::Identity,
  role::{Role, resolve_role},
};

/// Identity, role and loading flag as seen by the route guard and views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
  pub identity: Option<Identity>,
  pub role:     Option<Role>,
  /// `true` until the provider has delivered its first notification.
  pub loading:  bool,
}

impl SessionState {
  pub fn resolve(auth: &AuthState, admin_email: &str) -> Self {
    let identity = auth.identity().cloned();
    Self {
      role: resolve_role(identity.as_ref(), admin_email),
      identity,
      loading: matches!(auth, AuthState::Pending),
    }
  }

  /// The state of a client that has never contacted a provider.
  pub fn anonymous() -> Self {
    Self { identity: None, role: None, loading: false }
  }
}

pub struct Session<P> {
  provider:    Arc<P>,
  admin_email: String,
  auth:        watch::Receiver<AuthState>,
}

impl<P: AuthProvider> Session<P> {
  pub fn new(provider: Arc<P>, admin_email: impl Into<String>) -> Self {
    let auth = provider.subscribe();
    Self { provider, admin_email: admin_email.into(), auth }
  }

  pub fn state(&self) -> SessionState {
    SessionState::resolve(&self.auth.borrow(), &self.admin_email)
  }

  /// Wait for the next identity notification and return the new state.
  /// Returns `None` once the provider has been dropped.
  pub async fn changed(&mut self) -> Option<SessionState> {
    self.auth.changed().await.ok()?;
    Some(self.state())
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionState, AuthError> {
    self.provider.sign_in(email, password).await?;
    Ok(self.state())
  }

  /// Sign out through the provider. On success the state carries neither an
  /// identity nor a role.
  pub async fn logout(&self) -> Result<(), AuthError> { self.provider.sign_out().await }

  pub fn provider(&self) -> &P { &self.provider }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{auth::PasswordAuth, testing::StaticCredentials};

  const ADMIN: &str = "admin@portal.test";

  fn session() -> Session<PasswordAuth<StaticCredentials>> {
    let creds = StaticCredentials::new([(ADMIN, "root"), ("student@portal.test", "pw")]);
    Session::new(Arc::new(PasswordAuth::new(Arc::new(creds))), ADMIN)
  }

  #[tokio::test]
  async fn loading_until_first_notification() {
    let mut s = session();
    assert!(s.state().loading);
    assert_eq!(s.state().role, None);

    s.provider().settle();
    let next = s.changed().await.unwrap();
    assert!(!next.loading);
    assert_eq!(next.identity, None);
  }

  #[tokio::test]
  async fn admin_sign_in_resolves_admin_role() {
    let s = session();
    let state = s.sign_in(ADMIN, "root").await.unwrap();
    assert_eq!(state.role, Some(Role::Admin));
    assert!(!state.loading);
  }

  #[tokio::test]
  async fn user_sign_in_then_logout() {
    let s = session();
    let state = s.sign_in("student@portal.test", "pw").await.unwrap();
    assert_eq!(state.role, Some(Role::User));

    s.logout().await.unwrap();
    let after = s.state();
    assert_eq!(after.identity, None);
    assert_eq!(after.role, None);
    assert!(!after.loading);
  }

  #[test]
  fn resolve_pending_is_loading() {
    let state = SessionState::resolve(&AuthState::Pending, ADMIN);
    assert!(state.loading);
    assert_eq!(state, SessionState { loading: true, ..SessionState::anonymous() });
  }
}
