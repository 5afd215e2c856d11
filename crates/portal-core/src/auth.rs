//! Authentication provider seam and the password-based provider.
//!
//! A provider publishes identity changes on a [`watch`] channel. The channel
//! starts in [`AuthState::Pending`] and moves to `SignedIn`/`SignedOut` once
//! the provider knows who (if anyone) is signed in.

use std::{future::Future, sync::Arc};

use tokio::sync::watch;

use crate::{error::AuthError, model::Identity};

// ─── State ───────────────────────────────────────────────────────────────────

/// The latest identity notification from a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
  /// No notification has been delivered yet.
  #[default]
  Pending,
  SignedOut,
  SignedIn(Identity),
}

impl AuthState {
  pub fn identity(&self) -> Option<&Identity> {
    match self {
      Self::SignedIn(id) => Some(id),
      _ => None,
    }
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// A backend able to check an email/password pair.
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the matching identity, or `None` if the email is unknown or the
  /// password is wrong.
  fn verify<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;
}

/// Issues identities and notifies subscribers of sign-in/sign-out.
pub trait AuthProvider: Send + Sync {
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity, AuthError>> + Send + 'a;

  fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send + '_;

  /// A receiver that observes every subsequent identity change.
  fn subscribe(&self) -> watch::Receiver<AuthState>;
}

// ─── PasswordAuth ────────────────────────────────────────────────────────────

/// Email/password provider backed by a [`CredentialStore`].
///
/// One instance tracks one client's identity.
pub struct PasswordAuth<C> {
  credentials: Arc<C>,
  state:       watch::Sender<AuthState>,
}

impl<C: CredentialStore> PasswordAuth<C> {
  pub fn new(credentials: Arc<C>) -> Self {
    let (state, _) = watch::channel(AuthState::Pending);
    Self { credentials, state }
  }

  /// Deliver the first notification without a sign-in: the client is known
  /// to be signed out. No-op once any notification has been sent.
  pub fn settle(&self) {
    self.state.send_if_modified(|s| {
      if *s == AuthState::Pending {
        *s = AuthState::SignedOut;
        true
      } else {
        false
      }
    });
  }
}

impl<C: CredentialStore> AuthProvider for PasswordAuth<C> {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    let verified = self.credentials.verify(email, password).await;
    match verified {
      Ok(Some(identity)) => {
        tracing::info!(email = %identity.email, "signed in");
        self.state.send_replace(AuthState::SignedIn(identity.clone()));
        Ok(identity)
      }
      Ok(None) => {
        tracing::warn!(%email, "sign-in rejected");
        self.settle();
        Err(AuthError::InvalidCredentials)
      }
      Err(e) => {
        tracing::error!(%email, error = %e, "credential check failed");
        self.settle();
        Err(AuthError::Backend(Box::new(e)))
      }
    }
  }

  async fn sign_out(&self) -> Result<(), AuthError> {
    if let AuthState::SignedIn(id) = self.state.send_replace(AuthState::SignedOut) {
      tracing::info!(email = %id.email, "signed out");
    }
    Ok(())
  }

  fn subscribe(&self) -> watch::Receiver<AuthState> { self.state.subscribe() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::StaticCredentials;

  fn provider() -> PasswordAuth<StaticCredentials> {
    PasswordAuth::new(Arc::new(StaticCredentials::new([(
      "student@portal.test",
      "hunter2",
    )])))
  }

  #[tokio::test]
  async fn starts_pending() {
    let auth = provider();
    assert_eq!(*auth.subscribe().borrow(), AuthState::Pending);
  }

  #[tokio::test]
  async fn sign_in_publishes_identity() {
    let auth = provider();
    let mut rx = auth.subscribe();

    let id = auth.sign_in("student@portal.test", "hunter2").await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().identity(), Some(&id));
  }

  #[tokio::test]
  async fn wrong_password_settles_signed_out() {
    let auth = provider();
    let err = auth.sign_in("student@portal.test", "nope").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
  }

  #[tokio::test]
  async fn failed_sign_in_keeps_existing_identity() {
    let auth = provider();
    auth.sign_in("student@portal.test", "hunter2").await.unwrap();
    assert!(auth.sign_in("student@portal.test", "nope").await.is_err());
    assert!(auth.subscribe().borrow().identity().is_some());
  }

  #[tokio::test]
  async fn sign_out_clears_identity() {
    let auth = provider();
    auth.sign_in("student@portal.test", "hunter2").await.unwrap();
    auth.sign_out().await.unwrap();
    assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
  }

  #[test]
  fn settle_only_replaces_pending() {
    let auth = provider();
    auth.settle();
    assert_eq!(*auth.subscribe().borrow(), AuthState::SignedOut);
    auth.state.send_replace(AuthState::SignedIn(Identity {
      uid:   "u".into(),
      email: "e".into(),
    }));
    auth.settle();
    assert!(auth.subscribe().borrow().identity().is_some());
  }
}
