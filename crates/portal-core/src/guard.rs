//! Route guard and navigation.
//!
//! A pure decision table over [`SessionState`]; callers translate the
//! resulting [`Access`] into whatever their transport needs.

use serde::Serialize;

use crate::{role::Role, session::SessionState};

pub const PORTAL_TITLE: &str = "Student Feedback Portal";

/// The portal's navigable routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
  Root,
  Login,
  Admin,
  Feedback,
}

impl Route {
  pub fn path(self) -> &'static str {
    match self {
      Self::Root => "/",
      Self::Login => "/login",
      Self::Admin => "/admin",
      Self::Feedback => "/feedback",
    }
  }

  /// Where a signed-in caller with `role` belongs.
  pub fn landing(role: Option<Role>) -> Self {
    match role {
      Some(Role::Admin) => Self::Admin,
      _ => Self::Feedback,
    }
  }
}

/// Outcome of guarding a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  /// The provider has not reported yet; show a pending indicator.
  Pending,
  Redirect(Route),
  Granted,
}

pub fn guard(state: &SessionState, required: Option<Role>) -> Access {
  if state.loading {
    return Access::Pending;
  }
  if state.identity.is_none() {
    return Access::Redirect(Route::Login);
  }
  match required {
    Some(role) if state.role != Some(role) => Access::Redirect(Route::landing(state.role)),
    _ => Access::Granted,
  }
}

/// Resolution of `/`.
pub fn root_redirect(state: &SessionState) -> Access {
  if state.loading {
    Access::Pending
  } else if state.identity.is_none() {
    Access::Redirect(Route::Login)
  } else {
    Access::Redirect(Route::landing(state.role))
  }
}

// ─── Navigation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
  pub label: &'static str,
  pub href:  &'static str,
}

/// The navigation bar model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nav {
  pub title:      &'static str,
  pub links:      Vec<NavLink>,
  /// Whether a logout control is shown.
  pub can_logout: bool,
}

pub fn nav(state: &SessionState) -> Nav {
  let signed_in = state.identity.is_some();
  let links = match state.role.filter(|_| signed_in) {
    Some(Role::Admin) => vec![NavLink { label: "Admin Panel", href: Route::Admin.path() }],
    Some(Role::User) => vec![NavLink { label: "Feedback Form", href: Route::Feedback.path() }],
    None => Vec::new(),
  };
  Nav { title: PORTAL_TITLE, links, can_logout: signed_in }
}
