//! Coarse access roles.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::Identity;

/// The access level of a signed-in identity.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  User,
}

/// Derive the role of `identity`.
///
/// The comparison is exact: `admin_email` is the single configured
/// administrator address.
pub fn resolve_role(identity: Option<&Identity>, admin_email: &str) -> Option<Role> {
  identity.map(|id| {
    if id.email == admin_email {
      Role::Admin
    } else {
      Role::User
    }
  })
}
