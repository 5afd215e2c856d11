//! Records held by the portal's data store.
//!
//! Three flat collections: forms, questions and feedback submissions. There
//! is no relational integrity beyond what the view models enforce; a
//! question may outlive its form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Forms ───────────────────────────────────────────────────────────────────

/// A named collection of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
  pub form_id:    Uuid,
  pub name:       String,
  /// Store-assigned.
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_form`].
#[derive(Debug, Clone)]
pub struct NewForm {
  pub name: String,
}

// ─── Questions ───────────────────────────────────────────────────────────────

/// A single statement rated against every subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id: Uuid,
  pub text:        String,
  /// The owning form. Not checked by the store.
  pub form_id:     Uuid,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_question`].
#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub text:    String,
  pub form_id: Uuid,
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// An ordinal rating in `1..=5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: u8) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::InvalidRating(value))
    }
  }

  pub fn value(self) -> u8 { self.0 }

  /// Short label shown next to the rating control.
  pub fn label(self) -> &'static str {
    match self.0 {
      5 => "delighted",
      4 => "satisfied",
      3 => "neutral",
      2 => "dissatisfied",
      _ => "angry",
    }
  }

  /// Every level, best first; the order the controls are presented in.
  pub fn scale() -> impl Iterator<Item = Rating> {
    (Self::MIN..=Self::MAX).rev().map(Rating)
  }
}

impl TryFrom<u8> for Rating {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> { Self::new(value) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

/// Question id → subject label → rating.
pub type Ratings = BTreeMap<Uuid, BTreeMap<String, Rating>>;

// ─── Feedback ────────────────────────────────────────────────────────────────

/// One submitted rating grid. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
  pub feedback_id:  Uuid,
  pub form_id:      Uuid,
  /// The form's name at the time of submission.
  pub form_name:    String,
  /// The submitting identity's uid.
  pub user_id:      String,
  pub ratings:      Ratings,
  /// Store-assigned.
  pub submitted_at: DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::submit_feedback`].
/// `submitted_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewFeedback {
  pub form_id:   Uuid,
  pub form_name: String,
  pub user_id:   String,
  pub ratings:   Ratings,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// A signed-in identity as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub uid:   String,
  pub email: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rating_bounds() {
    assert!(Rating::new(0).is_err());
    assert!(Rating::new(6).is_err());
    for v in 1..=5 {
      assert_eq!(Rating::new(v).unwrap().value(), v);
    }
  }

  #[test]
  fn rating_scale_is_descending() {
    let values: Vec<u8> = Rating::scale().map(Rating::value).collect();
    assert_eq!(values, vec![5, 4, 3, 2, 1]);
  }

  #[test]
  fn rating_rejects_out_of_range_json() {
    assert!(serde_json::from_str::<Rating>("3").is_ok());
    assert!(serde_json::from_str::<Rating>("9").is_err());
  }
}
