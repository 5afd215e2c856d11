//! Error types for `portal-core`.

use thiserror::Error;
use uuid::Uuid;

/// A boxed error coming from a store or credential backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("form name must not be blank")]
  BlankName,

  #[error("question text must not be blank")]
  BlankText,

  #[error("no form selected")]
  NoFormSelected,

  #[error("form not found: {0}")]
  UnknownForm(Uuid),

  #[error("question not loaded: {0}")]
  UnknownQuestion(Uuid),

  #[error("unknown subject: {0:?}")]
  UnknownSubject(String),

  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(u8),

  #[error("subject list must be non-empty and free of duplicates")]
  InvalidSubjects,

  #[error(transparent)]
  Cascade(#[from] CascadeError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// `true` for errors raised before any store call was issued.
  pub fn is_validation(&self) -> bool {
    !matches!(self, Self::Cascade(_) | Self::Store(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A form delete that stopped part-way. Nothing is rolled back.
#[derive(Debug, Error)]
pub enum CascadeError {
  /// Some question deletes failed; the form itself was not touched.
  #[error(
    "form {form_id}: {deleted} questions deleted, {} failed; form kept",
    .failed.len()
  )]
  Children {
    form_id: Uuid,
    deleted: usize,
    failed:  Vec<Uuid>,
    #[source]
    source:  BoxError,
  },

  /// Every question was deleted but the form delete failed.
  #[error("form {form_id}: {deleted} questions deleted, form delete failed")]
  Parent {
    form_id: Uuid,
    deleted: usize,
    #[source]
    source:  BoxError,
  },
}

/// Failures of an [`AuthProvider`](crate::auth::AuthProvider) operation.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("credential store error: {0}")]
  Backend(#[source] BoxError),
}

/// Why a feedback submission did not produce a record.
#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("Please complete all feedback ratings before submitting.")]
  Incomplete { missing: usize },

  #[error("no form selected")]
  NoFormSelected,

  #[error("the selected form has no questions")]
  NoQuestions,

  #[error("a fetch or submission is already in progress")]
  Busy,

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}
