//! The `PortalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `portal-store-sqlite`).
//! The view models depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::model::{FeedbackSubmission, Form, NewFeedback, NewForm, NewQuestion, Question};

/// Create/read/delete access to the three portal collections.
///
/// Lists are returned in insertion order. Deleting an id that does not exist
/// succeeds. No referential integrity is enforced between collections.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PortalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Forms ─────────────────────────────────────────────────────────────

  /// Persist a new form; the id and timestamp are assigned by the store.
  fn create_form(
    &self,
    input: NewForm,
  ) -> impl Future<Output = Result<Form, Self::Error>> + Send + '_;

  fn list_forms(&self) -> impl Future<Output = Result<Vec<Form>, Self::Error>> + Send + '_;

  fn delete_form(
    &self,
    form_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Questions ─────────────────────────────────────────────────────────

  fn create_question(
    &self,
    input: NewQuestion,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  /// List questions, optionally restricted to those whose `form_id` equals
  /// the given id.
  fn list_questions(
    &self,
    form_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  fn delete_question(
    &self,
    question_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Feedback ──────────────────────────────────────────────────────────

  /// Persist a submission; `submitted_at` is set by the store.
  fn submit_feedback(
    &self,
    input: NewFeedback,
  ) -> impl Future<Output = Result<FeedbackSubmission, Self::Error>> + Send + '_;

  fn list_feedback(
    &self,
    form_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<FeedbackSubmission>, Self::Error>> + Send + '_;
}
