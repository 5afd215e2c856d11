//! Feedback submission view model.
//!
//! A user picks a form, rates every loaded question against every subject,
//! and submits the grid as one record. The grid lives only in memory until
//! submit.
//!
//! ```text
//!   NoFormSelected ──select──▶ LoadingQuestions ──fetched──▶ Ready
//!         ▲                                                  │  ▲
//!         └───────────── select(None) ◀──────────────────────┘  │ rate
//!                                      Ready ──submit──▶ Submitting ──ok──▶ Submitted
//! ```

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  error::SubmitError,
  model::{FeedbackSubmission, Form, Identity, NewFeedback, Question, Rating, Ratings},
  store::PortalStore,
};

/// The default subjects every question is rated against.
pub const SUBJECTS: [&str; 5] = ["Subject 1", "Subject 2", "Subject 3", "Subject 4", "Subject 5"];

pub const MSG_SUBMITTED: &str = "Thank you! Your feedback has been submitted successfully.";
pub const MSG_FAILED: &str = "An error occurred. Please try again.";

/// Check a subject list: non-empty, no duplicates.
pub fn validate_subjects(subjects: &[String]) -> Result<()> {
  let mut seen = std::collections::HashSet::new();
  if subjects.is_empty() || !subjects.iter().all(|s| seen.insert(s.as_str())) {
    return Err(Error::InvalidSubjects);
  }
  Ok(())
}

pub fn default_subjects() -> Vec<String> { SUBJECTS.iter().map(|s| (*s).to_owned()).collect() }

// ─── Phase ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  NoFormSelected,
  LoadingQuestions,
  Ready,
  Submitting,
  Submitted,
}

/// Identifies one question fetch. Only the ticket of the latest selection is
/// accepted by [`FeedbackView::finish_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
  generation: u64,
  form_id:    Uuid,
}

// ─── Rating matrix ───────────────────────────────────────────────────────────

/// Ratings keyed by (question, subject).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RatingMatrix(Ratings);

impl RatingMatrix {
  pub fn set(&mut self, question_id: Uuid, subject: &str, rating: Rating) {
    self.0.entry(question_id).or_default().insert(subject.to_owned(), rating);
  }

  pub fn get(&self, question_id: Uuid, subject: &str) -> Option<Rating> {
    self.0.get(&question_id)?.get(subject).copied()
  }

  /// Number of populated (question, subject) cells.
  pub fn len(&self) -> usize { self.0.values().map(BTreeMap::len).sum() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn clear(&mut self) { self.0.clear(); }

  /// Every (question, subject) pair without a rating, in question order.
  pub fn missing(&self, questions: &[Question], subjects: &[String]) -> Vec<(Uuid, String)> {
    questions
      .iter()
      .flat_map(|q| subjects.iter().map(move |s| (q.question_id, s)))
      .filter(|(qid, s)| self.get(*qid, s).is_none())
      .map(|(qid, s)| (qid, s.clone()))
      .collect()
  }

  pub fn as_ratings(&self) -> &Ratings { &self.0 }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScaleLevel {
  pub value: u8,
  pub label: &'static str,
}

/// Serialisable state of the view.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackSnapshot {
  pub phase:         Phase,
  pub forms:         Vec<Form>,
  pub selected_form: Option<Uuid>,
  pub questions:     Vec<Question>,
  pub subjects:      Vec<String>,
  pub scale:         Vec<ScaleLevel>,
  pub ratings:       RatingMatrix,
  pub message:       Option<String>,
}

// ─── View ────────────────────────────────────────────────────────────────────

pub struct FeedbackView<S> {
  store:      Arc<S>,
  subjects:   Vec<String>,
  forms:      Vec<Form>,
  selected:   Option<Uuid>,
  questions:  Vec<Question>,
  ratings:    RatingMatrix,
  phase:      Phase,
  message:    Option<String>,
  generation: u64,
}

impl<S: PortalStore> FeedbackView<S> {
  pub fn new(store: Arc<S>, subjects: Vec<String>) -> Result<Self> {
    validate_subjects(&subjects)?;
    Ok(Self {
      store,
      subjects,
      forms: Vec::new(),
      selected: None,
      questions: Vec::new(),
      ratings: RatingMatrix::default(),
      phase: Phase::NoFormSelected,
      message: None,
      generation: 0,
    })
  }

  pub fn phase(&self) -> Phase { self.phase }

  pub fn forms(&self) -> &[Form] { &self.forms }

  pub fn questions(&self) -> &[Question] { &self.questions }

  pub fn ratings(&self) -> &RatingMatrix { &self.ratings }

  pub fn message(&self) -> Option<&str> { self.message.as_deref() }

  pub fn selected_form(&self) -> Option<Uuid> { self.selected }

  pub fn snapshot(&self) -> FeedbackSnapshot {
    FeedbackSnapshot {
      phase:         self.phase,
      forms:         self.forms.clone(),
      selected_form: self.selected,
      questions:     self.questions.clone(),
      subjects:      self.subjects.clone(),
      scale:         Rating::scale()
        .map(|r| ScaleLevel { value: r.value(), label: r.label() })
        .collect(),
      ratings:       self.ratings.clone(),
      message:       self.message.clone(),
    }
  }

  /// Fetch the forms offered in the selector.
  pub async fn load_forms(&mut self) -> Result<()> {
    match self.store.list_forms().await {
      Ok(forms) => {
        self.forms = forms;
        Ok(())
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to fetch forms");
        Err(Error::store(e))
      }
    }
  }

  // ── Selection ─────────────────────────────────────────────────────────

  /// Start a selection change. Clearing the selection completes
  /// immediately and returns `None`; otherwise the returned ticket must be
  /// passed to [`finish_selection`](Self::finish_selection) with the
  /// questions fetched by [`fetch_questions`].
  ///
  /// Every call invalidates tickets handed out earlier.
  pub fn begin_selection(&mut self, form_id: Option<Uuid>) -> Result<Option<FetchTicket>> {
    if let Some(id) = form_id
      && !self.forms.iter().any(|f| f.form_id == id)
    {
      return Err(Error::UnknownForm(id));
    }

    self.generation += 1;
    self.selected = form_id;
    self.questions.clear();
    self.ratings.clear();
    self.message = None;

    match form_id {
      None => {
        self.phase = Phase::NoFormSelected;
        Ok(None)
      }
      Some(form_id) => {
        self.phase = Phase::LoadingQuestions;
        Ok(Some(FetchTicket { generation: self.generation, form_id }))
      }
    }
  }

  /// Apply a question fetch. Returns `false`, leaving the view untouched,
  /// when a newer selection has started since `ticket` was issued.
  pub fn finish_selection(&mut self, ticket: FetchTicket, fetched: Result<Vec<Question>>) -> bool {
    if ticket.generation != self.generation {
      tracing::warn!(form_id = %ticket.form_id, "discarding stale question fetch");
      return false;
    }

    match fetched {
      Ok(questions) => self.questions = questions,
      Err(e) => tracing::error!(form_id = %ticket.form_id, error = %e, "failed to fetch questions"),
    }
    self.phase = Phase::Ready;
    true
  }

  /// Select a form and load its questions in one step.
  pub async fn select_form(&mut self, form_id: Option<Uuid>) -> Result<()> {
    if let Some(ticket) = self.begin_selection(form_id)? {
      let fetched = fetch_questions(self.store.as_ref(), ticket).await;
      self.finish_selection(ticket, fetched);
    }
    Ok(())
  }

  // ── Rating ────────────────────────────────────────────────────────────

  pub fn set_rating(&mut self, question_id: Uuid, subject: &str, value: u8) -> Result<()> {
    if !self.questions.iter().any(|q| q.question_id == question_id) {
      return Err(Error::UnknownQuestion(question_id));
    }
    if !self.subjects.iter().any(|s| s == subject) {
      return Err(Error::UnknownSubject(subject.to_owned()));
    }
    let rating = Rating::new(value)?;

    self.ratings.set(question_id, subject, rating);
    if self.phase == Phase::Submitted {
      self.phase = Phase::Ready;
      self.message = None;
    }
    Ok(())
  }

  // ── Submit ────────────────────────────────────────────────────────────

  /// Write the grid as one feedback record attributed to `identity`.
  ///
  /// Nothing is written unless every loaded question has a rating for every
  /// subject. On a store failure the grid is kept so it can be resubmitted.
  pub async fn submit(&mut self, identity: &Identity) -> Result<FeedbackSubmission, SubmitError> {
    if matches!(self.phase, Phase::LoadingQuestions | Phase::Submitting) {
      return Err(SubmitError::Busy);
    }
    let form_id = self.selected.ok_or(SubmitError::NoFormSelected)?;
    if self.questions.is_empty() {
      return Err(SubmitError::NoQuestions);
    }

    let missing = self.ratings.missing(&self.questions, &self.subjects).len();
    if missing > 0 {
      return Err(SubmitError::Incomplete { missing });
    }

    let form_name = self
      .forms
      .iter()
      .find(|f| f.form_id == form_id)
      .map(|f| f.name.clone())
      .unwrap_or_default();

    self.phase = Phase::Submitting;
    self.message = None;

    let input = NewFeedback {
      form_id,
      form_name,
      user_id: identity.uid.clone(),
      ratings: self.ratings.as_ratings().clone(),
    };

    match self.store.submit_feedback(input).await {
      Ok(record) => {
        tracing::info!(
          feedback_id = %record.feedback_id,
          %form_id,
          user_id = %record.user_id,
          "feedback submitted"
        );
        self.phase = Phase::Submitted;
        self.message = Some(MSG_SUBMITTED.to_owned());
        self.ratings.clear();
        Ok(record)
      }
      Err(e) => {
        tracing::error!(%form_id, error = %e, "failed to submit feedback");
        self.phase = Phase::Ready;
        self.message = Some(MSG_FAILED.to_owned());
        Err(SubmitError::Store(Box::new(e)))
      }
    }
  }
}

/// Fetch the questions for a selection ticket. Free of the view so callers
/// can run it without holding a lock on the view.
pub async fn fetch_questions<S: PortalStore>(store: &S, ticket: FetchTicket) -> Result<Vec<Question>> {
  store.list_questions(Some(ticket.form_id)).await.map_err(Error::store)
}
