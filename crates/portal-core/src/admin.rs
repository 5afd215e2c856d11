//! Administration view model: CRUD over forms and questions.
//!
//! Every successful mutation is followed by a full refetch of both
//! collections; there is no optimistic update. Store failures are logged,
//! the loading flag is cleared and the previous lists stay in place.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  error::CascadeError,
  model::{Form, NewForm, NewQuestion, Question},
  store::PortalStore,
};

/// Shown for a question whose form no longer exists.
pub const UNKNOWN_FORM: &str = "Unknown Form";

pub const DELETE_FORM_PROMPT: &str =
  "Are you sure? This will also delete all associated questions!";
pub const DELETE_QUESTION_PROMPT: &str = "Are you sure you want to delete this question?";

// ─── Display rows ────────────────────────────────────────────────────────────

/// A question paired with the name of its form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRow {
  pub question_id: Uuid,
  pub text:        String,
  pub form_id:     Uuid,
  pub form_name:   String,
}

/// Pair every question with its form's name, keeping question order.
pub fn join_questions(forms: &[Form], questions: Vec<Question>) -> Vec<QuestionRow> {
  questions
    .into_iter()
    .map(|q| {
      let form_name = forms
        .iter()
        .find(|f| f.form_id == q.form_id)
        .map_or_else(|| UNKNOWN_FORM.to_owned(), |f| f.name.clone());
      QuestionRow {
        question_id: q.question_id,
        text: q.text,
        form_id: q.form_id,
        form_name,
      }
    })
    .collect()
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdminOutcome {
  Created { id: Uuid },
  Deleted { questions: usize },
  /// The caller did not confirm a destructive action.
  Cancelled,
}

/// Serialisable state of the view.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSnapshot {
  pub forms:         Vec<Form>,
  pub questions:     Vec<QuestionRow>,
  pub selected_form: Option<Uuid>,
  pub loading:       bool,
}

// ─── View ────────────────────────────────────────────────────────────────────

pub struct AdminView<S> {
  store:         Arc<S>,
  forms:         Vec<Form>,
  rows:          Vec<QuestionRow>,
  /// Target form for new questions.
  selected_form: Option<Uuid>,
  loading:       bool,
}

impl<S: PortalStore> AdminView<S> {
  /// A view that has not fetched yet; `loading` stays set until the first
  /// [`refresh`](Self::refresh).
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      forms: Vec::new(),
      rows: Vec::new(),
      selected_form: None,
      loading: true,
    }
  }

  pub fn forms(&self) -> &[Form] { &self.forms }

  pub fn rows(&self) -> &[QuestionRow] { &self.rows }

  pub fn selected_form(&self) -> Option<Uuid> { self.selected_form }

  pub fn is_loading(&self) -> bool { self.loading }

  pub fn snapshot(&self) -> AdminSnapshot {
    AdminSnapshot {
      forms:         self.forms.clone(),
      questions:     self.rows.clone(),
      selected_form: self.selected_form,
      loading:       self.loading,
    }
  }

  /// Refetch both collections. If nothing is selected and forms exist, the
  /// first form becomes the selection.
  pub async fn refresh(&mut self) -> Result<()> {
    self.loading = true;
    let fetched = self.fetch().await;
    self.loading = false;

    match fetched {
      Ok((forms, questions)) => {
        self.rows = join_questions(&forms, questions);
        self.forms = forms;
        if self.selected_form.is_none() {
          self.selected_form = self.forms.first().map(|f| f.form_id);
        }
        Ok(())
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to fetch forms and questions");
        Err(e)
      }
    }
  }

  async fn fetch(&self) -> Result<(Vec<Form>, Vec<Question>)> {
    let forms = self.store.list_forms().await.map_err(Error::store)?;
    let questions = self.store.list_questions(None).await.map_err(Error::store)?;
    Ok((forms, questions))
  }

  /// Refresh after a successful mutation. A failed refetch is logged inside
  /// `refresh` and does not undo the mutation.
  async fn reload(&mut self) { let _ = self.refresh().await; }

  // ── Forms ─────────────────────────────────────────────────────────────

  /// Insert a form named `name`. Blank names are rejected before any store
  /// call.
  pub async fn create_form(&mut self, name: &str) -> Result<AdminOutcome> {
    if name.trim().is_empty() {
      return Err(Error::BlankName);
    }

    let created = self
      .store
      .create_form(NewForm { name: name.to_owned() })
      .await
      .map_err(|e| self.failed("create form", Error::store(e)))?;

    tracing::info!(form_id = %created.form_id, name = %created.name, "form created");
    self.reload().await;
    Ok(AdminOutcome::Created { id: created.form_id })
  }

  /// Delete a form and, first, every question that belongs to it.
  ///
  /// Two phases with no rollback: all of the form's questions are deleted
  /// concurrently, then the form itself, but only when every question delete
  /// succeeded. A partial failure is reported as a [`CascadeError`].
  pub async fn delete_form(&mut self, form_id: Uuid, confirmed: bool) -> Result<AdminOutcome> {
    if !confirmed {
      return Ok(AdminOutcome::Cancelled);
    }

    let deleted = match self.cascade(form_id).await {
      Ok(n) => n,
      Err(e) => {
        let e = self.failed("delete form", e);
        // Some questions may be gone even though the form is not.
        self.reload().await;
        return Err(e);
      }
    };

    tracing::info!(%form_id, questions = deleted, "form deleted");
    if self.selected_form == Some(form_id) {
      self.selected_form = None;
    }
    self.reload().await;
    Ok(AdminOutcome::Deleted { questions: deleted })
  }

  async fn cascade(&self, form_id: Uuid) -> Result<usize> {
    let children = self
      .store
      .list_questions(Some(form_id))
      .await
      .map_err(Error::store)?;

    let results =
      join_all(children.iter().map(|q| self.store.delete_question(q.question_id))).await;

    let mut deleted = 0;
    let mut failed = Vec::new();
    let mut first_error = None;
    for (q, result) in children.iter().zip(results) {
      match result {
        Ok(()) => deleted += 1,
        Err(e) => {
          failed.push(q.question_id);
          first_error.get_or_insert(e);
        }
      }
    }

    if let Some(source) = first_error {
      return Err(
        CascadeError::Children { form_id, deleted, failed, source: Box::new(source) }.into(),
      );
    }

    self
      .store
      .delete_form(form_id)
      .await
      .map_err(|e| CascadeError::Parent { form_id, deleted, source: Box::new(e) })?;

    Ok(deleted)
  }

  // ── Questions ─────────────────────────────────────────────────────────

  /// Change the target form for new questions.
  pub fn select_form(&mut self, form_id: Option<Uuid>) -> Result<()> {
    if let Some(id) = form_id {
      self.ensure_known(id)?;
    }
    self.selected_form = form_id;
    Ok(())
  }

  /// Insert a question into `form_id`, or into the selected form when
  /// `form_id` is `None`.
  pub async fn create_question(
    &mut self,
    text: &str,
    form_id: Option<Uuid>,
  ) -> Result<AdminOutcome> {
    if text.trim().is_empty() {
      return Err(Error::BlankText);
    }
    let form_id = form_id.or(self.selected_form).ok_or(Error::NoFormSelected)?;
    self.ensure_known(form_id)?;

    let created = self
      .store
      .create_question(NewQuestion { text: text.to_owned(), form_id })
      .await
      .map_err(|e| self.failed("create question", Error::store(e)))?;

    tracing::info!(question_id = %created.question_id, %form_id, "question created");
    self.selected_form = Some(form_id);
    self.reload().await;
    Ok(AdminOutcome::Created { id: created.question_id })
  }

  pub async fn delete_question(
    &mut self,
    question_id: Uuid,
    confirmed: bool,
  ) -> Result<AdminOutcome> {
    if !confirmed {
      return Ok(AdminOutcome::Cancelled);
    }

    self
      .store
      .delete_question(question_id)
      .await
      .map_err(|e| self.failed("delete question", Error::store(e)))?;

    tracing::info!(%question_id, "question deleted");
    self.reload().await;
    Ok(AdminOutcome::Deleted { questions: 1 })
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  fn ensure_known(&self, form_id: Uuid) -> Result<()> {
    if self.forms.iter().any(|f| f.form_id == form_id) {
      Ok(())
    } else {
      Err(Error::UnknownForm(form_id))
    }
  }

  fn failed(&self, action: &str, e: Error) -> Error {
    tracing::error!(error = %e, "failed to {action}");
    e
  }
}
