//! In-memory test doubles: a call-recording store with failure injection and
//! a fixed credential table.

use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  auth::CredentialStore,
  model::{
    FeedbackSubmission, Form, Identity, NewFeedback, NewForm, NewQuestion, Question,
  },
  store::PortalStore,
};

#[derive(Debug, Error)]
#[error("injected failure: {0}")]
pub struct Injected(pub &'static str);

/// A store call, in the order it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  CreateForm(String),
  ListForms,
  DeleteForm(Uuid),
  CreateQuestion(Uuid),
  ListQuestions(Option<Uuid>),
  DeleteQuestion(Uuid),
  SubmitFeedback(Uuid),
  ListFeedback(Option<Uuid>),
}

/// Which calls should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fail {
  CreateForm,
  ListForms,
  DeleteForm,
  ListQuestions,
  DeleteQuestion(Uuid),
  SubmitFeedback,
}

#[derive(Default)]
struct Inner {
  forms:     Vec<Form>,
  questions: Vec<Question>,
  feedback:  Vec<FeedbackSubmission>,
  calls:     Vec<Call>,
  failures:  Vec<Fail>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn fail(&self, f: Fail) { self.inner.lock().unwrap().failures.push(f); }

  pub fn heal(&self) { self.inner.lock().unwrap().failures.clear(); }

  pub fn calls(&self) -> Vec<Call> { self.inner.lock().unwrap().calls.clone() }

  pub fn clear_calls(&self) { self.inner.lock().unwrap().calls.clear(); }

  pub fn feedback(&self) -> Vec<FeedbackSubmission> {
    self.inner.lock().unwrap().feedback.clone()
  }

  /// Seed a form without recording a call.
  pub fn seed_form(&self, name: &str) -> Form {
    let form = Form { form_id: Uuid::new_v4(), name: name.into(), created_at: Utc::now() };
    self.inner.lock().unwrap().forms.push(form.clone());
    form
  }

  /// Seed a question without recording a call.
  pub fn seed_question(&self, form_id: Uuid, text: &str) -> Question {
    let q = Question {
      question_id: Uuid::new_v4(),
      text: text.into(),
      form_id,
      created_at: Utc::now(),
    };
    self.inner.lock().unwrap().questions.push(q.clone());
    q
  }

  fn record(&self, call: Call, fail: Option<Fail>) -> Result<(), Injected> {
    let mut inner = self.inner.lock().unwrap();
    inner.calls.push(call);
    match fail {
      Some(f) if inner.failures.contains(&f) => Err(Injected("configured")),
      _ => Ok(()),
    }
  }
}

impl PortalStore for MemoryStore {
  type Error = Injected;

  async fn create_form(&self, input: NewForm) -> Result<Form, Injected> {
    self.record(Call::CreateForm(input.name.clone()), Some(Fail::CreateForm))?;
    let form = Form { form_id: Uuid::new_v4(), name: input.name, created_at: Utc::now() };
    self.inner.lock().unwrap().forms.push(form.clone());
    Ok(form)
  }

  async fn list_forms(&self) -> Result<Vec<Form>, Injected> {
    self.record(Call::ListForms, Some(Fail::ListForms))?;
    Ok(self.inner.lock().unwrap().forms.clone())
  }

  async fn delete_form(&self, form_id: Uuid) -> Result<(), Injected> {
    self.record(Call::DeleteForm(form_id), Some(Fail::DeleteForm))?;
    self.inner.lock().unwrap().forms.retain(|f| f.form_id != form_id);
    Ok(())
  }

  async fn create_question(&self, input: NewQuestion) -> Result<Question, Injected> {
    self.record(Call::CreateQuestion(input.form_id), None)?;
    let q = Question {
      question_id: Uuid::new_v4(),
      text:        input.text,
      form_id:     input.form_id,
      created_at:  Utc::now(),
    };
    self.inner.lock().unwrap().questions.push(q.clone());
    Ok(q)
  }

  async fn list_questions(&self, form_id: Option<Uuid>) -> Result<Vec<Question>, Injected> {
    self.record(Call::ListQuestions(form_id), Some(Fail::ListQuestions))?;
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .questions
        .iter()
        .filter(|q| form_id.is_none_or(|id| q.form_id == id))
        .cloned()
        .collect(),
    )
  }

  async fn delete_question(&self, question_id: Uuid) -> Result<(), Injected> {
    self.record(Call::DeleteQuestion(question_id), Some(Fail::DeleteQuestion(question_id)))?;
    self.inner.lock().unwrap().questions.retain(|q| q.question_id != question_id);
    Ok(())
  }

  async fn submit_feedback(&self, input: NewFeedback) -> Result<FeedbackSubmission, Injected> {
    self.record(Call::SubmitFeedback(input.form_id), Some(Fail::SubmitFeedback))?;
    let record = FeedbackSubmission {
      feedback_id:  Uuid::new_v4(),
      form_id:      input.form_id,
      form_name:    input.form_name,
      user_id:      input.user_id,
      ratings:      input.ratings,
      submitted_at: Utc::now(),
    };
    self.inner.lock().unwrap().feedback.push(record.clone());
    Ok(record)
  }

  async fn list_feedback(&self, form_id: Option<Uuid>) -> Result<Vec<FeedbackSubmission>, Injected> {
    self.record(Call::ListFeedback(form_id), None)?;
    let inner = self.inner.lock().unwrap();
    Ok(
      inner
        .feedback
        .iter()
        .filter(|f| form_id.is_none_or(|id| f.form_id == id))
        .cloned()
        .collect(),
    )
  }
}

/// Plain-text credentials; the uid is derived from the email.
pub struct StaticCredentials {
  accounts: Vec<(String, String)>,
}

impl StaticCredentials {
  pub fn new<'a>(accounts: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
    Self {
      accounts: accounts
        .into_iter()
        .map(|(e, p)| (e.to_owned(), p.to_owned()))
        .collect(),
    }
  }
}

impl CredentialStore for StaticCredentials {
  type Error = Injected;

  async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, Injected> {
    Ok(
      self
        .accounts
        .iter()
        .find(|(e, p)| e == email && p == password)
        .map(|(e, _)| Identity { uid: format!("uid:{e}"), email: e.clone() }),
    )
  }
}
