//! [`SqliteStore`], the SQLite implementation of [`PortalStore`].

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use portal_core::{
  model::{FeedbackSubmission, Form, NewFeedback, NewForm, NewQuestion, Question},
  store::PortalStore,
};

use crate::{
  Result,
  encode::{RawFeedback, RawForm, RawQuestion, encode_dt, encode_ratings, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A portal store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `DELETE ... WHERE <id column> = ?1`.
  async fn delete_by_id(&self, sql: &'static str, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(sql, rusqlite::params![id_str])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PortalStore impl ────────────────────────────────────────────────────────

impl PortalStore for SqliteStore {
  type Error = crate::Error;

  // ── Forms ─────────────────────────────────────────────────────────────────

  async fn create_form(&self, input: NewForm) -> Result<Form> {
    let form = Form { form_id: Uuid::new_v4(), name: input.name, created_at: Utc::now() };

    let id_str = encode_uuid(form.form_id);
    let name   = form.name.clone();
    let at_str = encode_dt(form.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO forms (form_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(form)
  }

  async fn list_forms(&self) -> Result<Vec<Form>> {
    let raws: Vec<RawForm> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT form_id, name, created_at FROM forms ORDER BY rowid")?;
        let rows = stmt
          .query_map([], RawForm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawForm::into_form).collect()
  }

  async fn delete_form(&self, form_id: Uuid) -> Result<()> {
    self.delete_by_id("DELETE FROM forms WHERE form_id = ?1", form_id).await
  }

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn create_question(&self, input: NewQuestion) -> Result<Question> {
    let question = Question {
      question_id: Uuid::new_v4(),
      text:        input.text,
      form_id:     input.form_id,
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(question.question_id);
    let text        = question.text.clone();
    let form_id_str = encode_uuid(question.form_id);
    let at_str      = encode_dt(question.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO questions (question_id, text, form_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, text, form_id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(question)
  }

  async fn list_questions(&self, form_id: Option<Uuid>) -> Result<Vec<Question>> {
    let form_id_str = form_id.map(encode_uuid);

    let raws: Vec<RawQuestion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT question_id, text, form_id, created_at
           FROM questions
           WHERE ?1 IS NULL OR form_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![form_id_str], RawQuestion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuestion::into_question).collect()
  }

  async fn delete_question(&self, question_id: Uuid) -> Result<()> {
    self
      .delete_by_id("DELETE FROM questions WHERE question_id = ?1", question_id)
      .await
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  async fn submit_feedback(&self, input: NewFeedback) -> Result<FeedbackSubmission> {
    let record = FeedbackSubmission {
      feedback_id:  Uuid::new_v4(),
      form_id:      input.form_id,
      form_name:    input.form_name,
      user_id:      input.user_id,
      ratings:      input.ratings,
      submitted_at: Utc::now(),
    };

    let id_str       = encode_uuid(record.feedback_id);
    let form_id_str  = encode_uuid(record.form_id);
    let form_name    = record.form_name.clone();
    let user_id      = record.user_id.clone();
    let ratings_json = encode_ratings(&record.ratings)?;
    let at_str       = encode_dt(record.submitted_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feedback (
             feedback_id, form_id, form_name, user_id, ratings_json, submitted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, form_id_str, form_name, user_id, ratings_json, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn list_feedback(&self, form_id: Option<Uuid>) -> Result<Vec<FeedbackSubmission>> {
    let form_id_str = form_id.map(encode_uuid);

    let raws: Vec<RawFeedback> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT feedback_id, form_id, form_name, user_id, ratings_json, submitted_at
           FROM feedback
           WHERE ?1 IS NULL OR form_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![form_id_str], RawFeedback::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeedback::into_submission).collect()
  }
}
