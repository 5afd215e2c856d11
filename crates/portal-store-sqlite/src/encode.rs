//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! rating grids compact JSON.

use chrono::{DateTime, Utc};
use portal_core::model::{FeedbackSubmission, Form, Question, Ratings};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

pub fn encode_ratings(r: &Ratings) -> Result<String> { Ok(serde_json::to_string(r)?) }

/// Out-of-range ratings fail here, through `Rating`'s `TryFrom<u8>`.
pub fn decode_ratings(s: &str) -> Result<Ratings> { Ok(serde_json::from_str(s)?) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub struct RawForm {
  pub form_id:    String,
  pub name:       String,
  pub created_at: String,
}

impl RawForm {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { form_id: row.get(0)?, name: row.get(1)?, created_at: row.get(2)? })
  }

  pub fn into_form(self) -> Result<Form> {
    Ok(Form {
      form_id:    decode_uuid(&self.form_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawQuestion {
  pub question_id: String,
  pub text:        String,
  pub form_id:     String,
  pub created_at:  String,
}

impl RawQuestion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id: row.get(0)?,
      text:        row.get(1)?,
      form_id:     row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      question_id: decode_uuid(&self.question_id)?,
      text:        self.text,
      form_id:     decode_uuid(&self.form_id)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawFeedback {
  pub feedback_id:  String,
  pub form_id:      String,
  pub form_name:    String,
  pub user_id:      String,
  pub ratings_json: String,
  pub submitted_at: String,
}

impl RawFeedback {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      feedback_id:  row.get(0)?,
      form_id:      row.get(1)?,
      form_name:    row.get(2)?,
      user_id:      row.get(3)?,
      ratings_json: row.get(4)?,
      submitted_at: row.get(5)?,
    })
  }

  pub fn into_submission(self) -> Result<FeedbackSubmission> {
    Ok(FeedbackSubmission {
      feedback_id:  decode_uuid(&self.feedback_id)?,
      form_id:      decode_uuid(&self.form_id)?,
      form_name:    self.form_name,
      user_id:      self.user_id,
      ratings:      decode_ratings(&self.ratings_json)?,
      submitted_at: decode_dt(&self.submitted_at)?,
    })
  }
}
