//! SQL schema for the portal SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Collections are returned in `rowid` order, which is insertion order.
/// `questions.form_id` deliberately has no foreign key: the portal tolerates
/// questions whose form is gone.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS forms (
    form_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL     -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS questions (
    question_id TEXT PRIMARY KEY,
    text        TEXT NOT NULL,
    form_id     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Feedback rows are append-only.
CREATE TABLE IF NOT EXISTS feedback (
    feedback_id  TEXT PRIMARY KEY,
    form_id      TEXT NOT NULL,
    form_name    TEXT NOT NULL,   -- snapshot at submit time
    user_id      TEXT NOT NULL,
    ratings_json TEXT NOT NULL,   -- {question_id: {subject: 1..5}}
    submitted_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL   -- argon2 PHC string
);

CREATE INDEX IF NOT EXISTS questions_form_idx ON questions(form_id);
CREATE INDEX IF NOT EXISTS feedback_form_idx  ON feedback(form_id);

PRAGMA user_version = 1;
";
