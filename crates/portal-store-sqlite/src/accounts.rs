//! Account table: the credential side of the authentication provider.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use portal_core::{auth::CredentialStore, model::Identity};
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{Error, Result, SqliteStore, encode::encode_uuid};

/// Hash `password` into an argon2 PHC string with a fresh random salt.
fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

impl SqliteStore {
  /// Create an account and return its identity. Emails are unique.
  pub async fn add_account(&self, email: &str, password: &str) -> Result<Identity> {
    let identity = Identity { uid: encode_uuid(Uuid::new_v4()), email: email.to_owned() };
    let hash = hash_password(password)?;

    let uid       = identity.uid.clone();
    let email_str = identity.email.clone();
    let inserted: bool = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO accounts (uid, email, password_hash) VALUES (?1, ?2, ?3)",
          rusqlite::params![uid, email_str, hash],
        ) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateAccount(identity.email));
    }
    tracing::info!(email = %identity.email, "account created");
    Ok(identity)
  }

  async fn find_account(&self, email: &str) -> Result<Option<(String, String)>> {
    let email = email.to_owned();
    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, password_hash FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(row)
  }
}

impl CredentialStore for SqliteStore {
  type Error = Error;

  async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>> {
    let Some((uid, stored)) = self.find_account(email).await? else {
      return Ok(None);
    };

    let parsed = PasswordHash::new(&stored).map_err(|e| Error::PasswordHash(e.to_string()))?;
    let matches = Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok();

    Ok(matches.then(|| Identity { uid, email: email.to_owned() }))
  }
}
