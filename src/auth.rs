// Registration, login and bearer-token sessions
// Errors here DO surface: they become request-level failures with a status
// and message, unlike the extraction pipeline which never raises.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::db;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Bearer token issued on register/login.
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Salted SHA-256 digest, stored as `salt$hex`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let digest = digest_with_salt(&salt, password);
    format!("{salt}${digest}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => digest_with_salt(salt, password) == digest,
        None => false,
    }
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create an account and log it straight in.
pub fn register(
    conn: &Connection,
    email: &str,
    password: &str,
    ttl_minutes: i64,
) -> Result<SessionToken, AuthError> {
    if db::get_user_by_email(conn, email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let user_id = db::create_user(conn, email, &hash_password(password))?;
    info!("registered user {}", email);

    issue_session(conn, user_id, ttl_minutes)
}

pub fn login(
    conn: &Connection,
    email: &str,
    password: &str,
    ttl_minutes: i64,
) -> Result<SessionToken, AuthError> {
    let user = db::get_user_by_email(conn, email)?.ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    issue_session(conn, user.id, ttl_minutes)
}

/// Mint an opaque session token with the configured lifetime.
pub fn issue_session(
    conn: &Connection,
    user_id: i64,
    ttl_minutes: i64,
) -> Result<SessionToken, AuthError> {
    let token = uuid::Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    db::insert_session(conn, &token, user_id, expires_at)?;

    Ok(SessionToken { token, expires_at })
}

/// Resolve a bearer token to the owning user id.
pub fn authenticate(conn: &Connection, token: &str) -> Result<i64, AuthError> {
    db::lookup_session(conn, token, Utc::now())?.ok_or(AuthError::InvalidToken)
}
