use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use crate::extract::Category;
use crate::record::ExpenseRecord;

/// Registered account. The password hash is the salted digest produced by
/// [`crate::auth::hash_password`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

/// A persisted expense record plus its row id.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReceipt {
    pub id: i64,
    pub vendor: String,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    pub raw_text: String,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            token TEXT UNIQUE NOT NULL,
            user_id INTEGER NOT NULL,
            expires_at TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS receipts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            vendor TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            raw_text TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipts_user ON receipts(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_receipts_date ON receipts(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_token ON sessions(token)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// Receipts - the two operations the pipeline's callers need
// ============================================================================

/// Append one record for a user. Returns the new row id.
pub fn insert_receipt(conn: &Connection, user_id: i64, record: &ExpenseRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO receipts (user_id, vendor, amount, category, date, raw_text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            record.vendor,
            record.amount,
            record.category.as_str(),
            record.date.to_string(),
            record.raw_text,
        ],
    )
    .context("Failed to insert receipt")?;

    let id = conn.last_insert_rowid();
    debug!("stored receipt {} for user {}", id, user_id);
    Ok(id)
}

/// List all records for a user, newest first.
pub fn get_receipts_for_user(conn: &Connection, user_id: i64) -> Result<Vec<StoredReceipt>> {
    let mut stmt = conn.prepare(
        "SELECT id, vendor, amount, category, date, raw_text
         FROM receipts
         WHERE user_id = ?1
         ORDER BY date DESC, id DESC",
    )?;

    let receipts = stmt
        .query_map(params![user_id], |row| {
            let category: String = row.get(3)?;
            let date: String = row.get(4)?;

            Ok(StoredReceipt {
                id: row.get(0)?,
                vendor: row.get(1)?,
                amount: row.get(2)?,
                category: Category::from_label(&category),
                date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                raw_text: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(receipts)
}

pub fn count_receipts_for_user(conn: &Connection, user_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM receipts WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

// ============================================================================
// Users
// ============================================================================

pub fn create_user(conn: &Connection, email: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (email, password_hash) VALUES (?1, ?2)",
        params![email, password_hash],
    )
    .context("Failed to insert user")?;

    Ok(conn.last_insert_rowid())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, email, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(user)
}

// ============================================================================
// Sessions
// ============================================================================

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, expires_at.to_rfc3339()],
    )
    .context("Failed to insert session")?;

    Ok(())
}

/// Resolve a bearer token to its user id. Expired or unknown tokens resolve
/// to `None`; `now` is passed in so expiry is testable.
pub fn lookup_session(conn: &Connection, token: &str, now: DateTime<Utc>) -> Result<Option<i64>> {
    let row = conn
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                let user_id: i64 = row.get(0)?;
                let expires_at: String = row.get(1)?;
                Ok((user_id, expires_at))
            },
        )
        .optional()?;

    match row {
        Some((user_id, expires_at)) => {
            let expires_at = DateTime::parse_from_rfc3339(&expires_at)
                .context("Malformed session expiry timestamp")?
                .with_timezone(&Utc);

            Ok((expires_at > now).then_some(user_id))
        }
        None => Ok(None),
    }
}

pub fn purge_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let purged = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now.to_rfc3339()],
    )?;

    if purged > 0 {
        debug!("purged {} expired sessions", purged);
    }
    Ok(purged)
}
