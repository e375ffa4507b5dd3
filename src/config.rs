// Runtime configuration
// One explicit structure handed to the binaries at startup; nothing reads
// globals after this point.

use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Address the web server binds to.
    pub bind_addr: String,

    /// Lifetime of issued session tokens.
    pub session_ttl_minutes: i64,

    /// Command used for text recognition.
    pub tesseract_cmd: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/receipts.db"),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_ttl_minutes: 60,
            tesseract_cmd: "tesseract".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `RECEIPT_DB`, `RECEIPT_ADDR`,
    /// `RECEIPT_SESSION_TTL` and `RECEIPT_TESSERACT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = env::var("RECEIPT_DB") {
            config.db_path = PathBuf::from(value);
        }
        if let Ok(value) = env::var("RECEIPT_ADDR") {
            config.bind_addr = value;
        }
        if let Ok(value) = env::var("RECEIPT_SESSION_TTL") {
            if let Ok(minutes) = value.parse() {
                config.session_ttl_minutes = minutes;
            }
        }
        if let Ok(value) = env::var("RECEIPT_TESSERACT") {
            config.tesseract_cmd = value;
        }

        config
    }

    /// Create the directory the database file lives in.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();

        assert_eq!(config.db_path, PathBuf::from("data/receipts.db"));
        assert_eq!(config.session_ttl_minutes, 60);
        assert_eq!(config.tesseract_cmd, "tesseract");
    }

    #[test]
    fn ensure_db_dir_handles_bare_filenames() {
        let config = AppConfig {
            db_path: PathBuf::from("receipts.db"),
            ..AppConfig::default()
        };

        assert!(config.ensure_db_dir().is_ok());
    }
}
