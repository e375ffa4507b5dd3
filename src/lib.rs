// Receipt Ledger - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod auth;
pub mod config;
pub mod db;
pub mod export;
pub mod extract;
pub mod import;
pub mod ocr;
pub mod record;

// Re-export commonly used types
pub use auth::{authenticate, hash_password, login, register, AuthError, SessionToken};
pub use config::AppConfig;
pub use db::{
    count_receipts_for_user, create_user, get_receipts_for_user, get_user_by_email,
    insert_receipt, lookup_session, purge_expired_sessions, setup_database, StoredReceipt, User,
};
pub use export::{to_csv_string, write_csv};
pub use extract::{
    AmountExtractor, Category, CategoryClassifier, Clock, DateExtractor, ReceiptNormalizer,
    SystemClock, VendorResolver,
};
pub use import::{import_csv, read_csv};
pub use ocr::{TesseractOcr, TextRecognizer};
pub use record::ExpenseRecord;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
