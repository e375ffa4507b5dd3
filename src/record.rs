// Expense Record - the pipeline's output type
// Constructed once per upload/import event, never mutated afterwards

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::extract::Category;

/// Upper bound on the stored vendor string, in characters.
pub const VENDOR_MAX_CHARS: usize = 100;

/// Sentinel vendor when no usable line exists in the source text.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// One structured expense, produced by the normalization pipeline and handed
/// to storage. The constructor owns the data-model invariants:
///
/// - `vendor` is non-empty and at most [`VENDOR_MAX_CHARS`] characters
/// - `amount` is never negative
/// - `category` comes from the closed label set
/// - `date` is always a valid calendar date (the clock fallback guarantees one)
/// - `raw_text` keeps the original source text for audit; empty on the CSV path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub vendor: String,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    pub raw_text: String,
}

impl ExpenseRecord {
    pub fn new(
        vendor: String,
        amount: f64,
        category: Category,
        date: NaiveDate,
        raw_text: String,
    ) -> Self {
        let vendor = if vendor.trim().is_empty() {
            UNKNOWN_VENDOR.to_string()
        } else {
            clip_chars(&vendor, VENDOR_MAX_CHARS)
        };

        // f64::max also maps a NaN amount onto the documented zero default.
        ExpenseRecord {
            vendor,
            amount: amount.max(0.0),
            category,
            date,
            raw_text,
        }
    }
}

/// Character-based truncation. Byte slicing would panic mid-codepoint on the
/// arbitrary Unicode that OCR produces.
pub(crate) fn clip_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
