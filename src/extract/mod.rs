// Extraction & normalization pipeline
// Turns raw OCR text or a bank-CSV row into one structured ExpenseRecord.
// Pure functions over strings: no I/O, no shared mutable state, safe to call
// from any number of request handlers concurrently.

pub mod amount;
pub mod category;
pub mod date;
pub mod patterns;
pub mod vendor;

pub use amount::AmountExtractor;
pub use category::{Category, CategoryClassifier};
pub use date::{Clock, DateExtractor, SystemClock};
pub use vendor::VendorResolver;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::record::ExpenseRecord;

/// The one canonical pipeline, used identically whether the text came from
/// OCR or a CSV row. Malformed input degrades to documented defaults; no
/// error crosses this boundary.
pub struct ReceiptNormalizer {
    amounts: AmountExtractor,
    dates: DateExtractor,
    categories: CategoryClassifier,
    vendors: VendorResolver,
    clock: Arc<dyn Clock>,
}

impl ReceiptNormalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            amounts: AmountExtractor::new(),
            dates: DateExtractor::new(Arc::clone(&clock)),
            categories: CategoryClassifier::new(),
            vendors: VendorResolver::new(),
            clock,
        }
    }

    /// Normalizer backed by the wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// OCR path: vendor from the first usable line, amount/date/category
    /// extracted from the full text, which is retained verbatim for audit.
    pub fn normalize(&self, text: &str) -> ExpenseRecord {
        ExpenseRecord::new(
            self.vendors.from_text(text),
            self.amounts.extract(text),
            self.categories.classify(text),
            self.dates.extract(text),
            text.to_string(),
        )
    }

    /// CSV path: `Amount`, `Description` and `Date` fields of an
    /// externally-parsed row. Classification runs over the resolved vendor
    /// string, reusing the same rule engine. Missing or malformed fields
    /// degrade to defaults, never an error.
    pub fn normalize_row(&self, fields: &HashMap<String, String>) -> ExpenseRecord {
        let amount = fields
            .get("Amount")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        let vendor = self.vendors.from_field(fields.get("Description").map(String::as_str));
        let category = self.categories.classify(&vendor);

        let date = fields
            .get("Date")
            .and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
            .unwrap_or_else(|| self.clock.today());

        ExpenseRecord::new(vendor, amount, category, date, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::date::FixedClock;
    use super::*;

    fn pinned_normalizer() -> (ReceiptNormalizer, NaiveDate) {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        (ReceiptNormalizer::new(Arc::new(FixedClock(today))), today)
    }

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn ocr_path_builds_full_record() {
        let (normalizer, _) = pinned_normalizer();
        let text = "\n  Joe's Restaurant\n123 Main St\n2024-03-15\nTotal: $42.50\n";

        let record = normalizer.normalize(text);

        assert_eq!(record.vendor, "Joe's Restaurant");
        assert_eq!(record.amount, 42.50);
        assert_eq!(record.category, Category::Food);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(record.raw_text, text);
    }

    #[test]
    fn csv_row_builds_full_record() {
        let (normalizer, _) = pinned_normalizer();
        let fields = row(&[
            ("Amount", "19.99"),
            ("Description", "Taxi fare"),
            ("Date", "2024-01-05"),
        ]);

        let record = normalizer.normalize_row(&fields);

        assert_eq!(record.vendor, "Taxi fare");
        assert_eq!(record.amount, 19.99);
        assert_eq!(record.category, Category::Travel);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(record.raw_text, "");
    }

    #[test]
    fn missing_amount_defaults_to_zero() {
        let (normalizer, _) = pinned_normalizer();
        let fields = row(&[("Description", "Lunch"), ("Date", "2024-01-05")]);

        assert_eq!(normalizer.normalize_row(&fields).amount, 0.0);
    }

    #[test]
    fn unparseable_amount_defaults_to_zero() {
        let (normalizer, _) = pinned_normalizer();
        let fields = row(&[("Amount", "abc"), ("Description", "Lunch")]);

        assert_eq!(normalizer.normalize_row(&fields).amount, 0.0);
    }

    #[test]
    fn csv_date_is_strict_iso_with_clock_fallback() {
        let (normalizer, today) = pinned_normalizer();
        // MM/DD/YYYY is valid on the OCR path but not on the CSV path.
        let fields = row(&[("Amount", "5"), ("Date", "01/05/2024")]);

        assert_eq!(normalizer.normalize_row(&fields).date, today);
    }

    #[test]
    fn csv_classification_runs_over_vendor_string() {
        let (normalizer, _) = pinned_normalizer();
        let fields = row(&[("Amount", "12.00"), ("Description", "Corner Restaurant")]);

        assert_eq!(normalizer.normalize_row(&fields).category, Category::Food);
    }

    #[test]
    fn empty_row_degrades_to_all_defaults() {
        let (normalizer, today) = pinned_normalizer();
        let record = normalizer.normalize_row(&HashMap::new());

        assert_eq!(record.vendor, "Unknown");
        assert_eq!(record.amount, 0.0);
        assert_eq!(record.category, Category::Other);
        assert_eq!(record.date, today);
        assert_eq!(record.raw_text, "");
    }

    #[test]
    fn normalize_is_idempotent_under_pinned_clock() {
        let (normalizer, _) = pinned_normalizer();
        let text = "Cafe Uno\nno date on this one\nTotal: 9.95";

        assert_eq!(normalizer.normalize(text), normalizer.normalize(text));
    }
}
