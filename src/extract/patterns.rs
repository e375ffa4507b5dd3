// Compiled pattern tables for receipt text extraction

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Labeled totals, tried in order against lower-cased text. Each pattern
    /// allows an optional colon/whitespace run and an optional currency
    /// symbol before the numeric token.
    pub static ref AMOUNT_LABELS: [Regex; 4] = [
        Regex::new(r"total[:\s]*[$€£]?\s*([\d.,]+)").unwrap(),
        Regex::new(r"amount[:\s]*[$€£]?\s*([\d.,]+)").unwrap(),
        Regex::new(r"balance[:\s]*[$€£]?\s*([\d.,]+)").unwrap(),
        Regex::new(r"grand total[:\s]*[$€£]?\s*([\d.,]+)").unwrap(),
    ];

    // Date shapes in priority order: ISO first, then the two US layouts.
    pub static ref DATE_ISO: Regex = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
    pub static ref DATE_US_SLASH: Regex = Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap();
    pub static ref DATE_US_DASH: Regex = Regex::new(r"\d{2}-\d{2}-\d{4}").unwrap();
}
