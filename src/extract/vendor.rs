// Vendor resolution - display name for an expense

use crate::record::{clip_chars, UNKNOWN_VENDOR, VENDOR_MAX_CHARS};

/// Default when a tabular Description field is absent or empty.
const UNKNOWN_FIELD: &str = "Unknown";

/// Picks a display vendor string from free OCR text or a tabular field.
pub struct VendorResolver;

impl VendorResolver {
    pub fn new() -> Self {
        Self
    }

    /// First line with visible content, trimmed and capped. Receipts print
    /// the merchant name at the top, so the first real line is the vendor.
    pub fn from_text(&self, text: &str) -> String {
        text.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| clip_chars(line, VENDOR_MAX_CHARS))
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
    }

    /// Tabular field taken verbatim, capped.
    pub fn from_field(&self, field: Option<&str>) -> String {
        match field {
            Some(value) if !value.is_empty() => clip_chars(value, VENDOR_MAX_CHARS),
            _ => UNKNOWN_FIELD.to_string(),
        }
    }
}

impl Default for VendorResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_blank_line_wins() {
        let resolver = VendorResolver::new();
        assert_eq!(
            resolver.from_text("\n\n  Starbucks #42\nTotal: $5.00"),
            "Starbucks #42"
        );
    }

    #[test]
    fn blank_text_yields_sentinel() {
        let resolver = VendorResolver::new();
        assert_eq!(resolver.from_text(""), UNKNOWN_VENDOR);
        assert_eq!(resolver.from_text("   \n\t\n"), UNKNOWN_VENDOR);
    }

    #[test]
    fn long_lines_are_capped() {
        let resolver = VendorResolver::new();
        let line = "M".repeat(150);
        assert_eq!(resolver.from_text(&line).chars().count(), VENDOR_MAX_CHARS);
    }

    #[test]
    fn field_is_taken_verbatim() {
        let resolver = VendorResolver::new();
        assert_eq!(resolver.from_field(Some("Taxi fare")), "Taxi fare");
    }

    #[test]
    fn missing_or_empty_field_defaults() {
        let resolver = VendorResolver::new();
        assert_eq!(resolver.from_field(None), "Unknown");
        assert_eq!(resolver.from_field(Some("")), "Unknown");
    }
}
