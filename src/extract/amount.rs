// Amount extraction from free receipt text

use super::patterns::AMOUNT_LABELS;

/// Finds the monetary total in free text.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Labeled totals win; otherwise the largest parsable number in the text
    /// is taken, since totals are typically the largest figure on a receipt.
    /// Returns 0.0 when nothing numeric parses at all.
    pub fn extract(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();

        // A label hit whose captured token fails to parse is skipped, not an
        // error; the next label gets its chance.
        for pattern in AMOUNT_LABELS.iter() {
            if let Some(caps) = pattern.captures(&lower) {
                if let Some(value) = parse_number(&caps[1]) {
                    return value;
                }
            }
        }

        let mut best: Option<f64> = None;
        for token in text.split_whitespace() {
            let cleaned = token.trim_matches(|c| matches!(c, '$' | '€' | '£'));
            if let Some(value) = parse_number(cleaned) {
                best = Some(match best {
                    Some(current) if current >= value => current,
                    _ => value,
                });
            }
        }

        best.unwrap_or(0.0)
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a numeric token after stripping thousands-separator commas.
fn parse_number(token: &str) -> Option<f64> {
    if token.is_empty() {
        return None;
    }
    token.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_total_wins() {
        let extractor = AmountExtractor::new();
        let text = "Starbucks #42\nItem 3.00\nItem 9.99\nTotal: $42.50";
        assert_eq!(extractor.extract(text), 42.50);
    }

    #[test]
    fn amount_and_balance_labels_are_recognized() {
        let extractor = AmountExtractor::new();
        assert_eq!(extractor.extract("Amount: $17.25"), 17.25);
        assert_eq!(extractor.extract("Balance 8.40"), 8.40);
    }

    #[test]
    fn thousands_separators_are_stripped() {
        let extractor = AmountExtractor::new();
        assert_eq!(extractor.extract("GRAND TOTAL: $1,299.00"), 1299.00);
    }

    #[test]
    fn falls_back_to_largest_number() {
        let extractor = AmountExtractor::new();
        let text = "qty 12 widgets at 7.5 each, 100 in stock";
        assert_eq!(extractor.extract(text), 100.0);
    }

    #[test]
    fn fallback_strips_currency_symbols() {
        let extractor = AmountExtractor::new();
        assert_eq!(extractor.extract("coffee $4.75 tip $1.25"), 4.75);
    }

    #[test]
    fn no_numbers_yields_zero() {
        let extractor = AmountExtractor::new();
        assert_eq!(extractor.extract("thanks for shopping with us"), 0.0);
        assert_eq!(extractor.extract(""), 0.0);
    }

    #[test]
    fn unparseable_label_token_is_skipped() {
        let extractor = AmountExtractor::new();
        // "total" captures only separators; the bare-number fallback still runs.
        assert_eq!(extractor.extract("total: .,. and later 12.00 appeared"), 12.00);
    }
}
