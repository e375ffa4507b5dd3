// Date extraction from free receipt text

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use super::patterns::{DATE_ISO, DATE_US_DASH, DATE_US_SLASH};

/// Source of "today". The fallback date inside [`DateExtractor`] depends on
/// it, so it is supplied by the caller instead of read from a hidden global;
/// tests pin it to a fixed day.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation used everywhere outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Fixed clock for deterministic fallback dates in tests.
#[cfg(test)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Format ladder applied to whichever shape matched, most to least strict.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

/// Finds a calendar date in free text, falling back to the clock's today.
pub struct DateExtractor {
    clock: Arc<dyn Clock>,
}

impl DateExtractor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Scans the original-case text for the first shape that matches:
    /// `YYYY-MM-DD`, then `MM/DD/YYYY`, then `MM-DD-YYYY`.
    ///
    /// Once a shape matches, a candidate that fails every format degrades
    /// straight to the clock fallback; the remaining shapes are NOT
    /// re-scanned. Callers relying on the fallback date get "today".
    pub fn extract(&self, text: &str) -> NaiveDate {
        let shapes = [&*DATE_ISO, &*DATE_US_SLASH, &*DATE_US_DASH];

        for shape in shapes {
            if let Some(found) = shape.find(text) {
                return parse_candidate(found.as_str()).unwrap_or_else(|| self.clock.today());
            }
        }

        self.clock.today()
    }
}

fn parse_candidate(candidate: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned() -> (DateExtractor, NaiveDate) {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        (DateExtractor::new(Arc::new(FixedClock(today))), today)
    }

    #[test]
    fn iso_date_is_found() {
        let (extractor, _) = pinned();
        assert_eq!(
            extractor.extract("Paid on 2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn us_slash_date_is_found() {
        let (extractor, _) = pinned();
        assert_eq!(
            extractor.extract("Paid on 03/15/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn us_dash_date_is_found() {
        let (extractor, _) = pinned();
        assert_eq!(
            extractor.extract("Visited 12-31-2024, thank you"),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn iso_shape_outranks_us_shapes() {
        let (extractor, _) = pinned();
        // Both shapes present in the text; the ISO shape wins regardless of
        // position.
        assert_eq!(
            extractor.extract("03/15/2023 then 2024-01-02"),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn no_date_falls_back_to_clock() {
        let (extractor, today) = pinned();
        assert_eq!(extractor.extract("no date here"), today);
    }

    #[test]
    fn shape_match_with_invalid_date_falls_back_to_clock() {
        let (extractor, today) = pinned();
        // "2024-13-45" matches the ISO shape but parses under no format. The
        // perfectly valid 03/15/2024 later in the text is deliberately NOT
        // re-scanned.
        assert_eq!(extractor.extract("2024-13-45 or maybe 03/15/2024"), today);
    }
}
