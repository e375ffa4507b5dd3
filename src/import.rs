// Bank CSV import
// The CSV mechanics can fail (unreadable file, ragged rows); the row
// contents never do - they degrade inside the normalizer.

use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::db::insert_receipt;
use crate::extract::ReceiptNormalizer;
use crate::record::ExpenseRecord;

/// Parse a bank CSV export into expense records, one per data row. Rows are
/// keyed by the header line, so column order does not matter.
pub fn read_csv<R: Read>(reader: R, normalizer: &ReceiptNormalizer) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.context("Failed to read CSV row")?;

        let fields: HashMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();

        records.push(normalizer.normalize_row(&fields));
    }

    info!("parsed {} rows from bank CSV", records.len());
    Ok(records)
}

/// Import a whole CSV payload for one user. Returns how many records landed.
pub fn import_csv(
    conn: &Connection,
    user_id: i64,
    data: &[u8],
    normalizer: &ReceiptNormalizer,
) -> Result<usize> {
    let records = read_csv(data, normalizer)?;

    for record in &records {
        insert_receipt(conn, user_id, record)?;
    }

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_receipts_for_user, create_user, get_receipts_for_user, setup_database};
    use crate::extract::date::FixedClock;
    use crate::extract::Category;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn pinned_normalizer() -> ReceiptNormalizer {
        ReceiptNormalizer::new(Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )))
    }

    #[test]
    fn csv_rows_become_records() {
        let csv = "Date,Description,Amount\n\
                   2024-01-05,Taxi fare,19.99\n\
                   2024-01-06,Corner Restaurant,12.50\n";

        let records = read_csv(csv.as_bytes(), &pinned_normalizer()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].vendor, "Taxi fare");
        assert_eq!(records[0].category, Category::Travel);
        assert_eq!(records[1].amount, 12.50);
        assert_eq!(records[1].category, Category::Food);
    }

    #[test]
    fn missing_columns_degrade_instead_of_failing() {
        let csv = "Date,Description\n2024-01-05,Lunch\n";

        let records = read_csv(csv.as_bytes(), &pinned_normalizer()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, 0.0);
    }

    #[test]
    fn import_lands_rows_for_the_user() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let user_id = create_user(&conn, "a@example.com", "hash").unwrap();

        let csv = "Date,Description,Amount\n2024-01-05,Taxi fare,19.99\n";
        let imported = import_csv(&conn, user_id, csv.as_bytes(), &pinned_normalizer()).unwrap();

        assert_eq!(imported, 1);
        assert_eq!(count_receipts_for_user(&conn, user_id).unwrap(), 1);
        assert_eq!(
            get_receipts_for_user(&conn, user_id).unwrap()[0].vendor,
            "Taxi fare"
        );
    }

    #[test]
    fn empty_csv_imports_nothing() {
        let csv = "Date,Description,Amount\n";
        let records = read_csv(csv.as_bytes(), &pinned_normalizer()).unwrap();
        assert!(records.is_empty());
    }
}
