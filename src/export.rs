// CSV export of stored receipts

use std::io::Write;

use anyhow::{Context, Result};

use crate::db::StoredReceipt;

/// Write receipts as CSV with a `Vendor,Amount,Category,Date` header.
pub fn write_csv<W: Write>(writer: W, receipts: &[StoredReceipt]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["Vendor", "Amount", "Category", "Date"])
        .context("Failed to write CSV header")?;

    for receipt in receipts {
        let amount = format!("{:.2}", receipt.amount);
        let date = receipt.date.to_string();

        wtr.write_record([
            receipt.vendor.as_str(),
            amount.as_str(),
            receipt.category.as_str(),
            date.as_str(),
        ])
        .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// In-memory variant for the HTTP download path.
pub fn to_csv_string(receipts: &[StoredReceipt]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, receipts)?;

    // csv output over UTF-8 inputs is UTF-8
    String::from_utf8(buffer).context("CSV output was not valid UTF-8")
}
