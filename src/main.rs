use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::fs::File;
use std::path::Path;

// Use library instead of local modules
use receipt_ledger::{
    auth, count_receipts_for_user, get_receipts_for_user, get_user_by_email, import_csv,
    setup_database, write_csv, AppConfig, ReceiptNormalizer,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("register") => run_register(&args[2..]),
        Some("import") => run_import(&args[2..]),
        Some("list") => run_list(&args[2..]),
        Some("export") => run_export(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("receipt-ledger {}", receipt_ledger::VERSION);
    println!();
    println!("Usage:");
    println!("  receipt-ledger register <email> <password>");
    println!("  receipt-ledger import <csv-file> <email>");
    println!("  receipt-ledger list <email>");
    println!("  receipt-ledger export <email> [out-file]");
    println!();
    println!("  Web UI: cargo run --bin receipt-server --features server");
}

fn open_database(config: &AppConfig) -> Result<Connection> {
    config.ensure_db_dir()?;
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {:?}", config.db_path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn require_user(conn: &Connection, email: &str) -> Result<i64> {
    match get_user_by_email(conn, email)? {
        Some(user) => Ok(user.id),
        None => bail!("No account for {}. Run: receipt-ledger register {} <password>", email, email),
    }
}

fn run_register(args: &[String]) -> Result<()> {
    let [email, password] = args else {
        bail!("Usage: receipt-ledger register <email> <password>");
    };

    let config = AppConfig::from_env();
    let conn = open_database(&config)?;

    auth::register(&conn, email, password, config.session_ttl_minutes)?;
    println!("✓ Registered {}", email);

    Ok(())
}

fn run_import(args: &[String]) -> Result<()> {
    let [csv_path, email] = args else {
        bail!("Usage: receipt-ledger import <csv-file> <email>");
    };

    let config = AppConfig::from_env();
    let conn = open_database(&config)?;
    let user_id = require_user(&conn, email)?;

    println!("📂 Importing {}...", csv_path);
    let data = std::fs::read(Path::new(csv_path))
        .with_context(|| format!("Failed to read {}", csv_path))?;

    let normalizer = ReceiptNormalizer::system();
    let imported = import_csv(&conn, user_id, &data, &normalizer)?;
    println!("✓ Imported {} records", imported);

    let count = count_receipts_for_user(&conn, user_id)?;
    println!("✓ {} now has {} records", email, count);

    Ok(())
}

fn run_list(args: &[String]) -> Result<()> {
    let [email] = args else {
        bail!("Usage: receipt-ledger list <email>");
    };

    let config = AppConfig::from_env();
    let conn = open_database(&config)?;
    let user_id = require_user(&conn, email)?;

    let receipts = get_receipts_for_user(&conn, user_id)?;
    if receipts.is_empty() {
        println!("No records for {}", email);
        return Ok(());
    }

    println!("{:<12} {:>10}  {:<8} Vendor", "Date", "Amount", "Category");
    for receipt in &receipts {
        println!(
            "{:<12} {:>10.2}  {:<8} {}",
            receipt.date, receipt.amount, receipt.category, receipt.vendor
        );
    }
    println!("✓ {} records", receipts.len());

    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    let (email, out_path) = match args {
        [email] => (email, "data/export.csv"),
        [email, out] => (email, out.as_str()),
        _ => bail!("Usage: receipt-ledger export <email> [out-file]"),
    };

    let config = AppConfig::from_env();
    let conn = open_database(&config)?;
    let user_id = require_user(&conn, email)?;

    let receipts = get_receipts_for_user(&conn, user_id)?;
    let file = File::create(out_path).with_context(|| format!("Failed to create {}", out_path))?;
    write_csv(file, &receipts)?;

    println!("✓ Exported {} records to {}", receipts.len(), out_path);

    Ok(())
}
