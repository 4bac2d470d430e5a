#![forbid(unsafe_code)]
//! List the most recent transfers from the ledger database.

use clap::Parser;
use ledgerd::config::load_config;
use ledgerd::persistence::Database;
use ledgerd::query::QueryService;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ledger-history", about = "Print the most recent transfers")]
struct Args {
    /// Number of transfers to show
    #[arg(long, default_value_t = 10)]
    count: i64,

    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let db = Arc::new(Database::open(&config.database.path)?);
    let query = QueryService::new(db);

    let records = query.recent_transfers(args.count)?;
    if records.is_empty() {
        println!("No transfers recorded yet");
        return Ok(());
    }

    for record in records {
        println!(
            "#{:<6} {}  {} -> {}  {:.6}",
            record.id, record.timestamp, record.from_address, record.to_address, record.amount
        );
    }

    Ok(())
}
