#![forbid(unsafe_code)]
//! Inspect a wallet balance straight from the ledger database.

use clap::Parser;
use ledgerd::config::load_config;
use ledgerd::persistence::Database;
use ledgerd::query::QueryService;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ledger-balance", about = "Print the balance of a wallet")]
struct Args {
    /// Wallet address (64-character hex)
    address: String,

    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let db = Arc::new(Database::open(&config.database.path)?);
    let query = QueryService::new(db);

    let balance = query.balance_of(&args.address)?;

    println!("Address: {}", args.address);
    println!("Balance: {:.6}", balance);

    Ok(())
}
