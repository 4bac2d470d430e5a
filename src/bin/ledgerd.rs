#![forbid(unsafe_code)]
//! ledgerd server: schema bootstrap, first-run wallet seeding, HTTP API.

use clap::Parser;
use ledgerd::api::{run_api_server, Service};
use ledgerd::config::load_config;
use ledgerd::persistence::Database;
use std::fs;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "ledgerd", about = "Minimal wallet ledger service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Override the configured API port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = load_config(&args.config)?;
    let port = args.port.unwrap_or(config.network.api_port);

    // Enforce deterministic startup order.
    // 1) Ensure the data directory (parent of the DB path) exists
    let db_path = std::path::Path::new(&config.database.path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create data dir {:?}: {}", parent, e))?;
        }
    }

    // 2) Open the database and seed wallets on first run. A failing random
    //    source aborts startup here rather than surfacing at request time.
    let db = Arc::new(Database::open(&config.database.path)?);
    let seeded = db.seed_wallets(config.seed.wallets, config.seed.balance)?;
    if !seeded.is_empty() {
        info!(
            "Created {} initial wallets with {} balance each",
            seeded.len(),
            config.seed.balance
        );
    }
    info!("Ledger ready with {} wallets", db.wallet_count()?);

    // 3) Serve the API
    let service = Arc::new(Service::new(db));
    run_api_server(service, port).await
}
