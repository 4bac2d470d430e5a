//! Database persistence layer for ledgerd
//!
//! Owns the single SQLite connection behind a mutex. The mutex plus SQLite
//! transactions are the sole serialization point for every balance mutation
//! and log append in the process.

use crate::address::generate_address;
use crate::error::{LedgerError, Result};
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to open database: {}", e)))?;

        // Bounded wait on file-level contention; the engine retries on top.
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| LedgerError::DatabaseError(format!("Failed to set busy timeout: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS wallets (
                address TEXT PRIMARY KEY,
                balance REAL NOT NULL CHECK (balance >= 0)
            )",
            [],
        )
        .map_err(|e| LedgerError::DatabaseError(format!("Failed to create wallets table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_address TEXT NOT NULL,
                to_address TEXT NOT NULL,
                amount REAL NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            LedgerError::DatabaseError(format!("Failed to create transactions table: {}", e))
        })?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Acquires the shared connection. Callers hold the guard for the full
    /// duration of their atomic unit of work.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::DatabaseError("Mutex poisoned".to_string()))
    }

    pub fn wallet_count(&self) -> Result<u32> {
        let conn = self.lock()?;
        let count: u32 = conn.query_row("SELECT COUNT(*) FROM wallets", [], |row| row.get(0))?;
        Ok(count)
    }

    /// First-run seeding: creates `count` wallets with `balance` each inside
    /// one transaction and returns their addresses. A ledger that already
    /// holds wallets is left untouched and an empty list is returned.
    pub fn seed_wallets(&self, count: u32, balance: f64) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let existing: u32 = conn.query_row("SELECT COUNT(*) FROM wallets", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(Vec::new());
        }

        let tx = conn.unchecked_transaction()?;
        let mut addresses = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let address = generate_address()?;
            tx.execute(
                "INSERT INTO wallets (address, balance) VALUES (?1, ?2)",
                params![address, balance],
            )?;
            addresses.push(address);
        }
        tx.commit()?;

        Ok(addresses)
    }

    /// Inserts a single wallet row. Bootstrap and test use only; the
    /// transfer engine never creates wallets.
    pub fn create_wallet(&self, address: &str, balance: f64) -> Result<()> {
        if address.is_empty() {
            return Err(LedgerError::InvalidParameters(
                "address must not be empty".to_string(),
            ));
        }
        if balance < 0.0 || !balance.is_finite() {
            return Err(LedgerError::InvalidParameters(
                "balance must be a non-negative number".to_string(),
            ));
        }
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO wallets (address, balance) VALUES (?1, ?2)",
            params![address, balance],
        )?;
        Ok(())
    }
}
