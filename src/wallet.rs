//! Wallet balance storage for ledgerd

use crate::error::{LedgerError, Result};
use crate::persistence::Database;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::Arc;

/// Read and adjust per-wallet balances. Mutations go through
/// [`WalletStore::apply_delta`], which only operates inside an open atomic
/// unit of work supplied by the transfer engine.
pub struct WalletStore {
    db: Arc<Database>,
}

impl WalletStore {
    pub fn new(db: Arc<Database>) -> Self {
        WalletStore { db }
    }

    /// Point balance lookup. No side effects.
    pub fn balance(&self, address: &str) -> Result<f64> {
        let conn = self.db.lock()?;
        Self::balance_in(&conn, address)
    }

    pub fn exists(&self, address: &str) -> Result<bool> {
        let conn = self.db.lock()?;
        Self::exists_in(&conn, address)
    }

    pub(crate) fn balance_in(conn: &Connection, address: &str) -> Result<f64> {
        conn.query_row(
            "SELECT balance FROM wallets WHERE address = ?1",
            params![address],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| LedgerError::WalletNotFound(address.to_string()))
    }

    pub(crate) fn exists_in(conn: &Connection, address: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM wallets WHERE address = ?1",
                params![address],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Adjusts a wallet balance by `delta` inside the supplied unit of work.
    /// The sufficiency condition is part of the UPDATE itself, so check and
    /// mutation happen at the same serialization point: a negative delta
    /// that would drive the balance below zero affects no rows and the
    /// wallet is left unchanged.
    pub(crate) fn apply_delta(tx: &Transaction<'_>, address: &str, delta: f64) -> Result<()> {
        let changed = tx.execute(
            "UPDATE wallets SET balance = balance + ?1
             WHERE address = ?2 AND balance + ?1 >= 0",
            params![delta, address],
        )?;
        if changed == 1 {
            return Ok(());
        }
        if Self::exists_in(tx, address)? {
            Err(LedgerError::InsufficientFunds)
        } else {
            Err(LedgerError::WalletNotFound(address.to_string()))
        }
    }
}
