//! Transfer records and the append-only transaction log

use crate::error::{LedgerError, Result};
use crate::persistence::Database;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One committed transfer. Records are append-only: once written they are
/// never mutated or deleted, and ids are never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: i64,
    pub from_address: String,
    pub to_address: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

pub struct TransactionLog {
    db: Arc<Database>,
}

impl TransactionLog {
    pub fn new(db: Arc<Database>) -> Self {
        TransactionLog { db }
    }

    /// Appends a record inside the supplied unit of work and returns the new
    /// id. The timestamp is assigned here, never by the caller. Fixed-width
    /// fractional seconds keep lexicographic order chronological.
    pub(crate) fn append(tx: &Transaction<'_>, from: &str, to: &str, amount: f64) -> Result<i64> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        tx.execute(
            "INSERT INTO transactions (from_address, to_address, amount, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![from, to, amount, timestamp],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// The most recent committed transfers, newest first; ties on timestamp
    /// resolve to the later id. Returns at most `count` records.
    pub(crate) fn recent(&self, count: i64) -> Result<Vec<TransferRecord>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, from_address, to_address, amount, timestamp
             FROM transactions ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![count], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, from_address, to_address, amount, timestamp) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| {
                    LedgerError::DatabaseError(format!(
                        "Corrupt timestamp on record {}: {}",
                        id, e
                    ))
                })?
                .with_timezone(&Utc);
            records.push(TransferRecord {
                id,
                from_address,
                to_address,
                amount,
                timestamp,
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append_one(db: &Database, from: &str, to: &str, amount: f64) -> i64 {
        let conn = db.lock().unwrap();
        let tx = conn.unchecked_transaction().unwrap();
        let id = TransactionLog::append(&tx, from, to, amount).unwrap();
        tx.commit().unwrap();
        id
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        let first = append_one(&db, "a", "b", 1.0);
        let second = append_one(&db, "b", "a", 2.0);
        assert!(second > first);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        for i in 1..=5 {
            append_one(&db, "a", "b", f64::from(i));
        }

        let log = TransactionLog::new(db);
        let records = log.recent(3).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].amount, 5.0);
        assert_eq!(records[1].amount, 4.0);
        assert_eq!(records[2].amount, 3.0);
        // Strictly descending ids; equal timestamps resolve the same way
        assert!(records[0].id > records[1].id && records[1].id > records[2].id);
    }

    #[test]
    fn test_recent_clamps_to_available() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        append_one(&db, "a", "b", 1.0);

        let log = TransactionLog::new(db);
        assert_eq!(log.recent(10).unwrap().len(), 1);
    }
}
