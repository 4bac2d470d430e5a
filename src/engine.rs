//! The transfer engine: validation plus atomic debit/credit/log-append
//!
//! A transfer's precondition checks and mutations all execute under one held
//! connection lock inside one SQLite transaction, so two concurrent
//! transfers against the same wallet serialize and the second observes the
//! first's committed debit. A stale sufficiency check can never overcommit
//! a balance.

use crate::error::{LedgerError, Result};
use crate::persistence::Database;
use crate::transaction::TransactionLog;
use crate::wallet::WalletStore;
use std::sync::Arc;
use std::time::Duration;

/// Bounded number of attempts when storage reports transient contention.
const MAX_TRANSFER_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Confirmation of a committed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub record_id: i64,
}

pub struct TransferEngine {
    db: Arc<Database>,
}

impl TransferEngine {
    pub fn new(db: Arc<Database>) -> Self {
        TransferEngine { db }
    }

    /// Moves `amount` from one wallet to another, or fails leaving every
    /// balance and the log unchanged.
    ///
    /// Precondition order: parameter validity, `from` exists, `to` exists,
    /// sufficient funds. Transient conflicts are retried with the
    /// preconditions re-evaluated fresh on each attempt.
    pub fn transfer(&self, from: &str, to: &str, amount: f64) -> Result<TransferReceipt> {
        if from.is_empty() || to.is_empty() || amount <= 0.0 || !amount.is_finite() {
            return Err(LedgerError::InvalidParameters(
                "'from', 'to', and 'amount' must be valid".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_transfer(from, to, amount) {
                Err(LedgerError::Conflict(msg)) => {
                    if attempt < MAX_TRANSFER_ATTEMPTS {
                        tracing::warn!(attempt, "transfer contended, retrying: {}", msg);
                        std::thread::sleep(RETRY_BACKOFF * attempt);
                        continue;
                    }
                    return Err(LedgerError::DatabaseError(format!(
                        "transfer aborted after {} contended attempts: {}",
                        attempt, msg
                    )));
                }
                result => return result,
            }
        }
    }

    /// One attempt. Existence checks, the conditional debit, the credit and
    /// the log append share a single unit of work under the held connection
    /// lock; every early return before `commit` drops the transaction,
    /// which rolls it back.
    fn try_transfer(&self, from: &str, to: &str, amount: f64) -> Result<TransferReceipt> {
        let conn = self.db.lock()?;
        let tx = conn.unchecked_transaction()?;

        if !WalletStore::exists_in(&tx, from)? {
            return Err(LedgerError::FromWalletNotFound);
        }
        if !WalletStore::exists_in(&tx, to)? {
            return Err(LedgerError::ToWalletNotFound);
        }

        WalletStore::apply_delta(&tx, from, -amount)?;
        WalletStore::apply_delta(&tx, to, amount)?;
        let record_id = TransactionLog::append(&tx, from, to, amount)?;

        tx.commit()?;
        Ok(TransferReceipt { record_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryService;

    fn setup(wallets: &[(&str, f64)]) -> (TransferEngine, QueryService) {
        let db = Arc::new(Database::open(":memory:").unwrap());
        for (address, balance) in wallets {
            db.create_wallet(address, *balance).unwrap();
        }
        (TransferEngine::new(db.clone()), QueryService::new(db))
    }

    #[test]
    fn test_successful_transfer() {
        let (engine, query) = setup(&[("alice", 100.0), ("bob", 100.0)]);

        let receipt = engine.transfer("alice", "bob", 40.0).unwrap();
        assert!(receipt.record_id > 0);

        assert_eq!(query.balance_of("alice").unwrap(), 60.0);
        assert_eq!(query.balance_of("bob").unwrap(), 140.0);

        let records = query.recent_transfers(1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from_address, "alice");
        assert_eq!(records[0].to_address, "bob");
        assert_eq!(records[0].amount, 40.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let (engine, query) = setup(&[("alice", 100.0), ("bob", 100.0)]);

        for (from, to, amount) in [
            ("", "bob", 10.0),
            ("alice", "", 10.0),
            ("alice", "bob", 0.0),
            ("alice", "bob", -5.0),
            ("alice", "bob", f64::NAN),
            ("alice", "bob", f64::INFINITY),
        ] {
            let err = engine.transfer(from, to, amount).unwrap_err();
            assert!(
                matches!(err, LedgerError::InvalidParameters(_)),
                "expected InvalidParameters for ({:?}, {:?}, {})",
                from,
                to,
                amount
            );
        }

        assert_eq!(query.balance_of("alice").unwrap(), 100.0);
        assert_eq!(query.balance_of("bob").unwrap(), 100.0);
        assert!(query.recent_transfers(10).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_wallets_checked_in_order() {
        let (engine, query) = setup(&[("alice", 100.0)]);

        assert_eq!(
            engine.transfer("ghost", "alice", 10.0).unwrap_err(),
            LedgerError::FromWalletNotFound
        );
        assert_eq!(
            engine.transfer("alice", "ghost", 10.0).unwrap_err(),
            LedgerError::ToWalletNotFound
        );
        // Both unknown: the sender check wins
        assert_eq!(
            engine.transfer("ghost", "phantom", 10.0).unwrap_err(),
            LedgerError::FromWalletNotFound
        );

        assert_eq!(query.balance_of("alice").unwrap(), 100.0);
        assert!(query.recent_transfers(10).unwrap().is_empty());
    }

    #[test]
    fn test_insufficient_funds_leaves_state_unchanged() {
        let (engine, query) = setup(&[("alice", 50.0), ("bob", 10.0)]);

        assert_eq!(
            engine.transfer("alice", "bob", 60.0).unwrap_err(),
            LedgerError::InsufficientFunds
        );

        assert_eq!(query.balance_of("alice").unwrap(), 50.0);
        assert_eq!(query.balance_of("bob").unwrap(), 10.0);
        assert!(query.recent_transfers(10).unwrap().is_empty());
    }

    #[test]
    fn test_exact_balance_transfer_allowed() {
        let (engine, query) = setup(&[("alice", 50.0), ("bob", 0.0)]);

        engine.transfer("alice", "bob", 50.0).unwrap();
        assert_eq!(query.balance_of("alice").unwrap(), 0.0);
        assert_eq!(query.balance_of("bob").unwrap(), 50.0);
    }

    #[test]
    fn test_self_transfer_is_net_noop_with_record() {
        let (engine, query) = setup(&[("alice", 100.0)]);

        engine.transfer("alice", "alice", 30.0).unwrap();
        assert_eq!(query.balance_of("alice").unwrap(), 100.0);
        assert_eq!(query.recent_transfers(10).unwrap().len(), 1);
    }

    #[test]
    fn test_conservation_across_transfers() {
        let (engine, query) = setup(&[("alice", 100.0), ("bob", 100.0), ("carol", 100.0)]);

        engine.transfer("alice", "bob", 25.0).unwrap();
        engine.transfer("bob", "carol", 75.0).unwrap();
        engine.transfer("carol", "alice", 10.0).unwrap();
        let _ = engine.transfer("alice", "carol", 10_000.0); // fails, must not leak

        let total = query.balance_of("alice").unwrap()
            + query.balance_of("bob").unwrap()
            + query.balance_of("carol").unwrap();
        assert_eq!(total, 300.0);
    }

    #[test]
    fn test_record_ids_follow_commit_order() {
        let (engine, query) = setup(&[("alice", 100.0), ("bob", 100.0)]);

        let first = engine.transfer("alice", "bob", 1.0).unwrap();
        let second = engine.transfer("alice", "bob", 2.0).unwrap();
        assert!(second.record_id > first.record_id);

        let records = query.recent_transfers(2).unwrap();
        assert_eq!(records[0].id, second.record_id);
        assert_eq!(records[1].id, first.record_id);
    }
}
