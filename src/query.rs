//! Read-only query facade for ledgerd
//!
//! Holds read access to the wallet store and the transaction log; has no
//! write authority. Each query takes the connection lock for a single
//! statement, so readers never hold writers up for longer than one
//! point-in-time view.

use crate::error::{LedgerError, Result};
use crate::persistence::Database;
use crate::transaction::{TransactionLog, TransferRecord};
use crate::wallet::WalletStore;
use std::sync::Arc;

pub struct QueryService {
    wallets: WalletStore,
    log: TransactionLog,
}

impl QueryService {
    pub fn new(db: Arc<Database>) -> Self {
        QueryService {
            wallets: WalletStore::new(db.clone()),
            log: TransactionLog::new(db),
        }
    }

    /// Current balance for `address`.
    pub fn balance_of(&self, address: &str) -> Result<f64> {
        if address.is_empty() {
            return Err(LedgerError::InvalidParameters(
                "address is required".to_string(),
            ));
        }
        self.wallets.balance(address)
    }

    /// The `count` most recent transfers, newest first.
    pub fn recent_transfers(&self, count: i64) -> Result<Vec<TransferRecord>> {
        if count <= 0 {
            return Err(LedgerError::InvalidParameters(
                "'count' must be a positive integer".to_string(),
            ));
        }
        self.log.recent(count)
    }
}
