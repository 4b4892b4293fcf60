//! Persistent storage using RocksDB.
//!
//! One database backs both halves of the node: the append-only message
//! store and the account ledger. Values are JSON under prefixed keys
//! (`message:`, `balance:`, `receipt:`, `validator:`).

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use prism_dag::{Message, MessageId, MessageStore, StoreError};
use prism_ledger::{LedgerError, LedgerGateway, TransferReceipt};
use prism_quorum::Validator;
use prism_spectrum::Credits;
use rocksdb::{Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

const RECEIPT_SEQ_KEY: &[u8] = b"meta:receipt_seq";

/// Open or create the node database at the given path.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Arc<DB>> {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    let db = DB::open(&opts, path)?;
    Ok(Arc::new(db))
}

fn message_key(id: &MessageId) -> String {
    format!("message:{id}")
}

fn balance_key(account: &str) -> String {
    format!("balance:{account}")
}

fn receipt_key(id: &str) -> String {
    format!("receipt:{id}")
}

fn validator_key(id: &str) -> String {
    format!("validator:{id}")
}

// --- Message store ---

/// RocksDB-backed message store.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Create a store over an open database.
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    // --- Validator persistence (registry survives restarts) ---

    /// Persist a registered validator.
    pub fn put_validator(&self, validator: &Validator) -> Result<()> {
        let value = serde_json::to_vec(validator)?;
        self.db.put(validator_key(&validator.id).as_bytes(), value)?;
        Ok(())
    }

    /// List all persisted validators.
    pub fn list_validators(&self) -> Result<Vec<Validator>> {
        let prefix = b"validator:";
        let mut validators = Vec::new();

        let iter = self.db.prefix_iterator(prefix);
        for item in iter {
            let (key, value) = item?;
            if key.starts_with(prefix) {
                let validator: Validator = serde_json::from_slice(&value)?;
                validators.push(validator);
            } else {
                break;
            }
        }

        Ok(validators)
    }
}

impl MessageStore for RocksStore {
    fn get(&self, id: &MessageId) -> std::result::Result<Option<Message>, StoreError> {
        match self
            .db
            .get(message_key(id).as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(data) => {
                let message = serde_json::from_slice(&data)
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    fn append(&self, message: &Message) -> std::result::Result<(), StoreError> {
        if self.exists(&message.id)? {
            return Err(StoreError::Duplicate(message.id));
        }
        let value =
            serde_json::to_vec(message).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.db
            .put(message_key(&message.id).as_bytes(), value)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn exists(&self, id: &MessageId) -> std::result::Result<bool, StoreError> {
        Ok(self
            .db
            .get(message_key(id).as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .is_some())
    }
}

// --- Ledger ---

/// A receipt together with its reversal flag.
#[derive(Debug, Serialize, Deserialize)]
struct ReceiptRecord {
    receipt: TransferReceipt,
    reversed: bool,
}

/// RocksDB-backed account ledger.
///
/// Transfers write both balances and the receipt in a single `WriteBatch`,
/// which RocksDB applies atomically - the all-or-nothing half of the
/// gateway contract. The reversal flag on the stored receipt makes rollback
/// at-most-once across restarts.
#[derive(Clone)]
pub struct RocksLedger {
    db: Arc<DB>,
    next_receipt: Arc<AtomicU64>,
}

impl RocksLedger {
    /// Create a ledger over an open database, resuming the receipt sequence.
    pub fn new(db: Arc<DB>) -> Result<Self> {
        let next = match db.get(RECEIPT_SEQ_KEY)? {
            Some(data) => {
                let bytes: [u8; 8] = data
                    .as_slice()
                    .try_into()
                    .map_err(|_| crate::error::Error::Storage("bad receipt sequence".into()))?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };
        Ok(Self {
            db,
            next_receipt: Arc::new(AtomicU64::new(next)),
        })
    }

    fn balance_of(&self, account: &str) -> std::result::Result<Credits, LedgerError> {
        match self
            .db
            .get(balance_key(account).as_bytes())
            .map_err(|e| LedgerError::TransferFailed(e.to_string()))?
        {
            Some(data) => serde_json::from_slice(&data)
                .map_err(|e| LedgerError::TransferFailed(e.to_string())),
            None => Ok(Credits::ZERO),
        }
    }

    /// Credit an account out of thin air. Operator/faucet surface, not part
    /// of the gateway contract.
    pub fn credit(&self, account: &str, amount: Credits) -> Result<Credits> {
        let balance = self
            .balance_of(account)
            .map_err(|e| crate::error::Error::Storage(e.to_string()))?;
        let updated = balance.checked_add(amount).unwrap_or(balance);
        let value = serde_json::to_vec(&updated)?;
        self.db.put(balance_key(account).as_bytes(), value)?;
        debug!(account, amount = %amount, balance = %updated, "credited account");
        Ok(updated)
    }
}

impl LedgerGateway for RocksLedger {
    fn get_balance(&self, account: &str) -> std::result::Result<Credits, LedgerError> {
        self.balance_of(account)
    }

    fn authorize(&self, from: &str, amount: Credits) -> std::result::Result<(), LedgerError> {
        let available = self.balance_of(from)?;
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from.to_string(),
                required: amount,
                available,
            });
        }
        Ok(())
    }

    fn commit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Credits,
        memo: &str,
    ) -> std::result::Result<TransferReceipt, LedgerError> {
        let available = self.balance_of(from)?;
        let debited = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: from.to_string(),
                required: amount,
                available,
            })?;

        let seq = self.next_receipt.fetch_add(1, Ordering::SeqCst) + 1;
        let receipt = TransferReceipt {
            id: format!("rx-{seq:08}"),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            memo: memo.to_string(),
        };
        let record = ReceiptRecord {
            receipt: receipt.clone(),
            reversed: false,
        };

        let mut batch = WriteBatch::default();
        if from == to {
            // Degenerate self-transfer: net-zero balance change.
        } else {
            let credited = self
                .balance_of(to)?
                .checked_add(amount)
                .ok_or_else(|| LedgerError::TransferFailed("balance overflow".to_string()))?;
            batch.put(
                balance_key(from).as_bytes(),
                serde_json::to_vec(&debited)
                    .map_err(|e| LedgerError::TransferFailed(e.to_string()))?,
            );
            batch.put(
                balance_key(to).as_bytes(),
                serde_json::to_vec(&credited)
                    .map_err(|e| LedgerError::TransferFailed(e.to_string()))?,
            );
        }
        batch.put(
            receipt_key(&receipt.id).as_bytes(),
            serde_json::to_vec(&record)
                .map_err(|e| LedgerError::TransferFailed(e.to_string()))?,
        );
        batch.put(RECEIPT_SEQ_KEY, seq.to_be_bytes());

        self.db
            .write(batch)
            .map_err(|e| LedgerError::TransferFailed(e.to_string()))?;

        debug!(receipt = %receipt.id, from, to, amount = %amount, memo, "committed transfer");
        Ok(receipt)
    }

    fn rollback(&self, receipt: &TransferReceipt) -> std::result::Result<(), LedgerError> {
        let key = receipt_key(&receipt.id);
        let data = self
            .db
            .get(key.as_bytes())
            .map_err(|e| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: e.to_string(),
            })?
            .ok_or_else(|| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: "unknown receipt".to_string(),
            })?;

        let mut record: ReceiptRecord =
            serde_json::from_slice(&data).map_err(|e| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: e.to_string(),
            })?;
        if record.reversed {
            return Err(LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: "already reversed".to_string(),
            });
        }

        let holder = self.balance_of(&record.receipt.to)?;
        let drained =
            holder
                .checked_sub(record.receipt.amount)
                .ok_or_else(|| LedgerError::RollbackFailed {
                    receipt: receipt.id.clone(),
                    detail: format!(
                        "recipient {} no longer holds {}",
                        record.receipt.to, record.receipt.amount
                    ),
                })?;
        let restored = self
            .balance_of(&record.receipt.from)?
            .checked_add(record.receipt.amount)
            .ok_or_else(|| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: "balance overflow on reversal".to_string(),
            })?;

        record.reversed = true;
        let mut batch = WriteBatch::default();
        if record.receipt.from != record.receipt.to {
            batch.put(
                balance_key(&record.receipt.to).as_bytes(),
                serde_json::to_vec(&drained).map_err(|e| LedgerError::RollbackFailed {
                    receipt: receipt.id.clone(),
                    detail: e.to_string(),
                })?,
            );
            batch.put(
                balance_key(&record.receipt.from).as_bytes(),
                serde_json::to_vec(&restored).map_err(|e| LedgerError::RollbackFailed {
                    receipt: receipt.id.clone(),
                    detail: e.to_string(),
                })?,
            );
        }
        batch.put(
            key.as_bytes(),
            serde_json::to_vec(&record).map_err(|e| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: e.to_string(),
            })?,
        );

        self.db
            .write(batch)
            .map_err(|e| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: e.to_string(),
            })?;

        debug!(receipt = %receipt.id, "reversed transfer");
        Ok(())
    }
}
