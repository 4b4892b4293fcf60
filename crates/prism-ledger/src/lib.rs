//! Account ledger gateway.
//!
//! The admission engine never owns balances. It talks to an external,
//! already-durable account ledger through the [`LedgerGateway`] trait:
//! balance lookup, a read-only authorization pre-check, an all-or-nothing
//! transfer, and a compensating rollback. Whatever backs the trait - an
//! in-process map, RocksDB, a SQL database - must keep those two promises:
//!
//! - `commit_transfer` debits and credits atomically or not at all;
//! - `rollback` reverses a committed transfer at most once per receipt.
//!
//! [`MemoryLedger`] is the reference implementation used by tests and
//! single-process deployments.

mod gateway;
mod memory;

pub use gateway::{LedgerGateway, TransferReceipt};
pub use memory::MemoryLedger;

use prism_spectrum::Credits;
use thiserror::Error;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors from the ledger gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The paying account cannot cover the amount.
    #[error("insufficient funds: {account} holds {available}, needs {required}")]
    InsufficientFunds {
        account: String,
        required: Credits,
        available: Credits,
    },

    /// The transfer could not be committed. Nothing moved.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// A compensating rollback could not be applied (unknown receipt,
    /// already reversed, or funds no longer available).
    #[error("rollback failed for receipt {receipt}: {detail}")]
    RollbackFailed { receipt: String, detail: String },
}
