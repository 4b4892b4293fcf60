//! The gateway trait and transfer receipts.

use prism_spectrum::Credits;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Receipt for a committed transfer.
///
/// Holds everything needed to apply a compensating reversal later. Receipt
/// ids are unique per gateway instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Gateway-assigned receipt id.
    pub id: String,

    /// Debited account.
    pub from: String,

    /// Credited account.
    pub to: String,

    /// Amount moved.
    pub amount: Credits,

    /// Caller-supplied memo (settlement context).
    pub memo: String,
}

/// Interface to an external account ledger.
///
/// The engine treats every call as blocking and the backing system as
/// durable. Implementations must uphold:
///
/// - `commit_transfer` is all-or-nothing: on error, neither account changed.
/// - `rollback` reverses a committed transfer exactly once; a second call
///   with the same receipt must fail rather than double-reverse.
/// - `authorize` is read-only.
pub trait LedgerGateway: Send + Sync {
    /// Current balance of an account. Unknown accounts hold zero.
    fn get_balance(&self, account: &str) -> Result<Credits>;

    /// Read-only pre-check that `from` can cover `amount`.
    fn authorize(&self, from: &str, amount: Credits) -> Result<()>;

    /// Atomically debit `from` and credit `to`.
    fn commit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Credits,
        memo: &str,
    ) -> Result<TransferReceipt>;

    /// Apply the compensating reversal of a committed transfer.
    fn rollback(&self, receipt: &TransferReceipt) -> Result<()>;
}
