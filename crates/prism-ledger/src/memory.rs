//! In-memory reference ledger.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use prism_spectrum::Credits;
use tracing::debug;

use crate::gateway::{LedgerGateway, TransferReceipt};
use crate::{LedgerError, Result};

#[derive(Debug, Default)]
struct Inner {
    balances: HashMap<String, Credits>,
    /// Receipts issued by this ledger, by id.
    issued: HashMap<String, TransferReceipt>,
    /// Receipt ids already reversed. Rollback is at-most-once.
    reversed: HashSet<String>,
    next_receipt: u64,
}

/// Mutex-guarded in-memory ledger.
///
/// Transfers mutate both balances under one lock acquisition, which gives
/// the all-or-nothing property the gateway contract requires.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-funded with the given balances.
    pub fn with_balances<I, S>(balances: I) -> Self
    where
        I: IntoIterator<Item = (S, Credits)>,
        S: Into<String>,
    {
        let ledger = Self::new();
        {
            let mut inner = ledger.inner.lock().expect("ledger lock poisoned");
            for (account, amount) in balances {
                inner.balances.insert(account.into(), amount);
            }
        }
        ledger
    }

    /// Credit an account out of thin air. Operator/faucet surface, not part
    /// of the gateway contract.
    pub fn credit(&self, account: &str, amount: Credits) -> Credits {
        let mut inner = self.inner.lock().expect("ledger lock poisoned");
        let balance = inner.balances.entry(account.to_string()).or_default();
        *balance = balance
            .checked_add(amount)
            .unwrap_or(*balance);
        *balance
    }
}

impl LedgerGateway for MemoryLedger {
    fn get_balance(&self, account: &str) -> Result<Credits> {
        let inner = self.inner.lock().expect("ledger lock poisoned");
        Ok(inner.balances.get(account).copied().unwrap_or(Credits::ZERO))
    }

    fn authorize(&self, from: &str, amount: Credits) -> Result<()> {
        let inner = self.inner.lock().expect("ledger lock poisoned");
        let available = inner.balances.get(from).copied().unwrap_or(Credits::ZERO);
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
    ) -> Result<TransferReceipt> {
        let mut inner = self.inner.lock().expect("ledger lock poisoned");

        let available = inner.balances.get(from).copied().unwrap_or(Credits::ZERO);
        let debited = available.checked_sub(amount).ok_or_else(|| {
            LedgerError::InsufficientFunds {
                account: from.to_string(),
                required: amount,
                available,
            }
        })?;

        // Compute both sides before touching either - all-or-nothing.
        if from != to {
            let holder = inner.balances.get(to).copied().unwrap_or(Credits::ZERO);
            let credited = holder
                .checked_add(amount)
                .ok_or_else(|| LedgerError::TransferFailed("balance overflow".to_string()))?;
            inner.balances.insert(from.to_string(), debited);
            inner.balances.insert(to.to_string(), credited);
        }

        inner.next_receipt += 1;
        let receipt = TransferReceipt {
            id: format!("mem-{:08}", inner.next_receipt),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            memo: memo.to_string(),
        };
        inner.issued.insert(receipt.id.clone(), receipt.clone());

        debug!(
            receipt = %receipt.id,
            from,
            to,
            amount = %amount,
            memo,
            "committed transfer"
        );
        Ok(receipt)
    }

    fn rollback(&self, receipt: &TransferReceipt) -> Result<()> {
        let mut inner = self.inner.lock().expect("ledger lock poisoned");

        // Reverse what was issued, not what the caller hands us.
        let issued = inner
            .issued
            .get(&receipt.id)
            .cloned()
            .ok_or_else(|| LedgerError::RollbackFailed {
                receipt: receipt.id.clone(),
                detail: "unknown receipt".to_string(),
            })?;
        if inner.reversed.contains(&issued.id) {
            return Err(LedgerError::RollbackFailed {
                receipt: issued.id.clone(),
                detail: "already reversed".to_string(),
            });
        }

        if issued.from != issued.to {
            let holder = inner
                .balances
                .get(&issued.to)
                .copied()
                .unwrap_or(Credits::ZERO);
            let drained = holder.checked_sub(issued.amount).ok_or_else(|| {
                LedgerError::RollbackFailed {
                    receipt: issued.id.clone(),
                    detail: format!(
                        "recipient {} no longer holds {}",
                        issued.to, issued.amount
                    ),
                }
            })?;
            let restored = inner
                .balances
                .get(&issued.from)
                .copied()
                .unwrap_or(Credits::ZERO)
                .checked_add(issued.amount)
                .ok_or_else(|| LedgerError::RollbackFailed {
                    receipt: issued.id.clone(),
                    detail: "balance overflow on reversal".to_string(),
                })?;

            inner.balances.insert(issued.to.clone(), drained);
            inner.balances.insert(issued.from.clone(), restored);
        }
        inner.reversed.insert(issued.id.clone());

        debug!(receipt = %issued.id, "reversed transfer");
        Ok(())
    }
}
