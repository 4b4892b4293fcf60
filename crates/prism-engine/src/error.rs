//! The admission error taxonomy.

use prism_dag::{DagError, MessageId};
use prism_quorum::SelectionError;
use prism_spectrum::{Band, Credits, UnknownBand};
use thiserror::Error;

/// Result type for admission operations.
pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Everything that can go wrong while admitting a message.
///
/// The first six variants are validation-phase failures: they are detected
/// before any ledger mutation and never leave side effects. The post-payment
/// variants (`RewardDistributionFailed`, `StorageFailed`) only surface after
/// the sender's payment has been rolled back; the single exception is
/// [`CriticalLedgerInconsistency`], where the rollback itself failed and
/// funds are stranded pending manual reconciliation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The submission named a band outside the configured set.
    #[error("unknown band: {0:?}")]
    UnknownBand(String),

    /// The submission listed its own id among its parents.
    #[error("message cannot list itself as a parent")]
    SelfReference,

    /// A declared parent has not been admitted.
    #[error("missing parent {0}")]
    MissingParent(MessageId),

    /// Audit replay found a fingerprint that does not recompute.
    #[error("fingerprint mismatch against recorded value")]
    TamperDetected,

    /// Too few distinct validator bands are registered.
    #[error("insufficient band diversity: required {required}, missing {missing:?}")]
    InsufficientDiversity {
        required: usize,
        missing: Vec<Band>,
    },

    /// The sender cannot cover the message cost.
    #[error("insufficient funds: {account} holds {available}, needs {required}")]
    InsufficientFunds {
        account: String,
        required: Credits,
        available: Credits,
    },

    /// The submission was cancelled by the caller before payment began.
    #[error("submission cancelled before payment")]
    Cancelled,

    /// The sender payment could not be committed. Nothing moved; the whole
    /// submission is safe to retry.
    #[error("ledger transfer failed: {0}")]
    TransferFailed(String),

    /// A reward payout failed partway through the quorum. The sender payment
    /// was rolled back; safe to retry.
    #[error("reward distribution failed, sender payment rolled back: {0}")]
    RewardDistributionFailed(String),

    /// The message append failed after payment. The sender payment was
    /// rolled back; safe to retry.
    #[error("message store append failed, sender payment rolled back: {0}")]
    StorageFailed(String),

    /// A rollback failed after a committed payment. Funds are stranded;
    /// operators must reconcile by hand. Never retried automatically.
    #[error("CRITICAL ledger inconsistency: rollback of receipt {receipt} failed: {detail}")]
    CriticalLedgerInconsistency { receipt: String, detail: String },
}

impl AdmissionError {
    /// Stable snake_case kind tag for wire responses and log filters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownBand(_) => "unknown_band",
            Self::SelfReference => "self_reference",
            Self::MissingParent(_) => "missing_parent",
            Self::TamperDetected => "tamper_detected",
            Self::InsufficientDiversity { .. } => "insufficient_diversity",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Cancelled => "cancelled",
            Self::TransferFailed(_) => "transfer_failed",
            Self::RewardDistributionFailed(_) => "reward_distribution_failed",
            Self::StorageFailed(_) => "storage_failed",
            Self::CriticalLedgerInconsistency { .. } => "critical_ledger_inconsistency",
        }
    }

    /// Whether the whole submission can be retried as-is without operator
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransferFailed(_) | Self::RewardDistributionFailed(_) | Self::StorageFailed(_)
        )
    }
}

impl From<UnknownBand> for AdmissionError {
    fn from(err: UnknownBand) -> Self {
        Self::UnknownBand(err.0)
    }
}

impl From<DagError> for AdmissionError {
    fn from(err: DagError) -> Self {
        match err {
            DagError::MissingParent(id) => Self::MissingParent(id),
            DagError::SelfReference(_) => Self::SelfReference,
            DagError::TamperDetected { .. } => Self::TamperDetected,
            DagError::Store(e) => Self::StorageFailed(e.to_string()),
        }
    }
}

impl From<SelectionError> for AdmissionError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::InsufficientDiversity {
                required, missing, ..
            } => Self::InsufficientDiversity { required, missing },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AdmissionError::SelfReference.kind(), "self_reference");
        assert_eq!(
            AdmissionError::CriticalLedgerInconsistency {
                receipt: "r".into(),
                detail: "d".into()
            }
            .kind(),
            "critical_ledger_inconsistency"
        );
    }

    #[test]
    fn retryability() {
        assert!(AdmissionError::TransferFailed("io".into()).is_retryable());
        assert!(AdmissionError::RewardDistributionFailed("io".into()).is_retryable());
        assert!(!AdmissionError::SelfReference.is_retryable());
        assert!(!AdmissionError::CriticalLedgerInconsistency {
            receipt: "r".into(),
            detail: "d".into()
        }
        .is_retryable());
    }
}
