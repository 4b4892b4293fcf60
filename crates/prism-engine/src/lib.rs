//! Prism message admission.
//!
//! The admission engine is the only write path into the message DAG. One
//! submission is one unit of work that runs:
//!
//! ```text
//! Validating → Costed → Paid → RewardsDistributed → Admitted
//! ```
//!
//! with two hard guarantees:
//!
//! - **Validation before money.** DAG linking, quorum diversity, cost and
//!   the authorization pre-check all run before any ledger mutation. A
//!   malformed submission never costs the sender anything.
//! - **Rollback after money.** Once the sender's payment has been committed,
//!   any later failure (a reward transfer, the store append) triggers
//!   compensating reversals of every committed transfer - rewards first,
//!   then the payment - before the error surfaces. The one failure that
//!   escapes is a failed reversal itself, surfaced loudly as
//!   [`AdmissionError::CriticalLedgerInconsistency`].
//!
//! The engine takes its collaborators - [`prism_quorum::ValidatorRegistry`],
//! a [`prism_dag::MessageStore`] and a [`prism_ledger::LedgerGateway`] - as
//! constructor arguments. There is no process-wide state.

mod engine;
mod error;

pub use engine::{
    Admission, AdmissionEngine, CancelToken, EngineConfig, SubmissionPhase, SubmitRequest,
};
pub use error::{AdmissionError, Result};
