//! The admission engine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use prism_dag::{derive_message_id, validate_and_link, Message, MessageId, MessageStore};
use prism_ledger::{LedgerError, LedgerGateway, TransferReceipt};
use prism_quorum::{distinct_bands, select_quorum, ValidatorRegistry};
use prism_spectrum::{compute_cost, Band};
use tracing::{debug, error, info, trace, warn};

use crate::error::{AdmissionError, Result};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum number of distinct bands an admitting quorum must span.
    pub diversity: usize,

    /// Fraction of each message cost paid out to the quorum, in basis
    /// points (4000 = 40%). The remainder stays in the protocol pool.
    pub reward_fraction_bps: u32,

    /// Ledger account that receives sender payments and disburses rewards.
    pub pool_account: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            diversity: 5,
            reward_fraction_bps: 4_000,
            pool_account: "prism.pool".to_string(),
        }
    }
}

impl EngineConfig {
    /// Set the quorum diversity threshold.
    #[must_use]
    pub fn with_diversity(mut self, diversity: usize) -> Self {
        self.diversity = diversity;
        self
    }

    /// Set the validator reward fraction in basis points.
    #[must_use]
    pub fn with_reward_fraction_bps(mut self, bps: u32) -> Self {
        self.reward_fraction_bps = bps;
        self
    }

    /// Set the protocol pool account.
    #[must_use]
    pub fn with_pool_account(mut self, account: impl Into<String>) -> Self {
        self.pool_account = account.into();
        self
    }
}

/// Phases a submission moves through. Used for structured logging; a
/// submission that fails validation never leaves `Validating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// DAG, quorum and funds checks - no side effects yet.
    Validating,
    /// Cost computed and authorized.
    Costed,
    /// Sender payment committed.
    Paid,
    /// All validator rewards committed.
    RewardsDistributed,
    /// Message appended; submission complete.
    Admitted,
    /// Post-payment failure, sender payment reversed.
    RolledBack,
}

impl std::fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validating => write!(f, "Validating"),
            Self::Costed => write!(f, "Costed"),
            Self::Paid => write!(f, "Paid"),
            Self::RewardsDistributed => write!(f, "RewardsDistributed"),
            Self::Admitted => write!(f, "Admitted"),
            Self::RolledBack => write!(f, "RolledBack"),
        }
    }
}

/// Cooperative cancellation handle for a submission.
///
/// Cancellation is honored up to the payment boundary: once the sender's
/// transfer has been committed the submission runs to Admitted or
/// RolledBack, never silently abandoned mid-payment.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A message submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Paying account.
    pub sender: String,
    /// Receiving account.
    pub recipient: String,
    /// Payload.
    pub content: String,
    /// Band chosen by the sender.
    pub band: Band,
    /// Declared parents; duplicates are collapsed before validation.
    pub parent_ids: Vec<MessageId>,
}

/// A successful admission: the immutable message plus a human-readable
/// settlement summary.
#[derive(Debug, Clone)]
pub struct Admission {
    /// The admitted message as appended to the store.
    pub message: Message,
    /// One-line settlement summary (cost, quorum bands, fingerprint prefix).
    pub summary: String,
}

/// The message admission engine.
///
/// Owns the validator registry and the rotation counter; consumes a message
/// store and a ledger gateway. One `submit` call is one unit of work - the
/// caller serializes concurrent submissions by holding the engine behind a
/// lock, which also keeps the rotation counter and parent lookups
/// consistent.
#[derive(Debug)]
pub struct AdmissionEngine<S, L> {
    store: S,
    ledger: L,
    registry: ValidatorRegistry,
    config: EngineConfig,
    /// Messages admitted by this engine; feeds quorum rotation.
    admitted: u64,
}

impl<S: MessageStore, L: LedgerGateway> AdmissionEngine<S, L> {
    /// Create an engine over its collaborators.
    pub fn new(store: S, ledger: L, registry: ValidatorRegistry, config: EngineConfig) -> Self {
        debug!(
            diversity = config.diversity,
            reward_fraction_bps = config.reward_fraction_bps,
            pool = %config.pool_account,
            validators = registry.len(),
            "created admission engine"
        );
        Self {
            store,
            ledger,
            registry,
            config,
            admitted: 0,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The validator registry.
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Mutable registry access for registration surfaces.
    pub fn registry_mut(&mut self) -> &mut ValidatorRegistry {
        &mut self.registry
    }

    /// The message store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The ledger gateway.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Messages admitted by this engine instance.
    pub fn admitted_count(&self) -> u64 {
        self.admitted
    }

    /// Fetch an admitted message.
    pub fn message(&self, id: &MessageId) -> Result<Option<Message>> {
        self.store
            .get(id)
            .map_err(|e| AdmissionError::StorageFailed(e.to_string()))
    }

    /// Recompute and check a stored message's fingerprint against the
    /// recorded value. Audit/replay surface; fails with
    /// [`AdmissionError::TamperDetected`] on mismatch.
    pub fn audit_message(&self, message: &Message) -> Result<()> {
        validate_and_link(
            &message.id,
            message.band,
            message.content.as_bytes(),
            &message.parent_ids,
            &self.store,
            Some(&message.fingerprint),
        )?;
        Ok(())
    }

    /// Admit one message.
    ///
    /// Equivalent to [`submit_with_cancel`](Self::submit_with_cancel) with a
    /// token that never fires.
    pub fn submit(&mut self, request: SubmitRequest) -> Result<Admission> {
        self.submit_with_cancel(request, &CancelToken::new())
    }

    /// Admit one message, honoring `cancel` up to the payment boundary.
    ///
    /// Runs the full state machine: validate → cost → pay → reward →
    /// record. See the crate docs for the ordering and rollback guarantees.
    pub fn submit_with_cancel(
        &mut self,
        request: SubmitRequest,
        cancel: &CancelToken,
    ) -> Result<Admission> {
        let SubmitRequest {
            sender,
            recipient,
            content,
            band,
            parent_ids,
        } = request;

        // --- Validating: no side effects past this whole block ---
        let parents = dedup_parents(parent_ids);
        let admitted_at = now_millis();
        let nonce: u64 = rand::random();
        let id = derive_message_id(&sender, band, content.as_bytes(), admitted_at, nonce);

        trace!(
            phase = %SubmissionPhase::Validating,
            id = %id.short(),
            %band,
            parents = parents.len(),
            "validating submission"
        );

        let fingerprint =
            validate_and_link(&id, band, content.as_bytes(), &parents, &self.store, None)?;

        let quorum = select_quorum(&self.registry, self.config.diversity, self.admitted)?;
        let bands = distinct_bands(&quorum);
        if bands.len() < self.config.diversity {
            // Selector postcondition re-checked, not trusted.
            error!(
                got = bands.len(),
                required = self.config.diversity,
                "quorum selector violated its diversity postcondition"
            );
            return Err(AdmissionError::InsufficientDiversity {
                required: self.config.diversity,
                missing: self.registry.bands_missing(),
            });
        }

        // --- Costed ---
        let cost = compute_cost(content.len() as u64, band);
        trace!(phase = %SubmissionPhase::Costed, id = %id.short(), %cost, "costed submission");
        self.ledger.authorize(&sender, cost).map_err(map_ledger)?;

        if cancel.is_cancelled() {
            debug!(id = %id.short(), "submission cancelled before payment");
            return Err(AdmissionError::Cancelled);
        }

        // --- Paid: every failure from here on rolls the payment back ---
        let memo = format!("msg {} on {}", id.short(), band);
        let payment = self
            .ledger
            .commit_transfer(&sender, &self.config.pool_account, cost, &memo)
            .map_err(map_ledger)?;
        trace!(phase = %SubmissionPhase::Paid, id = %id.short(), receipt = %payment.id, "sender payment committed");

        // --- RewardsDistributed ---
        let reward_pot = cost.scale_bps(self.config.reward_fraction_bps);
        let per_validator = reward_pot.split_evenly(quorum.len());
        let mut reward_receipts: Vec<TransferReceipt> = Vec::with_capacity(quorum.len());
        if !per_validator.is_zero() {
            for validator in &quorum {
                match self.ledger.commit_transfer(
                    &self.config.pool_account,
                    &validator.id,
                    per_validator,
                    &memo,
                ) {
                    Ok(receipt) => reward_receipts.push(receipt),
                    Err(e) => {
                        warn!(
                            id = %id.short(),
                            validator = %validator.id,
                            error = %e,
                            "reward transfer failed, reversing submission"
                        );
                        return Err(self.abort_paid(
                            &payment,
                            &reward_receipts,
                            AdmissionError::RewardDistributionFailed(e.to_string()),
                        ));
                    }
                }
            }
        }
        trace!(
            phase = %SubmissionPhase::RewardsDistributed,
            id = %id.short(),
            per_validator = %per_validator,
            quorum = quorum.len(),
            "rewards distributed"
        );

        // --- Admitted ---
        let message = Message {
            id,
            sender,
            recipient,
            content,
            band,
            parent_ids: parents,
            fingerprint,
            cost,
            validators: quorum.iter().map(|v| v.id.clone()).collect(),
            admitted_at,
        };

        if let Err(e) = self.store.append(&message) {
            warn!(id = %id.short(), error = %e, "append failed, reversing submission");
            return Err(self.abort_paid(
                &payment,
                &reward_receipts,
                AdmissionError::StorageFailed(e.to_string()),
            ));
        }

        self.admitted += 1;
        let summary = settlement_summary(&message, &bands);
        info!(
            phase = %SubmissionPhase::Admitted,
            id = %id.short(),
            %cost,
            bands = bands.len(),
            fingerprint = %message.fingerprint.short(),
            "message admitted"
        );

        Ok(Admission { message, summary })
    }

    /// Reverse every committed transfer of a failed submission.
    ///
    /// Compensations apply newest-first: reward payouts back into the pool,
    /// then the sender payment out of it, so the pool can always cover each
    /// step. Returns `cause` when every reversal lands; escalates to
    /// [`AdmissionError::CriticalLedgerInconsistency`] on the first reversal
    /// that does not.
    fn abort_paid(
        &self,
        payment: &TransferReceipt,
        reward_receipts: &[TransferReceipt],
        cause: AdmissionError,
    ) -> AdmissionError {
        for receipt in reward_receipts.iter().rev() {
            if let Err(rollback_err) = self.ledger.rollback(receipt) {
                error!(
                    receipt = %receipt.id,
                    cause = %cause,
                    error = %rollback_err,
                    "ROLLBACK FAILED after committed payment - manual reconciliation required"
                );
                return AdmissionError::CriticalLedgerInconsistency {
                    receipt: receipt.id.clone(),
                    detail: rollback_err.to_string(),
                };
            }
        }

        match self.ledger.rollback(payment) {
            Ok(()) => {
                debug!(
                    phase = %SubmissionPhase::RolledBack,
                    receipt = %payment.id,
                    reversed_rewards = reward_receipts.len(),
                    "submission reversed, sender made whole"
                );
                cause
            }
            Err(rollback_err) => {
                error!(
                    receipt = %payment.id,
                    cause = %cause,
                    error = %rollback_err,
                    "ROLLBACK FAILED after committed payment - manual reconciliation required"
                );
                AdmissionError::CriticalLedgerInconsistency {
                    receipt: payment.id.clone(),
                    detail: rollback_err.to_string(),
                }
            }
        }
    }
}

/// Collapse duplicate parent ids, preserving first-occurrence order.
fn dedup_parents(parent_ids: Vec<MessageId>) -> Vec<MessageId> {
    let mut seen = HashSet::new();
    parent_ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn settlement_summary(message: &Message, bands: &[Band]) -> String {
    let band_names: Vec<&str> = bands.iter().map(|b| b.name()).collect();
    format!(
        "admitted {} on {}: cost {}, quorum of {} across [{}], fingerprint {}",
        message.id.short(),
        message.band,
        message.cost,
        message.validators.len(),
        band_names.join(", "),
        message.fingerprint.short(),
    )
}

fn map_ledger(err: LedgerError) -> AdmissionError {
    match err {
        LedgerError::InsufficientFunds {
            account,
            required,
            available,
        } => AdmissionError::InsufficientFunds {
            account,
            required,
            available,
        },
        other => AdmissionError::TransferFailed(other.to_string()),
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_dag::{MemoryStore, StoreError};
    use prism_ledger::MemoryLedger;
    use prism_spectrum::Credits;
    use std::sync::atomic::AtomicU64;

    const SENDER: &str = "alice";
    const RECIPIENT: &str = "bob";
    const POOL: &str = "prism.pool";

    /// Ledger wrapper that fails the Nth commit_transfer call (1-based) and
    /// optionally refuses rollbacks.
    struct FlakyLedger {
        inner: MemoryLedger,
        commits: AtomicU64,
        fail_commit_at: Option<u64>,
        fail_rollback: bool,
    }

    impl FlakyLedger {
        fn new(inner: MemoryLedger) -> Self {
            Self {
                inner,
                commits: AtomicU64::new(0),
                fail_commit_at: None,
                fail_rollback: false,
            }
        }

        fn fail_commit_at(mut self, n: u64) -> Self {
            self.fail_commit_at = Some(n);
            self
        }

        fn fail_rollback(mut self) -> Self {
            self.fail_rollback = true;
            self
        }
    }

    impl LedgerGateway for FlakyLedger {
        fn get_balance(&self, account: &str) -> prism_ledger::Result<Credits> {
            self.inner.get_balance(account)
        }

        fn authorize(&self, from: &str, amount: Credits) -> prism_ledger::Result<()> {
            self.inner.authorize(from, amount)
        }

        fn commit_transfer(
            &self,
            from: &str,
            to: &str,
            amount: Credits,
            memo: &str,
        ) -> prism_ledger::Result<TransferReceipt> {
            let n = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_commit_at == Some(n) {
                return Err(LedgerError::TransferFailed(format!(
                    "injected failure on commit #{n}"
                )));
            }
            self.inner.commit_transfer(from, to, amount, memo)
        }

        fn rollback(&self, receipt: &TransferReceipt) -> prism_ledger::Result<()> {
            if self.fail_rollback {
                return Err(LedgerError::RollbackFailed {
                    receipt: receipt.id.clone(),
                    detail: "injected rollback failure".to_string(),
                });
            }
            self.inner.rollback(receipt)
        }
    }

    /// Store wrapper whose append always fails.
    struct BrokenStore(MemoryStore);

    impl MessageStore for BrokenStore {
        fn get(&self, id: &MessageId) -> std::result::Result<Option<Message>, StoreError> {
            self.0.get(id)
        }

        fn append(&self, _message: &Message) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    fn registry_over(bands: &[Band]) -> ValidatorRegistry {
        let mut registry = ValidatorRegistry::new();
        for band in bands {
            registry
                .register(format!("val-{band}"), *band, Credits::from_whole(100))
                .unwrap();
        }
        registry
    }

    fn funded_ledger() -> MemoryLedger {
        MemoryLedger::with_balances([(SENDER, Credits::from_whole(1_000))])
    }

    fn engine_with(
        bands: &[Band],
    ) -> AdmissionEngine<MemoryStore, MemoryLedger> {
        AdmissionEngine::new(
            MemoryStore::new(),
            funded_ledger(),
            registry_over(bands),
            EngineConfig::default(),
        )
    }

    fn request(content: &str, band: Band, parents: Vec<MessageId>) -> SubmitRequest {
        SubmitRequest {
            sender: SENDER.to_string(),
            recipient: RECIPIENT.to_string(),
            content: content.to_string(),
            band,
            parent_ids: parents,
        }
    }

    #[test]
    fn genesis_with_five_of_six_bands() {
        // Scenario: validators in exactly 5 bands, K=5.
        let mut engine = engine_with(&Band::ALL[..5]);

        let admission = engine.submit(request("hello", Band::Visible, vec![])).unwrap();

        assert!(admission.message.is_genesis());
        assert_eq!(admission.message.validators.len(), 5);
        let bands: HashSet<Band> = admission
            .message
            .validators
            .iter()
            .map(|id| engine.registry().get(id).unwrap().band)
            .collect();
        assert_eq!(bands.len(), 5);
        assert!(admission.summary.contains("quorum of 5"));
    }

    #[test]
    fn four_bands_is_insufficient_and_free() {
        let mut engine = engine_with(&Band::ALL[..4]);
        let before = engine.ledger().get_balance(SENDER).unwrap();

        let err = engine.submit(request("hello", Band::Visible, vec![])).unwrap_err();

        assert_eq!(
            err,
            AdmissionError::InsufficientDiversity {
                required: 5,
                missing: vec![Band::Ultraviolet, Band::XRay],
            }
        );
        assert_eq!(engine.ledger().get_balance(SENDER).unwrap(), before);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn child_fingerprint_chains_and_ids_stay_unique() {
        let mut engine = engine_with(&Band::ALL);

        let a = engine.submit(request("root", Band::Visible, vec![])).unwrap();
        let b = engine
            .submit(request("leaf", Band::Visible, vec![a.message.id]))
            .unwrap();
        // Same content, band and parent as b - new submission.
        let c = engine
            .submit(request("leaf", Band::Visible, vec![a.message.id]))
            .unwrap();

        // Linking to a parent changes the fingerprint relative to genesis.
        assert_ne!(b.message.fingerprint, a.message.fingerprint);
        // Identical inputs reproduce the fingerprint but never the id.
        assert_eq!(c.message.fingerprint, b.message.fingerprint);
        assert_ne!(c.message.id, b.message.id);
    }

    #[test]
    fn duplicate_parents_collapse() {
        let mut engine = engine_with(&Band::ALL);

        let a = engine.submit(request("root", Band::Radio, vec![])).unwrap();
        let b = engine
            .submit(request("leaf", Band::Radio, vec![a.message.id, a.message.id]))
            .unwrap();
        let single = engine
            .submit(request("leaf", Band::Radio, vec![a.message.id]))
            .unwrap();

        assert_eq!(b.message.parent_ids, vec![a.message.id]);
        assert_eq!(b.message.fingerprint, single.message.fingerprint);
    }

    #[test]
    fn balance_one_micro_short_fails_clean() {
        let cost = compute_cost(5, Band::Visible);
        let ledger = MemoryLedger::with_balances([(
            SENDER,
            Credits::from_micro(cost.as_micro() - 1),
        )]);
        let mut engine = AdmissionEngine::new(
            MemoryStore::new(),
            ledger,
            registry_over(&Band::ALL),
            EngineConfig::default(),
        );

        let err = engine.submit(request("hello", Band::Visible, vec![])).unwrap_err();

        assert!(matches!(err, AdmissionError::InsufficientFunds { .. }));
        assert_eq!(
            engine.ledger().get_balance(SENDER).unwrap(),
            Credits::from_micro(cost.as_micro() - 1)
        );
        assert!(engine.store().is_empty());
    }

    #[test]
    fn missing_parent_never_charges() {
        let mut engine = engine_with(&Band::ALL);
        let before = engine.ledger().get_balance(SENDER).unwrap();
        let ghost = MessageId([7; 32]);

        let err = engine.submit(request("leaf", Band::Radio, vec![ghost])).unwrap_err();

        assert_eq!(err, AdmissionError::MissingParent(ghost));
        assert_eq!(engine.ledger().get_balance(SENDER).unwrap(), before);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn admitted_message_is_immutable_in_store() {
        let mut engine = engine_with(&Band::ALL);

        let admission = engine.submit(request("root", Band::Visible, vec![])).unwrap();
        // Issue more traffic, then re-read the original.
        engine.submit(request("noise", Band::Radio, vec![])).unwrap();
        engine
            .submit(request("leaf", Band::Radio, vec![admission.message.id]))
            .unwrap();

        let stored = engine.message(&admission.message.id).unwrap().unwrap();
        assert_eq!(stored, admission.message);
    }

    #[test]
    fn payment_settles_cost_and_rewards() {
        let mut engine = engine_with(&Band::ALL);
        let before = engine.ledger().get_balance(SENDER).unwrap();

        let admission = engine.submit(request("hello", Band::Visible, vec![])).unwrap();
        let cost = admission.message.cost;

        // Sender paid exactly the cost.
        assert_eq!(
            engine.ledger().get_balance(SENDER).unwrap(),
            before.checked_sub(cost).unwrap()
        );

        // 40% split across 5 validators, remainder retained by the pool.
        let per_validator = cost.scale_bps(4_000).split_evenly(5);
        let mut paid_out = Credits::ZERO;
        for id in &admission.message.validators {
            assert_eq!(engine.ledger().get_balance(id).unwrap(), per_validator);
            paid_out = paid_out.checked_add(per_validator).unwrap();
        }
        assert_eq!(
            engine.ledger().get_balance(POOL).unwrap(),
            cost.checked_sub(paid_out).unwrap()
        );
    }

    #[test]
    fn reward_failure_restores_sender_and_stores_nothing() {
        // Commit #1 is the sender payment; #3 is the second reward.
        let ledger = FlakyLedger::new(funded_ledger()).fail_commit_at(3);
        let mut engine = AdmissionEngine::new(
            MemoryStore::new(),
            ledger,
            registry_over(&Band::ALL),
            EngineConfig::default(),
        );
        let before = engine.ledger().get_balance(SENDER).unwrap();

        let err = engine.submit(request("hello", Band::Visible, vec![])).unwrap_err();

        assert!(matches!(err, AdmissionError::RewardDistributionFailed(_)));
        assert_eq!(engine.ledger().get_balance(SENDER).unwrap(), before);
        // The one paid reward was reversed along with the payment.
        assert_eq!(
            engine.ledger().get_balance("val-radio").unwrap(),
            Credits::ZERO
        );
        assert_eq!(engine.ledger().get_balance(POOL).unwrap(), Credits::ZERO);
        assert!(engine.store().is_empty());
        assert_eq!(engine.admitted_count(), 0);
    }

    #[test]
    fn failed_rollback_is_critical() {
        let ledger = FlakyLedger::new(funded_ledger())
            .fail_commit_at(3)
            .fail_rollback();
        let mut engine = AdmissionEngine::new(
            MemoryStore::new(),
            ledger,
            registry_over(&Band::ALL),
            EngineConfig::default(),
        );

        let err = engine.submit(request("hello", Band::Visible, vec![])).unwrap_err();

        assert!(matches!(
            err,
            AdmissionError::CriticalLedgerInconsistency { .. }
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn append_failure_rolls_back_payment() {
        let mut engine = AdmissionEngine::new(
            BrokenStore(MemoryStore::new()),
            funded_ledger(),
            registry_over(&Band::ALL),
            EngineConfig::default(),
        );
        let before = engine.ledger().get_balance(SENDER).unwrap();

        let err = engine.submit(request("hello", Band::Visible, vec![])).unwrap_err();

        assert!(matches!(err, AdmissionError::StorageFailed(_)));
        // Sender whole, rewards clawed back, pool drained.
        assert_eq!(engine.ledger().get_balance(SENDER).unwrap(), before);
        for band in Band::ALL {
            assert_eq!(
                engine.ledger().get_balance(&format!("val-{band}")).unwrap(),
                Credits::ZERO
            );
        }
        assert_eq!(engine.ledger().get_balance(POOL).unwrap(), Credits::ZERO);
        assert_eq!(engine.admitted_count(), 0);
    }

    #[test]
    fn cancellation_honored_before_payment_only() {
        let mut engine = engine_with(&Band::ALL);
        let before = engine.ledger().get_balance(SENDER).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = engine
            .submit_with_cancel(request("hello", Band::Visible, vec![]), &cancel)
            .unwrap_err();

        assert_eq!(err, AdmissionError::Cancelled);
        assert_eq!(engine.ledger().get_balance(SENDER).unwrap(), before);

        // A fresh token admits normally.
        engine
            .submit_with_cancel(request("hello", Band::Visible, vec![]), &CancelToken::new())
            .unwrap();
    }

    #[test]
    fn zero_length_content_pays_the_floor() {
        let mut engine = engine_with(&Band::ALL);

        let admission = engine.submit(request("", Band::Radio, vec![])).unwrap();
        assert_eq!(admission.message.cost, prism_spectrum::COST_FLOOR);
    }

    #[test]
    fn rotation_leads_each_band_equally() {
        // All six bands registered, K=1 so the lead band is the whole quorum.
        let mut engine = AdmissionEngine::new(
            MemoryStore::new(),
            MemoryLedger::with_balances([(SENDER, Credits::from_whole(100_000))]),
            registry_over(&Band::ALL),
            EngineConfig::default().with_diversity(1),
        );

        let rounds = Band::COUNT * 3;
        let mut leads: std::collections::BTreeMap<Band, u32> = Default::default();
        for i in 0..rounds {
            let admission = engine
                .submit(request(&format!("m{i}"), Band::Radio, vec![]))
                .unwrap();
            let lead = engine
                .registry()
                .get(&admission.message.validators[0])
                .unwrap()
                .band;
            *leads.entry(lead).or_default() += 1;
        }

        for band in Band::ALL {
            assert_eq!(leads[&band], 3, "{band} should lead 3 times");
        }
    }

    #[test]
    fn audit_replay_checks_recorded_fingerprints() {
        let mut engine = engine_with(&Band::ALL);

        let a = engine.submit(request("root", Band::Visible, vec![])).unwrap();
        let b = engine
            .submit(request("leaf", Band::Visible, vec![a.message.id]))
            .unwrap();

        engine.audit_message(&a.message).unwrap();
        engine.audit_message(&b.message).unwrap();

        // A doctored copy fails the replay.
        let mut doctored = b.message.clone();
        doctored.content = "lead".to_string();
        assert_eq!(
            engine.audit_message(&doctored).unwrap_err(),
            AdmissionError::TamperDetected
        );
    }

    #[test]
    fn rotation_counter_only_advances_on_admission() {
        let mut engine = engine_with(&Band::ALL[..4]);

        assert!(engine.submit(request("x", Band::Radio, vec![])).is_err());
        assert_eq!(engine.admitted_count(), 0);
    }
}
