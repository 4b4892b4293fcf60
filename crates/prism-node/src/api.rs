//! HTTP API for the admission node.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use prism_dag::MessageId;
use prism_engine::{AdmissionEngine, AdmissionError, SubmitRequest};
use prism_ledger::LedgerGateway;
use prism_quorum::RegistryError;
use prism_spectrum::{compute_cost, Band, Credits};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::storage::{RocksLedger, RocksStore};

/// The engine type this node runs.
pub type Engine = AdmissionEngine<RocksStore, RocksLedger>;

type AppState = Arc<RwLock<Engine>>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Messages
        .route("/api/v1/messages", post(submit_message))
        .route("/api/v1/messages/:id", get(get_message))
        // Validators
        .route("/api/v1/validators", get(list_validators))
        .route("/api/v1/validators", post(register_validator))
        // Band table
        .route("/api/v1/bands", get(list_bands))
        // Accounts
        .route("/api/v1/accounts/:id", get(get_account))
        .route("/api/v1/accounts/:id/credit", post(credit_account))
        .layer(cors)
        .with_state(state)
}

/// Wire error body: `{error_kind, detail}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error_kind: String,
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn admission_error(err: &AdmissionError) -> ApiError {
    let status = match err {
        AdmissionError::UnknownBand(_)
        | AdmissionError::SelfReference
        | AdmissionError::MissingParent(_)
        | AdmissionError::TamperDetected
        | AdmissionError::Cancelled => StatusCode::BAD_REQUEST,
        AdmissionError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
        AdmissionError::InsufficientDiversity { .. }
        | AdmissionError::TransferFailed(_)
        | AdmissionError::RewardDistributionFailed(_)
        | AdmissionError::StorageFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        AdmissionError::CriticalLedgerInconsistency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error_kind: err.kind().to_string(),
            detail: err.to_string(),
        }),
    )
}

fn bad_request(error_kind: &str, detail: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error_kind: error_kind.to_string(),
            detail,
        }),
    )
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Message endpoints ---

#[derive(Debug, Deserialize)]
struct SubmitBody {
    sender: String,
    recipient: String,
    content: String,
    band: String,
    #[serde(default)]
    parent_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    message_id: String,
    fingerprint: String,
    cost: String,
    cost_micro: u128,
    quorum: Vec<String>,
    bands_represented: Vec<String>,
    admitted_at: u64,
    summary: String,
}

async fn submit_message(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let band = Band::parse(&body.band)
        .map_err(|e| admission_error(&AdmissionError::from(e)))?;

    let mut parent_ids = Vec::with_capacity(body.parent_ids.len());
    for raw in &body.parent_ids {
        let id = MessageId::from_hex(raw)
            .map_err(|_| bad_request("invalid_request", format!("invalid parent id {raw:?}")))?;
        parent_ids.push(id);
    }

    let mut engine = state.write().await;
    let admission = engine
        .submit(SubmitRequest {
            sender: body.sender,
            recipient: body.recipient,
            content: body.content,
            band,
            parent_ids,
        })
        .map_err(|e| admission_error(&e))?;

    let registry = engine.registry();
    let bands: BTreeSet<Band> = admission
        .message
        .validators
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|v| v.band)
        .collect();

    let response = SubmitResponse {
        message_id: admission.message.id.to_hex(),
        fingerprint: admission.message.fingerprint.to_hex(),
        cost: admission.message.cost.to_string(),
        cost_micro: admission.message.cost.as_micro(),
        quorum: admission.message.validators.clone(),
        bands_represented: bands.iter().map(|b| b.name().to_string()).collect(),
        admitted_at: admission.message.admitted_at,
        summary: admission.summary,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message_id: String,
    sender: String,
    recipient: String,
    content: String,
    band: String,
    parent_ids: Vec<String>,
    fingerprint: String,
    cost_micro: u128,
    validators: Vec<String>,
    admitted_at: u64,
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, StatusCode> {
    let id = MessageId::from_hex(&id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let engine = state.read().await;
    match engine.message(&id) {
        Ok(Some(message)) => Ok(Json(MessageResponse {
            message_id: message.id.to_hex(),
            sender: message.sender,
            recipient: message.recipient,
            content: message.content,
            band: message.band.name().to_string(),
            parent_ids: message.parent_ids.iter().map(|p| p.to_hex()).collect(),
            fingerprint: message.fingerprint.to_hex(),
            cost_micro: message.cost.as_micro(),
            validators: message.validators,
            admitted_at: message.admitted_at,
        })),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// --- Validator endpoints ---

#[derive(Debug, Serialize)]
struct ValidatorInfo {
    id: String,
    band: String,
    stake_micro: u128,
}

async fn list_validators(State(state): State<AppState>) -> Json<Vec<ValidatorInfo>> {
    let engine = state.read().await;
    let mut validators: Vec<ValidatorInfo> = engine
        .registry()
        .iter()
        .map(|v| ValidatorInfo {
            id: v.id.clone(),
            band: v.band.name().to_string(),
            stake_micro: v.stake.as_micro(),
        })
        .collect();
    validators.sort_by(|a, b| a.id.cmp(&b.id));
    Json(validators)
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    id: String,
    band: String,
    #[serde(default)]
    stake_micro: u128,
}

async fn register_validator(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<ValidatorInfo>), ApiError> {
    let band = Band::parse(&body.band)
        .map_err(|e| admission_error(&AdmissionError::from(e)))?;
    let stake = Credits::from_micro(body.stake_micro);

    let mut engine = state.write().await;
    engine
        .registry_mut()
        .register(body.id.clone(), band, stake)
        .map_err(|e| match e {
            RegistryError::DuplicateValidator(id) => (
                StatusCode::CONFLICT,
                Json(ErrorBody {
                    error_kind: "duplicate_validator".to_string(),
                    detail: format!("validator {id:?} is already registered"),
                }),
            ),
        })?;

    // Persist so the registry survives restarts.
    let validator = engine
        .registry()
        .get(&body.id)
        .cloned()
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error_kind: "storage_failed".to_string(),
                    detail: "validator vanished after registration".to_string(),
                }),
            )
        })?;
    engine.store().put_validator(&validator).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error_kind: "storage_failed".to_string(),
                detail: e.to_string(),
            }),
        )
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ValidatorInfo {
            id: validator.id,
            band: validator.band.name().to_string(),
            stake_micro: validator.stake.as_micro(),
        }),
    ))
}

// --- Band endpoints ---

#[derive(Debug, Serialize)]
struct BandInfo {
    band: String,
    frequency_hz: u64,
    cost_1kib: String,
    cost_1kib_micro: u128,
}

async fn list_bands() -> Json<Vec<BandInfo>> {
    let bands = Band::ALL
        .into_iter()
        .map(|band| {
            let cost = compute_cost(1024, band);
            BandInfo {
                band: band.name().to_string(),
                frequency_hz: band.frequency_hz(),
                cost_1kib: cost.to_string(),
                cost_1kib_micro: cost.as_micro(),
            }
        })
        .collect();
    Json(bands)
}

// --- Account endpoints ---

#[derive(Debug, Serialize)]
struct AccountResponse {
    account: String,
    balance: String,
    balance_micro: u128,
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, StatusCode> {
    let engine = state.read().await;
    match engine.ledger().get_balance(&id) {
        Ok(balance) => Ok(Json(AccountResponse {
            account: id,
            balance: balance.to_string(),
            balance_micro: balance.as_micro(),
        })),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[derive(Debug, Deserialize)]
struct CreditBody {
    amount_micro: u128,
}

async fn credit_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreditBody>,
) -> Result<Json<AccountResponse>, StatusCode> {
    // Write guard: credits must not interleave with a submission's
    // settlement.
    let engine = state.write().await;
    match engine
        .ledger()
        .credit(&id, Credits::from_micro(body.amount_micro))
    {
        Ok(balance) => Ok(Json(AccountResponse {
            account: id,
            balance: balance.to_string(),
            balance_micro: balance.as_micro(),
        })),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
