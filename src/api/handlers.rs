//! REST API handlers for the ballot page

use crate::api::websocket::SharedTallyView;
use crate::client::{ClientError, VotingClient};
use crate::storage::DeploymentDescriptor;
use axum::{extract::State, http::StatusCode, Json};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub client: Arc<VotingClient>,
    pub view: Arc<SharedTallyView>,
    pub descriptor: Arc<DeploymentDescriptor>,
    /// Account signing votes that do not name a sender
    pub default_sender: Address,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CandidateInfo {
    pub candidate: String,
    pub location: String,
    /// Last rendered tally, if any
    pub votes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub rendered: usize,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub candidate: String,
    pub location: String,
    pub votes: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub candidate: String,
    /// Sender address; the configured account when absent
    pub sender: Option<String>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn error_response(err: ClientError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        ClientError::UnknownCandidate(_) => StatusCode::NOT_FOUND,
        ClientError::CallTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ClientError::VoteFailed { .. } | ClientError::CallError(_) | ClientError::Account(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /contract.json - Deployment descriptor
pub async fn get_descriptor(State(state): State<ApiState>) -> Json<DeploymentDescriptor> {
    Json(state.descriptor.as_ref().clone())
}

/// GET /api/candidates - Registry with last rendered tallies
pub async fn list_candidates(State(state): State<ApiState>) -> Json<Vec<CandidateInfo>> {
    let tallies = state.view.snapshot();
    let candidates = state
        .client
        .registry()
        .slots()
        .iter()
        .map(|slot| CandidateInfo {
            candidate: slot.candidate.clone(),
            location: slot.location.clone(),
            votes: tallies.get(&slot.location).cloned(),
        })
        .collect();
    Json(candidates)
}

/// GET /api/tallies - Text of every display location
pub async fn get_tallies(State(state): State<ApiState>) -> Json<BTreeMap<String, String>> {
    Json(state.view.snapshot())
}

/// POST /api/refresh - Re-read all tallies from the contract
pub async fn refresh(State(state): State<ApiState>) -> ApiResult<RefreshResponse> {
    let rendered = state.client.render_all().await.map_err(error_response)?;
    Ok(Json(RefreshResponse { rendered }))
}

/// POST /api/vote - Cast a vote and return the new tally
pub async fn vote(
    State(state): State<ApiState>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<VoteResponse> {
    let sender = match req.sender.as_deref() {
        Some(text) => text.parse::<Address>().map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    error: format!("Invalid sender address {:?}: {}", text, e),
                }),
            )
        })?,
        None => state.default_sender,
    };

    let location = state
        .client
        .registry()
        .location(&req.candidate)
        .map(str::to_string)
        .map_err(|e| error_response(e.into()))?;

    let votes = state
        .client
        .vote(&req.candidate, sender)
        .await
        .map_err(error_response)?;

    Ok(Json(VoteResponse {
        candidate: req.candidate,
        location,
        votes,
    }))
}
