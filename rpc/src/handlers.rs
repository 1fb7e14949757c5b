//! RPC request handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use verileaf_registry::{EventLog, LoggedEvent};
use verileaf_store::RegistryStore;
use verileaf_types::{Claim, Identity, ImpactScore};

use crate::auth::{calls, RegisterClaimCall, SetVerifierCall, SignedCall, SubmitImpactScoreCall};
use crate::error::RpcError;
use crate::pagination::{next_cursor, Page, PaginationParams};
use crate::server::AppState;

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct RolesResponse {
    pub owner: Identity,
    pub verifier: Identity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub identity: Identity,
    /// Hex-encoded geometry bytes; empty for an absent claim.
    pub geometry: String,
    pub location_name: String,
    pub registered_at: u64,
    pub present: bool,
}

impl ClaimResponse {
    fn new(identity: Identity, claim: Claim) -> Self {
        Self {
            identity,
            geometry: hex::encode(&claim.geometry),
            location_name: claim.location_name,
            registered_at: claim.registered_at.as_secs(),
            present: claim.present,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub identity: Identity,
    pub score: ImpactScore,
}

/// Acknowledges an applied write.
#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub call: String,
    pub caller: Identity,
}

// ── Reads ────────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_roles<S, L>(State(state): State<AppState<S, L>>) -> Json<RolesResponse>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    let roles = state.registry.read().await.roles();
    Json(RolesResponse {
        owner: roles.owner,
        verifier: roles.verifier,
    })
}

pub async fn get_claim<S, L>(
    State(state): State<AppState<S, L>>,
    Path(identity): Path<String>,
) -> Result<Json<ClaimResponse>, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    let identity = Identity::parse(&identity)?;
    let claim = state.registry.read().await.get_claim(&identity)?;
    Ok(Json(ClaimResponse::new(identity, claim)))
}

pub async fn get_score<S, L>(
    State(state): State<AppState<S, L>>,
    Path(identity): Path<String>,
) -> Result<Json<ScoreResponse>, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    let identity = Identity::parse(&identity)?;
    let score = state.registry.read().await.score_of(&identity)?;
    Ok(Json(ScoreResponse { identity, score }))
}

pub async fn list_events<S, L>(
    State(state): State<AppState<S, L>>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<Page<LoggedEvent>>, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    let Query(params) = params.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let offset = params.decode_offset();
    let count = params.effective_count();
    let items = state.registry.read().await.events(offset, count as usize)?;
    let cursor = next_cursor(offset, items.len(), count);
    Ok(Json(Page { items, cursor }))
}

pub async fn metrics<S, L>(
    State(state): State<AppState<S, L>>,
) -> Result<impl IntoResponse, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    let body = state.metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

// ── Signed writes ────────────────────────────────────────────────────────

pub async fn register_claim<S, L>(
    State(state): State<AppState<S, L>>,
    body: Result<Json<SignedCall>, JsonRejection>,
) -> Result<Json<WriteResponse>, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    state
        .execute(calls::REGISTER_CLAIM, body, |registry, ctx, call: RegisterClaimCall| {
            let geometry = hex::decode(&call.geometry)
                .map_err(|e| RpcError::InvalidRequest(format!("geometry is not hex: {e}")))?;
            registry.register_claim(ctx, geometry, call.location_name)?;
            Ok(())
        })
        .await
}

pub async fn submit_impact_score<S, L>(
    State(state): State<AppState<S, L>>,
    body: Result<Json<SignedCall>, JsonRejection>,
) -> Result<Json<WriteResponse>, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    state
        .execute(
            calls::SUBMIT_IMPACT_SCORE,
            body,
            |registry, ctx, call: SubmitImpactScoreCall| {
                registry.submit_impact_score(ctx, call.identity, call.score)?;
                Ok(())
            },
        )
        .await
}

pub async fn set_verifier<S, L>(
    State(state): State<AppState<S, L>>,
    body: Result<Json<SignedCall>, JsonRejection>,
) -> Result<Json<WriteResponse>, RpcError>
where
    S: RegistryStore + Send + Sync + 'static,
    L: EventLog + Send + Sync + 'static,
{
    state
        .execute(calls::SET_VERIFIER, body, |registry, ctx, call: SetVerifierCall| {
            registry.set_verifier(ctx, call.new_verifier)?;
            Ok(())
        })
        .await
}

pub(crate) fn log_rejection(call: &str, error: &RpcError) {
    debug!(call, kind = error.kind(), error = %error, "write call rejected");
}
