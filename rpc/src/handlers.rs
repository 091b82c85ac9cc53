//! RPC request handlers.

use axum::extract::{Path, State};
use axum::Json;
use blam_engine::{parse_blam_text, parse_idv_text, CancelToken, PolicyEngine};
use blam_types::{
    ChannelId, CommandOutcome, Invocation, LockState, MemberId, MemberJoinOutcome, PolicyState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RpcError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PolicyEngine>,
    /// Fired on shutdown so in-flight enforcement stops starting removals.
    pub cancel: CancelToken,
}

// ── Commands ─────────────────────────────────────────────────────────────

pub async fn run_command(
    State(state): State<AppState>,
    Json(invocation): Json<Invocation>,
) -> Result<Json<CommandOutcome>, RpcError> {
    let outcome = state.engine.dispatch(invocation, &state.cancel).await?;
    Ok(Json(outcome))
}

/// Raw slash-command text, as the chat platform posts it.
#[derive(Debug, Deserialize)]
pub struct SlashRequest {
    pub channel: ChannelId,
    pub actor: MemberId,
    #[serde(default)]
    pub elevated: bool,
    #[serde(default)]
    pub text: String,
}

pub async fn slash_blam(
    State(state): State<AppState>,
    Json(req): Json<SlashRequest>,
) -> Result<Json<CommandOutcome>, RpcError> {
    let command = parse_blam_text(&req.text)?;
    dispatch_slash(&state, req, command).await
}

pub async fn slash_idv(
    State(state): State<AppState>,
    Json(req): Json<SlashRequest>,
) -> Result<Json<CommandOutcome>, RpcError> {
    let command = parse_idv_text(&req.text)?;
    dispatch_slash(&state, req, command).await
}

async fn dispatch_slash(
    state: &AppState,
    req: SlashRequest,
    command: blam_types::Command,
) -> Result<Json<CommandOutcome>, RpcError> {
    let invocation = Invocation {
        channel: req.channel,
        actor: req.actor,
        elevated: req.elevated,
        command,
    };
    Ok(Json(state.engine.dispatch(invocation, &state.cancel).await?))
}

// ── Events ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MemberJoinedEvent {
    pub channel: ChannelId,
    pub member: MemberId,
}

pub async fn member_joined(
    State(state): State<AppState>,
    Json(event): Json<MemberJoinedEvent>,
) -> Result<Json<MemberJoinOutcome>, RpcError> {
    let outcome = state
        .engine
        .member_joined(&event.channel, &event.member, &state.cancel)
        .await?;
    Ok(Json(outcome))
}

// ── Queries ──────────────────────────────────────────────────────────────

/// Stored policy plus its lock state, for dashboards and scripts.
#[derive(Debug, Serialize)]
pub struct ChannelPolicyResponse {
    #[serde(flatten)]
    pub policy: PolicyState,
    pub lock: LockState,
}

pub async fn channel_policy(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<ChannelPolicyResponse>, RpcError> {
    if channel.trim().is_empty() {
        return Err(RpcError::InvalidRequest("empty channel id".to_string()));
    }
    let policy = state.engine.policy(&ChannelId::new(channel)).await?;
    Ok(Json(ChannelPolicyResponse {
        lock: policy.lock_state(),
        policy,
    }))
}

pub async fn stats(State(state): State<AppState>) -> Json<BTreeMap<&'static str, u64>> {
    Json(state.engine.stats().snapshot())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
