use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use blam_engine::{CancelToken, EngineConfig, PolicyEngine};
use blam_idv::{HttpIdvOracle, IdvOracle};
use blam_nullables::{NullOracle, NullPolicyStore, NullRoster};
use blam_rpc::RpcServer;
use blam_types::{ChannelId, MemberId};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(roster: NullRoster) -> (Router, Arc<NullRoster>) {
    app_with_oracle(roster, Arc::new(NullOracle::new()))
}

fn app_with_oracle(roster: NullRoster, oracle: Arc<dyn IdvOracle>) -> (Router, Arc<NullRoster>) {
    let roster = Arc::new(roster);
    let config = EngineConfig::new(MemberId::from("UBOT")).with_admin(MemberId::from("UADMIN"));
    let engine = PolicyEngine::new(config, Arc::new(NullPolicyStore::new()), oracle, roster.clone());
    let server = RpcServer::new(0, Arc::new(engine), CancelToken::new());
    (server.router(), roster)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_returns_200() {
    let (app, _) = app(NullRoster::new());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn structured_blam_removes_and_reports() {
    let channel = ChannelId::from("C1");
    let (app, roster) = app(NullRoster::new().with_members(&channel, ["UA", "UB"]));

    let (status, body) = send(
        &app,
        "POST",
        "/commands",
        Some(json!({
            "channel": "C1",
            "actor": "UMOD",
            "elevated": true,
            "command": { "op": "blam", "member": "UB" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "blammed");
    assert_eq!(body["outcome"]["result"], "success");
    assert_eq!(roster.members(&channel), vec![MemberId::from("UA")]);

    let (status, body) = send(&app, "GET", "/channels/C1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blamlist"], json!(["UB"]));
    assert_eq!(body["lock"], "unlocked");
}

#[tokio::test]
async fn unprivileged_mutation_is_forbidden() {
    let (app, _) = app(NullRoster::new());
    let (status, body) = send(
        &app,
        "POST",
        "/commands",
        Some(json!({
            "channel": "C1",
            "actor": "UMOD",
            "command": { "op": "lock_idv" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "permission_denied");
}

#[tokio::test]
async fn slash_text_is_parsed_and_dispatched() {
    let channel = ChannelId::from("C1");
    let (app, roster) = app(NullRoster::new().with_members(&channel, ["UAAA", "UBBB"]));

    let (status, body) = send(
        &app,
        "POST",
        "/slash/idv",
        Some(json!({ "channel": "C1", "actor": "UMOD", "text": "test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "dry_run");
    assert_eq!(body["decision"]["to_remove"].as_array().unwrap().len(), 2);
    assert_eq!(roster.members(&channel).len(), 2);

    let (status, body) = send(
        &app,
        "POST",
        "/slash/blam",
        Some(json!({ "channel": "C1", "actor": "UMOD", "text": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Usage"));
}

#[tokio::test]
async fn actor_join_event_invites_admin() {
    let channel = ChannelId::from("C1");
    let (app, roster) = app(NullRoster::new());

    let (status, body) = send(
        &app,
        "POST",
        "/events/member-joined",
        Some(json!({ "channel": "C1", "member": "UBOT" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "admin_invited");
    assert_eq!(roster.members(&channel), vec![MemberId::from("UADMIN")]);
}

#[tokio::test]
async fn roster_outage_maps_to_service_unavailable() {
    let (app, roster) = app(NullRoster::new());
    roster.fail_list(true);

    let (status, body) = send(
        &app,
        "POST",
        "/commands",
        Some(json!({
            "channel": "C1",
            "actor": "UADMIN",
            "command": { "op": "idv_test" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "roster_unavailable");
}

#[tokio::test]
async fn unreachable_oracle_error_hides_transport_detail() {
    let channel = ChannelId::from("C1");
    // Nothing listens on the discard port locally.
    let oracle = HttpIdvOracle::with_timeout("http://127.0.0.1:9/check", Duration::from_millis(500));
    let (app, _) = app_with_oracle(NullRoster::new().with_members(&channel, ["UAAA"]), Arc::new(oracle));

    let (status, body) = send(
        &app,
        "POST",
        "/commands",
        Some(json!({
            "channel": "C1",
            "actor": "UADMIN",
            "command": { "op": "idv_test" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "oracle_unavailable");
    let message = body["error"].as_str().unwrap();
    assert_eq!(message, "identity verification service unavailable");
    assert!(!message.contains("127.0.0.1"));
    assert!(!message.contains("slack_id"));
    assert!(!message.contains("error sending request"));
}

#[tokio::test]
async fn locked_channel_reports_its_lock_state() {
    let (app, _) = app(NullRoster::new());

    let (status, _) = send(
        &app,
        "POST",
        "/slash/idv",
        Some(json!({ "channel": "C1", "actor": "UADMIN", "text": "on" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/channels/C1", None).await;
    assert_eq!(body["lock"], "locked");
    assert_eq!(body["idv_locked"], true);
}
