//! End-to-end HTTP tests against the router, without binding a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use verileaf_crypto::keypair_from_seed;
use verileaf_nullables::{NullClock, NullStore};
use verileaf_registry::{CallContext, MemoryEventLog, Registry};
use verileaf_rpc::auth::{RegisterClaimCall, SetVerifierCall, SubmitImpactScoreCall};
use verileaf_rpc::{
    calls, AppState, RegistryMetrics, ReplayGuard, RpcConfig, RpcServer, SignedCall,
};
use verileaf_types::{Identity, KeyPair, Timestamp};

const NOW: u64 = 1_700_000_000;

struct Harness {
    router: Router,
    clock: Arc<NullClock>,
    owner: KeyPair,
    verifier: KeyPair,
    farmer: KeyPair,
}

fn harness() -> Harness {
    let owner = keypair_from_seed(&[1u8; 32]);
    let verifier = keypair_from_seed(&[2u8; 32]);
    let farmer = keypair_from_seed(&[3u8; 32]);

    let ctx = CallContext::new(owner.identity(), Timestamp::new(NOW));
    let registry = Registry::construct(
        NullStore::new(),
        MemoryEventLog::new(),
        &ctx,
        Some(verifier.identity()),
    )
    .unwrap();

    let clock = Arc::new(NullClock::new(NOW));
    let state = AppState {
        registry: Arc::new(RwLock::new(registry)),
        replay: Arc::new(ReplayGuard::new()),
        metrics: Arc::new(RegistryMetrics::new()),
        clock: clock.clone(),
        max_clock_skew_secs: 300,
    };
    let router = RpcServer::new(RpcConfig::default(), state).router();

    Harness {
        router,
        clock,
        owner,
        verifier,
        farmer,
    }
}

fn signed<P: Serialize>(keypair: &KeyPair, call: &str, issued_at: u64, payload: &P) -> Value {
    let call = SignedCall::sign(keypair, call, Timestamp::new(issued_at), payload).unwrap();
    serde_json::to_value(call).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn metrics_text(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

fn claim_call(name: &str) -> RegisterClaimCall {
    RegisterClaimCall {
        geometry: hex::encode(br#"{"type":"Polygon"}"#),
        location_name: name.into(),
    }
}

fn score_call(identity: Identity, score: u32) -> SubmitImpactScoreCall {
    SubmitImpactScoreCall { identity, score }
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness();
    let (status, body) = get(&h.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn roles_report_owner_and_verifier() {
    let h = harness();
    let (status, body) = get(&h.router, "/roles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], h.owner.identity().encode());
    assert_eq!(body["verifier"], h.verifier.identity().encode());
}

#[tokio::test]
async fn claim_then_score_end_to_end() {
    let h = harness();
    let farmer = h.farmer.identity();

    let call = signed(&h.farmer, calls::REGISTER_CLAIM, NOW, &claim_call("Green Valley"));
    let (status, body) = post(&h.router, "/claims", &call).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["caller"], farmer.encode());

    let (status, claim) = get(&h.router, &format!("/claims/{farmer}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["present"], true);
    assert_eq!(claim["location_name"], "Green Valley");
    assert_eq!(claim["geometry"], hex::encode(br#"{"type":"Polygon"}"#));
    assert_eq!(claim["registered_at"], NOW);

    let call = signed(&h.verifier, calls::SUBMIT_IMPACT_SCORE, NOW, &score_call(farmer, 87));
    let (status, _) = post(&h.router, "/scores", &call).await;
    assert_eq!(status, StatusCode::OK);

    let (_, score) = get(&h.router, &format!("/scores/{farmer}")).await;
    assert_eq!(score["score"], 87);
}

#[tokio::test]
async fn non_verifier_score_is_forbidden() {
    let h = harness();
    let farmer = h.farmer.identity();
    let call = signed(&h.farmer, calls::SUBMIT_IMPACT_SCORE, NOW, &score_call(farmer, 50));
    let (status, body) = post(&h.router, "/scores", &call).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("verifier"));

    let (_, score) = get(&h.router, &format!("/scores/{farmer}")).await;
    assert_eq!(score["score"], 0);
}

#[tokio::test]
async fn out_of_range_score_is_bad_request() {
    let h = harness();
    let call = signed(
        &h.verifier,
        calls::SUBMIT_IMPACT_SCORE,
        NOW,
        &score_call(h.farmer.identity(), 101),
    );
    let (status, _) = post(&h.router, "/scores", &call).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verifier_rotation_by_owner() {
    let h = harness();
    let next = keypair_from_seed(&[4u8; 32]);
    let rotate = SetVerifierCall {
        new_verifier: next.identity(),
    };

    let call = signed(&h.verifier, calls::SET_VERIFIER, NOW, &rotate);
    let (status, _) = post(&h.router, "/verifier", &call).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let call = signed(&h.owner, calls::SET_VERIFIER, NOW, &rotate);
    let (status, _) = post(&h.router, "/verifier", &call).await;
    assert_eq!(status, StatusCode::OK);

    let (_, roles) = get(&h.router, "/roles").await;
    assert_eq!(roles["verifier"], next.identity().encode());
}

#[tokio::test]
async fn forged_signature_is_unauthorized() {
    let h = harness();
    let mut call = signed(&h.farmer, calls::REGISTER_CLAIM, NOW, &claim_call("Plot"));
    call["signer"] = json!(h.verifier.identity());
    let (status, _) = post(&h.router, "/claims", &call).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stale_call_is_unauthorized() {
    let h = harness();
    let call = signed(&h.farmer, calls::REGISTER_CLAIM, NOW, &claim_call("Plot"));
    h.clock.advance(301);
    let (status, body) = post(&h.router, "/claims", &call).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("301s"));
}

#[tokio::test]
async fn call_signed_for_another_endpoint_is_unauthorized() {
    let h = harness();
    let farmer = h.farmer.identity();
    // Signed as a score submission, replayed against the claims endpoint.
    let call = signed(&h.verifier, calls::SUBMIT_IMPACT_SCORE, NOW, &score_call(farmer, 87));
    let (status, _) = post(&h.router, "/claims", &call).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_identity_is_bad_request() {
    let h = harness();
    let (status, body) = get(&h.router, "/claims/vlf_nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("identity"));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let h = harness();
    let (status, body) = post(&h.router, "/claims", &json!({ "signer": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn absent_claim_reads_as_zero_record() {
    let h = harness();
    let stranger = keypair_from_seed(&[9u8; 32]).identity();
    let (status, claim) = get(&h.router, &format!("/claims/{stranger}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["present"], false);
    assert_eq!(claim["geometry"], "");
    assert_eq!(claim["location_name"], "");
    assert_eq!(claim["registered_at"], 0);
}

#[tokio::test]
async fn events_are_paginated() {
    let h = harness();
    for name in ["A", "B", "C"] {
        let call = signed(&h.farmer, calls::REGISTER_CLAIM, NOW, &claim_call(name));
        post(&h.router, "/claims", &call).await;
    }

    // Construction plus three claims.
    let (status, page) = get(&h.router, "/events?count=3").await;
    assert_eq!(status, StatusCode::OK);
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["type"], "verifier_updated");
    assert_eq!(items[1]["location_name"], "A");
    let cursor = page["cursor"].as_str().unwrap().to_string();

    let (_, page) = get(&h.router, &format!("/events?count=3&cursor={cursor}")).await;
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["sequence"], 3);
    assert!(page.get("cursor").is_none());
}

#[tokio::test]
async fn metrics_count_rejections() {
    let h = harness();
    let farmer = h.farmer.identity();
    let call = signed(&h.farmer, calls::SUBMIT_IMPACT_SCORE, NOW, &score_call(farmer, 50));
    post(&h.router, "/scores", &call).await;

    let text = metrics_text(&h.router).await;
    assert!(text.contains("verileaf_rejected_calls_total{kind=\"unauthorized\"} 1"));
}

#[tokio::test]
async fn replayed_claim_cannot_restore_old_claim() {
    let h = harness();
    let farmer = h.farmer.identity();
    let first = signed(&h.farmer, calls::REGISTER_CLAIM, NOW, &claim_call("A"));
    let second = signed(&h.farmer, calls::REGISTER_CLAIM, NOW + 1, &claim_call("B"));
    assert_eq!(post(&h.router, "/claims", &first).await.0, StatusCode::OK);
    assert_eq!(post(&h.router, "/claims", &second).await.0, StatusCode::OK);

    h.clock.advance(20);
    let (status, body) = post(&h.router, "/claims", &first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("already submitted"));

    let (_, claim) = get(&h.router, &format!("/claims/{farmer}")).await;
    assert_eq!(claim["location_name"], "B");
    assert_eq!(claim["registered_at"], NOW);
}

#[tokio::test]
async fn replayed_score_cannot_undo_correction() {
    let h = harness();
    let farmer = h.farmer.identity();
    let original = signed(&h.verifier, calls::SUBMIT_IMPACT_SCORE, NOW, &score_call(farmer, 87));
    let corrected = signed(
        &h.verifier,
        calls::SUBMIT_IMPACT_SCORE,
        NOW + 5,
        &score_call(farmer, 40),
    );
    h.clock.advance(5);
    assert_eq!(post(&h.router, "/scores", &original).await.0, StatusCode::OK);
    assert_eq!(post(&h.router, "/scores", &corrected).await.0, StatusCode::OK);

    h.clock.advance(20);
    let (status, _) = post(&h.router, "/scores", &original).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, score) = get(&h.router, &format!("/scores/{farmer}")).await;
    assert_eq!(score["score"], 40);
    let (_, page) = get(&h.router, "/events").await;
    assert_eq!(page["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn replayed_rotation_cannot_reinstate_verifier() {
    let h = harness();
    let outsider = keypair_from_seed(&[4u8; 32]).identity();
    let to_outsider = signed(
        &h.owner,
        calls::SET_VERIFIER,
        NOW,
        &SetVerifierCall {
            new_verifier: outsider,
        },
    );
    let back = signed(
        &h.owner,
        calls::SET_VERIFIER,
        NOW + 1,
        &SetVerifierCall {
            new_verifier: h.verifier.identity(),
        },
    );
    assert_eq!(post(&h.router, "/verifier", &to_outsider).await.0, StatusCode::OK);
    assert_eq!(post(&h.router, "/verifier", &back).await.0, StatusCode::OK);

    h.clock.advance(20);
    let (status, _) = post(&h.router, "/verifier", &to_outsider).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, roles) = get(&h.router, "/roles").await;
    assert_eq!(roles["verifier"], h.verifier.identity().encode());
}

#[tokio::test]
async fn rejected_call_is_still_single_use() {
    let h = harness();
    let farmer = h.farmer.identity();
    let call = signed(&h.farmer, calls::SUBMIT_IMPACT_SCORE, NOW, &score_call(farmer, 99));
    assert_eq!(post(&h.router, "/scores", &call).await.0, StatusCode::FORBIDDEN);
    assert_eq!(post(&h.router, "/scores", &call).await.0, StatusCode::UNAUTHORIZED);

    let text = metrics_text(&h.router).await;
    assert!(text.contains("verileaf_rejected_calls_total{kind=\"replayed_call\"} 1"));
}

#[tokio::test]
async fn resigned_call_with_new_time_is_accepted() {
    let h = harness();
    let call = signed(&h.farmer, calls::REGISTER_CLAIM, NOW, &claim_call("Plot"));
    assert_eq!(post(&h.router, "/claims", &call).await.0, StatusCode::OK);
    let again = signed(&h.farmer, calls::REGISTER_CLAIM, NOW + 1, &claim_call("Plot"));
    assert_eq!(post(&h.router, "/claims", &again).await.0, StatusCode::OK);
}
