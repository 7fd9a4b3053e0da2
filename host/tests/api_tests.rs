use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use poa_core::{assemble_proof, digest_bytes, FingerprintScheme};
use poa_host::api::{GenerateResponse, RegisterResponse, VerifyResponse};
use poa_host::config::ServerConfig;
use poa_host::generator::{Generator, LocalGenerator};
use poa_host::registry::MemoryRegistry;
use poa_host::server::build_router;
use poa_host::storage::MemoryStorage;
use poa_host::{ProofService, Result};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

/// Stands in for a remote backend returning full-size artwork
struct LargeOutputGenerator(usize);

#[async_trait]
impl Generator for LargeOutputGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let seed = prompt.len() as u8;
        Ok((0..self.0).map(|i| (i as u8).wrapping_mul(31) ^ seed).collect())
    }

    fn name(&self) -> &'static str {
        "large"
    }
}

fn router_with(generator: Arc<dyn Generator>, scheme: FingerprintScheme) -> Router {
    let service = ProofService::new(
        generator,
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryRegistry::new()),
        scheme,
    );
    build_router(Arc::new(service), &ServerConfig::default())
}

fn app_with(scheme: FingerprintScheme) -> Router {
    router_with(Arc::new(LocalGenerator::new(1)), scheme)
}

fn app() -> Router {
    app_with(FingerprintScheme::Concatenated)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = app_with(FingerprintScheme::Framed);
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["scheme"], "framed");
}

#[tokio::test]
async fn test_generate_then_verify_by_hash_and_file() {
    let app = app();

    let (status, body) = post(
        &app,
        "/api/generate",
        json!({ "prompt": "a red cube", "creatorId": "0xABC" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let generated: GenerateResponse = serde_json::from_value(body).unwrap();
    assert!(generated.success);
    assert!(generated.transaction_id.is_some());
    assert!(generated.proof.is_consistent());

    let output = STANDARD.decode(&generated.output).unwrap();
    assert_eq!(generated.proof.output_hash(), digest_bytes(&output));

    let (status, body) = post(
        &app,
        "/api/verify",
        json!({ "combinedHash": generated.proof.combined_hash() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let verified: VerifyResponse = serde_json::from_value(body).unwrap();
    assert!(verified.verified);
    assert_eq!(verified.creator_id.as_deref(), Some("0xABC"));
    assert_eq!(verified.timestamp, Some(generated.proof.timestamp()));
    assert_eq!(verified.storage_link.as_deref(), Some(generated.storage_link.as_str()));

    let (status, body) = post(&app, "/api/verify", json!({ "file": generated.output })).await;
    assert_eq!(status, StatusCode::OK);
    let by_file: VerifyResponse = serde_json::from_value(body).unwrap();
    assert_eq!(by_file, verified);
}

#[tokio::test]
async fn test_legacy_user_address_field() {
    let app = app();
    let (status, body) = post(
        &app,
        "/api/generate",
        json!({ "prompt": "sunset", "userAddress": "0xDEF", "register": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proof"]["creatorId"], "0xDEF");
    assert!(body.get("transactionId").is_none());
}

#[tokio::test]
async fn test_generate_rejects_missing_fields() {
    let app = app();

    let (status, body) = post(&app, "/api/generate", json!({ "prompt": "a red cube" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, _) = post(
        &app,
        "/api/generate",
        json!({ "prompt": "a red cube", "creatorId": "0xABC", "type": "text" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_unregistered_is_not_verified() {
    let app = app();
    let (status, body) = post(
        &app,
        "/api/verify",
        json!({ "combinedHash": "f6c8d975ffa337c6b38da1018489c22fd6357f13f412f926eddcb91ee2757a8b" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "verified": false }));

    let (status, body) = post(&app, "/api/verify", json!({ "file": STANDARD.encode([9u8, 9, 9]) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn test_verify_requires_input() {
    let app = app();
    let (status, _) = post(&app, "/api/verify", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/verify", json!({ "file": "not base64!" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_endpoint_and_conflict() {
    let app = app();
    let proof = assemble_proof("a red cube", &[1, 2, 3], "0xABC", 1_700_000_000_000);
    let request = json!({ "proof": proof, "storageLink": "bafy-artwork" });

    let (status, body) = post(&app, "/api/register", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let registered: RegisterResponse = serde_json::from_value(body).unwrap();
    assert!(registered.transaction_id.starts_with("0x"));

    let (status, body) = post(&app, "/api/register", request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["retryable"], false);

    let (status, body) = post(
        &app,
        "/api/verify",
        json!({ "combinedHash": "f6c8d975ffa337c6b38da1018489c22fd6357f13f412f926eddcb91ee2757a8b" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
    assert_eq!(body["timestamp"], 1_700_000_000_000u64);
    assert_eq!(body["storageLink"], "bafy-artwork");
}

#[tokio::test]
async fn test_register_rejects_inconsistent_proof() {
    let app = app();
    let mut proof = serde_json::to_value(assemble_proof("a red cube", &[1, 2, 3], "0xABC", 1)).unwrap();
    proof["combinedHash"] = json!("00".repeat(32));

    let (status, _) = post(
        &app,
        "/api/register",
        json!({ "proof": proof, "storageLink": "bafy" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_same_prompt_twice_is_ambiguous_by_file() {
    // local generator is deterministic, so two creators get identical bytes
    let app = app();
    for creator in ["0xAAA", "0xBBB"] {
        let (status, _) = post(
            &app,
            "/api/generate",
            json!({ "prompt": "twin", "creatorId": creator }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let bytes = LocalGenerator::new(1).render_png("twin").unwrap();
    let (status, body) = post(&app, "/api/verify", json!({ "file": STANDARD.encode(bytes) })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["candidates"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_verify_full_size_artwork_by_file() {
    let app = router_with(
        Arc::new(LargeOutputGenerator(2_000_000)),
        FingerprintScheme::Concatenated,
    );

    let (status, body) = post(
        &app,
        "/api/generate",
        json!({ "prompt": "a red cube", "creatorId": "0xABC" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let generated: GenerateResponse = serde_json::from_value(body).unwrap();
    // base64 alone is past axum's 2 MiB default
    assert!(generated.output.len() > 2 * 1024 * 1024);

    let (status, body) = post(&app, "/api/verify", json!({ "file": generated.output })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
    assert_eq!(body["combinedHash"], generated.proof.combined_hash());
}

#[tokio::test]
async fn test_body_limit_is_configurable() {
    let service = ProofService::new(
        Arc::new(LocalGenerator::new(1)),
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryRegistry::new()),
        FingerprintScheme::Concatenated,
    );
    let config = ServerConfig {
        max_body_bytes: 4096,
        ..ServerConfig::default()
    };
    let app = build_router(Arc::new(service), &config);

    let (status, _) = post(&app, "/api/verify", json!({ "file": STANDARD.encode(vec![7u8; 8192]) })).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
