use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::*;
use crate::config::ServerConfig;
use crate::error::{PoaError, Result};
use crate::resolver::VerifyQuery;
use crate::service::{GenerationRequest, ProofService};

pub type SharedService = Arc<ProofService>;

pub fn build_router(service: SharedService, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/register", post(register))
        .route("/api/verify", post(verify))
        .with_state(service)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if config.permissive_cors {
        app = app.layer(CorsLayer::permissive());
    } else {
        tracing::warn!("CORS disabled: browser clients on other origins will be refused");
    }

    app
}

async fn health(State(service): State<SharedService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        scheme: service.scheme().to_string(),
    })
}

async fn generate(
    State(service): State<SharedService>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    if req.kind != "image" {
        return Err(PoaError::Input(format!("unsupported type '{}'", req.kind)));
    }

    let outcome = service
        .create_proof(&GenerationRequest {
            prompt: req.prompt,
            creator_id: req.creator_id,
            register: req.register,
        })
        .await
        .inspect_err(|e| tracing::error!("Generation failed: {}", e))?;

    Ok(Json(GenerateResponse {
        success: true,
        output: STANDARD.encode(&outcome.output),
        proof: outcome.proof,
        storage_link: outcome.storage_link,
        metadata_link: outcome.metadata_link,
        gateway_url: outcome.gateway_url,
        transaction_id: outcome.transaction_id,
    }))
}

async fn register(
    State(service): State<SharedService>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let transaction_id = service.register(req.proof, req.storage_link).await?;
    Ok(Json(RegisterResponse {
        success: true,
        transaction_id,
    }))
}

async fn verify(
    State(service): State<SharedService>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let query = match (req.combined_hash, req.file) {
        (Some(hash), _) if !hash.trim().is_empty() => VerifyQuery::ByHash(hash),
        (_, Some(file)) => {
            let bytes = STANDARD
                .decode(file.trim())
                .map_err(|e| PoaError::Input(format!("file is not valid base64: {}", e)))?;
            VerifyQuery::ByBytes(bytes)
        }
        _ => {
            return Err(PoaError::Input(
                "file or combined hash is required".to_string(),
            ))
        }
    };

    match service.resolver().resolve(query).await {
        Ok(proof) => Ok(Json(proof.into())),
        Err(PoaError::NotFound(key)) => {
            tracing::debug!("No proof for {}", key);
            Ok(Json(VerifyResponse::not_found()))
        }
        Err(e) => Err(e),
    }
}
