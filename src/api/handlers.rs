use axum::{extract::State, Json};

use crate::bridge::ask_via_bridge;
use crate::error::AppError;
use crate::AppState;

use super::extract::RelayPayload;
use super::models::{Endpoints, HealthResponse, RelayResponse, ServiceInfo};
use super::{HEALTH_PATH, RELAY_PATH};

pub async fn relay(
    State(state): State<AppState>,
    RelayPayload(payload): RelayPayload,
) -> Result<Json<RelayResponse>, AppError> {
    let prompt = payload.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        tracing::info!("Rejected relay request without a prompt");
        return Err(AppError::MissingPrompt);
    }

    let Some(generator) = state.generator.as_deref() else {
        let var = state.provider.credential_var();
        tracing::error!("Missing {}", var);
        return Err(AppError::MissingCredential(var));
    };

    tracing::info!(
        provider = generator.provider().as_str(),
        model = %generator.model(),
        prompt_len = prompt.len(),
        "Calling upstream"
    );

    let response = ask_via_bridge(prompt, generator, state.timeout_ms)
        .await
        .map_err(|e| {
            tracing::error!(provider = generator.provider().as_str(), "Upstream call failed: {}", e);
            e
        })?;

    tracing::info!(response_len = response.len(), "Upstream call succeeded");

    Ok(Json(RelayResponse {
        success: true,
        response,
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        provider: state.provider.as_str(),
        endpoints: Endpoints {
            relay: RELAY_PATH,
            health: HEALTH_PATH,
        },
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
