pub mod api;
pub mod bridge;
pub mod config;
pub mod cors;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::bridge::TextGenerator;
use crate::config::{Provider, RelayConfig};
use crate::cors::{cors_middleware, CorsPolicy};

#[derive(Clone)]
pub struct AppState {
    pub provider: Provider,
    /// `None` when the provider credential is missing.
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub timeout_ms: u64,
}

impl AppState {
    pub fn from_config(cfg: &RelayConfig, client: reqwest::Client) -> Self {
        let generator = bridge::from_config(cfg, client);
        if generator.is_none() {
            tracing::error!(
                "{} is not set; every relay request will fail until it is configured",
                cfg.provider.credential_var()
            );
        }

        Self {
            provider: cfg.provider,
            generator,
            timeout_ms: cfg.upstream_timeout_ms,
        }
    }
}

pub fn build_app(state: AppState, cors: CorsPolicy) -> Router {
    api::router(state)
        .layer(from_fn_with_state(Arc::new(cors), cors_middleware))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(app: Router, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to port {}: {}", port, e);
        e
    })?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use ::config::Environment;
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn config_from(vars: &[(&str, &str)]) -> RelayConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::load(Environment::default().source(Some(map))).unwrap()
    }

    #[test]
    fn state_carries_generator_for_configured_provider() {
        let cfg = config_from(&[
            ("RELAY_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-test"),
            ("UPSTREAM_TIMEOUT_MS", "1234"),
        ]);
        let state = AppState::from_config(&cfg, reqwest::Client::new());

        let generator = state.generator.expect("generator");
        assert_eq!(generator.provider(), Provider::OpenAi);
        assert_eq!(generator.model(), "gpt-test");
        assert_eq!(state.timeout_ms, 1_234);
    }

    #[tokio::test]
    async fn missing_key_in_config_yields_500_on_relay() {
        let cfg = config_from(&[("RELAY_PROVIDER", "gemini"), ("OPENAI_API_KEY", "sk-test")]);
        let state = AppState::from_config(&cfg, reqwest::Client::new());
        assert!(state.generator.is_none());

        let app = build_app(state, CorsPolicy::new(&cfg.allowed_origins()));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/gemini")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"prompt":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            &body[..],
            br#"{"error":"API key not configured","message":"GEMINI_API_KEY is not set"}"#
        );
    }
}
