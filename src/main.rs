use anyhow::Context;
use prompt_relay::{
    build_app, config::RelayConfig, cors::CorsPolicy, run_server, telemetry::init_tracing,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level);

    tracing::info!(
        provider = config.provider.as_str(),
        model = %config.model(),
        port = config.port,
        "Starting prompt relay"
    );

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let state = AppState::from_config(&config, client);
    let app = build_app(state, CorsPolicy::new(&config.allowed_origins()));

    run_server(app, config.port).await.context("server failed")
}
