//! Student document intake server binary

use anyhow::Context;
use clap::Parser;
use intake_server::{api, telemetry, AppConfig, AppState, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let config: AppConfig = Args::parse().into();
    telemetry::init(config.log_format);

    if let Some(dir) = config.data_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }
    tokio::fs::create_dir_all(&config.storage.upload_dir)
        .await
        .with_context(|| format!("creating upload directory {}", config.storage.upload_dir.display()))?;

    let state = AppState::from_config(&config).await;
    tracing::info!(
        storage = %state.storage.backend_kind(),
        classifier = %state.classifier.kind(),
        data_file = %config.data_file.display(),
        auth = state.api_token.is_some(),
        "services ready"
    );

    let (addr, server) = warp::serve(api::routes(state))
        .try_bind_with_graceful_shutdown(config.addr, async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown requested");
        })
        .with_context(|| format!("binding {}", config.addr))?;

    tracing::info!(%addr, "listening");
    server.await;
    Ok(())
}
