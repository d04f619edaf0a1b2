use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use packwise::api;
use packwise::config::AppConfig;
use packwise::service::PackService;
use packwise::sizes::build_size_source;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_result = dotenvy::dotenv();
    enable_tracing();
    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    info!("🚀 Pack calculator starting...");

    let source = build_size_source(&app_config.sizes)
        .with_context(|| format!("initializing pack size source {}", app_config.sizes))?;
    let service = PackService::new(source, app_config.solver.packing_config());

    let addr = app_config.api.socket_addr();
    api::start_api_server(app_config.api, service)
        .await
        .with_context(|| format!("running API server on {addr}"))?;

    info!("bye");
    Ok(())
}
