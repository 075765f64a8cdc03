mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_scan_throttle, AppState},
    middleware::ApiKeys,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(okapiq_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let (adapters, census) = okapiq_sources::build_adapters(
        &config.provider_keys,
        config.adapter_timeout_secs,
        &config.user_agent,
    )?;
    if adapters.is_empty() {
        tracing::warn!("no provider API keys configured; scans will be rejected");
    }

    let pool = match &config.database_url {
        Some(url) => Some(okapiq_db::connect(url).await?),
        None => {
            tracing::info!("no database configured; scan history disabled");
            None
        }
    };

    let orchestrator = Arc::new(okapiq_scan::Orchestrator::new(
        adapters,
        census,
        config.adapter_timeout_secs,
        config.scan_timeout_secs,
        config.cache_ttl_secs,
    ));

    let keys = ApiKeys::from_env(matches!(
        config.env,
        okapiq_core::Environment::Development
    ))?;
    let app = build_app(AppState { orchestrator, pool }, keys, default_scan_throttle());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting okapiq server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
