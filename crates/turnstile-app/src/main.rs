use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload};
use turnstile_app::app::api::routes;
use turnstile_app::config::ConfigHandler;
use turnstile_app::pipeline_handler::PipelineHandler;
use turnstile_app::seed::{build_enforcer, seed_services};
use turnstile_core::config::load_config;
use turnstile_service::auth::AuthPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(filter_layer).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    // Dependencies logging through the `log` facade
    tracing_log::LogTracer::init()?;

    tracing::info!("Starting Turnstile portal authentication server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let enforcer = build_enforcer(&config).await?;
    let services = seed_services(&config, enforcer).await;
    let pipeline = Arc::new(AuthPipeline::new(&config.auth, services));

    tracing::info!(default_mode = ?config.auth.default_mode, sites = config.sites.len(), "Authentication pipeline ready");

    let bind_addr = config.server.bind_address();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(ConfigHandler {
            settings: Arc::new(config),
        })
        .hoop(PipelineHandler { pipeline })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
