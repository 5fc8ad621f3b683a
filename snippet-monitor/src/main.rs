use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cloudflare_client::{CloudflareClient, ZoneApi};
use snippet_monitor::api::{ApiServer, ApiServerConfig, AppState};
use snippet_monitor::cli::{Cli, Command};
use snippet_monitor::render::render_text;
use snippet_monitor::state::{MemoryStateStore, SqliteStateStore, StateStore};
use snippet_monitor::trigger::CronTrigger;
use snippet_monitor::{MonitorConfig, MonitorService, config, logging};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Logging first so config warnings are recorded.
    let log_dir = config::log_dir_from_lookup(|key| std::env::var(key).ok());
    let _log_guard = logging::init_logging(log_dir.as_deref())?;

    let config = MonitorConfig::from_env_or_default()?;

    let api: Arc<dyn ZoneApi> = Arc::new(
        CloudflareClient::with_base_url(&config.api_base_url)
            .context("failed to build Cloudflare client")?,
    );

    match cli.command_or_default() {
        Command::Serve => serve(config, api).await,
        Command::Check => {
            // On-demand runs never touch persisted state.
            let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
            let service = MonitorService::from_config(&config, api, store);
            let aggregate = service.on_demand().await;
            print!("{}", render_text(&aggregate));
            Ok(())
        }
        Command::RunOnce => {
            let store = open_store(&config).await?;
            let service = MonitorService::from_config(&config, api, store);
            let aggregate = service.scheduled().await;
            print!("{}", render_text(&aggregate));
            Ok(())
        }
    }
}

async fn open_store(config: &MonitorConfig) -> anyhow::Result<Arc<dyn StateStore>> {
    let store = SqliteStateStore::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open state database {}", config.database_url))?;
    Ok(Arc::new(store))
}

async fn serve(config: MonitorConfig, api: Arc<dyn ZoneApi>) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let trigger = CronTrigger::new(&config.cron_schedule, config.timezone)?;
    let service = MonitorService::from_config(&config, api, store).into_shared();

    let cancel_token = CancellationToken::new();

    if let Some(log_dir) = &config.log_dir {
        logging::start_retention_cleanup(log_dir.as_str(), cancel_token.clone());
    }

    info!(
        schedule = %config.cron_schedule,
        timezone = %config.timezone,
        notifications = config.notifications_enabled(),
        "snippet-monitor starting"
    );

    let trigger_task = tokio::spawn(trigger.run(service.clone(), cancel_token.clone()));

    let shutdown = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received");
        shutdown.cancel();
    });

    let server = ApiServer::new(ApiServerConfig::from(&config), AppState::new(service))
        .with_cancel_token(cancel_token.clone());
    let result = server.run().await;

    // Let an in-flight scheduled run and its notification settle.
    cancel_token.cancel();
    if let Err(e) = trigger_task.await {
        warn!(error = %e, "Cron trigger task ended abnormally");
    }

    result?;
    info!("snippet-monitor stopped");
    Ok(())
}
