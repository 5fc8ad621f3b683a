//! Long-lived monitor service shared by the HTTP surface, cron trigger and CLI.

use std::sync::Arc;

use cloudflare_client::ZoneApi;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::MonitorConfig;
use crate::domain::RunAggregate;
use crate::monitor::AuditPipeline;
use crate::notification::{NotificationChannel, NotificationDispatcher, TelegramChannel};
use crate::state::{ChangeDetector, StateStore};

pub struct MonitorService {
    pipeline: AuditPipeline,
    tokens: Option<String>,
    detector: ChangeDetector,
    dispatcher: NotificationDispatcher,
    /// Serializes scheduled runs within this process.
    run_lock: Mutex<()>,
}

impl MonitorService {
    pub fn new(
        pipeline: AuditPipeline,
        tokens: Option<String>,
        detector: ChangeDetector,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            pipeline,
            tokens,
            detector,
            dispatcher,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire the service from configuration.
    ///
    /// Notifications are disabled when no Telegram destination is configured.
    pub fn from_config(
        config: &MonitorConfig,
        api: Arc<dyn ZoneApi>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let pipeline = AuditPipeline::new(api)
            .with_batch_size(config.batch_size)
            .with_per_page(config.per_page)
            .with_retry(config.retry);

        let channel = config.telegram.clone().map(|telegram| {
            let channel: Arc<dyn NotificationChannel> = Arc::new(TelegramChannel::new(telegram));
            channel
        });
        if channel.is_none() {
            info!("Telegram not configured, notifications disabled");
        }

        Self::new(
            pipeline,
            config.api_tokens.clone(),
            ChangeDetector::new(store),
            NotificationDispatcher::new(channel, config.timezone),
        )
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Audit without touching persisted state.
    pub async fn on_demand(&self) -> RunAggregate {
        self.pipeline.run_on_demand(self.tokens.as_deref()).await
    }

    /// Full scheduled run. Returns once the notification (if any) has settled.
    pub async fn scheduled(&self) -> RunAggregate {
        let _guard = self.run_lock.lock().await;

        info!("Starting scheduled run");
        let run = self
            .pipeline
            .run_scheduled(self.tokens.as_deref(), &self.detector, &self.dispatcher)
            .await;
        let newly_enabled = run.change.as_ref().map_or(0, |c| c.newly_enabled.len());
        let aggregate = run.finish().await;

        info!(
            zones = aggregate.records.len(),
            enabled = aggregate.enabled_count(),
            newly_enabled,
            diagnostics = aggregate.diagnostics.len(),
            "Scheduled run finished"
        );
        aggregate
    }
}
