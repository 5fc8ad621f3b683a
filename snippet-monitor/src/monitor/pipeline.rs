//! Audit pipeline: tokens → zones → probes → aggregate, optionally followed
//! by change detection and notification.

use std::sync::Arc;

use chrono::Utc;
use cloudflare_client::ZoneApi;
use tracing::{info, warn};

use super::paginator::{DEFAULT_PER_PAGE, ZonePaginator};
use super::probe::FeatureProbe;
use super::retry::RetryPolicy;
use super::scheduler::{DEFAULT_BATCH_SIZE, ProbeScheduler};
use crate::Error;
use crate::credentials::CredentialSet;
use crate::domain::RunAggregate;
use crate::notification::{DetachedSend, NotificationDispatcher};
use crate::state::{ChangeDetector, ChangeSet};

/// Diagnostic emitted when no tokens are configured.
pub const CONFIG_MISSING_MESSAGE: &str = "请在设置中配置 CF_API_TOKEN";

/// Result of a scheduled run.
#[derive(Debug)]
pub struct ScheduledRun {
    pub aggregate: RunAggregate,
    /// `None` when change detection did not run (no tokens, or the state store failed).
    pub change: Option<ChangeSet>,
    /// In-flight notification, if one was started.
    pub notification: Option<DetachedSend>,
}

impl ScheduledRun {
    /// Wait for the notification, folding any failure into the diagnostics.
    pub async fn finish(mut self) -> RunAggregate {
        if let Some(send) = self.notification.take()
            && let Some(diagnostic) = send.wait().await
        {
            self.aggregate.diagnostics.push(diagnostic);
        }
        self.aggregate
    }
}

/// Pure pipeline over explicit collaborators.
pub struct AuditPipeline {
    api: Arc<dyn ZoneApi>,
    scheduler: ProbeScheduler,
    per_page: u32,
    retry: RetryPolicy,
}

impl AuditPipeline {
    pub fn new(api: Arc<dyn ZoneApi>) -> Self {
        Self {
            api,
            scheduler: ProbeScheduler::new(DEFAULT_BATCH_SIZE),
            per_page: DEFAULT_PER_PAGE,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.scheduler = ProbeScheduler::new(batch_size);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enumerate and probe every zone of every configured token.
    ///
    /// Tokens are handled one after another. A token whose listing fails
    /// contributes whatever zones it did list plus one diagnostic.
    pub async fn collect(&self, tokens: Option<&str>) -> RunAggregate {
        let credentials = match CredentialSet::from_config(tokens) {
            Ok(set) => set,
            Err(Error::ConfigMissing) => {
                warn!("No API tokens configured");
                return RunAggregate::empty_with(CONFIG_MISSING_MESSAGE);
            }
            Err(e) => return RunAggregate::empty_with(e.to_string()),
        };

        let started_at = Utc::now();
        let mut records = Vec::new();
        let mut diagnostics = Vec::new();

        let paginator = ZonePaginator::new(self.api.as_ref())
            .with_per_page(self.per_page)
            .with_retry(self.retry);
        let probe = FeatureProbe::new(self.api.as_ref());

        for credential in &credentials {
            let listing = paginator.fetch_all(credential).await;

            if let Some(reason) = &listing.truncated_by {
                diagnostics.push(format!("Token 处理出错 ({credential}): {reason}"));
            }

            if listing.zones.is_empty() {
                continue;
            }

            info!(
                credential = %credential,
                zones = listing.zones.len(),
                batch_size = self.scheduler.batch_size(),
                "Probing zones"
            );
            records.extend(self.scheduler.run(&probe, &listing.zones, credential).await);
        }

        let aggregate = RunAggregate {
            records,
            diagnostics,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            tokens = credentials.len(),
            zones = aggregate.records.len(),
            enabled = aggregate.enabled_count(),
            diagnostics = aggregate.diagnostics.len(),
            "Audit complete"
        );

        aggregate
    }

    /// On-demand entry point: audit only, persisted state is not touched.
    pub async fn run_on_demand(&self, tokens: Option<&str>) -> RunAggregate {
        self.collect(tokens).await
    }

    /// Scheduled entry point: audit, diff against persisted state, commit,
    /// then start the notification.
    ///
    /// The new state is committed before the notification is dispatched so a
    /// crash after delivery cannot re-announce the same zones.
    pub async fn run_scheduled(
        &self,
        tokens: Option<&str>,
        detector: &ChangeDetector,
        dispatcher: &NotificationDispatcher,
    ) -> ScheduledRun {
        if CredentialSet::from_config(tokens).is_err() {
            warn!("No API tokens configured, skipping scheduled run");
            return ScheduledRun {
                aggregate: RunAggregate::empty_with(CONFIG_MISSING_MESSAGE),
                change: None,
                notification: None,
            };
        }

        let mut aggregate = self.collect(tokens).await;

        let change = match detector.detect(&aggregate).await {
            Ok(change) => change,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted state, skipping change detection");
                aggregate.diagnostics.push(format!("读取状态失败: {e}"));
                return ScheduledRun {
                    aggregate,
                    change: None,
                    notification: None,
                };
            }
        };

        if let Err(e) = detector.commit(&change).await {
            warn!(error = %e, "Failed to persist enabled set");
            aggregate.diagnostics.push(format!("保存状态失败: {e}"));
        }

        let notification = dispatcher.dispatch(&change, &aggregate);

        ScheduledRun {
            aggregate,
            change: Some(change),
            notification,
        }
    }
}
