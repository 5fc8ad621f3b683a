//! Cron-driven scheduled runs.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::MonitorService;
use crate::{Error, Result};

/// A cron expression evaluated in a fixed timezone.
#[derive(Debug, Clone)]
pub struct CronTrigger {
    schedule: cron::Schedule,
    timezone: Tz,
}

impl CronTrigger {
    pub fn new(expression: &str, timezone: Tz) -> Result<Self> {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| Error::config(format!("Invalid cron expression '{expression}': {e}")))?;
        Ok(Self { schedule, timezone })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The first fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = now.with_timezone(&self.timezone);
        self.schedule
            .after(&local)
            .next()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Run the scheduled pipeline at every fire time until cancelled.
    ///
    /// Cancellation only interrupts the sleep between runs; a run in progress
    /// (including its notification) always completes.
    pub async fn run(self, service: Arc<MonitorService>, cancel_token: CancellationToken) {
        info!(timezone = %self.timezone, "Cron trigger started");

        loop {
            let now = Utc::now();
            let Some(next) = self.next_after(now) else {
                warn!("Cron schedule has no upcoming fire times, stopping trigger");
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next.with_timezone(&self.timezone), "Next scheduled run");

            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Cron trigger shutting down");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    service.scheduled().await;
                }
            }
        }
    }
}
