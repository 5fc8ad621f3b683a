//! Best-effort delivery of "newly enabled" announcements.
//!
//! The send runs on a detached tokio task. Whoever hosts the monitor must
//! call [`DetachedSend::wait`] before the process is allowed to exit, or the
//! message may be lost mid-flight.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::channels::NotificationChannel;
use super::message::NotificationMessage;
use crate::domain::{Resource, RunAggregate};
use crate::state::ChangeSet;

/// Handle to an in-flight notification.
#[derive(Debug)]
pub struct DetachedSend {
    handle: JoinHandle<Option<String>>,
}

impl DetachedSend {
    /// Wait for delivery to finish. Returns a diagnostic if it failed.
    pub async fn wait(self) -> Option<String> {
        match self.handle.await {
            Ok(diagnostic) => diagnostic,
            Err(e) => Some(format!("通知任务异常结束: {e}")),
        }
    }
}

pub struct NotificationDispatcher {
    channel: Option<Arc<dyn NotificationChannel>>,
    timezone: Tz,
}

impl NotificationDispatcher {
    pub fn new(channel: Option<Arc<dyn NotificationChannel>>, timezone: Tz) -> Self {
        Self { channel, timezone }
    }

    /// A dispatcher that never sends.
    pub fn disabled() -> Self {
        Self::new(None, chrono_tz::Asia::Shanghai)
    }

    pub fn is_configured(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_enabled())
    }

    /// Start delivery of the announcement for `change`, if there is anything to announce.
    ///
    /// Returns `None` without side effects when the delta is empty or no
    /// channel is configured.
    pub fn dispatch(&self, change: &ChangeSet, aggregate: &RunAggregate) -> Option<DetachedSend> {
        if change.newly_enabled.is_empty() {
            info!(
                total_enabled = change.current.len(),
                "No newly enabled zones, skipping notification"
            );
            return None;
        }

        let channel = match &self.channel {
            Some(channel) if channel.is_enabled() => Arc::clone(channel),
            _ => {
                debug!("Notification channel not configured, skipping notification");
                return None;
            }
        };

        let message = self.build_message(change, aggregate);
        let channel_type = channel.channel_type();
        info!(
            channel = channel_type,
            newly_enabled = message.newly_enabled.len(),
            "Dispatching notification"
        );

        let handle = tokio::spawn(async move {
            match channel.send(&message).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(channel = channel_type, error = %e, "Notification delivery failed");
                    Some(format!("通知推送失败 ({channel_type}): {e}"))
                }
            }
        });

        Some(DetachedSend { handle })
    }

    fn build_message(&self, change: &ChangeSet, aggregate: &RunAggregate) -> NotificationMessage {
        // First occurrence per name, in run order.
        let mut seen = std::collections::HashSet::new();
        let newly: Vec<&Resource> = aggregate
            .enabled()
            .map(|r| &r.resource)
            .filter(|r| change.newly_enabled.contains(&r.name) && seen.insert(r.name.as_str()))
            .collect();

        NotificationMessage::newly_enabled(&newly, &change.current, Utc::now(), self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProbeOutcome;
    use crate::test_support::{RecordingChannel, record};
    use std::collections::BTreeSet;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn aggregate(names: &[&str]) -> RunAggregate {
        RunAggregate {
            records: names.iter().map(|n| record(n, ProbeOutcome::Enabled)).collect(),
            diagnostics: vec![],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    fn dispatcher(channel: &Arc<RecordingChannel>) -> NotificationDispatcher {
        let channel: Arc<dyn NotificationChannel> = channel.clone();
        NotificationDispatcher::new(Some(channel), chrono_tz::Asia::Shanghai)
    }

    #[tokio::test]
    async fn test_not_invoked_for_empty_delta() {
        let channel = Arc::new(RecordingChannel::default());
        let names: Vec<String> = (0..50).map(|i| format!("z{i}.example")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let change = ChangeSet {
            previous: set(&refs),
            current: set(&refs),
            newly_enabled: BTreeSet::new(),
        };

        let handle = dispatcher(&channel).dispatch(&change, &aggregate(&refs));

        assert!(handle.is_none());
        assert_eq!(channel.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_sends_once_with_delta() {
        let channel = Arc::new(RecordingChannel::default());
        let change = ChangeSet {
            previous: set(&["a.example"]),
            current: set(&["a.example", "b.example"]),
            newly_enabled: set(&["b.example"]),
        };

        let handle = dispatcher(&channel)
            .dispatch(&change, &aggregate(&["a.example", "b.example"]))
            .unwrap();

        assert!(handle.wait().await.is_none());
        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].newly_enabled, vec!["b.example"]);
        assert_eq!(sent[0].current_enabled, vec!["a.example", "b.example"]);
    }

    #[tokio::test]
    async fn test_failure_becomes_diagnostic() {
        let channel = Arc::new(RecordingChannel::failing());
        let change = ChangeSet {
            previous: BTreeSet::new(),
            current: set(&["a.example"]),
            newly_enabled: set(&["a.example"]),
        };

        let handle = dispatcher(&channel)
            .dispatch(&change, &aggregate(&["a.example"]))
            .unwrap();

        let diagnostic = handle.wait().await.unwrap();
        assert!(diagnostic.contains("recording"));
    }

    #[test]
    fn test_unconfigured_dispatcher() {
        let change = ChangeSet {
            previous: BTreeSet::new(),
            current: set(&["a.example"]),
            newly_enabled: set(&["a.example"]),
        };
        let dispatcher = NotificationDispatcher::disabled();
        assert!(!dispatcher.is_configured());
        assert!(dispatcher.dispatch(&change, &aggregate(&["a.example"])).is_none());
    }
}
