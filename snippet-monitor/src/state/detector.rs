//! Newly-enabled detection against the persisted enabled set.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::StateStore;
use crate::Result;
use crate::domain::RunAggregate;

/// Key holding the JSON array of enabled zone names.
pub const ENABLED_ZONES_KEY: &str = "enabled_zones";

/// Outcome of comparing one run against the persisted set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Persisted set at the start of the run.
    pub previous: BTreeSet<String>,
    /// Zones enabled in this run.
    pub current: BTreeSet<String>,
    /// `current \ previous`.
    pub newly_enabled: BTreeSet<String>,
}

impl ChangeSet {
    pub fn compute(previous: BTreeSet<String>, current: BTreeSet<String>) -> Self {
        let newly_enabled = current.difference(&previous).cloned().collect();
        Self {
            previous,
            current,
            newly_enabled,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.newly_enabled.is_empty()
    }
}

pub struct ChangeDetector {
    store: Arc<dyn StateStore>,
    key: String,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            key: ENABLED_ZONES_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Read the persisted set. Missing or malformed values read as empty.
    pub async fn load_previous(&self) -> Result<BTreeSet<String>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(BTreeSet::new());
        };

        match serde_json::from_slice::<Vec<String>>(&raw) {
            Ok(names) => Ok(names.into_iter().collect()),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Persisted enabled set is malformed, treating as empty");
                Ok(BTreeSet::new())
            }
        }
    }

    /// Compare `aggregate` against the persisted set.
    pub async fn detect(&self, aggregate: &RunAggregate) -> Result<ChangeSet> {
        let previous = self.load_previous().await?;
        let change = ChangeSet::compute(previous, aggregate.enabled_names());

        info!(
            previous = change.previous.len(),
            current = change.current.len(),
            newly_enabled = change.newly_enabled.len(),
            "Change detection complete"
        );

        Ok(change)
    }

    /// Replace the persisted set with `change.current`.
    ///
    /// This is a full overwrite: zones missing from the current run are dropped.
    pub async fn commit(&self, change: &ChangeSet) -> Result<()> {
        let names: Vec<&String> = change.current.iter().collect();
        let raw = serde_json::to_vec(&names)?;
        self.store.put(&self.key, raw).await
    }
}
