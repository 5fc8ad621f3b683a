//! Batched probe execution.
//!
//! Zones are split into contiguous batches. All probes of one batch are in
//! flight together on the current task; the next batch starts only after
//! the whole batch has resolved.

use cloudflare_client::Zone;
use futures::future::join_all;
use tracing::debug;

use super::probe::FeatureProbe;
use crate::credentials::Credential;
use crate::domain::ProbeRecord;

/// Concurrent probes per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ProbeScheduler {
    batch_size: usize,
}

impl ProbeScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Probe every zone, returning records in input order.
    pub async fn run(
        &self,
        probe: &FeatureProbe<'_>,
        zones: &[Zone],
        credential: &Credential,
    ) -> Vec<ProbeRecord> {
        let mut records = Vec::with_capacity(zones.len());

        for (index, batch) in zones.chunks(self.batch_size).enumerate() {
            debug!(
                credential = %credential,
                batch = index,
                size = batch.len(),
                "Probing batch"
            );
            // join_all yields results in the order of its inputs.
            let results = join_all(batch.iter().map(|zone| probe.probe(zone, credential))).await;
            records.extend(results);
        }

        records
    }
}

impl Default for ProbeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
