//! Per-zone Snippets status check and outcome classification.

use cloudflare_client::{StatusEnvelope, Zone, ZoneApi};
use tracing::{debug, warn};

use crate::credentials::Credential;
use crate::domain::{ProbeOutcome, ProbeRecord, Resource};

/// Classify a Snippets rules response.
///
/// Total over every `(status, body)` pair; transport failures never reach
/// this function and are mapped to [`ProbeOutcome::TransportError`] by
/// [`FeatureProbe::probe`].
pub fn classify(status: u16, body: &[u8]) -> ProbeOutcome {
    match status {
        200 => {
            let envelope: StatusEnvelope = serde_json::from_slice(body).unwrap_or_default();
            if envelope.success == Some(true) {
                ProbeOutcome::Enabled
            } else {
                ProbeOutcome::DisabledKnown
            }
        }
        403 => ProbeOutcome::PermissionDenied,
        400 => ProbeOutcome::NotEntitled,
        404 => ProbeOutcome::NotFound,
        other => {
            let message = serde_json::from_slice::<StatusEnvelope>(body)
                .ok()
                .and_then(|env| env.first_error().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {other}"));
            ProbeOutcome::OtherHttpError { message }
        }
    }
}

/// Issues the status check for one zone.
pub struct FeatureProbe<'a> {
    api: &'a dyn ZoneApi,
}

impl<'a> FeatureProbe<'a> {
    pub fn new(api: &'a dyn ZoneApi) -> Self {
        Self { api }
    }

    /// Probe `zone` with `credential`. Every failure resolves to an outcome.
    pub async fn probe(&self, zone: &Zone, credential: &Credential) -> ProbeRecord {
        let resource = Resource::from_zone(zone);

        let outcome = match self.api.snippet_rules(credential.expose(), &zone.id).await {
            Ok(response) => classify(response.status, &response.body),
            Err(e) => {
                warn!(zone = %zone.name, error = %e, "Snippets status check failed");
                ProbeOutcome::TransportError
            }
        };

        debug!(zone = %zone.name, outcome = outcome.kind(), "Probed zone");
        ProbeRecord { resource, outcome }
    }
}
