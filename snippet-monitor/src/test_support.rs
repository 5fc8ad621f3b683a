//! In-memory fakes shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cloudflare_client::{
    ApiMessage, ClientError, ListZonesResponse, ProbeResponse, ResultInfo, Zone, ZoneAccount,
    ZoneApi, ZonePlan,
};

use crate::Result;
use crate::domain::{ProbeOutcome, ProbeRecord, Resource};
use crate::notification::{NotificationChannel, NotificationMessage};

pub fn zone(id: &str, name: &str) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
        account: Some(ZoneAccount {
            id: "acc".to_string(),
            name: "Main Account".to_string(),
        }),
        plan: Some(ZonePlan {
            id: "free".to_string(),
            name: "Free Website".to_string(),
        }),
    }
}

/// `count` zones named `{prefix}-{i}.example` with ids `{prefix}-id-{i}`.
pub fn zones(prefix: &str, count: usize) -> Vec<Zone> {
    (0..count)
        .map(|i| zone(&format!("{prefix}-id-{i}"), &format!("{prefix}-{i}.example")))
        .collect()
}

pub fn record(name: &str, outcome: ProbeOutcome) -> ProbeRecord {
    ProbeRecord {
        resource: Resource {
            name: name.to_string(),
            account_name: "acct".to_string(),
            plan_tier: "Free".to_string(),
            masked_id: "...000000".to_string(),
        },
        outcome,
    }
}

#[derive(Default)]
struct Calls {
    listing_requests: Vec<(String, u32)>,
    probe_count: usize,
    in_flight: usize,
    max_in_flight: usize,
    batch_sizes: Vec<usize>,
}

/// Scriptable [`ZoneApi`]. Unscripted zones probe as enabled; unknown
/// tokens get a 403 on listing.
#[derive(Default)]
pub struct FakeZoneApi {
    pages: HashMap<String, Vec<Vec<Zone>>>,
    listing_failures: HashMap<String, u32>,
    unsuccessful_pages: HashMap<String, u32>,
    probes: HashMap<String, (u16, String)>,
    probe_delays: HashMap<String, Duration>,
    transport_failures: HashSet<String>,
    calls: Mutex<Calls>,
}

impl FakeZoneApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, token: &str, pages: Vec<Vec<Zone>>) -> Self {
        self.pages.insert(token.to_string(), pages);
        self
    }

    /// Fail listing requests for `page` (and beyond) with a 500.
    pub fn with_listing_failure(mut self, token: &str, page: u32) -> Self {
        self.listing_failures.insert(token.to_string(), page);
        self
    }

    pub fn with_unsuccessful_page(mut self, token: &str, page: u32) -> Self {
        self.unsuccessful_pages.insert(token.to_string(), page);
        self
    }

    pub fn with_probe(mut self, zone_id: &str, status: u16, body: &str) -> Self {
        self.probes
            .insert(zone_id.to_string(), (status, body.to_string()));
        self
    }

    pub fn with_probe_delay(mut self, zone_id: &str, delay: Duration) -> Self {
        self.probe_delays.insert(zone_id.to_string(), delay);
        self
    }

    pub fn with_transport_failure(mut self, zone_id: &str) -> Self {
        self.transport_failures.insert(zone_id.to_string());
        self
    }

    pub fn listing_requests(&self, token: &str) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .listing_requests
            .iter()
            .filter(|(t, _)| t == token)
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn probe_count(&self) -> usize {
        self.calls.lock().unwrap().probe_count
    }

    pub fn max_in_flight(&self) -> usize {
        self.calls.lock().unwrap().max_in_flight
    }

    /// Probes started between two idle points, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().batch_sizes.clone()
    }
}

#[async_trait]
impl ZoneApi for FakeZoneApi {
    async fn list_zones(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> std::result::Result<ListZonesResponse, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .listing_requests
            .push((token.to_string(), page));

        if self.listing_failures.get(token).is_some_and(|p| page >= *p) {
            return Err(ClientError::Status(500));
        }
        let Some(pages) = self.pages.get(token) else {
            return Err(ClientError::Status(403));
        };
        if self.unsuccessful_pages.get(token) == Some(&page) {
            return Ok(ListZonesResponse {
                success: false,
                errors: vec![ApiMessage {
                    code: Some(1000),
                    message: "scripted failure".to_string(),
                }],
                ..Default::default()
            });
        }

        let total_pages = pages.len() as u32;
        let result = pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(ListZonesResponse {
            success: true,
            result_info: Some(ResultInfo {
                page,
                per_page,
                total_pages,
                count: result.len() as u32,
                total_count: pages.iter().map(Vec::len).sum::<usize>() as u32,
            }),
            result,
            errors: vec![],
        })
    }

    async fn snippet_rules(
        &self,
        _token: &str,
        zone_id: &str,
    ) -> std::result::Result<ProbeResponse, ClientError> {
        {
            let mut calls = self.calls.lock().unwrap();
            if calls.in_flight == 0 {
                calls.batch_sizes.push(0);
            }
            if let Some(last) = calls.batch_sizes.last_mut() {
                *last += 1;
            }
            calls.probe_count += 1;
            calls.in_flight += 1;
            calls.max_in_flight = calls.max_in_flight.max(calls.in_flight);
        }

        if let Some(delay) = self.probe_delays.get(zone_id) {
            tokio::time::sleep(*delay).await;
        }

        self.calls.lock().unwrap().in_flight -= 1;

        if self.transport_failures.contains(zone_id) {
            return Err(ClientError::InvalidUrl("connection refused".to_string()));
        }

        let (status, body) = self
            .probes
            .get(zone_id)
            .cloned()
            .unwrap_or((200, r#"{"success":true,"result":[]}"#.to_string()));
        Ok(ProbeResponse {
            status,
            body: Bytes::from(body),
        })
    }
}

/// Channel that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<NotificationMessage>>,
    pub fail: bool,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn channel_type(&self) -> &'static str {
        "recording"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(crate::Error::notification("scripted delivery failure"));
        }
        Ok(())
    }
}
