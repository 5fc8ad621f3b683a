//! Cloudflare v4 API client used by snippet-monitor.
//!
//! Only two endpoints are covered:
//! - `GET /zones` (paged zone enumeration)
//! - `GET /zones/{id}/snippets/rules` (Snippets entitlement check)

pub mod client;
pub mod error;
pub mod models;

pub use client::{CloudflareClient, DEFAULT_BASE_URL, ProbeResponse, ZoneApi, install_rustls_provider};
pub use error::ClientError;
pub use models::{ApiMessage, ListZonesResponse, ResultInfo, StatusEnvelope, Zone, ZoneAccount, ZonePlan};
