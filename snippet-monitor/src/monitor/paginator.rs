//! Paged zone enumeration for one token.

use cloudflare_client::{Zone, ZoneApi};
use tracing::{debug, warn};

use super::retry::{RetryPolicy, retry_async};
use crate::credentials::Credential;

/// Zones requested per listing page.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Zones collected for one token.
#[derive(Debug, Default)]
pub struct PaginatedZones {
    /// Concatenation of every page fetched, in page order.
    pub zones: Vec<Zone>,
    /// Pages successfully fetched.
    pub pages_fetched: u32,
    /// Why pagination stopped early, if it did.
    pub truncated_by: Option<String>,
}

impl PaginatedZones {
    pub fn is_truncated(&self) -> bool {
        self.truncated_by.is_some()
    }
}

/// Walks `GET /zones` page by page until `page > total_pages`.
pub struct ZonePaginator<'a> {
    api: &'a dyn ZoneApi,
    per_page: u32,
    retry: RetryPolicy,
}

impl<'a> ZonePaginator<'a> {
    pub fn new(api: &'a dyn ZoneApi) -> Self {
        Self {
            api,
            per_page: DEFAULT_PER_PAGE,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch every page for `credential`.
    ///
    /// Never fails: the first failing page ends the walk and whatever was
    /// already collected is returned with `truncated_by` set.
    pub async fn fetch_all(&self, credential: &Credential) -> PaginatedZones {
        let mut out = PaginatedZones::default();
        let mut page = 1u32;
        let mut total_pages = 1u32;

        while page <= total_pages {
            let result = retry_async(&self.retry, "zone listing", || {
                self.api.list_zones(credential.expose(), page, self.per_page)
            })
            .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(credential = %credential, page, error = %e, "Zone listing failed");
                    out.truncated_by = Some(format!("page {page}: {e}"));
                    break;
                }
            };

            if !response.success {
                let reason = response
                    .errors
                    .first()
                    .map(|e| e.message.clone())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "success=false".to_string());
                warn!(credential = %credential, page, reason = %reason, "Zone listing reported failure");
                out.truncated_by = Some(format!("page {page}: {reason}"));
                break;
            }

            total_pages = response.total_pages();
            out.zones.extend(response.result);
            out.pages_fetched += 1;
            page += 1;
        }

        debug!(
            credential = %credential,
            zones = out.zones.len(),
            pages = out.pages_fetched,
            truncated = out.is_truncated(),
            "Zone listing complete"
        );

        out
    }
}
