//! HTTP client for the zone listing and Snippets status endpoints.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::models::ListZonesResponse;

/// Production API root. Must end with `/` so relative joins keep the version segment.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4/";

/// Default request timeout applied by [`CloudflareClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Raw response of a Snippets status check.
///
/// Classification is left to the caller; the client only reports what came back.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Bytes,
}

/// The two remote calls the monitor depends on.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// Fetch one page of zones visible to `token`.
    ///
    /// Non-2xx responses are returned as [`ClientError::Status`]. A 2xx body
    /// with `success: false` is returned as-is.
    async fn list_zones(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ListZonesResponse, ClientError>;

    /// Check the Snippets rules endpoint of one zone.
    ///
    /// Only transport failures are errors; every HTTP status is returned.
    async fn snippet_rules(&self, token: &str, zone_id: &str) -> Result<ProbeResponse, ClientError>;
}

/// reqwest-backed [`ZoneApi`] implementation.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    client: Client,
    base_url: Url,
}

impl CloudflareClient {
    /// Create a client against the production API.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom API root (used by tests and proxies).
    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        install_rustls_provider();
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Self::with_client(client, base_url)
    }

    /// Create a client from a preconfigured `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl ZoneApi for CloudflareClient {
    async fn list_zones(
        &self,
        token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ListZonesResponse, ClientError> {
        let mut url = self.endpoint("zones")?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(page, status = status.as_u16(), "zone listing returned non-success status");
            return Err(ClientError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn snippet_rules(&self, token: &str, zone_id: &str) -> Result<ProbeResponse, ClientError> {
        let url = self.endpoint(&format!("zones/{zone_id}/snippets/rules"))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(ProbeResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = CloudflareClient::with_base_url("http://localhost:1234/client/v4").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:1234/client/v4/");
        assert_eq!(
            client.endpoint("zones").unwrap().as_str(),
            "http://localhost:1234/client/v4/zones"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            CloudflareClient::with_base_url("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_zones_sends_bearer_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "50"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": [{"id": "z1", "name": "a.example"}],
                "result_info": {"page": 2, "per_page": 50, "total_pages": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CloudflareClient::with_base_url(&server.uri()).unwrap();
        let resp = client.list_zones("secret-token", 2, 50).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.result.len(), 1);
        assert_eq!(resp.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_list_zones_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = CloudflareClient::with_base_url(&server.uri()).unwrap();
        let err = client.list_zones("t", 1, 50).await.unwrap_err();
        assert!(matches!(err, ClientError::Status(401)));
    }

    #[tokio::test]
    async fn test_snippet_rules_returns_any_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/z1/snippets/rules"))
            .respond_with(ResponseTemplate::new(403).set_body_string("{\"success\":false}"))
            .mount(&server)
            .await;

        let client = CloudflareClient::with_base_url(&server.uri()).unwrap();
        let resp = client.snippet_rules("t", "z1").await.unwrap();
        assert_eq!(resp.status, 403);
        assert_eq!(&resp.body[..], b"{\"success\":false}");
    }
}
