//! Backend transport for paginated list endpoints
//!
//! Handles HTTP communication with the SmartSales365 REST API:
//! - Bearer token authentication
//! - Retry with exponential backoff for connectivity failures
//! - Request timeouts
//! - Normalization of backend error bodies

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use smartsales_core::config::ApiConfig;
use smartsales_core::types::{ListQuery, Page};
use smartsales_core::{Error, Result};

/// Source of list pages
///
/// The controller only depends on this seam, so tests and alternative
/// backends can stand in for the HTTP implementation.
#[async_trait]
pub trait ListTransport: Send + Sync {
    /// Fetch the page described by `query`
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Value>>;
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL endpoints are appended to
    pub base_url: String,
    /// Bearer token, if the backend requires authentication
    pub token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum retry attempts for connectivity failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for TransportConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            token: api.token.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
            connect_timeout: Duration::from_secs(api.connect_timeout_secs),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(100),
        }
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a new transport with the given configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            Error::Config(format!("Invalid API base URL '{}': {}", config.base_url, e))
        })?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Absolute URL for an endpoint path plus query pairs
    pub fn endpoint_url(&self, endpoint: &str, pairs: &[(String, String)]) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| Error::InvalidArgument(format!("invalid URL '{}': {}", joined, e)))?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// GET a JSON document, retrying connectivity failures
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let mut last_error = None;
        let mut delay = self.config.retry_base_delay;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, url);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }

            match self.get_once(url).await {
                Ok(response) => return Ok(response),
                Err(Error::Network(message)) => {
                    warn!("Request to {} failed (attempt {}): {}", url, attempt + 1, message);
                    last_error = Some(Error::Network(message));
                }
                Err(other) => return Err(other),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Network("Unknown error".to_string())))
    }

    /// Send a single request without retry
    async fn get_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::server(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait]
impl ListTransport for HttpTransport {
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<Value>> {
        let url = query.request_url(&self.config.base_url)?;
        debug!("GET {}", url);
        self.get_json(&url).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smartsales_core::{ErrorKind, ServerErrorBody};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(TransportConfig {
            base_url: format!("{}/api", server.uri()),
            token: Some("test-token".to_string()),
            max_retries: 0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
        assert!(config.token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_page_sends_query_and_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/usuarios/users/customers/"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 23,
                "next": "http://backend/api/usuarios/users/customers/?page=2",
                "previous": null,
                "results": [{"id_usuario": 1}, {"id_usuario": 2}]
            })))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let query = ListQuery::new("/usuarios/users/customers/", 10)
            .unwrap()
            .with_fixed_filters([("rol__nombre__in", "cliente")])
            .unwrap();

        let page = transport.fetch_page(&query).await.unwrap();
        assert_eq!(page.count, 23);
        assert_eq!(page.results.len(), 2);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.query(),
            Some("page_size=10&rol__nombre__in=cliente")
        );
    }

    #[tokio::test]
    async fn test_server_error_is_normalized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "email": ["ya existe"],
                "profile": {"telefono": ["inválido"]}
            })))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let query = ListQuery::new("/usuarios/users/", 10).unwrap();
        let err = transport.fetch_page(&query).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Server);
        match err {
            Error::Server { status, body } => {
                assert_eq!(status, 400);
                assert!(matches!(body, ServerErrorBody::FieldErrors(_)));
                assert_eq!(body.message(), "email: ya existe; profile: telefono: inválido");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let query = ListQuery::new("/ventas/", 10).unwrap();
        let err = transport.fetch_page(&query).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let transport = HttpTransport::new(TransportConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            connect_timeout: Duration::from_millis(500),
            timeout: Duration::from_secs(1),
            max_retries: 1,
            retry_base_delay: Duration::from_millis(10),
            token: None,
        })
        .unwrap();

        let query = ListQuery::new("/ventas/", 10).unwrap();
        let err = transport.fetch_page(&query).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpTransport::new(TransportConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
