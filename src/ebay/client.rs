//! HTTP client for eBay API requests.

use crate::config::Config;
use crate::ebay::endpoints::Endpoints;
use crate::ebay::models::Response;
use crate::ebay::request::{ApiRequest, RequestBuilder};
use crate::ebay::response;
use crate::error::{Error, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;

/// Trait for executing one API call - enables mocking for tests.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Performs the call and returns the normalized response.
    async fn execute(&self, request: &ApiRequest) -> Result<Response>;
}

/// How responses travel over the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Padded JSON: every request names a fresh callback the body is wrapped in.
    #[default]
    Jsonp,
    /// Plain JSON bodies.
    Json,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Jsonp => write!(f, "jsonp"),
            Transport::Json => write!(f, "json"),
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonp" => Ok(Transport::Jsonp),
            "json" | "ajax" => Ok(Transport::Json),
            _ => Err(format!("Unknown mode: {}. Use: jsonp, json", s)),
        }
    }
}

/// eBay HTTP client.
pub struct EbayClient {
    client: Client,
    builder: RequestBuilder,
    transport: Transport,
    timeout_ms: u64,
    retries: u32,
    retry_backoff_ms: u64,
    retry_jitter_ms: u64,
    call_ids: AtomicU64,
}

impl EbayClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, config.base_url.clone())
    }

    /// Creates a new client with an explicit base URL override (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let app_id = config.app_id.trim();
        if app_id.is_empty() {
            return Err(Error::Config {
                message: "app id is required (set app_id, EBAY_APP_ID or --app-id)".to_string(),
            });
        }

        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).map_err(|e| Error::Config {
                message: format!("invalid proxy '{}': {}", proxy_url, e),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| Error::Config { message: e.to_string() })?;

        Ok(Self {
            client,
            builder: RequestBuilder::new(app_id, Endpoints::new(base_url.as_deref())),
            transport: config.mode,
            timeout_ms: config.timeout_ms,
            retries: config.retries,
            retry_backoff_ms: config.retry_backoff_ms,
            retry_jitter_ms: config.retry_jitter_ms,
            call_ids: AtomicU64::new(0),
        })
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Returns a fresh padding callback name; never reused by this client.
    fn next_callback(&self) -> String {
        format!("JSONP{}", self.call_ids.fetch_add(1, Ordering::Relaxed))
    }

    /// Performs a GET request and returns the body.
    async fn get(&self, id: &str, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let accept = match self.transport {
            Transport::Jsonp => "application/javascript, application/json;q=0.9, */*;q=0.1",
            Transport::Json => "application/json",
        };

        let response = self
            .client
            .get(url)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| self.request_error(id, e, "request failed"))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(Error::RequestFailed {
                id: id.to_string(),
                reason: format!("status {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| self.request_error(id, e, "failed to read response body"))
    }

    /// Timeouts map to [`Error::Timeout`] whether they hit while sending or
    /// while reading the body.
    fn request_error(&self, id: &str, err: wreq::Error, context: &str) -> Error {
        if err.is_timeout() {
            Error::Timeout { id: id.to_string(), after_ms: self.timeout_ms }
        } else {
            Error::RequestFailed { id: id.to_string(), reason: format!("{}: {}", context, err) }
        }
    }

    /// One attempt: build the URL, fetch, decode.
    async fn attempt(&self, request: &ApiRequest) -> Result<Response> {
        let id = request.primary().as_str();
        let callback = match self.transport {
            Transport::Jsonp => Some(self.next_callback()),
            Transport::Json => None,
        };

        let url = self.builder.build(request, callback.as_deref());
        let body = self.get(id, &url).await?;
        response::decode(id, &body, callback.as_deref())
    }

    /// Sleeps before retry number `attempt` (1-based).
    async fn backoff(&self, attempt: u32) {
        let jitter = if self.retry_jitter_ms > 0 {
            rand::rng().random_range(0..=self.retry_jitter_ms)
        } else {
            0
        };

        let total = self.retry_backoff_ms.saturating_mul(u64::from(attempt)) + jitter;
        debug!("Retrying in {}ms", total);
        tokio::time::sleep(Duration::from_millis(total)).await;
    }
}

#[async_trait]
impl CatalogApi for EbayClient {
    async fn execute(&self, request: &ApiRequest) -> Result<Response> {
        info!("{} {}", request.operation(), request.primary());

        let mut attempt = 0;
        loop {
            match self.attempt(request).await {
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!("{} (attempt {}/{})", err, attempt, self.retries + 1);
                    self.backoff(attempt).await;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebay::request::{Operation, Properties};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config(mode: Transport) -> Config {
        Config {
            app_id: "TestApp".to_string(),
            mode,
            retries: 0,
            retry_backoff_ms: 0,
            retry_jitter_ms: 0,
            ..Config::default()
        }
    }

    fn user_request(id: &str) -> ApiRequest {
        ApiRequest::new(Operation::GetUserProfile, id, &Properties::new())
    }

    #[test]
    fn test_transport_parsing() {
        assert_eq!("jsonp".parse::<Transport>().unwrap(), Transport::Jsonp);
        assert_eq!("JSON".parse::<Transport>().unwrap(), Transport::Json);
        assert_eq!("ajax".parse::<Transport>().unwrap(), Transport::Json);
        assert!("xml".parse::<Transport>().unwrap_err().contains("Unknown mode"));
        assert_eq!(Transport::Jsonp.to_string(), "jsonp");
    }

    #[test]
    fn test_missing_app_id() {
        let config = Config { app_id: "  ".to_string(), ..Config::default() };
        let err = EbayClient::new(&config).err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("app id is required"));
    }

    #[test]
    fn test_callback_names_increase() {
        let client = EbayClient::new(&make_test_config(Transport::Jsonp)).unwrap();
        assert_eq!(client.next_callback(), "JSONP0");
        assert_eq!(client.next_callback(), "JSONP1");
        assert_eq!(client.next_callback(), "JSONP2");
    }

    #[test]
    fn test_default_endpoints_used() {
        let client = EbayClient::new(&make_test_config(Transport::Json)).unwrap();
        let url = client.request_builder().build(&user_request("u"), None);
        assert!(url.starts_with("http://open.api.ebay.com/shopping?callname=GetUserProfile"));
    }

    #[tokio::test]
    async fn test_json_mode_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("callname", "GetUserProfile"))
            .and(query_param("appid", "TestApp"))
            .and(query_param("UserID", "seller1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Timestamp": "2024-05-01T10:00:00.000Z",
                "Ack": "Success",
                "Build": "E1_CORE",
                "Version": "525",
                "User": {"UserID": "seller1"}
            })))
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Json),
            Some(mock_server.uri()),
        )
        .unwrap();

        let response = client.execute(&user_request("seller1")).await.unwrap();
        assert_eq!(response.len(), 1);
        assert_eq!(response.get("User"), Some(&json!({"UserID": "seller1"})));
    }

    #[tokio::test]
    async fn test_jsonp_mode_unwraps_padding() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("callbackname", "JSONP0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"JSONP0({"Ack":"Success","User":{"UserID":"a"}});"#),
            )
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Jsonp),
            Some(mock_server.uri()),
        )
        .unwrap();

        let response = client.execute(&user_request("a")).await.unwrap();
        assert_eq!(response.get("User"), Some(&json!({"UserID": "a"})));
        assert!(!response.contains_key("Ack"));
    }

    #[tokio::test]
    async fn test_jsonp_mode_rejects_foreign_padding() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"JSONP99({"User":{}})"#))
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Jsonp),
            Some(mock_server.uri()),
        )
        .unwrap();

        let err = client.execute(&user_request("a")).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_finding_call_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("OPERATION-NAME", "findItemsByKeywords"))
            .and(query_param("SECURITY-APPNAME", "TestApp"))
            .and(query_param("keywords", "vintage camera"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "findItemsByKeywordsResponse": [{"ack": ["Success"]}]
            })))
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Json),
            Some(mock_server.uri()),
        )
        .unwrap();

        let request =
            ApiRequest::new(Operation::FindItemsByKeywords, "vintage camera", &Properties::new());
        let response = client.execute(&request).await.unwrap();
        assert!(response.contains_key("findItemsByKeywordsResponse"));
    }

    #[tokio::test]
    async fn test_http_error_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Json),
            Some(mock_server.uri()),
        )
        .unwrap();

        let err = client.execute(&user_request("x")).await.unwrap_err();
        assert!(matches!(err, Error::RequestFailed { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_empty_response_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Json),
            Some(mock_server.uri()),
        )
        .unwrap();

        let err = client.execute(&user_request("x")).await.unwrap_err();
        assert_eq!(
            err,
            Error::MalformedResponse { id: "x".to_string(), reason: "empty body".to_string() }
        );
    }

    #[tokio::test]
    async fn test_api_failure_ack() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Ack": "Failure",
                "Errors": [{"ShortMessage": "Invalid item ID.", "LongMessage": "Item not found."}]
            })))
            .mount(&mock_server)
            .await;

        let client = EbayClient::with_base_url(
            &make_test_config(Transport::Json),
            Some(mock_server.uri()),
        )
        .unwrap();

        let err = client.execute(&user_request("x")).await.unwrap_err();
        assert_eq!(
            err,
            Error::ApiFailure { id: "x".to_string(), message: "Item not found.".to_string() }
        );
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Item": {"ItemID": "1"}})))
            .mount(&mock_server)
            .await;

        let config = Config { retries: 2, ..make_test_config(Transport::Json) };
        let client = EbayClient::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let response = client.execute(&user_request("1")).await.unwrap();
        assert!(response.contains_key("Item"));
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let config = Config { retries: 2, ..make_test_config(Transport::Json) };
        let client = EbayClient::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let err = client.execute(&user_request("1")).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_response_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config { retries: 3, ..make_test_config(Transport::Json) };
        let client = EbayClient::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let err = client.execute(&user_request("1")).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_slow_headers_report_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"User": {"UserID": "slow"}}))
                    .set_delay(Duration::from_millis(2_000)),
            )
            .mount(&mock_server)
            .await;

        let config = Config { timeout_ms: 200, ..make_test_config(Transport::Json) };
        let client = EbayClient::with_base_url(&config, Some(mock_server.uri())).unwrap();

        let err = client.execute(&user_request("slow")).await.unwrap_err();
        assert_eq!(err, Error::Timeout { id: "slow".to_string(), after_ms: 200 });
    }

    #[tokio::test]
    async fn test_stalled_body_reports_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Headers and part of the body arrive at once, the rest never does.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                      Content-Length: 64\r\n\r\n{\"User\":",
                )
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let config = Config { timeout_ms: 300, ..make_test_config(Transport::Json) };
        let client =
            EbayClient::with_base_url(&config, Some(format!("http://{}", addr))).unwrap();

        let err = client.execute(&user_request("stalled")).await.unwrap_err();
        assert_eq!(err, Error::Timeout { id: "stalled".to_string(), after_ms: 300 });
    }
}
