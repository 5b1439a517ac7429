//! HTTP client for provider API and media requests

use super::retry::{RetryConfig, RetryExecutor};
use crate::error::VidmuxError;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default user agent, matching the ANDROID InnerTube client
pub const DEFAULT_USER_AGENT: &str =
    "com.google.android.youtube/20.10.38 (Linux; U; Android 11) gzip";

/// User agent sent with media requests
const MEDIA_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout for API calls
    pub timeout: Duration,
    /// Connect timeout, also applied to media requests
    pub connect_timeout: Duration,
    /// Maximum retries for API calls
    pub max_retries: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Force HTTP/1.1 only (disable HTTP/2)
    pub http1_only: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            user_agent: None,
            proxy_url: None,
            http1_only: false,
        }
    }
}

impl HttpClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }
}

/// Provider HTTP client
///
/// Two reqwest clients share one configuration: the API client carries the
/// request timeout, the media client only a connect timeout so long streams
/// are bounded by the transfer deadline instead.
#[derive(Debug, Clone)]
pub struct VideoClient {
    api: Client,
    media: Client,
    config: HttpClientConfig,
    retry: RetryExecutor,
}

impl VideoClient {
    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, VidmuxError> {
        let api = Self::builder(&config)?.timeout(config.timeout).build()?;
        let media = Self::builder(&config)?.build()?;
        let retry = RetryExecutor::with_config(
            RetryConfig::default().with_max_retries(config.max_retries),
        );

        Ok(Self {
            api,
            media,
            config,
            retry,
        })
    }

    fn builder(config: &HttpClientConfig) -> Result<ClientBuilder, VidmuxError> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(
                config
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            );

        if config.http1_only {
            builder = builder.http1_only();
        }

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(builder)
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create an API request with common headers
    pub fn create_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.api
            .request(method, url)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
    }

    /// Create a media request with minimal headers
    ///
    /// Media hosts reject some browser headers, and compressed transfer would
    /// break `Content-Length` passthrough.
    pub fn create_simple_media_request(&self, url: &str) -> RequestBuilder {
        self.media
            .request(Method::GET, url)
            .header("User-Agent", MEDIA_USER_AGENT)
            .header("Accept", "*/*")
            .header("Accept-Encoding", "identity")
            .header("Connection", "keep-alive")
    }

    /// Send a request with retry and return the response body as text
    pub async fn fetch_text_with_retry(
        &self,
        request: RequestBuilder,
    ) -> Result<String, VidmuxError> {
        let request = &request;
        self.retry
            .execute(move || async move {
                let response = Self::clone_request(request)?.send().await?;
                let response = response.error_for_status()?;
                Ok(response.text().await?)
            })
            .await
    }

    /// Send a request with retry and decode the JSON response
    pub async fn execute_with_retry<T>(&self, request: RequestBuilder) -> Result<T, VidmuxError>
    where
        T: DeserializeOwned,
    {
        let body = self.fetch_text_with_retry(request).await?;
        debug!("Received {} bytes of JSON", body.len());
        Ok(serde_json::from_str(&body)?)
    }

    fn clone_request(request: &RequestBuilder) -> Result<RequestBuilder, VidmuxError> {
        request
            .try_clone()
            .ok_or_else(|| VidmuxError::Generic("Request body cannot be retried".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VideoClient::with_config(HttpClientConfig::default()).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(30));
        assert_eq!(client.config().max_retries, 3);
    }

    #[test]
    fn test_invalid_proxy_is_an_error() {
        let config = HttpClientConfig::default().with_proxy("not a proxy url");
        assert!(VideoClient::with_config(config).is_err());
    }

    #[tokio::test]
    async fn test_execute_with_retry_decodes_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value": 42}"#)
            .create_async()
            .await;

        let client = VideoClient::with_config(HttpClientConfig::default()).unwrap();
        let request = client.create_request(Method::GET, &format!("{}/data", server.url()));
        let value: serde_json::Value = client.execute_with_retry(request).await.unwrap();

        assert_eq!(value["value"], 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = VideoClient::with_config(HttpClientConfig::default()).unwrap();
        let request = client.create_request(Method::GET, &format!("{}/missing", server.url()));
        let result = client.fetch_text_with_retry(request).await;

        assert!(matches!(result, Err(VidmuxError::Http(_))));
        mock.assert_async().await;
    }
}
