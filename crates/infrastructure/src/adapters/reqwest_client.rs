//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use pulse_application::ports::{HttpClient, HttpClientError, HttpRequest, HttpResponse};
use pulse_domain::HttpMethod;
use reqwest::{Client, Method, Url};

const USER_AGENT: &str = concat!("Pulse/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `HttpClient` implementation over a shared `reqwest::Client`.
///
/// Performs one exchange per call. Redirects are followed; statuses are
/// returned as-is.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client with the Pulse user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(error: &reqwest::Error, timeout: Duration) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        let host = error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string();

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return HttpClientError::DnsError { host, message };
            }
            if lowered.contains("refused") {
                let port = error
                    .url()
                    .and_then(Url::port_or_known_default)
                    .unwrap_or(80);
                return HttpClientError::ConnectionRefused { host, port };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        let url = Url::parse(&request.url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.url)))?;
        let timeout = request.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("failed to read body: {e}")))?
            .to_vec();

        Ok(HttpResponse::new(status, body))
    }
}
