//! Single-exchange request executor
//!
//! Performs exactly one HTTP call per invocation: injects the stored bearer
//! token, sends, and classifies the outcome into [`ApiResult`]. It never
//! retries and never writes to the token store.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pulse_domain::{ApiError, ApiRequest, ApiResult, TokenKey};
use serde_json::Value;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::ports::{HttpClient, HttpRequest, HttpResponse};

/// Outcome of one send, with the access token that was attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Classified outcome.
    pub result: ApiResult,
    /// Access token sent as the bearer credential, if any.
    pub access_token: Option<String>,
}

/// Issues single authenticated HTTP calls against the API base URL.
#[derive(Clone)]
pub struct RequestExecutor {
    http: Arc<dyn HttpClient>,
    tokens: TokenStore,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, tokens: TokenStore, config: &ClientConfig) -> Self {
        Self {
            http,
            tokens,
            base_url: config.api_base_url.clone(),
            timeout: config.request_timeout(),
        }
    }

    /// The token store this executor reads from.
    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Sends one request and classifies the response.
    pub async fn execute(&self, request: &ApiRequest) -> ApiResult {
        self.send(request).await.result
    }

    /// Sends one request, reporting which access token was attached.
    pub async fn send(&self, request: &ApiRequest) -> Attempt {
        let access_token = if request.has_authorization() {
            None
        } else {
            self.tokens.get(TokenKey::AccessToken).await
        };

        let http_request = match self.build(request, access_token.as_deref()) {
            Ok(http_request) => http_request,
            Err(error) => {
                return Attempt {
                    result: Err(error),
                    access_token,
                };
            }
        };

        let started = Instant::now();
        let result = match self.http.execute(http_request).await {
            Ok(response) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    elapsed = ?started.elapsed(),
                    "response received"
                );
                classify(response)
            }
            Err(error) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    error = %error,
                    "request failed before a response"
                );
                Err(ApiError::fetch_error(error.to_string()))
            }
        };

        Attempt {
            result,
            access_token,
        }
    }

    fn build(&self, request: &ApiRequest, access_token: Option<&str>) -> ApiResult<HttpRequest> {
        request
            .validate()
            .map_err(|e| ApiError::fetch_error(e.to_string()))?;

        let mut http_request = HttpRequest::new(request.method, request.url(&self.base_url));
        http_request.timeout = Some(self.timeout);
        http_request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));

        if let Some(body) = &request.body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| ApiError::fetch_error(e.to_string()))?;
            http_request
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
            http_request.body = Some(bytes);
        }

        for (name, value) in &request.headers {
            http_request.headers.push((name.clone(), value.clone()));
        }

        if let Some(token) = access_token {
            http_request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        Ok(http_request)
    }
}

/// Turns a raw response into data or a classified error.
fn classify(response: HttpResponse) -> ApiResult {
    let status = response.status;
    let blank = response.body.iter().all(u8::is_ascii_whitespace);

    if response.is_success() {
        if blank {
            return Ok(Value::Null);
        }
        return serde_json::from_slice(&response.body).map_err(|e| {
            ApiError::parsing_error(status, e.to_string(), Some(lossy_text(&response.body)))
        });
    }

    let data = if blank {
        None
    } else {
        Some(
            serde_json::from_slice(&response.body)
                .unwrap_or_else(|_| lossy_text(&response.body)),
        )
    };
    Err(ApiError::http(status, data))
}

fn lossy_text(body: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::HttpClientError;
    use crate::testing::{FlakyStore, Harness, Reply, ScriptedHttpClient, bearer};
    use pretty_assertions::assert_eq;
    use pulse_domain::ErrorStatus;
    use serde_json::json;

    fn harness(reply: Reply, backend: FlakyStore) -> Harness {
        Harness::new(ScriptedHttpClient::new(move |_| reply.clone()), backend)
    }

    #[tokio::test]
    async fn test_injects_bearer_and_parses_json() {
        let h = harness(
            Reply::json(200, &json!({"id": 7})),
            FlakyStore::with_tokens("A1", "R1"),
        );

        let attempt = h.executor.send(&ApiRequest::get("/users/me")).await;

        assert_eq!(attempt.result, Ok(json!({"id": 7})));
        assert_eq!(attempt.access_token.as_deref(), Some("A1"));
        let requests = h.http.requests();
        let sent = &requests[0];
        assert_eq!(sent.url, "https://api.test/users/me");
        assert_eq!(bearer(sent), Some("A1"));
        assert_eq!(sent.header("Accept"), Some("application/json"));
        assert_eq!(sent.timeout, Some(h.config.request_timeout()));
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let h = harness(Reply::json(200, &json!({})), FlakyStore::new());

        let attempt = h.executor.send(&ApiRequest::get("/recipes")).await;

        assert_eq!(attempt.access_token, None);
        assert_eq!(h.http.requests()[0].header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_explicit_authorization_header_wins() {
        let h = harness(
            Reply::json(200, &json!({})),
            FlakyStore::with_tokens("A1", "R1"),
        );

        let request = ApiRequest::get("/other").with_header("Authorization", "Basic abc");
        let attempt = h.executor.send(&request).await;

        assert_eq!(attempt.access_token, None);
        let requests = h.http.requests();
        let sent = &requests[0];
        assert_eq!(sent.header("Authorization"), Some("Basic abc"));
        assert_eq!(
            sent.headers
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case("authorization"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_body_is_serialized_with_content_type() {
        let h = harness(Reply::json(201, &json!({"ok": true})), FlakyStore::new());

        let request = ApiRequest::post("/tracking/water", json!({"amount_ml": 250}));
        let result = h.executor.execute(&request).await;

        assert_eq!(result, Ok(json!({"ok": true})));
        let requests = h.http.requests();
        let sent = &requests[0];
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"amount_ml": 250}));
    }

    #[tokio::test]
    async fn test_unauthorized_is_typed() {
        let h = harness(
            Reply::json(401, &json!({"message": "jwt expired"})),
            FlakyStore::with_tokens("A1", "R1"),
        );

        let error = h.executor.execute(&ApiRequest::get("/users/me")).await.unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(error.server_message(), Some("jwt expired"));
    }

    #[tokio::test]
    async fn test_other_http_failures_carry_status_and_body() {
        let h = harness(Reply::raw(503, "upstream down"), FlakyStore::new());

        let error = h.executor.execute(&ApiRequest::get("/recipes")).await.unwrap_err();

        assert_eq!(error.status, ErrorStatus::Http(503));
        assert_eq!(error.data, Some(json!("upstream down")));
        assert!(!error.is_unauthorized());
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_error() {
        let h = harness(
            Reply::Fail(HttpClientError::Timeout { timeout_ms: 30_000 }),
            FlakyStore::new(),
        );

        let error = h.executor.execute(&ApiRequest::get("/recipes")).await.unwrap_err();

        assert_eq!(error.status, ErrorStatus::FetchError);
        assert_eq!(error.http_status(), None);
    }

    #[tokio::test]
    async fn test_invalid_success_body_is_parsing_error() {
        let h = harness(Reply::raw(200, "<html>"), FlakyStore::new());

        let error = h.executor.execute(&ApiRequest::get("/recipes")).await.unwrap_err();

        assert_eq!(error.status, ErrorStatus::ParsingError(200));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let h = harness(Reply::raw(204, ""), FlakyStore::new());

        let result = h.executor.execute(&ApiRequest::delete("/tracking/water/1")).await;

        assert_eq!(result, Ok(Value::Null));
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_transport() {
        let h = harness(Reply::json(200, &json!({})), FlakyStore::new());

        let error = h.executor.execute(&ApiRequest::get("users")).await.unwrap_err();

        assert_eq!(error.status, ErrorStatus::FetchError);
        assert!(h.http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_executor_never_writes_tokens() {
        let h = harness(
            Reply::json(200, &json!({"access_token": "X", "refresh_token": "Y"})),
            FlakyStore::with_tokens("A1", "R1"),
        );

        h.executor.execute(&ApiRequest::get("/users/me")).await.unwrap();

        assert_eq!(h.backend.value(TokenKey::AccessToken).as_deref(), Some("A1"));
        assert!(h.backend.write_log().is_empty());
    }
}
