//! Canvas API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Resource operations live in [`crate::resources`]; pagination and file
//! uploads build on the full-response and single-page entry points here.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{api_error_message, CanvasError, Result};
use crate::params::{format_domain, to_query_pairs, Params};

const USER_AGENT: &str = concat!("canvasapi/", env!("CARGO_PKG_VERSION"));

/// Retry behavior for failed requests.
///
/// The default is [`RetryPolicy::None`]: every failure surfaces
/// immediately, matching Canvas's documented rate-limit semantics being
/// the caller's concern. `Limited` retries transport errors and 429/5xx
/// responses with a fixed delay; it is never applied implicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Fail fast; no retries.
    #[default]
    None,
    /// Retry up to `attempts` extra times, sleeping `backoff` in between.
    Limited { attempts: u32, backoff: Duration },
}

impl RetryPolicy {
    fn allows(self, attempt: u32, status: Option<StatusCode>) -> bool {
        match self {
            RetryPolicy::None => false,
            RetryPolicy::Limited { attempts, .. } => {
                attempt < attempts
                    && status.map_or(true, |s| s.as_u16() == 429 || s.is_server_error())
            }
        }
    }

    fn backoff(self) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Limited { backoff, .. } => backoff,
        }
    }
}

/// Where a request is aimed: a path under the API base, or an absolute
/// URL handed back by the server (pagination `next` links, upload
/// confirmation pointers).
#[derive(Debug, Clone, Copy)]
pub enum RequestTarget<'a> {
    Endpoint(&'a str),
    Url(&'a str),
}

/// Low-level Canvas API client.
///
/// Issues authenticated JSON requests against
/// `https://{domain}/api/v1{endpoint}` with a bearer token. This struct is
/// cheaply cloneable; clones reference the same underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use canvasapi::CanvasClient;
///
/// # fn example() -> canvasapi::Result<()> {
/// // Create from environment variables
/// let client = CanvasClient::from_env()?;
///
/// // Or configure manually
/// let client = CanvasClient::new("school.instructure.com", "access-token")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CanvasClient {
    http: Client,
    base_url: Arc<Url>,
    token: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for CanvasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CanvasClient {
    /// Create a client from environment variables.
    ///
    /// Uses `CANVAS_DOMAIN` for the instance domain and
    /// `CANVAS_ACCESS_TOKEN` for authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is not set.
    pub fn from_env() -> Result<Self> {
        let domain = env::var("CANVAS_DOMAIN").map_err(|_| {
            CanvasError::ConfigMissing("CANVAS_DOMAIN environment variable not set".to_string())
        })?;
        let token = env::var("CANVAS_ACCESS_TOKEN").map_err(|_| {
            CanvasError::ConfigMissing(
                "CANVAS_ACCESS_TOKEN environment variable not set".to_string(),
            )
        })?;

        Self::new(&domain, &token)
    }

    /// Create a new client for a Canvas instance.
    ///
    /// The domain may carry a scheme, trailing slash, or `/api/v1` suffix;
    /// it is normalized before use.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting base URL is invalid.
    pub fn new(domain: &str, token: &str) -> Result<Self> {
        let domain = format_domain(domain);
        let base_url = Url::parse(&format!("https://{domain}/api/v1"))?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(CanvasError::Http)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            token: token.to_string(),
            retry: RetryPolicy::None,
        })
    }

    /// Create a client against an explicit base URL, bypassing domain
    /// normalization. Useful for tests and non-standard deployments where
    /// the API does not live at `https://{domain}/api/v1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(CanvasError::Http)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            token: token.to_string(),
            retry: RetryPolicy::None,
        })
    }

    /// Set the retry policy for this client.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Make an authenticated request against an API endpoint and decode
    /// the JSON body.
    ///
    /// Empty `body`/`query` maps are omitted from the wire call entirely,
    /// so a `GET` never carries a `{}` JSON body.
    #[tracing::instrument(skip(self, body, query))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: &Params,
        query: &Params,
    ) -> Result<Value> {
        let response = self
            .send(method, RequestTarget::Endpoint(endpoint), body, query)
            .await?;
        Self::decode(response).await
    }

    /// Like [`CanvasClient::request`], but also returns the response
    /// headers. Needed by the pagination driver to read `Link`.
    #[tracing::instrument(skip(self, body, query))]
    pub async fn request_with_headers(
        &self,
        method: Method,
        target: RequestTarget<'_>,
        body: &Params,
        query: &Params,
    ) -> Result<(Value, HeaderMap)> {
        let response = self.send(method, target, body, query).await?;
        let headers = response.headers().clone();
        let value = Self::decode(response).await?;
        Ok((value, headers))
    }

    /// GET an absolute URL with the bearer token. Used for server-supplied
    /// follow-up URLs (upload confirmation).
    #[tracing::instrument(skip(self))]
    pub async fn get_url(&self, url: &str) -> Result<Value> {
        let response = self
            .send(
                Method::GET,
                RequestTarget::Url(url),
                &Params::new(),
                &Params::new(),
            )
            .await?;
        Self::decode(response).await
    }

    /// Convenience: GET an endpoint with query parameters.
    pub async fn get(&self, endpoint: &str, query: &Params) -> Result<Value> {
        self.request(Method::GET, endpoint, &Params::new(), query).await
    }

    /// Convenience: POST a body to an endpoint.
    pub async fn post(&self, endpoint: &str, body: &Params) -> Result<Value> {
        self.request(Method::POST, endpoint, body, &Params::new()).await
    }

    /// Convenience: PUT a body to an endpoint.
    pub async fn put(&self, endpoint: &str, body: &Params) -> Result<Value> {
        self.request(Method::PUT, endpoint, body, &Params::new()).await
    }

    /// Convenience: DELETE an endpoint, optionally with a body
    /// (Canvas uses body fields like `event` and `task` on deletes).
    pub async fn delete(&self, endpoint: &str, body: &Params) -> Result<Value> {
        self.request(Method::DELETE, endpoint, body, &Params::new()).await
    }

    fn resolve(&self, target: RequestTarget<'_>) -> Result<Url> {
        match target {
            RequestTarget::Endpoint(endpoint) => {
                Ok(Url::parse(&format!("{}{}", self.base_url, endpoint))?)
            }
            RequestTarget::Url(url) => Ok(Url::parse(url)?),
        }
    }

    async fn send(
        &self,
        method: Method,
        target: RequestTarget<'_>,
        body: &Params,
        query: &Params,
    ) -> Result<Response> {
        let url = self.resolve(target)?;
        let pairs = to_query_pairs(query);

        let mut attempt = 0u32;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&self.token);
            if !pairs.is_empty() {
                request = request.query(&pairs);
            }
            if !body.is_empty() {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    if self.retry.allows(attempt, Some(response.status())) {
                        tracing::debug!(
                            status = response.status().as_u16(),
                            attempt,
                            "retrying request"
                        );
                    } else {
                        return Err(Self::normalize_failure(response).await);
                    }
                }
                Err(err) => {
                    if self.retry.allows(attempt, None) {
                        tracing::debug!(error = %err, attempt, "retrying request");
                    } else {
                        return Err(CanvasError::Http(err));
                    }
                }
            }

            attempt += 1;
            tokio::time::sleep(self.retry.backoff()).await;
        }
    }

    /// Turn a non-2xx response into the normalized API error.
    pub(crate) async fn normalize_failure(response: Response) -> CanvasError {
        let status = response.status();
        let message = match response.text().await {
            Ok(body) if body.is_empty() => format!("HTTP {status}"),
            Ok(body) => match serde_json::from_str::<Value>(&body) {
                Ok(json) => api_error_message(&json),
                Err(_) => body,
            },
            Err(_) => format!("HTTP {status}"),
        };

        CanvasError::Api {
            message,
            status_code: Some(status.as_u16()),
        }
    }

    async fn decode(response: Response) -> Result<Value> {
        let body = response.text().await.map_err(CanvasError::Http)?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug_hides_token() {
        let client = CanvasClient::new("school.instructure.com", "secret-token").unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("CanvasClient"));
        assert!(debug.contains("school.instructure.com"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_base_url_normalization() {
        let client1 = CanvasClient::new("school.instructure.com", "t").unwrap();
        let client2 = CanvasClient::new("https://school.instructure.com/api/v1", "t").unwrap();
        assert_eq!(client1.base_url().as_str(), client2.base_url().as_str());
        assert_eq!(
            client1.base_url().as_str(),
            "https://school.instructure.com/api/v1"
        );
    }

    #[test]
    fn test_endpoint_resolution() {
        let client = CanvasClient::new("school.instructure.com", "t").unwrap();
        let url = client
            .resolve(RequestTarget::Endpoint("/courses/42/assignments"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://school.instructure.com/api/v1/courses/42/assignments"
        );
    }

    #[test]
    fn test_retry_policy_default_is_fail_fast() {
        let policy = RetryPolicy::default();
        assert!(!policy.allows(0, Some(StatusCode::TOO_MANY_REQUESTS)));
        assert!(!policy.allows(0, None));
    }

    #[test]
    fn test_retry_policy_limited() {
        let policy = RetryPolicy::Limited {
            attempts: 2,
            backoff: Duration::from_millis(1),
        };
        assert!(policy.allows(0, Some(StatusCode::TOO_MANY_REQUESTS)));
        assert!(policy.allows(1, Some(StatusCode::INTERNAL_SERVER_ERROR)));
        assert!(!policy.allows(2, Some(StatusCode::INTERNAL_SERVER_ERROR)));
        // 4xx client errors are never retried
        assert!(!policy.allows(0, Some(StatusCode::BAD_REQUEST)));
    }
}
