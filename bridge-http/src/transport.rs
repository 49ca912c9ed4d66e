//! Transport Implementation using Reqwest
//!
//! Speaks the Bard REST API. Read resources map onto
//! `/api/v1/metadata/song/{id}` and `/api/v1/artist_credit/info?id=`; the
//! rating write maps onto `/api/v1/song/set_ratings`. The backend's write
//! endpoints take their arguments as query parameters, so write payloads are
//! flattened into the query string rather than sent as a body.

use async_trait::async_trait;
use bridge_traits::{
    error::{Result, TransportError},
    transport::{ResourceKind, RetryPolicy, Transport},
};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Reqwest-based transport to a Bard backend.
///
/// Provides:
/// - Connection pooling via reqwest
/// - Request timeout
/// - Automatic retry with exponential backoff on 5xx / 429
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl ReqwestTransport {
    /// Create a new transport for the backend at `base_url` with default
    /// configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new transport with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("bard-client/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(base_url, client)
    }

    /// Create a new transport reusing an existing reqwest client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Route a read resource to its backend URL.
    fn fetch_url(&self, resource: ResourceKind, key: &str) -> Result<String> {
        let key = urlencoding::encode(key);
        match resource {
            ResourceKind::SongMetadata => {
                Ok(format!("{}/api/v1/metadata/song/{}", self.base_url, key))
            }
            ResourceKind::ArtistCreditInfo => {
                Ok(format!("{}/api/v1/artist_credit/info?id={}", self.base_url, key))
            }
            ResourceKind::SongRatings => Err(TransportError::Unsupported(
                "song_ratings is write-only".to_string(),
            )),
        }
    }

    /// Route a write resource to its backend URL.
    fn write_url(&self, resource: ResourceKind) -> Result<String> {
        match resource {
            ResourceKind::SongRatings => Ok(format!("{}/api/v1/song/set_ratings", self.base_url)),
            ResourceKind::SongMetadata | ResourceKind::ArtistCreditInfo => Err(
                TransportError::Unsupported(format!("{} is read-only", resource)),
            ),
        }
    }

    /// Flatten a write payload into query parameters.
    ///
    /// The key always travels as `id`; payload fields follow in map order.
    fn write_params(key: &str, payload: &Value) -> Result<Vec<(String, String)>> {
        let mut params = vec![("id".to_string(), key.to_string())];
        match payload {
            Value::Object(fields) => {
                for (name, value) in fields {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    params.push((name.clone(), value));
                }
                Ok(params)
            }
            Value::Null => Ok(params),
            _ => Err(TransportError::Unsupported(
                "write payload must be a JSON object".to_string(),
            )),
        }
    }

    /// Issue one GET with retry, returning the decoded JSON body.
    ///
    /// The Bard backend answers some requests with `200` and an empty body:
    /// for lookups that means "no such id" (`allow_empty = false`, a decode
    /// error so callers never cache a useless sentinel); for writes it is
    /// the normal success reply (`allow_empty = true`, reported as `Null`).
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        allow_empty: bool,
    ) -> Result<Value> {
        let policy = &self.retry_policy;
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts {
            debug!(attempt, max_attempts = policy.max_attempts, url, "Executing request");

            let request = self.client.get(url).query(params);

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status >= 500 || status == 429 {
                        warn!(status, attempt, "Request failed with retryable status");
                        last_error = Some(TransportError::Http {
                            status,
                            body: "retryable server error".to_string(),
                        });
                    } else {
                        let body = response
                            .text()
                            .await
                            .map_err(|e| TransportError::Network(e.to_string()))?;

                        if !(200..300).contains(&status) {
                            return Err(TransportError::Http { status, body });
                        }
                        if body.is_empty() {
                            if allow_empty {
                                return Ok(Value::Null);
                            }
                            return Err(TransportError::Decode(
                                "empty response body".to_string(),
                            ));
                        }
                        return serde_json::from_str(&body)
                            .map_err(|e| TransportError::Decode(e.to_string()));
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Request failed");
                    last_error = Some(if e.is_timeout() {
                        TransportError::Timeout(e.to_string())
                    } else if e.is_connect() {
                        TransportError::Network(format!("Connection failed: {}", e))
                    } else {
                        TransportError::Network(e.to_string())
                    });
                }
            }

            if attempt < policy.max_attempts {
                let delay = if policy.use_exponential_backoff {
                    (policy.base_delay * 2u32.pow(attempt - 1)).min(policy.max_delay)
                } else {
                    policy.base_delay
                };
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TransportError::Network("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, resource: ResourceKind, key: &str) -> Result<Value> {
        let url = self.fetch_url(resource, key)?;
        self.get_json(&url, &[], false).await
    }

    async fn write(&self, resource: ResourceKind, key: &str, payload: Value) -> Result<Value> {
        let url = self.write_url(resource)?;
        let params = Self::write_params(key, &payload)?;
        self.get_json(&url, &params, true).await
    }
}
