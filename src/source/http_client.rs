use crate::config::SourceConfig;
use crate::error::FetchError;
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::RetryIf;
use tracing::{debug, warn};
use url::Url;

/// JSON-over-HTTP client with per-request timeout and jittered exponential retry.
pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: u32,
    retry_base_ms: u64,
}

impl HttpClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            inner,
            max_retries: config.max_retries,
            retry_base_ms: config.retry_base_ms,
        })
    }

    pub async fn get_json<T>(&self, url: &Url, headers: &HeaderMap) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        self.send_json(|| self.inner.get(url.clone()).headers(headers.clone()))
            .await
    }

    pub async fn post_json<B, T>(&self, url: &Url, headers: &HeaderMap, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(|| self.inner.post(url.clone()).headers(headers.clone()).json(body))
            .await
    }

    /// base, 2×base, 4×base … with random jitter; one entry per retry.
    fn backoff(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.retry_base_ms;
        (0..self.max_retries)
            .map(move |n| Duration::from_millis(base.saturating_mul(1u64 << n.min(16))))
            .map(jitter)
    }

    async fn send_json<T, F>(&self, build: F) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;

        RetryIf::spawn(
            self.backoff(),
            || {
                attempt += 1;
                let request = build();
                let n = attempt;
                async move {
                    let response = request.send().await?;
                    let status = response.status();
                    let url = response.url().to_string();
                    debug!("{} → {} (attempt {})", url, status, n);

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(FetchError::RateLimited);
                    }
                    if !status.is_success() {
                        return Err(FetchError::Status {
                            status: status.as_u16(),
                            url,
                        });
                    }

                    let body = response.bytes().await?;
                    serde_json::from_slice(&body)
                        .map_err(|e| FetchError::Decode(format!("{url}: {e}")))
                }
            },
            |e: &FetchError| {
                let retry = e.is_retryable();
                if retry {
                    warn!("Request failed, retrying: {}", e);
                }
                retry
            },
        )
        .await
    }
}
