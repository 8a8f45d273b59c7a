//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] POSTs a JSON payload to a URL. Transport failures and
//! 5xx responses are retried up to three times with exponential backoff
//! (1 s, 2 s, 4 s). A 4xx response is final: the receiver understood the
//! request and rejected it, so repeating it cannot help.

use std::time::Duration;

use reqwest::header::HeaderMap;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

impl WebhookError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::HttpStatus(status) => *status >= 500,
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// POSTs JSON payloads to external endpoints.
pub struct WebhookDelivery {
    client: reqwest::Client,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    /// Create a new delivery service with a pre-configured HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            retry_delays: RETRY_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),
        }
    }

    /// Replace the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Deliver `payload` to `url` with the given extra headers, retrying
    /// transient failures.
    ///
    /// Returns `Ok(())` on the first successful attempt.
    pub async fn deliver(
        &self,
        url: &str,
        headers: &HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<(), WebhookError> {
        let mut last_err: Option<WebhookError> = None;

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(url, headers, payload).await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(url, error = %e, "Webhook rejected, not retrying");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(url, headers, payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(url, error = %e, "Webhook delivery failed after all retries");
                Err(if e.is_retryable() { last_err.unwrap_or(e) } else { e })
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(
        &self,
        url: &str,
        headers: &HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for WebhookDelivery {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
