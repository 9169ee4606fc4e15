use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde_json::Value;
use url::Url;

use crate::{config::RetryConfig, JsonRpcRequest, JsonRpcResponse, Result, TokenListError};

#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub rpc_call_timeout: Duration,
}

impl From<&RetryConfig> for RetryOptions {
    fn from(config: &RetryConfig) -> Self {
        Self {
            retry_count: config.retry_count.max(1),
            retry_delay: config.retry_delay,
            rpc_call_timeout: config.rpc_call_timeout,
        }
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// JSON-RPC over HTTP with bounded retries for transport failures.
///
/// Only timeouts, connection errors and non-2xx statuses are retried. A
/// JSON-RPC error object is a definitive answer from the node (a revert stays
/// a revert) and is returned on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryProvider {
    url: Url,
    options: RetryOptions,
    client: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl RetryProvider {
    pub fn new(url: Url, options: RetryOptions) -> Self {
        Self {
            url,
            options,
            client: reqwest::Client::new(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host only; the query string may carry the provider key.
    pub fn endpoint_label(&self) -> &str {
        self.url.host_str().unwrap_or("unknown-host")
    }

    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        let mut last_error = None;

        for attempt in 0..self.options.retry_count {
            match self.attempt_rpc(&request).await {
                Ok(response) => return response.into_result(),
                Err(e) if e.is_retryable() => {
                    tracing::debug!(
                        endpoint = %self.endpoint_label(),
                        method = %method,
                        attempt = attempt + 1,
                        error = %e,
                        "Provider attempt failed"
                    );
                    last_error = Some(e);
                    if attempt + 1 < self.options.retry_count {
                        tokio::time::sleep(self.options.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let last = last_error.map(|e| e.to_string()).unwrap_or_default();
        tracing::warn!(
            endpoint = %self.endpoint_label(),
            method = %method,
            attempts = self.options.retry_count,
            "Failed after all retries"
        );
        Err(TokenListError::AllRetriesFailed {
            attempts: self.options.retry_count,
            last,
        })
    }

    async fn attempt_rpc(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse<Value>> {
        let timeout = self.options.rpc_call_timeout;
        let response = tokio::time::timeout(timeout, self.client.post(self.url.clone()).json(request).send())
            .await
            .map_err(|_| TokenListError::Timeout {
                duration_ms: timeout.as_millis() as u64,
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenListError::Http {
                url: self.endpoint_label().to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
