//! fal.ai queue client: job submission, progress observation, status polls.

use crate::error::{sanitize_error_message, Result, VidGenError};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Default base URL of the fal.ai queue API.
const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";

/// Sink for progress notifications observed while a job runs.
///
/// The adapter writes each backend log line to the sink as soon as it is
/// received, in arrival order, without filtering or deduplication. The
/// sink is a side channel: whatever it does never influences the call's
/// return value.
pub trait ProgressSink: Send + Sync {
    /// Receives one progress line.
    fn emit(&self, line: &str);
}

impl<F: Fn(&str) + Send + Sync> ProgressSink for F {
    fn emit(&self, line: &str) {
        self(line)
    }
}

/// Terminal outcome of a submitted generation job.
#[derive(Debug, Clone)]
pub struct Submitted {
    /// Request id assigned by the queue at submission time.
    pub request_id: String,
    /// Raw result document fetched after completion.
    pub result: Value,
}

/// Builder for [`FalClient`].
#[derive(Debug, Clone)]
pub struct FalClientBuilder {
    api_key: Option<String>,
    queue_url: String,
    poll_interval: Duration,
}

impl Default for FalClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            queue_url: DEFAULT_QUEUE_URL.to_string(),
            poll_interval: Duration::from_secs(3),
        }
    }
}

impl FalClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key explicitly. Falls back to the `FAL_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the queue base URL.
    pub fn queue_url(mut self, url: impl Into<String>) -> Self {
        self.queue_url = url.into();
        self
    }

    /// Sets the polling interval for in-flight jobs.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builds the client.
    ///
    /// A missing API key is not an error here: calls are attempted without
    /// credentials and fail with an authentication fault from the backend.
    pub fn build(self) -> FalClient {
        let api_key = self.api_key.or_else(|| std::env::var("FAL_KEY").ok());
        FalClient {
            http: reqwest::Client::new(),
            api_key,
            queue_url: self.queue_url,
            poll_interval: self.poll_interval,
        }
    }
}

/// Client for the fal.ai queue API.
///
/// Holds no per-request state; concurrent calls proceed independently and
/// are never serialized against each other.
#[derive(Debug, Clone)]
pub struct FalClient {
    http: reqwest::Client,
    api_key: Option<String>,
    queue_url: String,
    poll_interval: Duration,
}

impl FalClient {
    /// Creates a new [`FalClientBuilder`].
    pub fn builder() -> FalClientBuilder {
        FalClientBuilder::new()
    }

    /// Whether an API key was resolved at construction time.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Key {}", key)),
            None => builder,
        }
    }

    fn parse_error(&self, status: u16, text: &str) -> VidGenError {
        let text = sanitize_error_message(text);

        // fal.ai error bodies carry a `detail` field.
        if let Ok(error_resp) = serde_json::from_str::<FalErrorResponse>(&text) {
            let detail = error_resp.detail;
            let lower = detail.to_lowercase();
            if lower.contains("unauthorized") || lower.contains("invalid key") {
                return VidGenError::Auth(detail);
            }
            if lower.contains("rate") && lower.contains("limit") {
                return VidGenError::RateLimited;
            }
            return VidGenError::Api {
                status,
                message: detail,
            };
        }

        if status == 401 || status == 403 {
            return VidGenError::Auth(text);
        }
        if status == 429 {
            return VidGenError::RateLimited;
        }

        VidGenError::Api {
            status,
            message: text,
        }
    }

    /// Submits a job to the queue endpoint.
    async fn submit(&self, endpoint: &str, payload: &Value) -> Result<FalSubmitResponse> {
        let url = format!("{}/{}", self.queue_url, endpoint);

        let response = self
            .authed(self.http.post(&url))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        Ok(response.json().await?)
    }

    /// Polls the queue until the job reaches a terminal state.
    ///
    /// Log lines arriving while the job is in progress are emitted through
    /// `progress` immediately. No timeout is enforced here: a hung backend
    /// hangs the invocation until the host gives up on it.
    async fn poll_until_ready(
        &self,
        request_id: &str,
        status_url: &str,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        loop {
            let response = self
                .authed(self.http.get(status_url))
                .query(&[("logs", "1")])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(self.parse_error(status.as_u16(), &text));
            }

            let body: Value = response.json().await?;
            let job_status = body.get("status").and_then(Value::as_str).unwrap_or("");

            match job_status {
                "COMPLETED" => return Ok(()),
                "IN_PROGRESS" => {
                    emit_logs(&body, progress);
                    tokio::time::sleep(self.poll_interval).await;
                }
                "IN_QUEUE" => {
                    tracing::debug!(request_id = %request_id, "generation queued");
                    tokio::time::sleep(self.poll_interval).await;
                }
                "FAILED" => {
                    return Err(VidGenError::Generation(
                        "fal.ai reported the generation job as failed".into(),
                    ));
                }
                other => {
                    return Err(VidGenError::UnexpectedResponse(format!(
                        "fal.ai returned unexpected status: {}",
                        other
                    )));
                }
            }
        }
    }

    /// Fetches the completed result document.
    ///
    /// Tries the queue-provided `response_url` first. That URL can return
    /// a 404 for models with nested endpoint paths, in which case the
    /// result is fetched from a URL built from the endpoint itself.
    async fn fetch_result(
        &self,
        response_url: &str,
        endpoint: &str,
        request_id: &str,
    ) -> Result<Value> {
        let response = self.authed(self.http.get(response_url)).send().await?;

        let status = response.status();
        if status.as_u16() == 404 || status.as_u16() == 405 {
            tracing::debug!(
                response_url = %response_url,
                "response_url returned {}, falling back to endpoint-based URL",
                status.as_u16()
            );
            let fallback_url = format!(
                "{}/{}/requests/{}",
                self.queue_url, endpoint, request_id
            );
            let fallback = self.authed(self.http.get(&fallback_url)).send().await?;

            let fb_status = fallback.status();
            if !fb_status.is_success() {
                let text = fallback.text().await.unwrap_or_default();
                return Err(self.parse_error(fb_status.as_u16(), &text));
            }

            return Ok(fallback.json().await?);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        Ok(response.json().await?)
    }

    /// Submits a generation job and blocks until it reaches a terminal
    /// state, emitting progress through `progress` as it arrives.
    ///
    /// One attempt only: the call either completes (possibly after backend
    /// queueing) or fails with a terminal fault. There is no way to abort
    /// the remote job from this layer once submitted.
    pub async fn subscribe(
        &self,
        endpoint: &str,
        payload: &Value,
        progress: &dyn ProgressSink,
    ) -> Result<Submitted> {
        let submit = self.submit(endpoint, payload).await?;
        tracing::debug!(request_id = %submit.request_id, endpoint = %endpoint, "submitted generation job");

        self.poll_until_ready(&submit.request_id, &submit.status_url, progress)
            .await?;

        let result = self
            .fetch_result(&submit.response_url, endpoint, &submit.request_id)
            .await?;
        tracing::debug!(request_id = %submit.request_id, "generation job complete");

        Ok(Submitted {
            request_id: submit.request_id,
            result,
        })
    }

    /// Fetches the current status of a job in a single round-trip.
    ///
    /// Returns the raw status document; the normalizer deals with its
    /// shape. An unknown request id surfaces as a backend error, never as
    /// an empty success.
    pub async fn status(&self, endpoint: &str, request_id: &str) -> Result<Value> {
        let url = format!(
            "{}/{}/requests/{}/status",
            self.queue_url, endpoint, request_id
        );

        let response = self
            .authed(self.http.get(&url))
            .query(&[("logs", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        Ok(response.json().await?)
    }
}

/// Emits every log entry present in a status document, in order.
///
/// Entries are free-form strings or objects carrying a string `message`;
/// an object without a message is silently ignored.
fn emit_logs(body: &Value, progress: &dyn ProgressSink) {
    let Some(entries) = body.get("logs").and_then(Value::as_array) else {
        return;
    };
    for entry in entries {
        match entry {
            Value::String(line) => progress.emit(line),
            Value::Object(obj) => {
                if let Some(message) = obj.get("message").and_then(Value::as_str) {
                    progress.emit(message);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Deserialize)]
struct FalSubmitResponse {
    request_id: String,
    /// URL to poll for status (provided by fal.ai).
    status_url: String,
    /// URL to fetch the completed result (provided by fal.ai).
    response_url: String,
}

#[derive(Debug, Deserialize)]
struct FalErrorResponse {
    detail: String,
}
