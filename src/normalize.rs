//! Normalization of heterogeneous backend responses into uniform envelopes.
//!
//! Both functions here are total and defensive: whatever shape the backend
//! returns, they produce an envelope and never fault upward.

use crate::model::ModelId;
use crate::types::{ResultEnvelope, StatusEnvelope};
use serde_json::Value;

/// Placeholder reported when no video URL can be found in the response.
const VIDEO_URL_MISSING: &str = "Video URL not found in response";

/// Builds a [`ResultEnvelope`] from a raw generation result.
///
/// The video URL is looked up at `video.url` first, then `data.video.url`.
/// The request id comes from the response's `requestId` field, falling
/// back to the id observed at submission time, else `"Unknown"`.
pub fn normalize_generation(
    model: ModelId,
    raw: &Value,
    submitted_id: Option<&str>,
) -> ResultEnvelope {
    let video_url = raw
        .pointer("/video/url")
        .or_else(|| raw.pointer("/data/video/url"))
        .and_then(Value::as_str)
        .unwrap_or(VIDEO_URL_MISSING)
        .to_string();

    let request_id = raw
        .get("requestId")
        .and_then(Value::as_str)
        .or(submitted_id)
        .unwrap_or("Unknown")
        .to_string();

    ResultEnvelope {
        model,
        video_url,
        message: format!("Video generated successfully using {} model", model),
        request_id,
    }
}

/// Builds a [`StatusEnvelope`] from a raw status document.
///
/// Logs default to empty unless the field is an array; the queue position
/// falls back from `position` to `queue_position` whenever the former is
/// missing, malformed, or zero, else 0.
pub fn normalize_status(model: ModelId, raw: &Value) -> StatusEnvelope {
    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let logs = match raw.get("logs").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(line) => Some(line.clone()),
                Value::Object(obj) => obj
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    };

    // Fallback is value-based: a null, non-numeric, or zero `position`
    // falls through to `queue_position`.
    let position = raw
        .get("position")
        .and_then(Value::as_u64)
        .filter(|p| *p != 0)
        .or_else(|| raw.get("queue_position").and_then(Value::as_u64))
        .unwrap_or(0);

    StatusEnvelope {
        model,
        status,
        logs,
        position,
    }
}
