//! Core request and envelope types.

use crate::model::ModelId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Video aspect ratio accepted by the backend models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape (default).
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 21:9 ultrawide.
    #[serde(rename = "21:9")]
    Ultrawide,
    /// 9:21 ultratall.
    #[serde(rename = "9:21")]
    Ultratall,
}

/// Output resolution. Higher resolutions cost more credits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 540p (default).
    #[default]
    #[serde(rename = "540p")]
    P540,
    /// 720p.
    #[serde(rename = "720p")]
    P720,
    /// 1080p.
    #[serde(rename = "1080p")]
    P1080,
}

/// Clip duration. The 9 second option costs twice as much.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipDuration {
    /// 5 seconds (default).
    #[default]
    #[serde(rename = "5s")]
    S5,
    /// 9 seconds.
    #[serde(rename = "9s")]
    S9,
}

/// A validated video generation request, in the exact shape the backend
/// accepts.
///
/// The `model` selector is never part of this type; the translator strips
/// it before deserialization so it cannot leak into the backend payload.
/// Fields the caller omitted take their declared defaults here, and
/// fields outside the documented schema are carried through verbatim in
/// `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text description of the desired video content. Required.
    pub prompt: String,
    /// Initial image to start the video from (URL or base64 data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Final image to end the video with (URL or base64 data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_image_url: Option<String>,
    /// Aspect ratio of the video.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Resolution of the video.
    #[serde(default)]
    pub resolution: Resolution,
    /// Duration of the video.
    #[serde(default)]
    pub duration: ClipDuration,
    /// Whether the video should loop (blend end with beginning).
    #[serde(rename = "loop", default)]
    pub loop_video: bool,
    /// Undocumented caller fields, forwarded to the backend untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated status check request.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    /// The request id returned at submission time.
    pub request_id: String,
}

/// Uniform result of a completed generation call.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    /// Model that handled the request.
    pub model: ModelId,
    /// URL of the generated video, or a placeholder if the backend
    /// response carried none.
    pub video_url: String,
    /// Human-readable summary.
    pub message: String,
    /// Backend request id, or `"Unknown"`.
    pub request_id: String,
}

/// Uniform result of a status check.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEnvelope {
    /// Model the request was submitted to.
    pub model: ModelId,
    /// Backend-reported status, passed through unchanged.
    pub status: String,
    /// Log lines accumulated server-side, in order.
    pub logs: Vec<String>,
    /// Current queue position, 0 if unknown.
    pub position: u64,
}
