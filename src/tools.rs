//! Tool catalog advertised to the MCP host.

use serde::Serialize;
use serde_json::{json, Value};

/// MCP tool definition.
#[derive(Debug, Serialize)]
pub struct Tool {
    /// Tool name the host dispatches on.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON Schema for the tool's arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Returns the full tool catalog.
///
/// This is the schema the host uses for validation hints; the request
/// translator re-validates every call independently.
pub fn tool_catalog() -> Vec<Tool> {
    vec![
        Tool {
            name: "generate-video",
            description: "Generate a video from text prompt and/or images using AI models (Luma or Kling)",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Text description of the desired video content"
                    },
                    "image_url": {
                        "type": "string",
                        "description": "Initial image to start the video from (URL or base64 data URI)"
                    },
                    "end_image_url": {
                        "type": "string",
                        "description": "Final image to end the video with (URL or base64 data URI)"
                    },
                    "aspect_ratio": {
                        "type": "string",
                        "enum": ["16:9", "9:16", "4:3", "3:4", "21:9", "9:21"],
                        "default": "16:9",
                        "description": "Aspect ratio of the video"
                    },
                    "resolution": {
                        "type": "string",
                        "enum": ["540p", "720p", "1080p"],
                        "default": "540p",
                        "description": "Resolution of the video (higher resolutions use more credits)"
                    },
                    "duration": {
                        "type": "string",
                        "enum": ["5s", "9s"],
                        "default": "5s",
                        "description": "Duration of the video (9s costs 2x more)"
                    },
                    "loop": {
                        "type": "boolean",
                        "default": false,
                        "description": "Whether the video should loop (blend end with beginning)"
                    },
                    "model": {
                        "type": "string",
                        "enum": ["luma", "kling"],
                        "default": "luma",
                        "description": "AI model to use (luma=Ray2, kling=Kling)"
                    }
                },
                "required": ["prompt"]
            }),
        },
        Tool {
            name: "check-video-status",
            description: "Check the status of a video generation request",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "request_id": {
                        "type": "string",
                        "description": "The request ID to check"
                    },
                    "model": {
                        "type": "string",
                        "enum": ["luma", "kling"],
                        "default": "luma",
                        "description": "AI model used for the request (luma=Ray2, kling=Kling)"
                    }
                },
                "required": ["request_id"]
            }),
        },
    ]
}
