//! Translation of incoming tool calls into backend requests.

use crate::model::ModelId;
use crate::types::{GenerationRequest, StatusRequest};
use serde_json::{Map, Value};

/// A validation failure. Always returned as a value and surfaced to the
/// host as a structured error envelope, never raised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    /// Tool name not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Model identifier not in the registry.
    #[error(
        "Invalid model: {name}. Supported models are: {supported}",
        name = .0,
        supported = ModelId::supported()
    )]
    InvalidModel(String),

    /// Arguments failed schema validation.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// A tool call translated into a backend-ready form.
#[derive(Debug, Clone)]
pub enum TranslatedCall {
    /// Submit a generation job and wait for its terminal state.
    Generate {
        /// Resolved target model.
        model: ModelId,
        /// Backend payload, with the `model` selector stripped.
        payload: Value,
    },
    /// Poll the status of a previously submitted job.
    CheckStatus {
        /// Resolved target model.
        model: ModelId,
        /// Backend request id to poll.
        request_id: String,
    },
}

/// Validates and translates one tool invocation.
///
/// Pure: no side effects, errors are values. Guarantees that the `model`
/// selector field never appears in the returned backend payload, and that
/// every call resolves to exactly one [`ModelId`] before any backend
/// contact.
pub fn translate(tool_name: &str, args: Value) -> Result<TranslatedCall, ToolError> {
    if tool_name != "generate-video" && tool_name != "check-video-status" {
        return Err(ToolError::UnknownTool(tool_name.to_string()));
    }

    let mut args = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ToolError::InvalidParams(format!(
                "expected an object of arguments, got {}",
                other
            )));
        }
    };

    // Strip the selector before payload construction; backend APIs reject
    // unrecognized fields.
    let model = match args.remove("model") {
        None => ModelId::default(),
        Some(Value::String(name)) => {
            ModelId::resolve(&name).ok_or(ToolError::InvalidModel(name))?
        }
        Some(other) => return Err(ToolError::InvalidModel(other.to_string())),
    };

    match tool_name {
        "generate-video" => {
            let request: GenerationRequest = serde_json::from_value(Value::Object(args))
                .map_err(|e| ToolError::InvalidParams(e.to_string()))?;
            let payload = serde_json::to_value(&request)
                .map_err(|e| ToolError::InvalidParams(e.to_string()))?;
            Ok(TranslatedCall::Generate { model, payload })
        }
        "check-video-status" => {
            let request: StatusRequest = serde_json::from_value(Value::Object(args))
                .map_err(|e| ToolError::InvalidParams(e.to_string()))?;
            Ok(TranslatedCall::CheckStatus {
                model,
                request_id: request.request_id,
            })
        }
        _ => unreachable!("tool name checked above"),
    }
}
