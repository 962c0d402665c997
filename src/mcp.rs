//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes video generation and status checking as tools over JSON-RPC 2.0
//! on stdio. Every tool failure is returned as a structured error result;
//! nothing escapes to the transport as an unhandled fault.

use crate::fal::FalClient;
use crate::model::ModelId;
use crate::normalize::{normalize_generation, normalize_status};
use crate::tools::tool_catalog;
use crate::translate::{translate, TranslatedCall};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcError {
    pub(crate) code: i32,
    pub(crate) message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Wraps a serializable envelope as a text content block, 2-space indented.
fn tool_json<T: Serialize>(envelope: &T) -> Value {
    let text = serde_json::to_string_pretty(envelope).unwrap_or_default();
    json!({ "content": [{ "type": "text", "text": text }] })
}

/// Wraps a failure message as an error-flagged tool result.
fn tool_error(message: impl Into<String>) -> Value {
    json!({
        "content": [{ "type": "text", "text": message.into() }],
        "isError": true
    })
}

/// MCP server for video generation.
pub struct McpServer {
    client: Arc<FalClient>,
    initialized: AtomicBool,
}

impl McpServer {
    /// Creates a server backed by the given queue client.
    pub fn new(client: FalClient) -> Self {
        Self {
            client: Arc::new(client),
            initialized: AtomicBool::new(false),
        }
    }

    /// Runs the server: reads requests from stdin, writes responses to
    /// stdout.
    ///
    /// Each request is handled on its own task, so a generation blocking
    /// on the backend never stalls other invocations. Responses are
    /// funneled through a channel so exactly one line is written per call,
    /// whatever order calls complete in.
    pub async fn run(self) -> io::Result<()> {
        let server = Arc::new(self);
        let (tx, mut rx) = mpsc::channel::<String>(32);

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Ok::<(), io::Error>(())
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let server = Arc::clone(&server);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(resp) = server.handle_message(&line).await {
                    let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
                        json!({
                            "jsonrpc": "2.0",
                            "id": null,
                            "error": { "code": -32603, "message": e.to_string() }
                        })
                        .to_string()
                    });
                    let _ = tx.send(json).await;
                }
            });
        }

        drop(tx);
        writer
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    pub(crate) async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    -32700,
                    format!("Parse error: {}", e),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                -32600,
                "Invalid JSON-RPC version",
            ));
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(id, &request.params)),
            "initialized" => {
                // Notification, no response
                None
            }
            "tools/list" => Some(self.handle_tools_list(id)),
            "tools/call" => Some(self.handle_tools_call(id, &request.params).await),
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            _ => Some(JsonRpcResponse::error(
                id,
                -32601,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    fn handle_initialize(&self, id: Value, params: &Value) -> JsonRpcResponse {
        self.initialized.store(true, Ordering::Relaxed);

        if let Some(client_info) = params.get("clientInfo") {
            let name = client_info
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let version = client_info
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            tracing::info!("client: {} v{}", name, version);
        }

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "vidgen",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": tool_catalog() }))
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        // Validation failures are error envelopes, not protocol faults.
        let call = match translate(tool_name, arguments) {
            Ok(call) => call,
            Err(e) => return JsonRpcResponse::success(id, tool_error(e.to_string())),
        };

        match call {
            TranslatedCall::Generate { model, payload } => {
                self.generate_video(id, model, payload).await
            }
            TranslatedCall::CheckStatus { model, request_id } => {
                self.check_video_status(id, model, request_id).await
            }
        }
    }

    async fn generate_video(&self, id: Value, model: ModelId, payload: Value) -> JsonRpcResponse {
        tracing::info!(model = %model, "generating video");

        // Progress is a diagnostic side channel; losing it never affects
        // the final envelope.
        let progress = |line: &str| tracing::info!("Progress: {}", line);

        match self
            .client
            .subscribe(model.endpoint(), &payload, &progress)
            .await
        {
            Ok(submitted) => {
                let envelope =
                    normalize_generation(model, &submitted.result, Some(&submitted.request_id));
                tracing::info!(
                    model = %model,
                    request_id = %envelope.request_id,
                    "video generation completed"
                );
                JsonRpcResponse::success(id, tool_json(&envelope))
            }
            Err(e) => {
                tracing::error!(model = %model, "video generation failed: {e}");
                JsonRpcResponse::success(id, tool_error(format!("Error generating video: {}", e)))
            }
        }
    }

    async fn check_video_status(
        &self,
        id: Value,
        model: ModelId,
        request_id: String,
    ) -> JsonRpcResponse {
        match self.client.status(model.endpoint(), &request_id).await {
            Ok(raw) => JsonRpcResponse::success(id, tool_json(&normalize_status(model, &raw))),
            Err(e) => JsonRpcResponse::success(
                id,
                tool_error(format!("Error checking video status: {}", e)),
            ),
        }
    }
}
