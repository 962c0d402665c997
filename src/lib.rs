#![warn(missing_docs)]
//! vidgen - MCP server for AI video generation via fal.ai.
//!
//! Exposes two backend models (Luma Ray2 Flash and Kling v1.6 Pro, both
//! hosted on fal.ai's queue API) to a tool-calling host over the Model
//! Context Protocol. Incoming tool calls are validated, translated into
//! backend payloads, submitted as asynchronous generation jobs, and the
//! heterogeneous backend responses are normalized into uniform envelopes.
//!
//! # Quick Start
//!
//! ```no_run
//! use vidgen::{FalClient, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let client = FalClient::builder().build();
//!     McpServer::new(client).run().await
//! }
//! ```
//!
//! # Tools
//!
//! - `generate-video`: submit a generation job and wait for its terminal
//!   state, emitting backend progress to the diagnostic channel.
//! - `check-video-status`: single round-trip poll of a job by request id.

mod error;
pub mod fal;
pub mod mcp;
pub mod model;
pub mod normalize;
pub mod tools;
pub mod translate;
pub mod types;

pub use error::{Result, VidGenError};
pub use fal::{FalClient, FalClientBuilder, ProgressSink, Submitted};
pub use mcp::McpServer;
pub use model::ModelId;
pub use translate::{translate, ToolError, TranslatedCall};
pub use types::{
    AspectRatio, ClipDuration, GenerationRequest, Resolution, ResultEnvelope, StatusEnvelope,
    StatusRequest,
};
