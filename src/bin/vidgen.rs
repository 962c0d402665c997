//! CLI entry point for the vidgen MCP server.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidgen::tools::tool_catalog;
use vidgen::{FalClient, McpServer, ModelId};

#[derive(Parser)]
#[command(name = "vidgen")]
#[command(about = "MCP server for AI video generation via fal.ai (Luma Ray2, Kling)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,

    /// Print the tool catalog as JSON
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // stdout carries the protocol; all diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "vidgen=info".to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await?,
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&tool_catalog())?);
        }
    }

    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let client = FalClient::builder().build();

    // A missing key does not prevent startup; calls fail with an auth
    // fault when actually attempted.
    if !client.has_api_key() {
        tracing::warn!("FAL_KEY environment variable is not set. API calls will fail.");
    }

    tracing::info!("video generator MCP server running on stdio");
    tracing::info!("supported models: {}", ModelId::supported());

    McpServer::new(client).run().await?;
    Ok(())
}
