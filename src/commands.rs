use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::chat::ChatClient;
use crate::config::Config;
use crate::mcp::server::McpServer;
use crate::mcp::tools::AskHandler;

/// Build the server from configuration and serve the stdio transport
/// until EOF or an interrupt.
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    let client = ChatClient::new(&config);

    let mut server = McpServer::new(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    server.register_tool(AskHandler::tool_definition(&config), AskHandler::new(client));

    info!(
        "MCP server initialized with tool: {} (model: {})",
        config.tool_name(),
        config.model
    );

    let server = Arc::new(server);
    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            result.context("MCP server terminated with an error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt signal, shutting down");
        }
    }

    Ok(())
}
