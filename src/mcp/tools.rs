//! MCP tool implementation
//!
//! The single chat tool: descriptor derivation from configuration and the
//! call handler that forwards one question to the remote assistant.

use crate::chat::ChatClient;
use crate::config::Config;
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::server::ToolHandler;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Handler for the `ask-<assistant>` chat tool
pub struct AskHandler {
    client: ChatClient,
}

impl AskHandler {
    /// Create a new ask handler
    #[inline]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Create the tool definition, derived once from configuration
    #[inline]
    pub fn tool_definition(config: &Config) -> Tool {
        Tool {
            name: config.tool_name(),
            description: Some(format!("Ask {} a question", config.assistant_name)),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": format!("The question to ask {}", config.assistant_name),
                    }
                },
                "required": ["content"]
            }),
        }
    }

    fn forward(&self, params: &CallToolParams) -> Result<String> {
        let content = params
            .arguments
            .as_ref()
            .and_then(|args| args.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Content is required"))?;

        self.client.complete(content)
    }
}

#[async_trait]
impl ToolHandler for AskHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        debug!("Handling call for tool: {}", params.name);

        // Sole catch-and-convert boundary: every failure becomes a
        // structured envelope and never reaches the transport as an error.
        let result = match self.forward(&params) {
            Ok(text) => CallToolResult::text(text),
            Err(e) => CallToolResult::error_text(format!("Error: {:#}", e)),
        };

        Ok(result)
    }
}
