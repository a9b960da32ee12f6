//! MCP server implementation
//!
//! Core server framework: tool registration, message routing, and the
//! newline-delimited JSON-RPC loop over stdio. The server is immutable
//! once registration is done, so handlers share it without locking.

use crate::mcp::errors::{ErrorHandler, McpError};
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ListPromptsResult, ListResourcesResult, ListToolsResult, MCP_VERSION,
    PromptsCapability, RequestId, ResourcesCapability, SUPPORTED_PROTOCOL_VERSIONS,
    ServerCapabilities, Tool, ToolsCapability,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

/// MCP server state and configuration
pub struct McpServer {
    /// Server implementation information
    pub server_info: Implementation,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Registered tool descriptors, in registration order
    tools: Vec<Tool>,
    /// Tool handlers keyed by tool name
    tool_handlers: HashMap<String, Box<dyn ToolHandler>>,
}

/// Tool handler trait for implementing tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// Message handler for processing incoming messages
pub struct MessageHandler {
    server: Arc<McpServer>,
}

impl McpServer {
    /// Create a new MCP server
    #[inline]
    pub fn new(name: String, version: String) -> Self {
        let server_info = Implementation { name, version };

        let capabilities = ServerCapabilities {
            experimental: None,
            prompts: Some(PromptsCapability {
                list_changed: Some(false),
            }),
            resources: Some(ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        };

        Self {
            server_info,
            capabilities,
            tools: Vec::new(),
            tool_handlers: HashMap::new(),
        }
    }

    /// Register a tool with the server. Registration happens once at
    /// startup, before serving begins.
    #[inline]
    pub fn register_tool<H>(&mut self, tool: Tool, handler: H)
    where
        H: ToolHandler + 'static,
    {
        debug!("Registered tool: {}", tool.name);
        self.tool_handlers.insert(tool.name.clone(), Box::new(handler));
        self.tools.push(tool);
    }

    /// Start the server using stdio transport
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting MCP server with stdio transport");

        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(BufReader::new(stdin), stdout).await
    }

    /// Read and process messages until EOF
    #[inline]
    pub async fn serve<R, W>(self: Arc<Self>, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWriteExt + Unpin + Send,
    {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    // First parse as raw JSON
                    let raw_value: Value = match serde_json::from_str(line) {
                        Ok(value) => value,
                        Err(e) => {
                            error!("Failed to parse JSON: {}", e);
                            let error_response =
                                JsonRpcErrorResponse::new(JsonRpcError::parse_error(), None);
                            self.send_message(
                                &mut writer,
                                &JsonRpcMessage::ErrorResponse(error_response),
                            )
                            .await?;
                            continue;
                        }
                    };

                    // Then as a JSON-RPC message
                    let message: JsonRpcMessage = match serde_json::from_value(raw_value) {
                        Ok(message) => message,
                        Err(e) => {
                            error!("Message validation failed: {}", e);
                            let error_response =
                                JsonRpcErrorResponse::new(JsonRpcError::invalid_request(), None);
                            self.send_message(
                                &mut writer,
                                &JsonRpcMessage::ErrorResponse(error_response),
                            )
                            .await?;
                            continue;
                        }
                    };

                    let handler = MessageHandler::new(Arc::clone(&self));
                    if let Err(e) = handler.process_message(message, &mut writer).await {
                        error!("Error processing message: {}", e);
                    }
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Send a message to the client
    async fn send_message<W>(&self, writer: &mut W, message: &JsonRpcMessage) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        let json = serde_json::to_string(message)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

impl MessageHandler {
    /// Create a new message handler
    #[inline]
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Process an incoming message
    #[inline]
    pub async fn process_message<W>(&self, message: JsonRpcMessage, writer: &mut W) -> Result<()>
    where
        W: AsyncWriteExt + Unpin + Send,
    {
        match message {
            JsonRpcMessage::Request(request) => self.handle_request(request, writer).await,
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(&notification);
                Ok(())
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::ErrorResponse(_) => {
                warn!("Received unexpected response message from client");
                Ok(())
            }
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request<W>(&self, request: JsonRpcRequest, writer: &mut W) -> Result<()>
    where
        W: AsyncWriteExt + Unpin + Send,
    {
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            "resources/list" => Self::handle_list_resources(),
            "resources/read" => Self::handle_read_resource(),
            "prompts/list" => Self::handle_list_prompts(),
            "prompts/get" => Self::handle_get_prompt(),
            "ping" => Self::handle_ping(),
            _ => {
                warn!("Unknown request method: {}", request.method);
                let error = JsonRpcError::method_not_found();
                return self
                    .send_error_response(writer, error, Some(request.id))
                    .await;
            }
        };

        match response {
            Ok(result) => {
                let response = JsonRpcResponse::new(result, request.id);
                self.send_response(writer, JsonRpcMessage::Response(response))
                    .await
            }
            Err(e) => {
                let message = ErrorHandler::handle_error(&e, Some(request.id));
                self.send_response(writer, message).await
            }
        }
    }

    /// Handle a JSON-RPC notification
    fn handle_notification(&self, notification: &JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                info!("Server ready to handle requests");
            }
            "notifications/cancelled" => {
                debug!("Received cancellation notification");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => return Err(anyhow!("Initialize request missing parameters")),
        };

        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&params.protocol_version.as_str()) {
            return Err(McpError::UnsupportedProtocolVersion {
                version: params.protocol_version,
            }
            .into());
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: self.server.capabilities.clone(),
            server_info: self.server.server_info.clone(),
            instructions: Some("Chat completion relay MCP server".to_string()),
        };

        info!("Client initialized: {}", params.client_info.name);
        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.server.tools.clone(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request
    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)?,
            None => return Err(anyhow!("Tool call request missing parameters")),
        };

        let Some(handler) = self.server.tool_handlers.get(&params.name) else {
            // An unrecognized tool name is a normal outcome carried in the
            // envelope, not a protocol error.
            let result = CallToolResult::error_text(format!("Unknown tool: {}", params.name));
            return Ok(serde_json::to_value(result)?);
        };

        let result = handler.handle(params).await?;
        Ok(serde_json::to_value(result)?)
    }

    /// Handle list resources request. No resource ever exists.
    fn handle_list_resources() -> Result<Value> {
        let result = ListResourcesResult {
            resources: Vec::new(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle read resource request. Always fails: there are no resources.
    fn handle_read_resource() -> Result<Value> {
        Err(McpError::ResourceNotFound.into())
    }

    /// Handle list prompts request. No prompt ever exists.
    fn handle_list_prompts() -> Result<Value> {
        let result = ListPromptsResult {
            prompts: Vec::new(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle get prompt request. Always fails: there are no prompts.
    fn handle_get_prompt() -> Result<Value> {
        Err(McpError::PromptNotFound.into())
    }

    /// Handle ping request
    fn handle_ping() -> Result<Value> {
        Ok(serde_json::json!({}))
    }

    /// Send a response message
    async fn send_response<W>(&self, writer: &mut W, message: JsonRpcMessage) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        self.server.send_message(writer, &message).await
    }

    /// Send an error response
    async fn send_error_response<W>(
        &self,
        writer: &mut W,
        error: JsonRpcError,
        id: Option<RequestId>,
    ) -> Result<()>
    where
        W: AsyncWriteExt + Unpin,
    {
        let error_response = JsonRpcErrorResponse::new(error, id);
        let message = JsonRpcMessage::ErrorResponse(error_response);
        self.server.send_message(writer, &message).await
    }
}
