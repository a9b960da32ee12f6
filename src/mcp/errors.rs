//! MCP error handling
//!
//! Error classification and conversion into JSON-RPC error responses.
//! Handlers that are designed to fail return explicit variants here, so
//! they stay distinct from unexpected faults.

use crate::mcp::protocol::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcMessage, RequestId, SUPPORTED_PROTOCOL_VERSIONS,
    error_codes, mcp_error_codes,
};
use thiserror::Error;
use tracing::{error, warn};

/// MCP-specific errors surfaced as JSON-RPC error responses
#[derive(Error, Debug)]
pub enum McpError {
    #[error(
        "Unsupported protocol version: {version}. Supported: {}",
        SUPPORTED_PROTOCOL_VERSIONS.join(", ")
    )]
    UnsupportedProtocolVersion { version: String },

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Unknown prompt")]
    PromptNotFound,

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Convert MCP error to JSON-RPC error
    #[inline]
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        let code = match self {
            Self::UnsupportedProtocolVersion { .. } => mcp_error_codes::INVALID_PROTOCOL_VERSION,
            Self::ResourceNotFound => mcp_error_codes::RESOURCE_NOT_FOUND,
            Self::PromptNotFound => mcp_error_codes::PROMPT_NOT_FOUND,
            Self::InternalError { .. } => error_codes::INTERNAL_ERROR,
        };

        JsonRpcError::new(code, self.to_string(), None)
    }

    /// Create the error response message
    #[inline]
    pub fn to_error_response(&self, id: Option<RequestId>) -> JsonRpcMessage {
        let error_response = JsonRpcErrorResponse::new(self.to_jsonrpc_error(), id);
        JsonRpcMessage::ErrorResponse(error_response)
    }

    /// Log the error with the appropriate level
    #[inline]
    pub fn log(&self) {
        match self {
            Self::ResourceNotFound | Self::PromptNotFound => {
                warn!("Not found: {}", self);
            }
            Self::UnsupportedProtocolVersion { .. } | Self::InternalError { .. } => {
                error!("Server error: {}", self);
            }
        }
    }
}

/// Error handler utility for consistent error processing
pub struct ErrorHandler;

impl ErrorHandler {
    /// Handle any error and convert it to the matching JSON-RPC response
    #[inline]
    pub fn handle_error(error: &anyhow::Error, id: Option<RequestId>) -> JsonRpcMessage {
        // Designed-to-fail handlers surface as McpError; anything else is
        // an unexpected fault.
        if let Some(mcp_error) = error.downcast_ref::<McpError>() {
            mcp_error.log();
            return mcp_error.to_error_response(id);
        }

        error!("Unexpected error: {}", error);
        let internal_error = McpError::InternalError {
            message: error.to_string(),
        };
        internal_error.to_error_response(id)
    }
}
