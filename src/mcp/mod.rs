//! MCP (Model Context Protocol) server implementation
//!
//! Implements the JSON-RPC 2.0 framing and the MCP request kinds this
//! server answers, over a stdio transport.

#[cfg(test)]
mod tests;

pub mod errors;
pub mod protocol;
pub mod server;
pub mod tools;
