//! MCP server tests
//!
//! Unit tests for request dispatch, the single chat tool, and protocol
//! error mapping.

mod support {
    use crate::chat::ChatClient;
    use crate::config::Config;
    use crate::mcp::protocol::{JsonRpcMessage, JsonRpcRequest, RequestId};
    use crate::mcp::server::{McpServer, MessageHandler};
    use crate::mcp::tools::AskHandler;
    use serde_json::Value;
    use std::sync::Arc;
    use url::Url;

    pub fn test_config() -> Config {
        Config {
            // Port 9 (discard) so an accidental request fails fast.
            base_url: Url::parse("http://127.0.0.1:9").expect("Failed to parse base URL"),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            assistant_name: "Test Assistant".to_string(),
        }
    }

    pub fn test_server() -> Arc<McpServer> {
        let config = test_config();
        let mut server = McpServer::new("any-chat-mcp".to_string(), "0.1.0".to_string());
        server.register_tool(
            AskHandler::tool_definition(&config),
            AskHandler::new(ChatClient::new(&config)),
        );
        Arc::new(server)
    }

    pub async fn dispatch(server: &Arc<McpServer>, method: &str, params: Option<Value>) -> Value {
        let handler = MessageHandler::new(Arc::clone(server));
        let mut out = Vec::new();

        let request = JsonRpcRequest::new(method.to_string(), params, RequestId::Number(1));
        handler
            .process_message(JsonRpcMessage::Request(request), &mut out)
            .await
            .expect("Failed to process message");

        serde_json::from_slice(&out).expect("Failed to parse response")
    }
}

#[cfg(test)]
mod ask_tool_tests {
    use super::support;
    use crate::chat::ChatClient;
    use crate::mcp::protocol::{CallToolParams, ToolContent};
    use crate::mcp::server::ToolHandler;
    use crate::mcp::tools::AskHandler;
    use std::collections::HashMap;

    #[test]
    fn ask_tool_definition() {
        let config = support::test_config();
        let tool = AskHandler::tool_definition(&config);

        assert_eq!(tool.name, "ask-test-assistant");
        assert_eq!(
            tool.description,
            Some("Ask Test Assistant a question".to_string())
        );

        let schema = tool.input_schema;
        let properties = schema["properties"].as_object().expect("has properties");
        assert!(properties.contains_key("content"));
        assert_eq!(properties["content"]["type"], "string");

        let required = schema["required"].as_array().expect("has required array");
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "content");
    }

    #[tokio::test]
    async fn missing_content_returns_error_envelope() {
        let config = support::test_config();
        let handler = AskHandler::new(ChatClient::new(&config));

        let params = CallToolParams {
            name: config.tool_name(),
            arguments: Some(HashMap::new()),
        };

        let result = handler.handle(params).await.expect("Handler failed");
        assert_eq!(result.is_error, Some(true));

        let ToolContent::Text { text } = &result.content[0];
        assert!(text.starts_with("Error:"));
        assert!(text.contains("Content is required"));
    }

    #[tokio::test]
    async fn absent_arguments_return_error_envelope() {
        let config = support::test_config();
        let handler = AskHandler::new(ChatClient::new(&config));

        let params = CallToolParams {
            name: config.tool_name(),
            arguments: None,
        };

        let result = handler.handle(params).await.expect("Handler failed");
        assert_eq!(result.is_error, Some(true));

        let ToolContent::Text { text } = &result.content[0];
        assert!(text.starts_with("Error:"));
    }
}

#[cfg(test)]
mod dispatch_tests {
    use super::support;
    use crate::mcp::protocol::{error_codes, mcp_error_codes};
    use serde_json::json;

    #[tokio::test]
    async fn tools_list_contains_exactly_one_tool() {
        let server = support::test_server();
        let response = support::dispatch(&server, "tools/list", None).await;

        let tools = response["result"]["tools"]
            .as_array()
            .expect("has tools array");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "ask-test-assistant");
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn unknown_tool_call_returns_error_envelope() {
        let server = support::test_server();
        let response = support::dispatch(
            &server,
            "tools/call",
            Some(json!({"name": "nope", "arguments": {"content": "hi"}})),
        )
        .await;

        let result = &response["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn missing_content_through_dispatch() {
        let server = support::test_server();
        let response = support::dispatch(
            &server,
            "tools/call",
            Some(json!({"name": "ask-test-assistant", "arguments": {}})),
        )
        .await;

        let result = &response["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().expect("has text");
        assert!(text.starts_with("Error:"));
    }

    #[tokio::test]
    async fn resources_list_is_empty() {
        let server = support::test_server();
        let response = support::dispatch(&server, "resources/list", None).await;

        let resources = response["result"]["resources"]
            .as_array()
            .expect("has resources array");
        assert!(resources.is_empty());
    }

    #[tokio::test]
    async fn resources_read_always_fails() {
        let server = support::test_server();
        let response = support::dispatch(
            &server,
            "resources/read",
            Some(json!({"uri": "docs://anything"})),
        )
        .await;

        assert_eq!(
            response["error"]["code"],
            mcp_error_codes::RESOURCE_NOT_FOUND
        );
        assert_eq!(response["error"]["message"], "Resource not found");
    }

    #[tokio::test]
    async fn prompts_list_is_empty() {
        let server = support::test_server();
        let response = support::dispatch(&server, "prompts/list", None).await;

        let prompts = response["result"]["prompts"]
            .as_array()
            .expect("has prompts array");
        assert!(prompts.is_empty());
    }

    #[tokio::test]
    async fn prompts_get_always_fails() {
        let server = support::test_server();
        let response =
            support::dispatch(&server, "prompts/get", Some(json!({"name": "anything"}))).await;

        assert_eq!(response["error"]["code"], mcp_error_codes::PROMPT_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Unknown prompt");
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let server = support::test_server();
        let response = support::dispatch(&server, "bogus/method", None).await;

        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let server = support::test_server();
        let response = support::dispatch(&server, "ping", None).await;

        assert_eq!(response["result"], json!({}));
    }
}

#[cfg(test)]
mod initialize_tests {
    use super::support;
    use crate::mcp::protocol::{MCP_VERSION, error_codes, mcp_error_codes};
    use serde_json::json;

    fn initialize_params(version: &str) -> serde_json::Value {
        json!({
            "protocolVersion": version,
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0"}
        })
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let server = support::test_server();
        let response = support::dispatch(
            &server,
            "initialize",
            Some(initialize_params(MCP_VERSION)),
        )
        .await;

        let result = &response["result"];
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert_eq!(result["serverInfo"]["name"], "any-chat-mcp");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
    }

    #[tokio::test]
    async fn initialize_rejects_unsupported_protocol_version() {
        let server = support::test_server();
        let response = support::dispatch(
            &server,
            "initialize",
            Some(initialize_params("1999-01-01")),
        )
        .await;

        assert_eq!(
            response["error"]["code"],
            mcp_error_codes::INVALID_PROTOCOL_VERSION
        );
    }

    #[tokio::test]
    async fn initialize_without_params_is_an_internal_error() {
        let server = support::test_server();
        let response = support::dispatch(&server, "initialize", None).await;

        assert_eq!(response["error"]["code"], error_codes::INTERNAL_ERROR);
    }
}

#[cfg(test)]
mod serve_loop_tests {
    use super::support;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::io::BufReader;

    async fn serve_input(input: &str) -> Vec<Value> {
        let server = support::test_server();
        let mut output = Vec::new();

        Arc::clone(&server)
            .serve(BufReader::new(input.as_bytes()), &mut output)
            .await
            .expect("Serve loop failed");

        std::str::from_utf8(&output)
            .expect("Output is not UTF-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("Failed to parse response line"))
            .collect()
    }

    #[tokio::test]
    async fn malformed_json_yields_parse_error_and_loop_continues() {
        let responses = serve_input(
            "this is not json\n{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":1}\n",
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["result"], serde_json::json!({}));
        assert_eq!(responses[1]["id"], 1);
    }

    #[tokio::test]
    async fn non_jsonrpc_object_yields_invalid_request() {
        let responses = serve_input("{\"foo\": 1}\n").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn notifications_produce_no_output() {
        let responses =
            serve_input("{\"jsonrpc\":\"2.0\",\"method\":\"initialized\"}\n").await;

        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let responses =
            serve_input("\n\n{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":2}\n").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 2);
    }
}
