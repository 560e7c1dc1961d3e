//! Request handler and method dispatcher.

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::types::*;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Handler trait for processing MCP requests.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle initialize request.
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult>;

    /// Handle initialized notification.
    async fn initialized(&self) -> ProtocolResult<()>;

    /// Handle shutdown request.
    async fn shutdown(&self) -> ProtocolResult<()>;

    /// List resources.
    async fn list_resources(&self) -> ProtocolResult<ListResourcesResult>;

    /// Read a resource by URI.
    async fn read_resource(&self, params: ReadResourceParams) -> ProtocolResult<ReadResourceResult>;

    /// List available tools.
    async fn list_tools(&self) -> ProtocolResult<ListToolsResult>;

    /// Call a tool.
    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult>;

    /// Handle ping request.
    async fn ping(&self) -> ProtocolResult<Value> {
        Ok(serde_json::json!({}))
    }
}

/// Method dispatcher that routes requests to handler methods.
pub struct Dispatcher<H: Handler> {
    handler: Arc<H>,
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Dispatch a request to the appropriate handler method.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Dispatching request: {}", request.method);

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "initialized" | "notifications/initialized" => self.handle_initialized().await,
            "shutdown" => self.handle_shutdown().await,
            "ping" => self.handler.ping().await,
            "resources/list" => self.handle_list_resources().await,
            "resources/read" => self.handle_read_resource(request.params).await,
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => self.handle_call_tool(request.params).await,
            method => {
                warn!("Unknown method: {}", method);
                Err(ProtocolError::MethodNotFound(method.to_string()))
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => {
                error!("Request failed: {}", e);
                JsonRpcResponse::error(request.id, JsonRpcError::new(e.code(), e.to_string()))
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let params: InitializeParams = required_params(params)?;
        let result = self.handler.initialize(params).await?;
        to_value(result)
    }

    async fn handle_initialized(&self) -> ProtocolResult<Value> {
        self.handler.initialized().await?;
        Ok(Value::Null)
    }

    async fn handle_shutdown(&self) -> ProtocolResult<Value> {
        self.handler.shutdown().await?;
        Ok(Value::Null)
    }

    async fn handle_list_resources(&self) -> ProtocolResult<Value> {
        let result = self.handler.list_resources().await?;
        to_value(result)
    }

    async fn handle_read_resource(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let params: ReadResourceParams = required_params(params)?;
        let result = self.handler.read_resource(params).await?;
        to_value(result)
    }

    async fn handle_list_tools(&self) -> ProtocolResult<Value> {
        let result = self.handler.list_tools().await?;
        to_value(result)
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let params: CallToolParams = required_params(params)?;
        let result = self.handler.call_tool(params).await?;
        to_value(result)
    }
}

fn required_params<T: DeserializeOwned>(params: Option<Value>) -> ProtocolResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?
        .ok_or_else(|| ProtocolError::InvalidParams("Missing params".into()))
}

fn to_value<T: serde::Serialize>(value: T) -> ProtocolResult<Value> {
    serde_json::to_value(value).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockHandler;

    #[async_trait]
    impl Handler for MockHandler {
        async fn initialize(&self, _params: InitializeParams) -> ProtocolResult<InitializeResult> {
            Ok(InitializeResult {
                protocol_version: MCP_VERSION.into(),
                capabilities: ServerCapabilities::default(),
                server_info: ServerInfo {
                    name: "test".into(),
                    version: "1.0".into(),
                },
                instructions: None,
            })
        }

        async fn initialized(&self) -> ProtocolResult<()> {
            Ok(())
        }

        async fn shutdown(&self) -> ProtocolResult<()> {
            Ok(())
        }

        async fn list_resources(&self) -> ProtocolResult<ListResourcesResult> {
            Ok(ListResourcesResult {
                resources: vec![Resource {
                    uri: "mysql://orders/schema".into(),
                    name: "Table: orders".into(),
                    description: None,
                    mime_type: None,
                }],
                next_cursor: None,
            })
        }

        async fn read_resource(
            &self,
            params: ReadResourceParams,
        ) -> ProtocolResult<ReadResourceResult> {
            Ok(ReadResourceResult {
                contents: vec![ResourceContent::text(params.uri, "## Table: orders")],
            })
        }

        async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
            Ok(ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        }

        async fn call_tool(&self, _params: CallToolParams) -> ProtocolResult<CallToolResult> {
            Ok(CallToolResult::text("test"))
        }
    }

    #[tokio::test]
    async fn test_dispatcher_initialize() {
        let dispatcher = Dispatcher::new(Arc::new(MockHandler));

        let request = JsonRpcRequest::new("initialize")
            .with_id(1)
            .with_params(serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0"}
            }));

        let response = dispatcher.dispatch(request).await;
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatcher_resources_roundtrip() {
        let dispatcher = Dispatcher::new(Arc::new(MockHandler));

        let list = dispatcher
            .dispatch(JsonRpcRequest::new("resources/list").with_id(1))
            .await;
        let result = list.result.unwrap();
        assert_eq!(result["resources"][0]["uri"], "mysql://orders/schema");

        let read = dispatcher
            .dispatch(
                JsonRpcRequest::new("resources/read")
                    .with_id(2)
                    .with_params(serde_json::json!({"uri": "mysql://orders/schema"})),
            )
            .await;
        let result = read.result.unwrap();
        assert_eq!(result["contents"][0]["text"], "## Table: orders");
    }

    #[tokio::test]
    async fn test_dispatcher_read_resource_requires_params() {
        let dispatcher = Dispatcher::new(Arc::new(MockHandler));

        let response = dispatcher
            .dispatch(JsonRpcRequest::new("resources/read").with_id(1))
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_dispatcher_unknown_method() {
        let dispatcher = Dispatcher::new(Arc::new(MockHandler));

        let request = JsonRpcRequest::new("unknown/method").with_id(1);
        let response = dispatcher.dispatch(request).await;

        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
