//! MCP request handler implementation.
//!
//! This is the boundary where typed failures pick their presentation:
//! protocol-shaped problems (unknown tool, malformed URI, missing params)
//! become JSON-RPC errors; SQL validation and execution failures inside a
//! tool call come back as in-band error content blocks, so the caller still
//! receives a well-formed tool result.

use crate::error::{McpError, ProtocolError, ProtocolResult, ToolError};
use crate::protocol::{
    CallToolParams, CallToolResult, Handler, InitializeParams, InitializeResult,
    ListResourcesResult, ListToolsResult, MCP_VERSION, ReadResourceParams, ReadResourceResult,
    ResourceContent, ResourcesCapability, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::server::resources::{parse_table_uri, table_resource};
use crate::server::state::ServerState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// MCP request handler that processes protocol messages.
pub struct McpHandler {
    state: Arc<ServerState>,
}

impl McpHandler {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }
}

#[async_trait]
impl Handler for McpHandler {
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult> {
        info!(
            "Initialize request from {} v{}",
            params.client_info.name, params.client_info.version
        );

        self.state.set_initialized(params.client_info);

        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
            resources: Some(ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
        };

        let instructions = format!(
            "MySQL MCP server for database '{}'. Tables are exposed as \
            mysql://<table>/schema resources; the 'query' tool runs read-only \
            SELECT, SHOW and DESCRIBE statements.",
            self.state.config.mysql.database
        );

        Ok(InitializeResult {
            protocol_version: MCP_VERSION.into(),
            capabilities,
            server_info: ServerInfo {
                name: self.state.config.name.to_string(),
                version: self.state.config.version.to_string(),
            },
            instructions: Some(instructions),
        })
    }

    async fn initialized(&self) -> ProtocolResult<()> {
        info!("Server initialized successfully");
        Ok(())
    }

    async fn shutdown(&self) -> ProtocolResult<()> {
        info!("Shutdown request received");
        Ok(())
    }

    async fn list_resources(&self) -> ProtocolResult<ListResourcesResult> {
        let tables = self
            .state
            .introspector
            .list_tables()
            .await
            .map_err(|e| ProtocolError::InternalError(e.to_string().into()))?;

        debug!("Listing {} table resources", tables.len());

        Ok(ListResourcesResult {
            resources: tables.iter().map(|t| table_resource(t)).collect(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        params: ReadResourceParams,
    ) -> ProtocolResult<ReadResourceResult> {
        let table = parse_table_uri(&params.uri)
            .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?;

        debug!("Reading resource: {}", params.uri);

        let document = self
            .state
            .introspector
            .describe_table(table)
            .await
            .map_err(|e| ProtocolError::InternalError(e.to_string().into()))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContent::text(params.uri, document)],
        })
    }

    async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
        let tools = self.state.tools.list();
        debug!("Listing {} tools", tools.len());

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
        debug!("Tool call: {}", params.name);

        match self.state.tools.execute(params).await {
            Ok(result) => Ok(result),
            Err(McpError::Tool(ToolError::NotFound(name))) => Err(ProtocolError::InvalidParams(
                format!("Tool '{name}' not found").into(),
            )),
            Err(e) => {
                tracing::error!("Tool execution error: {}", e);
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MysqlPool;
    use crate::server::state::ServerStateBuilder;

    fn handler() -> McpHandler {
        let pool = Arc::new(MysqlPool::detached(1));
        let state = ServerStateBuilder::new().pool(pool).build().unwrap();
        McpHandler::new(Arc::new(state))
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_and_resources() {
        let handler = handler();
        let result = handler
            .initialize(InitializeParams {
                protocol_version: MCP_VERSION.into(),
                capabilities: Default::default(),
                client_info: crate::protocol::ClientInfo {
                    name: "client".into(),
                    version: "1.0".into(),
                },
            })
            .await
            .unwrap();

        assert!(result.capabilities.tools.is_some());
        assert!(result.capabilities.resources.is_some());
        assert!(handler.state().is_initialized());
    }

    #[tokio::test]
    async fn test_list_tools_has_query() {
        let result = handler().list_tools().await.unwrap();
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].name, "query");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_hard_error() {
        let result = handler()
            .call_tool(CallToolParams {
                name: "nonexistent".into(),
                arguments: serde_json::json!({}),
            })
            .await;

        assert!(matches!(result, Err(ProtocolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_rejected_statement_is_in_band_error() {
        let result = handler()
            .call_tool(CallToolParams {
                name: "query".into(),
                arguments: serde_json::json!({"sql": "DROP TABLE orders"}),
            })
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_malformed_uri_is_invalid_params() {
        let result = handler()
            .read_resource(ReadResourceParams {
                uri: "mysql://orders/data".into(),
            })
            .await;

        assert!(matches!(result, Err(ProtocolError::InvalidParams(_))));
    }
}
