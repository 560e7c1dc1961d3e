//! Read-only query execution tool.

use crate::database::executor::run_query;
use crate::database::pool::MysqlPool;
use crate::database::render::render_result;
use crate::error::{Result, ToolError};
use crate::protocol::{CallToolResult, Tool};
use crate::security::check_read_only;
use crate::tools::registry::ToolHandler;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
pub struct QueryArgs {
    #[serde(default)]
    pub sql: String,
}

/// The `query` tool: policy check, lease, execute, render.
pub struct QueryTool {
    pool: Arc<MysqlPool>,
}

impl QueryTool {
    pub fn new(pool: Arc<MysqlPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ToolHandler for QueryTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "query".into(),
            description: Some("Run a read-only SQL query".into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "SQL query to execute"
                    }
                },
                "required": ["sql"]
            }),
        }
    }

    #[instrument(skip(self, arguments), fields(tool = "query"))]
    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: QueryArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        // Rejected statements never touch the pool.
        check_read_only(&args.sql)?;

        let mut conn = self.pool.acquire().await?;
        let result = run_query(&mut conn, &args.sql).await?;
        drop(conn);

        debug!(rows = result.row_count(), "query executed");
        Ok(CallToolResult::text(render_result(&result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{McpError, PolicyError};

    fn tool() -> QueryTool {
        // Detached pool: policy failures must short-circuit before any
        // connection is needed.
        QueryTool::new(Arc::new(MysqlPool::detached(1)))
    }

    #[test]
    fn test_definition_shape() {
        let def = tool().definition();
        assert_eq!(def.name, "query");
        assert_eq!(def.input_schema["required"][0], "sql");
        assert!(def.input_schema["properties"]["sql"].is_object());
    }

    #[tokio::test]
    async fn test_write_rejected_before_database() {
        let result = tool()
            .execute(serde_json::json!({"sql": "DROP TABLE orders"}))
            .await;

        assert!(matches!(
            result,
            Err(McpError::Policy(PolicyError::WriteRejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_sql_is_empty_query() {
        let result = tool().execute(serde_json::json!({})).await;
        assert!(matches!(
            result,
            Err(McpError::Policy(PolicyError::EmptyQuery))
        ));
    }

    #[tokio::test]
    async fn test_blank_sql_is_empty_query() {
        let result = tool().execute(serde_json::json!({"sql": "  "})).await;
        assert!(matches!(
            result,
            Err(McpError::Policy(PolicyError::EmptyQuery))
        ));
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let result = tool().execute(serde_json::json!("DROP")).await;
        assert!(matches!(result, Err(McpError::Tool(_))));
    }
}
