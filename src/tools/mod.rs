//! MCP tool definitions and registry.

pub mod query;
pub mod registry;

pub use query::QueryTool;
pub use registry::{ToolHandler, ToolRegistry};

use crate::database::MysqlPool;
use std::sync::Arc;

/// Create and register all tools.
pub fn create_registry(pool: Arc<MysqlPool>) -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(QueryTool::new(pool));
    registry
}
