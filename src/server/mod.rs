//! Server facade: state, resources, and the MCP request handler.

pub mod handler;
pub mod resources;
pub mod state;

pub use handler::McpHandler;
pub use resources::{parse_table_uri, table_resource};
pub use state::{ServerState, ServerStateBuilder};
