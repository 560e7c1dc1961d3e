//! MCP server exposing a MySQL database through a bounded connection pool.
//!
//! Tables are published as `mysql://<table>/schema` resources (column
//! metadata, creation DDL, sample rows) and a single read-only `query` tool
//! executes SELECT, SHOW and DESCRIBE statements, rendering results as
//! markdown tables.
//!
//! # Example
//!
//! ```no_run
//! use mysql_pool_mcp::{
//!     config::{MysqlConfig, ServerConfig},
//!     database::MysqlPool,
//!     protocol::McpServerBuilder,
//!     server::{McpHandler, ServerStateBuilder},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MysqlConfig::builder()
//!         .username("app")
//!         .password("secret")
//!         .database("appdb")
//!         .build()?;
//!
//!     let pool = Arc::new(MysqlPool::open(&config).await?);
//!
//!     let state = Arc::new(
//!         ServerStateBuilder::new()
//!             .config(ServerConfig::new(config))
//!             .pool(Arc::clone(&pool))
//!             .build()
//!             .map_err(|e| anyhow::anyhow!(e))?,
//!     );
//!
//!     let server = McpServerBuilder::new()
//!         .handler(McpHandler::new(state))
//!         .with_tools()
//!         .with_resources()
//!         .build()?;
//!
//!     server.run().await?;
//!     pool.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod protocol;
pub mod security;
pub mod server;
pub mod tools;

pub use config::{MysqlConfig, MysqlConfigBuilder, ServerConfig};
pub use database::{CellValue, MysqlPool, PooledConn, QueryResult, SchemaIntrospector};
pub use error::{McpError, Result};
pub use protocol::{McpServer, McpServerBuilder};
pub use security::check_read_only;
pub use server::{McpHandler, ServerState, ServerStateBuilder};
