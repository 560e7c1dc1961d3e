//! MCP server binary entry point.

use anyhow::{Context, Result};
use mysql_pool_mcp::{
    config::{MysqlConfigBuilder, ServerConfig},
    database::MysqlPool,
    protocol::McpServerBuilder,
    server::{McpHandler, ServerStateBuilder},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = MysqlConfigBuilder::new()
        .from_env()?
        .build()
        .context("invalid database configuration")?;

    let pool = Arc::new(
        MysqlPool::open(&config)
            .await
            .context("failed to open connection pool")?,
    );

    let state = Arc::new(
        ServerStateBuilder::new()
            .config(ServerConfig::new(config))
            .pool(Arc::clone(&pool))
            .build()
            .map_err(|e| anyhow::anyhow!(e))?,
    );

    let handler = McpHandler::new(state);
    let server = McpServerBuilder::new()
        .handler(handler)
        .name(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .with_tools()
        .with_resources()
        .build()?;

    info!("MCP server ready, waiting for requests...");

    server.run().await?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mysql_pool_mcp=info,warn"));

    // Structured JSON logs on stderr; stdout is reserved for the MCP protocol.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .json()
        .init();
}
