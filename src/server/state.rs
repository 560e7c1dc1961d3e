//! Server state management.

use crate::config::ServerConfig;
use crate::database::{MysqlPool, SchemaIntrospector};
use crate::protocol::ClientInfo;
use crate::tools::ToolRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared per-process state, handed by `Arc` into every request handler.
///
/// The pool is an explicitly constructed object owned by `main`, not a
/// global; its lifetime brackets the server loop.
pub struct ServerState {
    pub config: ServerConfig,
    pub pool: Arc<MysqlPool>,
    pub introspector: SchemaIntrospector,
    pub tools: ToolRegistry,
    initialized: AtomicBool,
    client_info: RwLock<Option<ClientInfo>>,
}

impl ServerState {
    pub fn new(config: ServerConfig, pool: Arc<MysqlPool>) -> Self {
        let introspector = SchemaIntrospector::new(Arc::clone(&pool));
        let tools = crate::tools::create_registry(Arc::clone(&pool));

        Self {
            config,
            pool,
            introspector,
            tools,
            initialized: AtomicBool::new(false),
            client_info: RwLock::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn set_initialized(&self, client_info: ClientInfo) {
        *self.client_info.write() = Some(client_info);
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().clone()
    }
}

/// Builder for [`ServerState`].
#[derive(Default)]
pub struct ServerStateBuilder {
    config: Option<ServerConfig>,
    pool: Option<Arc<MysqlPool>>,
}

impl ServerStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn pool(mut self, pool: Arc<MysqlPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> Result<ServerState, &'static str> {
        let config = self.config.unwrap_or_default();
        let pool = self.pool.ok_or("Connection pool is required")?;
        Ok(ServerState::new(config, pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_pool() {
        assert!(ServerStateBuilder::new().build().is_err());
    }

    #[test]
    fn test_state_registers_query_tool() {
        let pool = Arc::new(MysqlPool::detached(1));
        let state = ServerStateBuilder::new().pool(pool).build().unwrap();

        assert_eq!(state.tools.len(), 1);
        assert!(state.tools.get("query").is_some());
        assert!(!state.is_initialized());
    }

    #[test]
    fn test_set_initialized_records_client() {
        let pool = Arc::new(MysqlPool::detached(1));
        let state = ServerStateBuilder::new().pool(pool).build().unwrap();

        state.set_initialized(ClientInfo {
            name: "client".into(),
            version: "1.0".into(),
        });

        assert!(state.is_initialized());
        assert_eq!(state.client_info().unwrap().name, "client");
    }
}
