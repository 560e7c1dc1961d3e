//! Configuration types and builders.

use crate::error::{ConfigError, McpError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;

/// Default MySQL server port.
pub const DEFAULT_PORT: u16 = 3306;

/// Default maximum pool size.
pub const DEFAULT_POOL_MAX: u32 = 10;

/// MySQL connection and pool configuration.
///
/// Username, password and database name are mandatory; the builder refuses
/// to produce a config without them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Connections opened eagerly at pool startup.
    pub pool_min: u32,
    /// Hard upper bound on live connections (idle + leased).
    pub pool_max: u32,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            pool_min: 1,
            pool_max: DEFAULT_POOL_MAX,
        }
    }
}

impl MysqlConfig {
    pub fn builder() -> MysqlConfigBuilder {
        MysqlConfigBuilder::default()
    }
}

/// Builder for MysqlConfig with fluent API.
#[derive(Default)]
pub struct MysqlConfigBuilder {
    config: MysqlConfig,
}

impl MysqlConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn pool_min(mut self, min: u32) -> Self {
        self.config.pool_min = min;
        self
    }

    pub fn pool_max(mut self, max: u32) -> Self {
        self.config.pool_max = max;
        self
    }

    /// Build from `MYSQL_*` environment variables.
    ///
    /// Host, port and pool size fall back to defaults when unset; the
    /// credentials and database name are validated at `build()`.
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(host) = env::var("MYSQL_HOST") {
            self.config.host = host;
        }

        if let Ok(port) = env::var("MYSQL_PORT") {
            self.config.port = port.parse().map_err(|_| {
                McpError::Config(ConfigError::InvalidValue {
                    field: "MYSQL_PORT".into(),
                    message: "Invalid port number".into(),
                })
            })?;
        }

        if let Ok(username) = env::var("MYSQL_USER") {
            self.config.username = username;
        }

        if let Ok(password) = env::var("MYSQL_PASSWORD") {
            self.config.password = password;
        }

        if let Ok(database) = env::var("MYSQL_DB") {
            self.config.database = database;
        }

        if let Ok(pool_size) = env::var("MYSQL_POOL_SIZE") {
            self.config.pool_max = pool_size.parse().map_err(|_| {
                McpError::Config(ConfigError::InvalidValue {
                    field: "MYSQL_POOL_SIZE".into(),
                    message: "Invalid pool size".into(),
                })
            })?;
        }

        Ok(self)
    }

    pub fn build(self) -> Result<MysqlConfig> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<()> {
        if self.config.username.is_empty() {
            return Err(ConfigError::MissingField("username".into()).into());
        }
        if self.config.password.is_empty() {
            return Err(ConfigError::MissingField("password".into()).into());
        }
        if self.config.database.is_empty() {
            return Err(ConfigError::MissingField("database".into()).into());
        }
        if self.config.pool_max == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_max".into(),
                message: "Pool size must be greater than 0".into(),
            }
            .into());
        }
        if self.config.pool_min > self.config.pool_max {
            return Err(ConfigError::InvalidValue {
                field: "pool_min".into(),
                message: "Minimum pool size cannot exceed maximum".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub mysql: MysqlConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            mysql: MysqlConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(mysql: MysqlConfig) -> Self {
        Self {
            mysql,
            ..Self::default()
        }
    }
}
