//! Pooled MySQL access: connection pool, statement execution,
//! result rendering, and schema introspection.

pub mod executor;
pub mod introspect;
pub mod pool;
pub mod render;
pub mod result;

pub use executor::run_query;
pub use introspect::SchemaIntrospector;
pub use pool::{MysqlPool, PoolMetrics, PoolMetricsSnapshot, PoolStatus, PooledConn};
pub use render::{markdown_table, render_result};
pub use result::{CellValue, ColumnInfo, QueryResult};
