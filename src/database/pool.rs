//! Bounded MySQL connection pool with scoped leases.
//!
//! The pool owns every physical connection. A connection is either idle
//! (held in the pool) or leased (owned by exactly one [`PooledConn`] guard);
//! the guard returns it on every exit path, including cancellation, so a
//! lease can never outlive its request.

use crate::config::MysqlConfig;
use crate::error::{DatabaseError, DbResult};
use mysql_async::{Conn, Opts, OptsBuilder};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

/// Pool counters for logging and diagnostics.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    pub connections_created: AtomicU32,
    pub connections_closed: AtomicU32,
    pub connection_errors: AtomicU32,
    pub leases_granted: AtomicU32,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_created(&self) {
        self.connections_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lease(&self) {
        self.leases_granted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            leases_granted: self.leases_granted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pool metrics.
#[derive(Debug, Clone)]
pub struct PoolMetricsSnapshot {
    pub connections_created: u32,
    pub connections_closed: u32,
    pub connection_errors: u32,
    pub leases_granted: u32,
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub max: u32,
    pub idle: u32,
    pub leased: u32,
}

struct PoolInner {
    opts: Opts,
    pool_max: u32,
    idle: Mutex<Vec<Conn>>,
    /// One permit per allowed concurrent lease; FIFO for queued acquirers.
    permits: Arc<Semaphore>,
    closed: AtomicBool,
    metrics: PoolMetrics,
}

/// Bounded MySQL connection pool.
///
/// Constructed once at startup and passed by `Arc` into every component;
/// closed once at shutdown.
pub struct MysqlPool {
    inner: Arc<PoolInner>,
}

impl MysqlPool {
    /// Opens the pool, eagerly establishing `pool_min` connections.
    ///
    /// Credential validation happens in the config builder; a dial failure
    /// here surfaces as [`DatabaseError::ConnectionFailed`].
    pub async fn open(config: &MysqlConfig) -> DbResult<Self> {
        let opts: Opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()))
            .into();

        let inner = Arc::new(PoolInner {
            opts,
            pool_max: config.pool_max,
            idle: Mutex::new(Vec::with_capacity(config.pool_max as usize)),
            permits: Arc::new(Semaphore::new(config.pool_max as usize)),
            closed: AtomicBool::new(false),
            metrics: PoolMetrics::new(),
        });

        for _ in 0..config.pool_min {
            let conn = inner.dial().await?;
            inner.idle.lock().push(conn);
        }

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            min = config.pool_min,
            max = config.pool_max,
            "MySQL connection pool opened"
        );

        Ok(Self { inner })
    }

    /// Acquires an exclusive lease on one connection.
    ///
    /// Suspends while the pool is exhausted and resumes when a lease is
    /// returned. Fails with [`DatabaseError::PoolClosed`] once `close()` has
    /// begun. Tops the pool up lazily: a permit holder with no idle
    /// connection dials a new one, so live connections never exceed
    /// `pool_max`.
    pub async fn acquire(&self) -> DbResult<PooledConn> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(DatabaseError::PoolClosed);
        }

        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| DatabaseError::PoolClosed)?;

        // close() may have released permits between the check and the await.
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(DatabaseError::PoolClosed);
        }

        let idle = self.inner.idle.lock().pop();
        let conn = match idle {
            Some(conn) => conn,
            None => self.inner.dial().await?,
        };

        self.inner.metrics.record_lease();
        debug!(status = ?self.status(), "connection leased");

        Ok(PooledConn {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Closes the pool: stops new acquisitions, waits for every outstanding
    /// lease to be returned, then disconnects all connections.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("closing MySQL connection pool");

        // Holding every permit means no lease is outstanding and none can
        // start; every connection is back in the idle set.
        if let Ok(_all) = self.inner.permits.acquire_many(self.inner.pool_max).await {
            let drained: Vec<Conn> = self.inner.idle.lock().drain(..).collect();
            for conn in drained {
                if let Err(e) = conn.disconnect().await {
                    warn!(error = %e, "error disconnecting pooled connection");
                }
                self.inner.metrics.record_connection_closed();
            }
        }

        info!("MySQL connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PoolStatus {
        let max = self.inner.pool_max;
        let available = self.inner.permits.available_permits() as u32;
        PoolStatus {
            max,
            idle: self.inner.idle.lock().len() as u32,
            leased: max.saturating_sub(available),
        }
    }

    pub fn metrics(&self) -> PoolMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Pool shell with no live connections, for exercising lease and
    /// shutdown bookkeeping without a database.
    #[cfg(test)]
    pub(crate) fn detached(pool_max: u32) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                opts: OptsBuilder::default().into(),
                pool_max,
                idle: Mutex::new(Vec::new()),
                permits: Arc::new(Semaphore::new(pool_max as usize)),
                closed: AtomicBool::new(false),
                metrics: PoolMetrics::new(),
            }),
        }
    }
}

impl PoolInner {
    async fn dial(&self) -> DbResult<Conn> {
        match Conn::new(self.opts.clone()).await {
            Ok(conn) => {
                self.metrics.record_connection_created();
                Ok(conn)
            }
            Err(e) => {
                self.metrics.record_connection_error();
                Err(DatabaseError::ConnectionFailed(e.to_string()))
            }
        }
    }
}

/// Exclusive lease on one pooled connection.
///
/// Dropping the guard returns the connection to the idle set and releases
/// the lease permit, whatever path got us here.
pub struct PooledConn {
    conn: Option<Conn>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl std::ops::Deref for PooledConn {
    type Target = Conn;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl std::ops::DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // The permit is still held here, so close() cannot have drained
            // the idle set yet; the connection always finds its way home.
            self.pool.idle.lock().push(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_metrics() {
        let metrics = PoolMetrics::new();
        metrics.record_connection_created();
        metrics.record_connection_created();
        metrics.record_lease();
        metrics.record_connection_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_created, 2);
        assert_eq!(snapshot.leases_granted, 1);
        assert_eq!(snapshot.connection_errors, 1);
        assert_eq!(snapshot.connections_closed, 0);
    }

    #[tokio::test]
    async fn test_acquire_after_close_fails() {
        let pool = MysqlPool::detached(2);
        pool.close().await;

        assert!(pool.is_closed());
        assert!(matches!(
            pool.acquire().await,
            Err(DatabaseError::PoolClosed)
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let pool = MysqlPool::detached(1);
        pool.close().await;
        pool.close().await;
        assert!(pool.is_closed());
    }

    #[test]
    fn test_status_starts_unleased() {
        let pool = MysqlPool::detached(4);
        let status = pool.status();
        assert_eq!(status.max, 4);
        assert_eq!(status.leased, 0);
        assert_eq!(status.idle, 0);
    }
}
