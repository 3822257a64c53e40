//! Connection pool handing out exclusive cache connections.
//!
//! Idle connections wait on a crossbeam channel. A [`PooledConnection`] puts its connection back
//! when dropped, so every exit path of its owner returns it, error paths included. Connections
//! that report themselves broken are discarded and their slot becomes available again.

use crate::client::CacheConnection;
use crate::memory::{MemoryCache, MemoryConnection};
use crate::settings::CacheSettings;
use crate::tcp::TcpConnection;
use crate::{warn, CacheError};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::debug;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT_SLICE: Duration = Duration::from_millis(10);

type Factory<C> = Box<dyn Fn() -> Result<C, CacheError> + Send + Sync>;

struct PoolInner<C> {
    idle_tx: Sender<C>,
    idle_rx: Receiver<C>,
    created: AtomicUsize,
    max_size: usize,
    acquire_timeout: Duration,
    factory: Factory<C>,
}

impl<C> PoolInner<C> {
    fn reserve_slot(&self) -> bool {
        self.created
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < self.max_size).then_some(n + 1))
            .is_ok()
    }

    fn free_slot(&self) {
        self.created.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ConnectionPool<C> {
    inner: Arc<PoolInner<C>>,
}

impl<C> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: CacheConnection> ConnectionPool<C> {
    /// # Panics
    ///
    /// If `max_size` is zero. [`ConnectionPool::from_settings`] reports that as an error instead.
    pub fn new<F>(max_size: usize, acquire_timeout: Duration, factory: F) -> Self
    where
        F: Fn() -> Result<C, CacheError> + Send + Sync + 'static,
    {
        assert!(max_size >= 1, "pool needs room for at least one connection");
        let (idle_tx, idle_rx) = unbounded();
        Self {
            inner: Arc::new(PoolInner {
                idle_tx,
                idle_rx,
                created: AtomicUsize::new(0),
                max_size,
                acquire_timeout,
                factory: Box::new(factory),
            }),
        }
    }

    /// Borrows a connection: an idle one if any, a new one while below `max_size`, otherwise
    /// waits for a release until the acquire timeout elapses. Waiting happens in short slices so
    /// that a slot freed by a discarded connection is picked up as well.
    pub fn acquire(&self) -> Result<PooledConnection<C>, CacheError> {
        let deadline = Instant::now() + self.inner.acquire_timeout;
        loop {
            if let Ok(conn) = self.inner.idle_rx.try_recv() {
                return Ok(self.wrap(conn));
            }
            if self.inner.reserve_slot() {
                return self.open();
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("No connection released within {:?}, pool of {} exhausted", self.inner.acquire_timeout, self.inner.max_size);
                return Err(CacheError::PoolTimeout(self.inner.acquire_timeout));
            }
            match self.inner.idle_rx.recv_timeout((deadline - now).min(WAIT_SLICE)) {
                Ok(conn) => return Ok(self.wrap(conn)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(CacheError::new("connection pool closed")),
            }
        }
    }

    fn open(&self) -> Result<PooledConnection<C>, CacheError> {
        match (self.inner.factory)() {
            Ok(conn) => {
                debug!("Opened pooled connection {}/{}", self.size(), self.inner.max_size);
                Ok(self.wrap(conn))
            }
            Err(e) => {
                self.inner.free_slot();
                Err(e)
            }
        }
    }

    fn wrap(&self, conn: C) -> PooledConnection<C> {
        PooledConnection { conn: Some(conn), pool: Arc::clone(&self.inner) }
    }

    /// Connections currently open, borrowed or idle.
    pub fn size(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    pub fn idle(&self) -> usize {
        self.inner.idle_rx.len()
    }

    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }
}

impl ConnectionPool<TcpConnection> {
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, CacheError> {
        settings.pool.validate()?;
        let transport = settings.transport.clone();
        Ok(Self::new(settings.pool.max_size, settings.pool.acquire_timeout_ms, move || TcpConnection::connect(&transport)))
    }
}

impl ConnectionPool<MemoryConnection> {
    pub fn in_memory(cache: &MemoryCache, max_size: usize, acquire_timeout: Duration) -> Self {
        let cache = cache.clone();
        Self::new(max_size, acquire_timeout, move || Ok(cache.connect()))
    }
}

/// Exclusive loan of a pooled connection, returned to the pool on drop.
pub struct PooledConnection<C: CacheConnection> {
    conn: Option<C>,
    pool: Arc<PoolInner<C>>,
}

impl<C: CacheConnection> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<C: CacheConnection> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if conn.is_broken() {
                debug!("Discarding broken connection");
                self.pool.free_slot();
            } else if self.pool.idle_tx.send(conn).is_err() {
                self.pool.free_slot();
            }
        }
    }
}
