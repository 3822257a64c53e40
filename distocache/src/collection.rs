//! Proxy shared by [`DistVector`](crate::DistVector) and [`DistDeque`](crate::DistDeque).
//!
//! A proxy owns one pooled connection and a cache key. It keeps no element state locally: every
//! call below is exactly one round trip, so `size()` and friends always reflect what the server
//! holds right now, including changes made by other clients sharing the key.

use crate::client::{CacheClient, CacheConnection};
use crate::codec::{Bincode, PayloadCodec};
use crate::cursor::{Cursors, Iter, RemoteSeq};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::{CacheError, Position};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    Vector,
    Deque,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Vector => "vector",
            CollectionKind::Deque => "deque",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Compile-time tag selecting which remote calls a proxy issues.
pub trait Kind: sealed::Sealed {
    const KIND: CollectionKind;
}

#[derive(Debug, Clone, Copy)]
pub enum Vector {}

#[derive(Debug, Clone, Copy)]
pub enum Deque {}

impl sealed::Sealed for Vector {}
impl sealed::Sealed for Deque {}

impl Kind for Vector {
    const KIND: CollectionKind = CollectionKind::Vector;
}

impl Kind for Deque {
    const KIND: CollectionKind = CollectionKind::Deque;
}

pub struct DistCollection<T, K: Kind, C: CacheConnection, D = Bincode> {
    pub(crate) key: String,
    pub(crate) conn: PooledConnection<C>,
    pub(crate) codec: D,
    _marker: PhantomData<fn() -> (T, K)>,
}

impl<T, K, C, D> DistCollection<T, K, C, D>
where
    K: Kind,
    C: CacheConnection,
    D: PayloadCodec<T>,
{
    /// Borrows a connection from `pool` and allocates `key` unless it already exists.
    pub fn open(pool: &ConnectionPool<C>, key: impl Into<String>) -> Result<Self, CacheError>
    where
        D: Default,
    {
        Self::with_codec(pool, key, D::default())
    }

    pub fn with_codec(pool: &ConnectionPool<C>, key: impl Into<String>, codec: D) -> Result<Self, CacheError> {
        let conn = pool.acquire()?;
        Self::attach(conn, key, codec)
    }

    /// Allocates `key` over an already borrowed connection. On failure the connection goes back
    /// to its pool.
    pub fn attach(conn: PooledConnection<C>, key: impl Into<String>, codec: D) -> Result<Self, CacheError> {
        let key = key.into();
        match conn.allocate(&key, K::KIND) {
            Ok(()) => debug!("Allocated {} {}", K::KIND, key),
            Err(CacheError::AlreadyAllocated(_)) => debug!("Reusing existing {}", key),
            Err(e) => return Err(e),
        }
        Ok(Self { key, conn, codec, _marker: PhantomData })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> CollectionKind {
        K::KIND
    }

    pub(crate) fn encode(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        self.codec.encode(value)
    }

    pub(crate) fn decode(&self, payload: Vec<u8>) -> Result<T, CacheError> {
        self.codec.decode(&payload)
    }

    /// Inserts `value` before `position`; `size()` is a valid position and appends.
    pub fn insert(&self, value: &T, position: Position) -> Result<(), CacheError> {
        self.insert_n(value, position, 1)
    }

    pub fn insert_n(&self, value: &T, position: Position, repetition: usize) -> Result<(), CacheError> {
        self.conn.insert(&self.key, self.encode(value)?, position, repetition)
    }

    pub fn at(&self, position: Position) -> Result<T, CacheError> {
        self.decode(self.conn.get_collection_entry_at(&self.key, position)?)
    }

    pub fn front(&self) -> Result<T, CacheError> {
        self.decode(self.conn.get_front_value(&self.key)?)
    }

    pub fn back(&self) -> Result<T, CacheError> {
        self.decode(self.conn.get_back_value(&self.key)?)
    }

    pub fn erase(&self, position: Position) -> Result<(), CacheError> {
        self.conn.remove_collection_entry_at(&self.key, position)
    }

    pub fn size(&self) -> Result<usize, CacheError> {
        self.conn.size(&self.key)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        self.conn.is_empty(&self.key)
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.conn.clear(&self.key)
    }

    /// Deallocates the remote collection. The proxy is consumed and its connection released
    /// whether or not the call succeeds.
    pub fn free(self) -> Result<(), CacheError> {
        self.conn.deallocate(&self.key)
    }

    /// Runs `f` with a cursor factory branded to this proxy; see [`Cursors`].
    pub fn cursors<'p, R, F>(&'p self, f: F) -> R
    where
        F: for<'id> FnOnce(Cursors<'p, 'id, Self>) -> R,
    {
        f(Cursors::new(self))
    }

    /// Iterates positions `0..size()`, with `size()` taken now.
    pub fn iter(&self) -> Result<Iter<'_, Self>, CacheError> {
        Ok(Iter::new(self, self.size()?))
    }
}

impl<T, K, C, D> RemoteSeq for DistCollection<T, K, C, D>
where
    K: Kind,
    C: CacheConnection,
    D: PayloadCodec<T>,
{
    type Item = T;

    fn get_at(&self, position: Position) -> Result<T, CacheError> {
        self.at(position)
    }

    fn set_at(&self, position: Position, value: &T) -> Result<(), CacheError> {
        self.conn.set_collection_entry_at(&self.key, position, self.encode(value)?)
    }

    fn len(&self) -> Result<usize, CacheError> {
        self.size()
    }
}

impl<T, K: Kind, C: CacheConnection, D> fmt::Debug for DistCollection<T, K, C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistCollection").field("key", &self.key).field("kind", &K::KIND).finish()
    }
}
