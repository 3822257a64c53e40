//! distocache makes a vector or deque living in a shared cache service look like a local ordered
//! collection.
//!
//! A [`DistVector`] or [`DistDeque`] holds one connection borrowed from a [`ConnectionPool`] and a
//! cache key. Every operation is a single round trip: values are encoded with a [`PayloadCodec`]
//! (bincode by default), sent as opaque payloads, and decoded on the way back. Nothing is cached
//! client side, so several proxies, in one process or many, can share a key and always see the
//! server's current state. Atomicity is per call; `pop_get_front`/`pop_get_back` exist to read and
//! remove in one call.
//!
//! The server side is provided by [`MemoryCache`], reachable in-process through
//! [`MemoryConnection`] or over TCP with [`TcpConnection`] and [`server::serve`].

pub mod client;
pub mod codec;
pub mod collection;
pub mod csv;
pub mod cursor;
pub mod deque;
pub mod error;
pub mod logger;
pub mod memory;
pub mod pool;
pub mod server;
pub mod settings;
pub mod tcp;
pub mod template;
pub mod vector;
pub mod wire;

/// Zero based index into a remote collection. Negative values never address an element.
pub type Position = i64;

pub use client::{CacheClient, CacheConnection};
pub use codec::{Bincode, Json, PayloadCodec};
pub use collection::{CollectionKind, Deque, DistCollection, Kind, Vector};
pub use csv::CsvFileReader;
pub use cursor::{Cursor, Cursors, Iter, RemoteSeq, UNSET};
pub use deque::DistDeque;
pub use error::CacheError;
pub use memory::{MemoryCache, MemoryConnection};
pub use pool::{ConnectionPool, PooledConnection};
pub use settings::CacheSettings;
pub use tcp::TcpConnection;
pub use template::{StringContext, TemplateEngine};
pub use vector::DistVector;
