//! Position cursors over a remote collection.
//!
//! A [`Cursor`] is a position plus a borrow of the proxy it came from. It owns no connection:
//! `get` and `set` go through the proxy's connection, one round trip each. Moving a cursor never
//! talks to the server and is never bounds checked, so a cursor stepped past either end only
//! fails once it is dereferenced.
//!
//! Cursors are handed out inside [`DistCollection::cursors`](crate::DistCollection::cursors), which
//! tags them with a lifetime unique to that call. Equality looks at positions only, and the tag
//! makes it impossible to compare cursors coming from two different proxies:
//!
//! ```compile_fail
//! use distocache::{ConnectionPool, DistVector, MemoryCache, MemoryConnection};
//! use std::time::Duration;
//!
//! let pool = ConnectionPool::in_memory(&MemoryCache::new(), 2, Duration::from_secs(1));
//! let a: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "a").unwrap();
//! let b: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "b").unwrap();
//! a.cursors(|ca| b.cursors(|cb| ca.begin() == cb.begin()));
//! ```

use crate::{CacheError, Position};
use std::fmt;
use std::marker::PhantomData;

/// Position of a cursor that was never placed.
pub const UNSET: Position = -1;

/// Positional access a cursor needs from its proxy.
pub trait RemoteSeq {
    type Item;

    fn get_at(&self, position: Position) -> Result<Self::Item, CacheError>;
    fn set_at(&self, position: Position, value: &Self::Item) -> Result<(), CacheError>;
    fn len(&self) -> Result<usize, CacheError>;
}

#[derive(Clone, Copy)]
struct Brand<'id>(PhantomData<fn(&'id ()) -> &'id ()>);

impl Brand<'_> {
    fn new() -> Self {
        Brand(PhantomData)
    }
}

/// Cursor factory for one proxy.
///
/// ```
/// use distocache::{ConnectionPool, DistVector, MemoryCache, MemoryConnection};
/// use std::time::Duration;
///
/// let pool = ConnectionPool::in_memory(&MemoryCache::new(), 1, Duration::from_secs(1));
/// let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "doc").unwrap();
/// v.push_back(&1).unwrap();
/// v.push_back(&2).unwrap();
/// let sum = v.cursors(|c| {
///     let (mut it, end) = (c.begin(), c.end().unwrap());
///     let mut sum = 0;
///     while it != end {
///         sum += it.get().unwrap();
///         it.advance();
///     }
///     sum
/// });
/// assert_eq!(sum, 3);
/// ```
pub struct Cursors<'p, 'id, P: ?Sized> {
    seq: &'p P,
    brand: Brand<'id>,
}

impl<P: ?Sized> Clone for Cursors<'_, '_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for Cursors<'_, '_, P> {}

impl<'p, 'id, P: RemoteSeq + ?Sized> Cursors<'p, 'id, P> {
    pub(crate) fn new(seq: &'p P) -> Self {
        Self { seq, brand: Brand::new() }
    }

    pub fn at(&self, position: Position) -> Cursor<'p, 'id, P> {
        Cursor { seq: self.seq, position, _brand: self.brand }
    }

    pub fn begin(&self) -> Cursor<'p, 'id, P> {
        self.at(0)
    }

    /// Cursor one past the last element, as of this call. Later pushes or erases on the
    /// collection do not move it.
    pub fn end(&self) -> Result<Cursor<'p, 'id, P>, CacheError> {
        let len = self.seq.len()?;
        let position = Position::try_from(len).map_err(|_| CacheError::Protocol(format!("size {} exceeds position range", len)))?;
        Ok(self.at(position))
    }

    pub fn unset(&self) -> Cursor<'p, 'id, P> {
        self.at(UNSET)
    }
}

pub struct Cursor<'p, 'id, P: ?Sized> {
    seq: &'p P,
    position: Position,
    _brand: Brand<'id>,
}

impl<P: ?Sized> Clone for Cursor<'_, '_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for Cursor<'_, '_, P> {}

impl<'p, 'id, P: RemoteSeq + ?Sized> Cursor<'p, 'id, P> {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn get(&self) -> Result<P::Item, CacheError> {
        self.seq.get_at(self.checked_position()?)
    }

    pub fn set(&self, value: &P::Item) -> Result<(), CacheError> {
        self.seq.set_at(self.checked_position()?, value)
    }

    fn checked_position(&self) -> Result<Position, CacheError> {
        if self.position < 0 {
            Err(CacheError::InvalidPosition(self.position))
        } else {
            Ok(self.position)
        }
    }

    pub fn advance(&mut self) -> &mut Self {
        self.advance_by(1)
    }

    pub fn retreat(&mut self) -> &mut Self {
        self.retreat_by(1)
    }

    pub fn advance_by(&mut self, n: Position) -> &mut Self {
        self.position = self.position.wrapping_add(n);
        self
    }

    pub fn retreat_by(&mut self, n: Position) -> &mut Self {
        self.position = self.position.wrapping_sub(n);
        self
    }

    /// Moves forward, returning the cursor as it was before the move.
    pub fn post_advance(&mut self) -> Self {
        let prior = *self;
        self.position = self.position.wrapping_add(1);
        prior
    }

    pub fn post_retreat(&mut self) -> Self {
        let prior = *self;
        self.position = self.position.wrapping_sub(1);
        prior
    }
}

impl<P: ?Sized> PartialEq for Cursor<'_, '_, P> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<P: ?Sized> Eq for Cursor<'_, '_, P> {}

impl<P: ?Sized> fmt::Debug for Cursor<'_, '_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("position", &self.position).finish()
    }
}

/// Reads positions `0..end` one round trip at a time.
pub struct Iter<'p, P: ?Sized> {
    seq: &'p P,
    next: usize,
    end: usize,
}

impl<'p, P: RemoteSeq + ?Sized> Iter<'p, P> {
    pub(crate) fn new(seq: &'p P, end: usize) -> Self {
        Self { seq, next: 0, end }
    }
}

impl<P: RemoteSeq + ?Sized> Iterator for Iter<'_, P> {
    type Item = Result<P::Item, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let item = self.seq.get_at(self.next as Position);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.end - self.next;
        (left, Some(left))
    }
}

impl<P: RemoteSeq + ?Sized> ExactSizeIterator for Iter<'_, P> {}
