use crate::client::{CacheClient, CacheConnection};
use crate::codec::{Bincode, PayloadCodec};
use crate::collection::{Deque, DistCollection};
use crate::CacheError;

/// Double-ended proxy onto a remote collection allocated as `deque`.
pub type DistDeque<T, C, D = Bincode> = DistCollection<T, Deque, C, D>;

impl<T, C, D> DistCollection<T, Deque, C, D>
where
    C: CacheConnection,
    D: PayloadCodec<T>,
{
    pub fn push_back(&self, value: &T) -> Result<(), CacheError> {
        self.conn.push_back_value(&self.key, self.encode(value)?)
    }

    pub fn push_front(&self, value: &T) -> Result<(), CacheError> {
        self.conn.push_front_value(&self.key, self.encode(value)?)
    }

    pub fn pop_back(&self) -> Result<(), CacheError> {
        self.conn.pop_back_value(&self.key)
    }

    pub fn pop_front(&self) -> Result<(), CacheError> {
        self.conn.pop_front_value(&self.key)
    }

    /// Removes and returns the last element in a single round trip.
    pub fn pop_get_back(&self) -> Result<T, CacheError> {
        self.decode(self.conn.pop_get_back_value(&self.key)?)
    }

    /// Removes and returns the first element in a single round trip.
    pub fn pop_get_front(&self) -> Result<T, CacheError> {
        self.decode(self.conn.pop_get_front_value(&self.key)?)
    }
}
