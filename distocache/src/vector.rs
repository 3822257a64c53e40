use crate::client::{CacheClient, CacheConnection};
use crate::codec::{Bincode, PayloadCodec};
use crate::collection::{DistCollection, Vector};
use crate::CacheError;

/// Array-like proxy onto a remote collection allocated as `vector`.
pub type DistVector<T, C, D = Bincode> = DistCollection<T, Vector, C, D>;

impl<T, C, D> DistCollection<T, Vector, C, D>
where
    C: CacheConnection,
    D: PayloadCodec<T>,
{
    pub fn push_back(&self, value: &T) -> Result<(), CacheError> {
        self.conn.add_collection_entry(&self.key, self.encode(value)?)
    }
}
