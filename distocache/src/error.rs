use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;
use crate::Position;

#[derive(Debug, Error)]
pub enum CacheError {

    #[error("Collection already allocated: {0}")]
    AlreadyAllocated(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(Position),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No connection available within {0:?}")]
    PoolTimeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl CacheError {
    pub fn new(msg: impl Into<String>) -> Self {
        CacheError::Custom(msg.into())
    }

    pub fn is_already_allocated(&self) -> bool {
        matches!(self, CacheError::AlreadyAllocated(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, CacheError::Remote(_))
    }
}

impl<T> From<PoisonError<T>> for CacheError
{
    fn from(e: PoisonError<T>) -> Self {
        CacheError::Custom(format!("Poison error: {:?}", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn error_kinds_are_distinguishable() {
        assert!(CacheError::AlreadyAllocated("v1".into()).is_already_allocated());
        assert!(!CacheError::Remote("boom".into()).is_already_allocated());
        assert!(CacheError::Remote("boom".into()).is_remote());
        assert!(!CacheError::InvalidPosition(-1).is_remote());
    }

    #[test]
    fn remote_error_carries_server_message() {
        let err = CacheError::Remote("Index out of bounds".into());
        assert_eq!(err.to_string(), "Remote error: Index out of bounds");
    }

    #[test]
    fn poisoned_lock_maps_to_custom() {
        let lock = Arc::new(Mutex::new(0));
        let cloned = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        }).join();
        let err: CacheError = lock.lock().unwrap_err().into();
        assert!(matches!(err, CacheError::Custom(msg) if msg.starts_with("Poison error")));
    }
}
