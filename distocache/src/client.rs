use crate::collection::CollectionKind;
use crate::wire::{ErrorKind, Request, Response};
use crate::{CacheError, Position};
use log::debug;

/// A single request/response channel to the cache service.
pub trait CacheConnection {
    fn call(&self, request: Request) -> Result<Response, CacheError>;

    /// A broken connection is dropped by the pool instead of being handed out again.
    fn is_broken(&self) -> bool {
        false
    }
}

fn checked(request: Request, conn: &(impl CacheConnection + ?Sized)) -> Result<Response, CacheError> {
    let name = request.name();
    debug!("{} {}", name, request.key());
    match conn.call(request)? {
        Response::Error { kind: ErrorKind::AlreadyExists, message } => Err(CacheError::AlreadyAllocated(message)),
        Response::Error { kind: ErrorKind::Failure, message } => {
            debug!("{} failed: {}", name, message);
            Err(CacheError::Remote(message))
        }
        other => Ok(other),
    }
}

fn unexpected(call: &str, response: &Response) -> CacheError {
    CacheError::Protocol(format!("{} answered with {}", call, response.describe()))
}

fn done(request: Request, conn: &(impl CacheConnection + ?Sized)) -> Result<(), CacheError> {
    let name = request.name();
    match checked(request, conn)? {
        Response::Done => Ok(()),
        other => Err(unexpected(name, &other)),
    }
}

fn payload(request: Request, conn: &(impl CacheConnection + ?Sized)) -> Result<Vec<u8>, CacheError> {
    let name = request.name();
    match checked(request, conn)? {
        Response::Payload(bytes) => Ok(bytes),
        other => Err(unexpected(name, &other)),
    }
}

/// Typed remote call surface, available on every [`CacheConnection`].
pub trait CacheClient: CacheConnection {
    fn allocate(&self, key: &str, kind: CollectionKind) -> Result<(), CacheError> {
        done(Request::Allocate { key: key.to_owned(), kind }, self)
    }

    fn deallocate(&self, key: &str) -> Result<(), CacheError> {
        done(Request::Deallocate { key: key.to_owned() }, self)
    }

    fn add_collection_entry(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError> {
        done(Request::AddCollectionEntry { key: key.to_owned(), payload }, self)
    }

    fn push_back_value(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError> {
        done(Request::PushBackValue { key: key.to_owned(), payload }, self)
    }

    fn push_front_value(&self, key: &str, payload: Vec<u8>) -> Result<(), CacheError> {
        done(Request::PushFrontValue { key: key.to_owned(), payload }, self)
    }

    fn insert(&self, key: &str, payload: Vec<u8>, position: Position, repetition: usize) -> Result<(), CacheError> {
        done(Request::Insert { key: key.to_owned(), payload, position, repetition }, self)
    }

    fn get_collection_entry_at(&self, key: &str, position: Position) -> Result<Vec<u8>, CacheError> {
        payload(Request::GetCollectionEntryAt { key: key.to_owned(), position }, self)
    }

    fn set_collection_entry_at(&self, key: &str, position: Position, payload: Vec<u8>) -> Result<(), CacheError> {
        done(Request::SetCollectionEntryAt { key: key.to_owned(), position, payload }, self)
    }

    fn get_front_value(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        payload(Request::GetFrontValue { key: key.to_owned() }, self)
    }

    fn get_back_value(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        payload(Request::GetBackValue { key: key.to_owned() }, self)
    }

    fn remove_collection_entry_at(&self, key: &str, position: Position) -> Result<(), CacheError> {
        done(Request::RemoveCollectionEntryAt { key: key.to_owned(), position }, self)
    }

    fn pop_back_value(&self, key: &str) -> Result<(), CacheError> {
        done(Request::PopBackValue { key: key.to_owned() }, self)
    }

    fn pop_front_value(&self, key: &str) -> Result<(), CacheError> {
        done(Request::PopFrontValue { key: key.to_owned() }, self)
    }

    fn pop_get_back_value(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        payload(Request::PopGetBackValue { key: key.to_owned() }, self)
    }

    fn pop_get_front_value(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        payload(Request::PopGetFrontValue { key: key.to_owned() }, self)
    }

    fn size(&self, key: &str) -> Result<usize, CacheError> {
        match checked(Request::Size { key: key.to_owned() }, self)? {
            Response::Size(n) => usize::try_from(n).map_err(|_| CacheError::Protocol(format!("size {} overflows usize", n))),
            other => Err(unexpected("size", &other)),
        }
    }

    fn is_empty(&self, key: &str) -> Result<bool, CacheError> {
        match checked(Request::IsEmpty { key: key.to_owned() }, self)? {
            Response::Empty(empty) => Ok(empty),
            other => Err(unexpected("isEmpty", &other)),
        }
    }

    fn clear(&self, key: &str) -> Result<(), CacheError> {
        done(Request::Clear { key: key.to_owned() }, self)
    }
}

impl<C: CacheConnection + ?Sized> CacheClient for C {}
