//! In-process cache service holding every collection in memory.
//!
//! [`MemoryCache`] implements the server side of the collection calls and is what the TCP server
//! dispatches into. [`MemoryConnection`] talks to it directly, without a socket.

use crate::client::CacheConnection;
use crate::collection::CollectionKind;
use crate::wire::{ErrorKind, Request, Response, ENTRY_EXISTS, MAX_FRAME_LEN};
use crate::{CacheError, Position};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

struct Entry {
    kind: CollectionKind,
    items: VecDeque<Vec<u8>>,
}

impl Entry {
    fn slot(&self, position: Position) -> Result<usize, Response> {
        usize::try_from(position)
            .ok()
            .filter(|p| *p < self.items.len())
            .ok_or_else(|| out_of_bounds(position, self.items.len()))
    }

    fn deque_only(&self, call: &str) -> Result<(), Response> {
        match self.kind {
            CollectionKind::Deque => Ok(()),
            CollectionKind::Vector => Err(Response::failure(format!("{} is not supported on a vector", call))),
        }
    }
}

fn out_of_bounds(position: Position, len: usize) -> Response {
    Response::failure(format!("Index {} out of bounds for size {}", position, len))
}

fn empty_collection() -> Response {
    Response::failure("Collection is empty")
}

#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self) -> MemoryConnection {
        MemoryConnection { cache: self.clone() }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }

    pub fn kind_of(&self, key: &str) -> Option<CollectionKind> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).map(|e| e.kind)
    }

    /// Executes one request atomically with respect to every other request on this cache.
    pub fn apply(&self, request: Request) -> Response {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match request {
            Request::Allocate { key, kind } => {
                if entries.contains_key(&key) {
                    Response::Error { kind: ErrorKind::AlreadyExists, message: ENTRY_EXISTS.to_string() }
                } else {
                    entries.insert(key, Entry { kind, items: VecDeque::new() });
                    Response::Done
                }
            }
            Request::Deallocate { key } => match entries.remove(&key) {
                Some(_) => Response::Done,
                None => missing(&key),
            },
            other => {
                let key = other.key().to_owned();
                match entries.get_mut(&key) {
                    Some(entry) => Self::apply_to(entry, other).unwrap_or_else(|err| err),
                    None => missing(&key),
                }
            }
        }
    }

    fn apply_to(entry: &mut Entry, request: Request) -> Result<Response, Response> {
        let response = match request {
            Request::AddCollectionEntry { payload, .. } => {
                entry.items.push_back(payload);
                Response::Done
            }
            Request::PushBackValue { payload, .. } => {
                entry.deque_only("pushBackValue")?;
                entry.items.push_back(payload);
                Response::Done
            }
            Request::PushFrontValue { payload, .. } => {
                entry.deque_only("pushFrontValue")?;
                entry.items.push_front(payload);
                Response::Done
            }
            Request::Insert { payload, position, repetition, .. } => {
                let len = entry.items.len();
                let at = usize::try_from(position).ok().filter(|p| *p <= len).ok_or_else(|| out_of_bounds(position, len))?;
                // One insert may not grow the store by more than a frame's worth of data.
                let expansion = repetition.checked_mul(payload.len().max(1)).filter(|n| *n <= MAX_FRAME_LEN);
                if expansion.is_none() || entry.items.try_reserve(repetition).is_err() {
                    return Err(Response::failure(format!("Repetition {} too large for insert", repetition)));
                }
                let tail = entry.items.split_off(at);
                entry.items.extend(std::iter::repeat(payload).take(repetition));
                entry.items.extend(tail);
                Response::Done
            }
            Request::GetCollectionEntryAt { position, .. } => {
                let at = entry.slot(position)?;
                Response::Payload(entry.items[at].clone())
            }
            Request::SetCollectionEntryAt { position, payload, .. } => {
                let at = entry.slot(position)?;
                entry.items[at] = payload;
                Response::Done
            }
            Request::GetFrontValue { .. } => Response::Payload(entry.items.front().cloned().ok_or_else(empty_collection)?),
            Request::GetBackValue { .. } => Response::Payload(entry.items.back().cloned().ok_or_else(empty_collection)?),
            Request::RemoveCollectionEntryAt { position, .. } => {
                let at = entry.slot(position)?;
                entry.items.remove(at);
                Response::Done
            }
            Request::PopBackValue { .. } => {
                entry.deque_only("popBackValue")?;
                entry.items.pop_back().ok_or_else(empty_collection)?;
                Response::Done
            }
            Request::PopFrontValue { .. } => {
                entry.deque_only("popFrontValue")?;
                entry.items.pop_front().ok_or_else(empty_collection)?;
                Response::Done
            }
            Request::PopGetBackValue { .. } => {
                entry.deque_only("popGetBackValue")?;
                Response::Payload(entry.items.pop_back().ok_or_else(empty_collection)?)
            }
            Request::PopGetFrontValue { .. } => {
                entry.deque_only("popGetFrontValue")?;
                Response::Payload(entry.items.pop_front().ok_or_else(empty_collection)?)
            }
            Request::Size { .. } => Response::Size(entry.items.len() as u64),
            Request::IsEmpty { .. } => Response::Empty(entry.items.is_empty()),
            Request::Clear { .. } => {
                entry.items.clear();
                Response::Done
            }
            Request::Allocate { .. } | Request::Deallocate { .. } => Response::failure("unreachable collection request"),
        };
        Ok(response)
    }
}

fn missing(key: &str) -> Response {
    Response::failure(format!("Entry not found: {}", key))
}

#[derive(Clone)]
pub struct MemoryConnection {
    cache: MemoryCache,
}

impl MemoryConnection {
    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }
}

impl CacheConnection for MemoryConnection {
    fn call(&self, request: Request) -> Result<Response, CacheError> {
        Ok(self.cache.apply(request))
    }
}
