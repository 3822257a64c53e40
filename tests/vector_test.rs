use distocache::wire::{Request, Response};
use distocache::*;
use std::time::Duration;

fn pool(cache: &MemoryCache, max_size: usize) -> ConnectionPool<MemoryConnection> {
    ConnectionPool::in_memory(cache, max_size, Duration::from_millis(50))
}

fn contents(v: &DistVector<i32, MemoryConnection>) -> Vec<i32> {
    v.iter().unwrap().collect::<Result<_, _>>().unwrap()
}

#[test]
fn it_should_push_back_onto_an_empty_vector() {
    let cache = MemoryCache::new();
    let v: DistVector<String, MemoryConnection> = DistVector::open(&pool(&cache, 1), "names").unwrap();
    v.push_back(&"ada".to_string()).unwrap();
    assert_eq!(v.size().unwrap(), 1);
    assert_eq!(v.at(0).unwrap(), "ada");
    assert_eq!(v.back().unwrap(), "ada");
}

#[test]
fn it_should_behave_like_a_local_vector() {
    let cache = MemoryCache::new();
    let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool(&cache, 1), "v1").unwrap();
    for i in 1..=3 {
        v.push_back(&i).unwrap();
    }
    assert_eq!(v.size().unwrap(), 3);
    assert_eq!(v.at(0).unwrap(), 1);
    assert_eq!(v.at(2).unwrap(), 3);
    assert_eq!(v.front().unwrap(), 1);
    assert_eq!(v.back().unwrap(), 3);

    v.insert(&99, 1).unwrap();
    assert_eq!(v.at(1).unwrap(), 99);
    assert_eq!(contents(&v), vec![1, 99, 2, 3]);
    v.erase(1).unwrap();
    assert_eq!(contents(&v), vec![1, 2, 3]);
}

#[test]
fn it_should_tolerate_double_allocation() {
    let cache = MemoryCache::new();
    let pool = pool(&cache, 2);
    let first: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "shared").unwrap();
    first.push_back(&7).unwrap();
    let second: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "shared").unwrap();
    assert_eq!(second.at(0).unwrap(), 7);
}

#[test]
fn it_should_see_changes_made_through_other_proxies() {
    let cache = MemoryCache::new();
    let pool = pool(&cache, 2);
    let reader: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "shared").unwrap();
    let writer: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "shared").unwrap();
    assert!(reader.is_empty().unwrap());
    writer.push_back(&1).unwrap();
    writer.push_back(&2).unwrap();
    assert_eq!(reader.size().unwrap(), 2);
    assert!(!reader.is_empty().unwrap());
}

#[test]
fn it_should_keep_the_key_usable_after_clear() {
    let cache = MemoryCache::new();
    let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool(&cache, 1), "v1").unwrap();
    v.push_back(&1).unwrap();
    v.clear().unwrap();
    assert!(v.is_empty().unwrap());
    assert_eq!(v.size().unwrap(), 0);
    v.push_back(&2).unwrap();
    assert_eq!(v.front().unwrap(), 2);
}

#[test]
fn it_should_restore_size_after_insert_and_erase() {
    let cache = MemoryCache::new();
    let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool(&cache, 1), "v1").unwrap();
    for i in 0..5 {
        v.push_back(&i).unwrap();
    }
    for p in 0..=5 {
        let before = v.size().unwrap();
        v.insert(&-1, p).unwrap();
        assert_eq!(v.at(p).unwrap(), -1);
        assert_eq!(v.size().unwrap(), before + 1);
        v.erase(p).unwrap();
        assert_eq!(v.size().unwrap(), before);
    }
}

#[test]
fn it_should_surface_remote_errors_verbatim() {
    let cache = MemoryCache::new();
    let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool(&cache, 1), "v1").unwrap();
    assert!(v.at(0).unwrap_err().is_remote());
    assert!(v.front().unwrap_err().is_remote());
    assert!(v.erase(3).unwrap_err().is_remote());
}

#[test]
fn it_should_outlive_the_proxy_until_freed() {
    let cache = MemoryCache::new();
    let pool = pool(&cache, 1);
    {
        let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "v1").unwrap();
        v.push_back(&5).unwrap();
    }
    assert!(cache.contains("v1"));

    let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "v1").unwrap();
    assert_eq!(v.at(0).unwrap(), 5);
    v.free().unwrap();
    assert!(!cache.contains("v1"));

    let reopened: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "v1").unwrap();
    assert!(reopened.is_empty().unwrap());
}

#[test]
fn it_should_release_the_connection_when_dropped() {
    let cache = MemoryCache::new();
    let pool = pool(&cache, 1);
    let v: DistVector<i32, MemoryConnection> = DistVector::open(&pool, "v1").unwrap();
    assert!(matches!(DistVector::<i32, MemoryConnection>::open(&pool, "v2"), Err(CacheError::PoolTimeout(_))));
    drop(v);
    assert_eq!(pool.idle(), 1);
    assert!(DistVector::<i32, MemoryConnection>::open(&pool, "v2").is_ok());
}

/// Refuses every allocation with a failure other than "already exists".
struct Refusing;

impl CacheConnection for Refusing {
    fn call(&self, request: Request) -> Result<Response, CacheError> {
        match request {
            Request::Allocate { .. } => Ok(Response::failure("Out of memory")),
            _ => Ok(Response::Done),
        }
    }
}

#[test]
fn it_should_propagate_allocation_failures_and_release_the_connection() {
    let pool = ConnectionPool::new(1, Duration::from_millis(50), || Ok(Refusing));
    match DistVector::<i32, Refusing>::open(&pool, "v1") {
        Err(CacheError::Remote(msg)) => assert_eq!(msg, "Out of memory"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    assert_eq!(pool.idle(), 1);
}
