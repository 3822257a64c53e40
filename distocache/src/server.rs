use crate::memory::MemoryCache;
use crate::wire::{read_frame_async, write_frame_async, Request, Response};
use crate::{error, info, CacheError};
use log::debug;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

async fn handle(cache: MemoryCache, mut socket: TcpStream, peer: SocketAddr) -> Result<(), CacheError> {
    let (mut reader, mut writer) = socket.split();
    while let Some(request) = read_frame_async::<_, Request>(&mut reader).await? {
        debug!("{} {} from {}", request.name(), request.key(), peer);
        let response: Response = cache.apply(request);
        write_frame_async(&mut writer, &response).await?;
    }
    Ok(())
}

/// Serves `cache` on `listener` until `shutdown` flips, one task per client connection.
pub async fn serve(cache: MemoryCache, listener: TcpListener, shutdown: watch::Receiver<bool>) -> Result<(), CacheError> {
    let mut shutdown = shutdown.clone();
    info!("Cache server listening on {}", listener.local_addr()?);
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutting down cache server...");
                    return Ok(());
                }
            }
            accepted = listener.accept() => {
                if !dispatch(&cache, accepted) {
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Spawns a task for an accepted client. Accept failures such as descriptor exhaustion only
/// concern that attempt, so they are logged and the listener keeps going.
fn dispatch(cache: &MemoryCache, accepted: std::io::Result<(TcpStream, SocketAddr)>) -> bool {
    match accepted {
        Ok((socket, peer)) => {
            let cache = cache.clone();
            tokio::spawn(async move {
                if let Err(e) = handle(cache, socket, peer).await {
                    error!("Connection {} failed: {}", peer, e);
                }
            });
            true
        }
        Err(e) => {
            error!("Accepting a connection failed: {}", e);
            false
        }
    }
}
