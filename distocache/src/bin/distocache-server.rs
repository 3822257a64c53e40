use distocache::server::serve;
use distocache::{error, info, CacheError, CacheSettings, MemoryCache};
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), CacheError> {
    let settings = CacheSettings::new("config/settings")?;
    let listener = TcpListener::bind(&settings.server.bind_address).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(_) => info!("Received ctrl-c"),
            Err(e) => error!("Unable to listen for ctrl-c: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    serve(MemoryCache::new(), listener, shutdown_rx).await
}
