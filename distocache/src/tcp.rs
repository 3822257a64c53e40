use crate::client::CacheConnection;
use crate::settings::TransportSettings;
use crate::wire::{read_frame, write_frame, Request, Response};
use crate::{warn, CacheError};
use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct Stream {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// Blocking connection to a cache server speaking length-prefixed bincode frames.
pub struct TcpConnection {
    stream: Mutex<Stream>,
    peer: String,
    broken: AtomicBool,
}

impl TcpConnection {
    pub fn connect(settings: &TransportSettings) -> Result<Self, CacheError> {
        let addr = settings
            .address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| CacheError::new(format!("address {} did not resolve", settings.address)))?;
        let stream = if settings.connect_timeout_ms.is_zero() {
            TcpStream::connect(addr)?
        } else {
            TcpStream::connect_timeout(&addr, settings.connect_timeout_ms)?
        };
        let io_timeout = Some(settings.io_timeout_ms).filter(|t| !t.is_zero());
        stream.set_read_timeout(io_timeout)?;
        stream.set_write_timeout(io_timeout)?;
        stream.set_nodelay(true)?;
        Self::from_stream(stream, settings.address.clone())
    }

    pub fn from_stream(stream: TcpStream, peer: String) -> Result<Self, CacheError> {
        let writer = BufWriter::new(stream.try_clone()?);
        Ok(Self {
            stream: Mutex::new(Stream { reader: BufReader::new(stream), writer }),
            peer,
            broken: AtomicBool::new(false),
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn io_timeout(&self) -> Result<Option<Duration>, CacheError> {
        Ok(self.stream.lock()?.reader.get_ref().read_timeout()?)
    }
}

impl CacheConnection for TcpConnection {
    fn call(&self, request: Request) -> Result<Response, CacheError> {
        let mut stream = self.stream.lock()?;
        let Stream { reader, writer } = &mut *stream;
        let res = write_frame(writer, &request).and_then(|_| read_frame(reader));
        if let Err(e) = &res {
            warn!("Connection to {} broken during {}: {}", self.peer, request.name(), e);
            self.broken.store(true, Ordering::SeqCst);
        }
        res
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::SeqCst)
    }
}
