use crate::collection::CollectionKind;
use crate::{CacheError, Position};
use bincode::config::standard;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Message the cache service answers to a duplicate allocation.
pub const ENTRY_EXISTS: &str = "Entry already exists";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Allocate { key: String, kind: CollectionKind },
    Deallocate { key: String },
    AddCollectionEntry { key: String, payload: Vec<u8> },
    PushBackValue { key: String, payload: Vec<u8> },
    PushFrontValue { key: String, payload: Vec<u8> },
    Insert { key: String, payload: Vec<u8>, position: Position, repetition: usize },
    GetCollectionEntryAt { key: String, position: Position },
    SetCollectionEntryAt { key: String, position: Position, payload: Vec<u8> },
    GetFrontValue { key: String },
    GetBackValue { key: String },
    RemoveCollectionEntryAt { key: String, position: Position },
    PopBackValue { key: String },
    PopFrontValue { key: String },
    PopGetBackValue { key: String },
    PopGetFrontValue { key: String },
    Size { key: String },
    IsEmpty { key: String },
    Clear { key: String },
}

impl Request {
    pub fn key(&self) -> &str {
        match self {
            Request::Allocate { key, .. }
            | Request::Deallocate { key }
            | Request::AddCollectionEntry { key, .. }
            | Request::PushBackValue { key, .. }
            | Request::PushFrontValue { key, .. }
            | Request::Insert { key, .. }
            | Request::GetCollectionEntryAt { key, .. }
            | Request::SetCollectionEntryAt { key, .. }
            | Request::GetFrontValue { key }
            | Request::GetBackValue { key }
            | Request::RemoveCollectionEntryAt { key, .. }
            | Request::PopBackValue { key }
            | Request::PopFrontValue { key }
            | Request::PopGetBackValue { key }
            | Request::PopGetFrontValue { key }
            | Request::Size { key }
            | Request::IsEmpty { key }
            | Request::Clear { key } => key,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::Allocate { .. } => "allocate",
            Request::Deallocate { .. } => "deallocate",
            Request::AddCollectionEntry { .. } => "addCollectionEntry",
            Request::PushBackValue { .. } => "pushBackValue",
            Request::PushFrontValue { .. } => "pushFrontValue",
            Request::Insert { .. } => "insert",
            Request::GetCollectionEntryAt { .. } => "getCollectionEntryAt",
            Request::SetCollectionEntryAt { .. } => "setCollectionEntryAt",
            Request::GetFrontValue { .. } => "getFrontValue",
            Request::GetBackValue { .. } => "getBackValue",
            Request::RemoveCollectionEntryAt { .. } => "removeCollectionEntryAt",
            Request::PopBackValue { .. } => "popBackValue",
            Request::PopFrontValue { .. } => "popFrontValue",
            Request::PopGetBackValue { .. } => "popGetBackValue",
            Request::PopGetFrontValue { .. } => "popGetFrontValue",
            Request::Size { .. } => "size",
            Request::IsEmpty { .. } => "isEmpty",
            Request::Clear { .. } => "clear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AlreadyExists,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Done,
    Payload(Vec<u8>),
    Size(u64),
    Empty(bool),
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn failure(message: impl Into<String>) -> Self {
        Response::Error { kind: ErrorKind::Failure, message: message.into() }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Response::Done => "done",
            Response::Payload(_) => "payload",
            Response::Size(_) => "size",
            Response::Empty(_) => "empty",
            Response::Error { .. } => "error",
        }
    }
}

fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, CacheError> {
    let body = bincode::serde::encode_to_vec(msg, standard())?;
    if body.len() > MAX_FRAME_LEN {
        return Err(CacheError::Protocol(format!("frame of {} bytes exceeds limit {}", body.len(), MAX_FRAME_LEN)));
    }
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

fn checked_len(len: u32) -> Result<usize, CacheError> {
    let len = len as usize;
    if len > MAX_FRAME_LEN {
        Err(CacheError::Protocol(format!("frame of {} bytes exceeds limit {}", len, MAX_FRAME_LEN)))
    } else {
        Ok(len)
    }
}

/// Length prefixes inside a body are bounded too, so a forged one fails instead of allocating.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, CacheError> {
    let (msg, _) = bincode::serde::decode_from_slice::<T, _>(body, standard().with_limit::<MAX_FRAME_LEN>())?;
    Ok(msg)
}

pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<(), CacheError> {
    writer.write_all(&encode_frame(msg)?)?;
    writer.flush()?;
    Ok(())
}

pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, CacheError> {
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let mut body = vec![0u8; checked_len(u32::from_be_bytes(len))?];
    reader.read_exact(&mut body)?;
    decode_body(&body)
}

pub async fn write_frame_async<W: AsyncWrite + Unpin, T: Serialize>(writer: &mut W, msg: &T) -> Result<(), CacheError> {
    writer.write_all(&encode_frame(msg)?).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame, `Ok(None)` when the peer closed the stream cleanly between frames.
pub async fn read_frame_async<R: AsyncRead + Unpin, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>, CacheError> {
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut body = vec![0u8; checked_len(len)?];
    reader.read_exact(&mut body).await?;
    decode_body(&body).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_reports_its_key_and_call_name() {
        let req = Request::Insert { key: "v1".into(), payload: vec![1], position: 2, repetition: 3 };
        assert_eq!(req.key(), "v1");
        assert_eq!(req.name(), "insert");
        assert_eq!(Request::PopGetFrontValue { key: "d1".into() }.name(), "popGetFrontValue");
    }

    #[test]
    fn frames_are_length_prefixed() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Response::Size(7)).unwrap();
        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(len, buf.len() - 4);
    }

    #[test]
    fn consecutive_frames_read_back_in_order() {
        let mut buf = Vec::new();
        let first = Request::Allocate { key: "d1".into(), kind: CollectionKind::Deque };
        let second = Request::PushFrontValue { key: "d1".into(), payload: vec![20] };
        write_frame(&mut buf, &first).unwrap();
        write_frame(&mut buf, &second).unwrap();

        let mut reader = Cursor::new(buf);
        assert_eq!(read_frame::<_, Request>(&mut reader).unwrap(), first);
        assert_eq!(read_frame::<_, Request>(&mut reader).unwrap(), second);
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut buf = (MAX_FRAME_LEN as u32 + 1).to_be_bytes().to_vec();
        buf.extend_from_slice(&[0; 16]);
        let res = read_frame::<_, Response>(&mut Cursor::new(buf));
        assert!(matches!(res, Err(CacheError::Protocol(_))));
    }

    #[test]
    fn truncated_frame_is_an_io_error() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Response::Payload(vec![9; 32])).unwrap();
        buf.truncate(10);
        let res = read_frame::<_, Response>(&mut Cursor::new(buf));
        assert!(matches!(res, Err(CacheError::Io(_))));
    }

    #[test]
    fn forged_inner_length_is_a_decode_error() {
        let mut body = vec![0x00, 0xFD];
        body.extend_from_slice(&(1u64 << 62).to_le_bytes());
        let mut buf = (body.len() as u32).to_be_bytes().to_vec();
        buf.extend_from_slice(&body);
        let res = read_frame::<_, Request>(&mut Cursor::new(buf));
        assert!(matches!(res, Err(CacheError::Decode(_))));
    }

    #[tokio::test]
    async fn async_reader_sees_clean_eof_as_none() {
        let mut buf = Vec::new();
        write_frame_async(&mut buf, &Response::Empty(true)).await.unwrap();
        let mut reader = buf.as_slice();
        let first: Option<Response> = read_frame_async(&mut reader).await.unwrap();
        assert_eq!(first, Some(Response::Empty(true)));
        let second: Option<Response> = read_frame_async(&mut reader).await.unwrap();
        assert_eq!(second, None);
    }
}
