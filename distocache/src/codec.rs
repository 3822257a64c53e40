//! Payload codecs turning typed elements into the opaque byte strings stored remotely.
//!
//! The proxies never look inside a payload, so any symmetric encoding works. [`Bincode`] is the
//! default; [`Json`] trades size for payloads that other tools can read.

use crate::wire::MAX_FRAME_LEN;
use crate::CacheError;
use bincode::config::standard;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait PayloadCodec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CacheError>;
    fn decode(&self, payload: &[u8]) -> Result<T, CacheError>;
}

/// Compact binary encoding using bincode's standard configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bincode;

impl<T: Serialize + DeserializeOwned> PayloadCodec<T> for Bincode {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        Ok(bincode::serde::encode_to_vec(value, standard())?)
    }

    fn decode(&self, payload: &[u8]) -> Result<T, CacheError> {
        let (value, _) = bincode::serde::decode_from_slice::<T, _>(payload, standard().with_limit::<MAX_FRAME_LEN>())?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl<T: Serialize + DeserializeOwned> PayloadCodec<T> for Json {
    fn encode(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, payload: &[u8]) -> Result<T, CacheError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u64,
        sku: String,
        lines: Vec<(String, i32)>,
        note: Option<String>,
    }

    fn sample() -> Order {
        Order {
            id: 42,
            sku: "A-17".into(),
            lines: vec![("bolt".into(), 3), ("nut".into(), -1)],
            note: None,
        }
    }

    #[test]
    fn bincode_decodes_what_it_encodes() {
        let payload = Bincode.encode(&sample()).unwrap();
        let decoded: Order = Bincode.decode(&payload).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn json_decodes_what_it_encodes() {
        let payload = Json.encode(&sample()).unwrap();
        assert!(std::str::from_utf8(&payload).unwrap().contains("\"sku\":\"A-17\""));
        let decoded: Order = Json.decode(&payload).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(Bincode.encode(&sample()).unwrap(), Bincode.encode(&sample()).unwrap());
    }

    #[test]
    fn truncated_payload_fails_to_decode() {
        let payload = Bincode.encode(&sample()).unwrap();
        let res: Result<Order, _> = Bincode.decode(&payload[..payload.len() / 2]);
        assert!(matches!(res, Err(CacheError::Decode(_))));
    }

    #[test]
    fn forged_string_length_fails_without_allocating() {
        let mut payload = vec![0xFD];
        payload.extend_from_slice(&(1u64 << 62).to_le_bytes());
        let res: Result<String, _> = Bincode.decode(&payload);
        assert!(matches!(res, Err(CacheError::Decode(_))));
    }

    #[test]
    fn garbage_json_fails_to_decode() {
        let res: Result<Order, _> = Json.decode(b"{not json");
        assert!(matches!(res, Err(CacheError::Json(_))));
    }
}
