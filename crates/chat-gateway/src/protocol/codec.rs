//! Frame codec
//!
//! JSON frames travel as text messages, binary frames as MessagePack maps.

use std::sync::Arc;

use chat_common::WireEncoding;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("Malformed batch: {0}")]
    Batch(String),
}

/// Serialize a value into a WebSocket message
pub fn encode<T: Serialize>(encoding: WireEncoding, value: &T) -> Result<Message, CodecError> {
    Ok(match encoding {
        WireEncoding::Json => Message::Text(serde_json::to_string(value)?),
        WireEncoding::Binary => Message::Binary(rmp_serde::to_vec_named(value)?),
    })
}

/// Serialize a value into raw frame bytes
pub fn encode_value<T: Serialize>(encoding: WireEncoding, value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(match encoding {
        WireEncoding::Json => serde_json::to_vec(value)?,
        WireEncoding::Binary => rmp_serde::to_vec_named(value)?,
    })
}

pub fn decode<T: DeserializeOwned>(encoding: WireEncoding, bytes: &[u8]) -> Result<T, CodecError> {
    Ok(match encoding {
        WireEncoding::Json => serde_json::from_slice(bytes)?,
        WireEncoding::Binary => rmp_serde::from_slice(bytes)?,
    })
}

/// Build `base?v=<version>&encoding=<json|binary>`
pub fn gateway_url(base: &str, version: u32, encoding: WireEncoding) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("v", &version.to_string())
        .append_pair("encoding", encoding.as_str());
    Ok(url)
}

/// One inbound frame: the raw bytes plus the discriminator read from them.
///
/// Cloning shares the byte buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    raw: Arc<[u8]>,
    encoding: WireEncoding,
    event_type: String,
}

impl Frame {
    pub fn new(raw: impl Into<Arc<[u8]>>, encoding: WireEncoding, event_type: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            encoding,
            event_type: event_type.into(),
        }
    }

    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    #[inline]
    pub fn encoding(&self) -> WireEncoding {
        self.encoding
    }

    #[inline]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        decode(self.encoding, &self.raw)
    }

    /// Same bytes under another discriminator
    #[must_use]
    pub fn retyped(&self, event_type: impl Into<String>) -> Self {
        Self {
            raw: Arc::clone(&self.raw),
            encoding: self.encoding,
            event_type: event_type.into(),
        }
    }

    /// Split a `{v: [...]}` batch into one frame per item.
    ///
    /// Items without a string `type` come back as `None`.
    pub fn batch_items(&self) -> Result<Vec<Option<Frame>>, CodecError> {
        match self.encoding {
            WireEncoding::Json => self.json_batch_items(),
            WireEncoding::Binary => self.binary_batch_items(),
        }
    }

    fn json_batch_items(&self) -> Result<Vec<Option<Frame>>, CodecError> {
        #[derive(Deserialize)]
        struct Batch {
            v: Vec<serde_json::Value>,
        }

        let batch: Batch = serde_json::from_slice(&self.raw)?;
        batch
            .v
            .into_iter()
            .map(|item| {
                let Some(event_type) = item.get("type").and_then(serde_json::Value::as_str) else {
                    return Ok(None);
                };
                let event_type = event_type.to_string();
                let raw = serde_json::to_vec(&item)?;
                Ok(Some(Frame::new(raw, WireEncoding::Json, event_type)))
            })
            .collect()
    }

    // Items are re-encoded from a MessagePack value tree so extension types survive
    fn binary_batch_items(&self) -> Result<Vec<Option<Frame>>, CodecError> {
        let value = rmpv::decode::read_value(&mut &self.raw[..])
            .map_err(|e| CodecError::Batch(e.to_string()))?;
        let items = map_get(&value, "v")
            .and_then(rmpv::Value::as_array)
            .ok_or_else(|| CodecError::Batch("missing `v` list".to_string()))?;

        items
            .iter()
            .map(|item| {
                let Some(event_type) = map_get(item, "type").and_then(rmpv::Value::as_str) else {
                    return Ok(None);
                };
                let mut raw = Vec::new();
                rmpv::encode::write_value(&mut raw, item)
                    .map_err(|e| CodecError::Batch(e.to_string()))?;
                Ok(Some(Frame::new(raw, WireEncoding::Binary, event_type)))
            })
            .collect()
    }
}

fn map_get<'a>(value: &'a rmpv::Value, key: &str) -> Option<&'a rmpv::Value> {
    value
        .as_map()?
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gateway_url() {
        let url = gateway_url("wss://ws.example.com", 1, WireEncoding::Json).unwrap();
        assert_eq!(url.as_str(), "wss://ws.example.com/?v=1&encoding=json");

        let url = gateway_url("ws://127.0.0.1:9000/events", 2, WireEncoding::Binary).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:9000/events?v=2&encoding=binary");
    }

    #[test]
    fn test_gateway_url_rejects_garbage() {
        assert!(gateway_url("not a url", 1, WireEncoding::Json).is_err());
    }

    #[test]
    fn test_encode_message_kind() {
        let text = encode(WireEncoding::Json, &json!({"type": "Ping", "data": 1})).unwrap();
        assert!(matches!(text, Message::Text(_)));

        let binary = encode(WireEncoding::Binary, &json!({"type": "Ping", "data": 1})).unwrap();
        assert!(matches!(binary, Message::Binary(_)));
    }

    #[test]
    fn test_binary_frames_are_maps() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Probe {
            #[serde(rename = "type")]
            kind: String,
        }

        let bytes = encode_value(WireEncoding::Binary, &Probe { kind: "Pong".into() }).unwrap();
        let envelope: crate::protocol::Envelope = decode(WireEncoding::Binary, &bytes).unwrap();
        assert_eq!(envelope.event_type, "Pong");
    }

    #[test]
    fn test_json_batch_items() {
        let raw = serde_json::to_vec(&json!({
            "type": "Bulk",
            "v": [
                {"type": "ChannelStartTyping", "id": "c1", "user": "u1"},
                {"id": "no-type"},
                {"type": "MessageDelete", "id": "m1", "channel": "c1"}
            ]
        }))
        .unwrap();
        let frame = Frame::new(raw, WireEncoding::Json, "Bulk");

        let items = frame.batch_items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().event_type(), "ChannelStartTyping");
        assert!(items[1].is_none());
        assert_eq!(items[2].as_ref().unwrap().event_type(), "MessageDelete");
    }

    #[test]
    fn test_binary_batch_items() {
        let raw = rmp_serde::to_vec_named(&json!({
            "type": "Bulk",
            "v": [{"type": "ServerDelete", "id": "s1"}]
        }))
        .unwrap();
        let frame = Frame::new(raw, WireEncoding::Binary, "Bulk");

        let items = frame.batch_items().unwrap();
        let item = items[0].as_ref().unwrap();
        assert_eq!(item.event_type(), "ServerDelete");
        let value: serde_json::Value = item.decode().unwrap();
        assert_eq!(value["id"], "s1");
    }

    #[test]
    fn test_batch_without_list_is_an_error() {
        let frame = Frame::new(br#"{"type":"Bulk"}"#.to_vec(), WireEncoding::Json, "Bulk");
        assert!(frame.batch_items().is_err());
    }

    #[test]
    fn test_retyped_shares_bytes() {
        let frame = Frame::new(b"{}".to_vec(), WireEncoding::Json, "Auth");
        let inner = frame.retyped("DeleteSession");
        assert_eq!(inner.event_type(), "DeleteSession");
        assert_eq!(inner.raw(), frame.raw());
    }
}
