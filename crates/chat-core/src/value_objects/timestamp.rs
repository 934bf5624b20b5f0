//! Timestamp codec shared by both wire encodings
//!
//! JSON frames carry time as integer milliseconds since the Unix epoch (older
//! payloads use RFC 3339 strings); the binary encoding carries MessagePack's
//! native timestamp extension (type `-1`). Use with `#[serde(with = ...)]`.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serializer};
use std::fmt;

/// MessagePack extension type reserved for timestamps
const MSGPACK_TIMESTAMP_EXT: i8 = -1;

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(value.timestamp_millis())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(TimestampVisitor)
}

/// Same codec for optional fields
pub mod option {
    use super::TimestampVisitor;
    use chrono::{DateTime, Utc};
    use serde::de::{Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => super::serialize(ts, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OptionVisitor;

        impl<'de> Visitor<'de> for OptionVisitor {
            type Value = Option<DateTime<Utc>>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an optional timestamp")
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(TimestampVisitor).map(Some)
            }
        }

        deserializer.deserialize_option(OptionVisitor)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("epoch milliseconds, an RFC 3339 string, or a MessagePack timestamp")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Utc.timestamp_millis_opt(value)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {value}")))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let millis = i64::try_from(value).map_err(|_| E::custom("timestamp out of range"))?;
        self.visit_i64(millis)
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_i64(value as i64)
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        DateTime::parse_from_rfc3339(value)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| E::custom(format!("invalid timestamp string: {e}")))
    }

    // rmp-serde surfaces extension values as a newtype wrapping `(tag, bytes)`
    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (tag, data): (i8, serde_bytes::ByteBuf) = Deserialize::deserialize(deserializer)?;
        if tag != MSGPACK_TIMESTAMP_EXT {
            return Err(de::Error::custom(format!("unexpected extension type {tag}")));
        }
        decode_msgpack_timestamp(&data).map_err(de::Error::custom)
    }
}

/// Decode the payload of a MessagePack timestamp extension (32, 64 or 96 bit form)
pub fn decode_msgpack_timestamp(data: &[u8]) -> Result<DateTime<Utc>, String> {
    let (secs, nanos) = match data.len() {
        4 => {
            let secs = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            (i64::from(secs), 0u32)
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(data);
            let raw = u64::from_be_bytes(buf);
            ((raw & 0x0000_0003_ffff_ffff) as i64, (raw >> 34) as u32)
        }
        12 => {
            let nanos = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&data[4..]);
            (i64::from_be_bytes(buf), nanos)
        }
        len => return Err(format!("invalid timestamp extension length {len}")),
    };

    Utc.timestamp_opt(secs, nanos)
        .single()
        .ok_or_else(|| format!("timestamp out of range: {secs}s {nanos}ns"))
}
