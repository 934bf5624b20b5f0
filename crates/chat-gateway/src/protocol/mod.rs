//! Gateway wire protocol
//!
//! Outbound client frames, the minimal inbound envelope and the JSON/binary codec.

mod codec;
mod messages;

pub use codec::{decode, encode, encode_value, gateway_url, CodecError, Frame};
pub use messages::{ClientFrame, Envelope};
