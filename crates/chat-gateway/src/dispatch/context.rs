//! Per-dispatch context handed to handlers

use chat_common::WireEncoding;
use serde::de::DeserializeOwned;

use crate::protocol::{CodecError, Frame};

/// The frame a handler is reacting to
#[derive(Debug, Clone)]
pub struct Context {
    frame: Frame,
}

impl Context {
    pub(crate) fn new(frame: Frame) -> Self {
        Self { frame }
    }

    #[inline]
    pub fn event_type(&self) -> &str {
        self.frame.event_type()
    }

    /// Bytes exactly as received
    #[inline]
    pub fn raw(&self) -> &[u8] {
        self.frame.raw()
    }

    #[inline]
    pub fn encoding(&self) -> WireEncoding {
        self.frame.encoding()
    }

    /// Decode the raw frame into another shape, e.g. to read fields the typed payload omits
    pub fn decode_raw<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        self.frame.decode()
    }
}
