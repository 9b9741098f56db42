//! Caller-supplied hooks converting channels to and from bytes.
//!
//! The codec never interprets a channel itself. It hands the channel to a
//! [`ChannelEncoder`] when writing and a [`ChannelDecoder`] when reading, and
//! only deals with the bytes they produce or consume.

use crate::value::Channel;

/// Error type returned by channel capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Converts a channel into the payload carried by its wire token.
pub trait ChannelEncoder {
    fn encode_channel(&self, channel: &Channel) -> Result<Vec<u8>, BoxError>;
}

/// Rebuilds a channel from the payload carried by its wire token.
pub trait ChannelDecoder {
    /// Overwrite `dest` with the channel represented by `payload`.
    fn decode_channel(&self, dest: &mut Channel, payload: &[u8]) -> Result<(), BoxError>;
}

impl<F> ChannelEncoder for F
where
    F: Fn(&Channel) -> Result<Vec<u8>, BoxError>,
{
    fn encode_channel(&self, channel: &Channel) -> Result<Vec<u8>, BoxError> {
        self(channel)
    }
}

impl<F> ChannelDecoder for F
where
    F: Fn(&mut Channel, &[u8]) -> Result<(), BoxError>,
{
    fn decode_channel(&self, dest: &mut Channel, payload: &[u8]) -> Result<(), BoxError> {
        self(dest, payload)
    }
}
