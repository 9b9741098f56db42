//! JSON encoding and decoding with pluggable channel value support.
//!
//! Documents are built from [`Value`], which adds a [`Channel`] variant to the
//! usual JSON kinds. Channels cannot be written as plain JSON, so the
//! [`Codec`] hands them to a caller-supplied [`ChannelEncoder`] and embeds the
//! resulting bytes in a string token (see [`netjson_wire`]). On the way back
//! a [`ChannelDecoder`] rebuilds the channel in place inside a pre-allocated
//! destination tree.
//!
//! ```
//! use netjson::{BoxError, Channel, Codec, Value};
//!
//! let codec = Codec::new()
//!     .with_encoder(|_: &Channel| -> Result<Vec<u8>, BoxError> { Ok(vec![0xFF, 0x00]) })
//!     .with_decoder(|dest: &mut Channel, payload: &[u8]| -> Result<(), BoxError> {
//!         *dest = Channel::new(payload.to_vec());
//!         Ok(())
//!     });
//!
//! let wire = codec.to_string(&Value::Channel(Channel::new(7u32))).unwrap();
//! assert_eq!(wire, r#""\//chan(_wA)\//""#);
//!
//! let mut dest = Value::Channel(Channel::nil::<Vec<u8>>());
//! codec.from_slice(wire.as_bytes(), &mut dest).unwrap();
//! ```

pub mod capability;
pub mod codec;
pub mod compact;
pub mod config;
pub mod error;
pub mod reader;
pub mod value;
pub mod writer;

mod channel;
mod decode;
mod encode;

pub use capability::{BoxError, ChannelDecoder, ChannelEncoder};
pub use codec::Codec;
pub use compact::compact;
pub use config::{CodecConfig, DEFAULT_MAX_DOCUMENT_SIZE};
pub use error::{Error, Result};
pub use reader::DocumentReader;
pub use value::{Channel, Map, Value};
pub use writer::DocumentWriter;

/// Re-export of the wire token format.
pub mod wire {
    pub use netjson_wire::*;
}
