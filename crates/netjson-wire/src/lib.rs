//! Wire token format for channel values embedded in JSON documents.
//!
//! A channel has no native JSON form, so its binary encoding travels inside
//! an ordinary string literal:
//! - A fixed opening delimiter `//chan(`
//! - The payload as unpadded URL-safe base64
//! - A fixed closing delimiter `)//`
//!
//! When written, the slashes are escaped, so the literal reads
//! `"\//chan(...)\//"`. These bytes are part of the interchange contract and
//! never change between versions.

pub mod error;
pub mod token;

pub use error::{Result, WireError};
pub use token::{
    decode_payload, interior, is_wrapped, token_len, unwrap, wrap, PREFIX, QUOTED_PREFIX,
    QUOTED_SUFFIX, SUFFIX,
};
