/// Errors that can occur while wrapping or unwrapping channel tokens.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The string does not carry the channel token delimiters.
    #[error("string is not a wrapped channel token")]
    NotWrapped,

    /// The text between the delimiters is not unpadded URL-safe base64.
    #[error("invalid channel payload encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The token buffer could not hold the encoded payload.
    #[error("channel token encoding failed: {0}")]
    Encode(#[from] base64::EncodeSliceError),

    /// The decode buffer could not hold the decoded payload.
    #[error("channel payload buffer too small")]
    BufferTooSmall,

    /// The payload is too large for its token length to be addressable.
    #[error("channel payload too large to wrap ({0} bytes)")]
    LengthOverflow(usize),
}

pub type Result<T> = std::result::Result<T, WireError>;
