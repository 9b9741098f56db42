use crate::capability::BoxError;

/// Errors that can occur while encoding or decoding documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A channel was met during encoding but no encoder is configured.
    #[error("unsupported type: {type_name}")]
    UnsupportedType { type_name: &'static str },

    /// The channel encoder failed, or its token failed validation.
    #[error("error encoding value of type {type_name}: {source}")]
    Marshal {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    /// A JSON value cannot be stored in the destination slot.
    #[error("cannot decode {value} into value of type {type_name} (offset {offset})")]
    UnmarshalType {
        /// Kind of the JSON value found in the input.
        value: &'static str,
        /// Declared type of the destination.
        type_name: &'static str,
        /// Byte offset just past the offending value.
        offset: usize,
    },

    /// The channel decoder rejected a payload.
    #[error("error decoding value of type {type_name}: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    /// A channel token payload could not be unwrapped.
    #[error("channel token error: {0}")]
    Wire(#[from] netjson_wire::WireError),

    /// The input is not valid JSON, or a value could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoder lost its place in input that already passed validation.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        offset: usize,
        message: &'static str,
    },

    /// An I/O error occurred while reading or writing documents.
    #[error("document I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly between documents.
    #[error("end of document stream")]
    EndOfStream,

    /// The stream ended in the middle of a document.
    #[error("stream closed inside a document")]
    UnexpectedEof,

    /// A streamed document exceeds the configured maximum size.
    #[error("document too large ({size} bytes, max {max})")]
    DocumentTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
