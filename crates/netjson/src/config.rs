/// Default maximum size of a single streamed document: 16 MiB.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Controls encoding and streaming behavior of a [`Codec`](crate::Codec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// When true, `<`, `>` and `&` inside strings are written as unicode
    /// escapes so documents can be embedded in HTML. Default: true.
    pub escape_html: bool,
    /// Maximum bytes a [`DocumentReader`](crate::DocumentReader) buffers for
    /// one document. Default: 16 MiB.
    pub max_document_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            escape_html: true,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}
