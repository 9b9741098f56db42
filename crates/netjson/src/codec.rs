use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use bytes::BytesMut;

use crate::capability::{ChannelDecoder, ChannelEncoder};
use crate::config::CodecConfig;
use crate::decode::DecodeState;
use crate::encode::EncodeState;
use crate::error::Result;
use crate::reader::DocumentReader;
use crate::value::Value;
use crate::writer::DocumentWriter;

/// Encodes and decodes documents, delegating channels to injected hooks.
///
/// Without an encoder, encoding a channel fails with
/// [`Error::UnsupportedType`](crate::Error::UnsupportedType). Without a
/// decoder, every string read into a channel slot is a type mismatch, even
/// one that looks like a channel token.
#[derive(Clone, Default)]
pub struct Codec {
    config: CodecConfig,
    encoder: Option<Arc<dyn ChannelEncoder + Send + Sync>>,
    decoder: Option<Arc<dyn ChannelDecoder + Send + Sync>>,
}

impl Codec {
    /// Create a codec with default config and no channel hooks.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create a codec with explicit config and no channel hooks.
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            encoder: None,
            decoder: None,
        }
    }

    /// Install the hook used to turn channels into bytes.
    pub fn with_encoder<E>(mut self, encoder: E) -> Self
    where
        E: ChannelEncoder + Send + Sync + 'static,
    {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Install the hook used to rebuild channels from bytes.
    pub fn with_decoder<D>(mut self, decoder: D) -> Self
    where
        D: ChannelDecoder + Send + Sync + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Toggle HTML escaping for subsequent encodes.
    pub fn set_escape_html(&mut self, escape_html: bool) {
        self.config.escape_html = escape_html;
    }

    /// Current codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn has_encoder(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    /// Encode `value` as a compact JSON document.
    ///
    /// Any failure, including an unsupported or failing channel, aborts the
    /// whole document.
    pub fn to_vec(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(self.encode(value)?.to_vec())
    }

    /// Encode `value` as a compact JSON document string.
    pub fn to_string(&self, value: &Value) -> Result<String> {
        let bytes = self.to_vec(value)?;
        // The encoder only ever writes UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decode `data` into `dest`, using its current contents as a template.
    ///
    /// Channel slots in `dest` are filled in place. Type mismatches and
    /// channel failures do not stop decoding: every other value is stored
    /// and the first such error is returned.
    pub fn from_slice(&self, data: &[u8], dest: &mut Value) -> Result<()> {
        let decoder = self
            .decoder
            .as_deref()
            .map(|decoder| decoder as &dyn ChannelDecoder);
        DecodeState::new(data, decoder).unmarshal(dest)
    }

    /// Wrap a stream that documents are written to.
    pub fn writer<W: Write>(&self, inner: W) -> DocumentWriter<W> {
        DocumentWriter::with_codec(inner, self.clone())
    }

    /// Wrap a stream that documents are read from.
    pub fn reader<R: Read>(&self, inner: R) -> DocumentReader<R> {
        DocumentReader::with_codec(inner, self.clone())
    }

    pub(crate) fn encode(&self, value: &Value) -> Result<BytesMut> {
        let encoder = self
            .encoder
            .as_deref()
            .map(|encoder| encoder as &dyn ChannelEncoder);
        let mut state = EncodeState::new(self.config.escape_html, encoder);
        state.value(value)?;
        Ok(state.into_bytes())
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("config", &self.config)
            .field("encoder", &self.has_encoder())
            .field("decoder", &self.has_decoder())
            .finish()
    }
}
