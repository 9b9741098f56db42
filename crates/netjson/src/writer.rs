use std::io::{self, ErrorKind, Write};

use bytes::BufMut;
use tracing::trace;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::value::Value;

/// Writes newline-terminated documents to any `Write` stream.
pub struct DocumentWriter<T> {
    inner: T,
    codec: Codec,
}

impl<T: Write> DocumentWriter<T> {
    /// Create a document writer with a default codec.
    pub fn new(inner: T) -> Self {
        Self::with_codec(inner, Codec::new())
    }

    /// Create a document writer with an explicit codec.
    pub fn with_codec(inner: T, codec: Codec) -> Self {
        Self { inner, codec }
    }

    /// Encode and write one document followed by a newline (blocking).
    ///
    /// Nothing is written if encoding fails.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        let mut buf = self.codec.encode(value)?;
        buf.put_u8(b'\n');

        let mut offset = 0usize;
        while offset < buf.len() {
            match self.inner.write(&buf[offset..]) {
                Ok(0) => return Err(Error::Io(io::Error::from(ErrorKind::WriteZero))),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(Error::Io(err)),
            }
        }
        trace!(len = buf.len(), "wrote document");

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The codec used to encode documents.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}
