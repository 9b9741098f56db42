use std::io;

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::capability::ChannelEncoder;
use crate::channel::encode_channel;
use crate::compact::html_escape;
use crate::error::Result;
use crate::value::Value;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Compact JSON formatter applying the codec's string escaping rules.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HtmlSafeFormatter {
    escape_html: bool,
}

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            match html_escape(&bytes[i..], self.escape_html) {
                Some((seq, width)) => {
                    writer.write_all(&bytes[start..i])?;
                    writer.write_all(seq)?;
                    i += width;
                    start = i;
                }
                None => i += 1,
            }
        }
        writer.write_all(&bytes[start..])
    }
}

/// Output buffer and options for one document encode.
pub(crate) struct EncodeState<'a> {
    pub(crate) buf: BytesMut,
    pub(crate) escape_html: bool,
    pub(crate) encoder: Option<&'a dyn ChannelEncoder>,
}

impl<'a> EncodeState<'a> {
    pub(crate) fn new(escape_html: bool, encoder: Option<&'a dyn ChannelEncoder>) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            escape_html,
            encoder,
        }
    }

    /// Append `value` to the buffer. Any error leaves the buffer unusable.
    pub(crate) fn value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.buf.put_slice(b"null"),
            Value::Bool(true) => self.buf.put_slice(b"true"),
            Value::Bool(false) => self.buf.put_slice(b"false"),
            Value::Number(n) => self.scalar(n)?,
            Value::String(s) => self.scalar(s.as_str())?,
            Value::Array(items) => {
                self.buf.put_u8(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buf.put_u8(b',');
                    }
                    self.value(item)?;
                }
                self.buf.put_u8(b']');
            }
            Value::Object(map) => {
                self.buf.put_u8(b'{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        self.buf.put_u8(b',');
                    }
                    self.scalar(key.as_str())?;
                    self.buf.put_u8(b':');
                    self.value(item)?;
                }
                self.buf.put_u8(b'}');
            }
            Value::Channel(channel) => encode_channel(self, channel)?,
        }
        Ok(())
    }

    fn scalar<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let formatter = HtmlSafeFormatter {
            escape_html: self.escape_html,
        };
        let mut ser = serde_json::Serializer::with_formatter((&mut self.buf).writer(), formatter);
        value.serialize(&mut ser)?;
        Ok(())
    }

    pub(crate) fn into_bytes(self) -> BytesMut {
        self.buf
    }
}
