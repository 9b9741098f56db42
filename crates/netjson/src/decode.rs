use serde_json::Number;
use tracing::debug;

use crate::capability::ChannelDecoder;
use crate::channel::decode_channel;
use crate::error::{Error, Result};
use crate::value::{Map, Value};

/// Cursor over one input document plus the first error seen while storing
/// values into the destination.
///
/// The input is fully parsed once before the walk starts, strings and numbers
/// included, so nothing the walk reads can fail after `dest` is touched. Type mismatches and channel
/// failures are saved rather than returned: the first one is reported once
/// the rest of the document has been stored.
pub(crate) struct DecodeState<'a> {
    data: &'a [u8],
    off: usize,
    saved_error: Option<Error>,
    pub(crate) decoder: Option<&'a dyn ChannelDecoder>,
}

impl<'a> DecodeState<'a> {
    pub(crate) fn new(data: &'a [u8], decoder: Option<&'a dyn ChannelDecoder>) -> Self {
        Self {
            data,
            off: 0,
            saved_error: None,
            decoder,
        }
    }

    /// Current read position in the input.
    pub(crate) fn offset(&self) -> usize {
        self.off
    }

    /// Record `err` unless an earlier error is already recorded.
    pub(crate) fn save_error(&mut self, err: Error) {
        if self.saved_error.is_none() {
            debug!(offset = self.off, error = %err, "saved decode error");
            self.saved_error = Some(err);
        }
    }

    /// Decode the whole input into `dest`.
    ///
    /// Invalid JSON fails before `dest` is touched. Otherwise every value is
    /// stored and the first saved error, if any, is returned.
    pub(crate) fn unmarshal(mut self, dest: &mut Value) -> Result<()> {
        serde_json::from_slice::<serde_json::Value>(self.data)?;
        self.value(dest)?;
        match self.saved_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn value(&mut self, dest: &mut Value) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => self.object(dest),
            Some(b'[') => self.array(dest),
            Some(_) => self.literal(dest),
            None => Err(self.syntax_error("unexpected end of input")),
        }
    }

    fn object(&mut self, dest: &mut Value) -> Result<()> {
        if let Value::Channel(channel) = dest {
            return self.mismatch("object", channel.type_name());
        }

        let mut map = match std::mem::take(dest) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let result = self.object_members(&mut map);
        *dest = Value::Object(map);
        result
    }

    fn object_members(&mut self, map: &mut Map) -> Result<()> {
        self.off += 1; // '{'
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.off += 1;
            return Ok(());
        }

        loop {
            self.skip_whitespace();
            let key = self.string()?;
            self.skip_whitespace();
            if self.next_byte() != Some(b':') {
                return Err(self.syntax_error("expected ':' after object key"));
            }
            self.value(map.entry(key).or_default())?;

            self.skip_whitespace();
            match self.next_byte() {
                Some(b',') => {}
                Some(b'}') => return Ok(()),
                _ => return Err(self.syntax_error("expected ',' or '}' in object")),
            }
        }
    }

    fn array(&mut self, dest: &mut Value) -> Result<()> {
        if let Value::Channel(channel) = dest {
            return self.mismatch("array", channel.type_name());
        }

        let mut items = match std::mem::take(dest) {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let result = self.array_elements(&mut items);
        *dest = Value::Array(items);
        result
    }

    fn array_elements(&mut self, items: &mut Vec<Value>) -> Result<()> {
        self.off += 1; // '['
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.off += 1;
            items.clear();
            return Ok(());
        }

        let mut len = 0;
        loop {
            if len == items.len() {
                items.push(Value::Null);
            }
            self.value(&mut items[len])?;
            len += 1;

            self.skip_whitespace();
            match self.next_byte() {
                Some(b',') => {}
                Some(b']') => break,
                _ => return Err(self.syntax_error("expected ',' or ']' in array")),
            }
        }
        items.truncate(len);
        Ok(())
    }

    fn literal(&mut self, dest: &mut Value) -> Result<()> {
        match self.peek() {
            Some(b'"') => {
                let text = self.string()?;
                match dest {
                    Value::Channel(channel) => decode_channel(self, text.as_bytes(), channel),
                    other => *other = Value::String(text),
                }
            }
            Some(b'n') => {
                self.keyword(b"null")?;
                match dest {
                    Value::Channel(channel) => channel.clear(),
                    other => *other = Value::Null,
                }
            }
            Some(b't') => {
                self.keyword(b"true")?;
                self.store_bool(dest, true);
            }
            Some(b'f') => {
                self.keyword(b"false")?;
                self.store_bool(dest, false);
            }
            _ => {
                let number = self.number()?;
                match dest {
                    Value::Channel(channel) => self.save_error(Error::UnmarshalType {
                        value: "number",
                        type_name: channel.type_name(),
                        offset: self.off,
                    }),
                    other => *other = Value::Number(number),
                }
            }
        }
        Ok(())
    }

    fn store_bool(&mut self, dest: &mut Value, b: bool) {
        match dest {
            Value::Channel(channel) => self.save_error(Error::UnmarshalType {
                value: "bool",
                type_name: channel.type_name(),
                offset: self.off,
            }),
            other => *other = Value::Bool(b),
        }
    }

    /// Skip a value that cannot be stored, recording a type mismatch.
    fn mismatch(&mut self, value: &'static str, type_name: &'static str) -> Result<()> {
        let mut scratch = Value::Null;
        self.value(&mut scratch)?;
        self.save_error(Error::UnmarshalType {
            value,
            type_name,
            offset: self.off,
        });
        Ok(())
    }

    /// Read a string literal and return its unescaped content.
    fn string(&mut self) -> Result<String> {
        let start = self.off;
        if self.peek() != Some(b'"') {
            return Err(self.syntax_error("expected string"));
        }

        let mut i = start + 1;
        loop {
            match self.data.get(i) {
                Some(b'\\') => i += 2,
                Some(b'"') => break,
                Some(_) => i += 1,
                None => return Err(self.syntax_error("unterminated string")),
            }
        }
        self.off = i + 1;
        serde_json::from_slice(&self.data[start..self.off]).map_err(|_| Error::Syntax {
            offset: start,
            message: "invalid string literal",
        })
    }

    fn number(&mut self) -> Result<Number> {
        let start = self.off;
        while let Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') = self.peek() {
            self.off += 1;
        }
        if self.off == start {
            return Err(self.syntax_error("expected value"));
        }
        serde_json::from_slice(&self.data[start..self.off]).map_err(|_| Error::Syntax {
            offset: start,
            message: "invalid number",
        })
    }

    fn keyword(&mut self, word: &[u8]) -> Result<()> {
        if self.data[self.off..].starts_with(word) {
            self.off += word.len();
            Ok(())
        } else {
            Err(self.syntax_error("invalid literal"))
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.off += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.off).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.off += 1;
        Some(b)
    }

    fn syntax_error(&self, message: &'static str) -> Error {
        Error::Syntax {
            offset: self.off,
            message,
        }
    }
}
