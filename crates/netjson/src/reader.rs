use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use serde::de::IgnoredAny;
use tracing::{debug, trace};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::value::Value;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads successive JSON documents from any `Read` stream.
///
/// Handles partial reads internally. Documents may be separated by any
/// amount of whitespace.
pub struct DocumentReader<T> {
    inner: T,
    buf: BytesMut,
    codec: Codec,
    scan: Scan,
    eof: bool,
}

impl<T: Read> DocumentReader<T> {
    /// Create a document reader with a default codec.
    pub fn new(inner: T) -> Self {
        Self::with_codec(inner, Codec::new())
    }

    /// Create a document reader with an explicit codec.
    pub fn with_codec(inner: T, codec: Codec) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            codec,
            scan: Scan::default(),
            eof: false,
        }
    }

    /// Read the next document into `dest` (blocking).
    ///
    /// Returns [`Error::EndOfStream`] when the stream ends between documents
    /// and [`Error::UnexpectedEof`] when it ends inside one. Errors saved
    /// while storing values are returned after the document is consumed, so
    /// the next call starts at the following document.
    pub fn read_value(&mut self, dest: &mut Value) -> Result<()> {
        let max = self.codec.config().max_document_size;
        loop {
            let next = match self.next_document_len() {
                Ok(next) => next,
                Err(err) => {
                    // Drop the malformed input so the stream does not wedge on it.
                    self.discard();
                    return Err(err);
                }
            };
            if let Some(len) = next {
                let document = self.buf.split_to(len);
                self.scan = Scan::default();
                if len > max {
                    return Err(Error::DocumentTooLarge { size: len, max });
                }
                trace!(len, "read document");
                return self.codec.from_slice(&document, dest);
            }

            if self.eof {
                if self.buf.iter().all(u8::is_ascii_whitespace) {
                    self.buf.clear();
                    debug!("document stream closed");
                    return Err(Error::EndOfStream);
                }
                return Err(Error::UnexpectedEof);
            }

            if self.buf.len() > max {
                let size = self.buf.len();
                self.discard();
                return Err(Error::DocumentTooLarge { size, max });
            }

            self.fill()?;
        }
    }

    /// Length of the first complete document in the buffer, leading
    /// whitespace included.
    ///
    /// The buffer is only parsed once the scan says a value may have ended,
    /// so a document arriving in many small reads is not re-parsed per read.
    fn next_document_len(&mut self) -> Result<Option<usize>> {
        if !self.eof && !self.scan.advance(&self.buf) {
            return Ok(None);
        }

        let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<IgnoredAny>();
        match stream.next() {
            None => Ok(None),
            Some(Ok(_)) => Ok(Some(stream.byte_offset())),
            Some(Err(err)) if err.is_eof() => Ok(None),
            Some(Err(err)) => {
                debug!(error = %err, "malformed document input");
                Err(Error::Json(err))
            }
        }
    }

    fn discard(&mut self) {
        self.buf.clear();
        self.scan = Scan::default();
    }

    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    /// Number of buffered bytes not yet consumed as a document.
    pub fn buffered(&self) -> usize {
        self.buf.remaining()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The codec used to decode documents.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

/// Incremental scan for the end of the first top-level value in a buffer.
///
/// Tracks nesting and string state across reads. It does not validate; it
/// only decides when a full parse is worth attempting.
#[derive(Debug, Default)]
struct Scan {
    pos: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    scalar: Option<u8>,
}

impl Scan {
    /// Scan newly buffered bytes. Returns true if the first value may be
    /// complete.
    fn advance(&mut self, buf: &[u8]) -> bool {
        while let Some(&b) = buf.get(self.pos) {
            if self.in_string {
                self.pos += 1;
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return true;
                    }
                }
                continue;
            }

            if self.scalar.is_some() {
                if matches!(
                    b,
                    b' ' | b'\t' | b'\n' | b'\r' | b'"' | b'{' | b'}' | b'[' | b']' | b',' | b':'
                ) {
                    return true;
                }
                self.pos += 1;
                continue;
            }

            self.pos += 1;
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => {}
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return true;
                    }
                }
                _ if self.depth == 0 => self.scalar = Some(b),
                _ => {}
            }
        }

        // A number at the end of the buffer may still be growing; a keyword
        // is settled by the parser.
        matches!(self.scalar, Some(b't' | b'f' | b'n'))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::CodecConfig;

    #[test]
    fn reads_successive_documents() {
        let mut reader = DocumentReader::new(Cursor::new(b"{\"a\":1}\n[true]  \"x\"\n".to_vec()));

        let mut dest = Value::Null;
        reader.read_value(&mut dest).unwrap();
        assert!(dest.get("a").is_some());

        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_array().map(Vec::len), Some(1));

        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_str(), Some("x"));

        assert!(matches!(
            reader.read_value(&mut dest),
            Err(Error::EndOfStream)
        ));
    }

    #[test]
    fn trailing_number_waits_for_more_input() {
        let reader_input = ChunkedReader::new(vec![b"12".to_vec(), b"34 ".to_vec()]);
        let mut reader = DocumentReader::new(reader_input);

        let mut dest = Value::Null;
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_number().and_then(|n| n.as_u64()), Some(1234));
    }

    #[test]
    fn number_at_eof_is_complete() {
        let mut reader = DocumentReader::new(Cursor::new(b"42".to_vec()));
        let mut dest = Value::Null;
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_number().and_then(|n| n.as_u64()), Some(42));
    }

    #[test]
    fn document_split_across_reads() {
        let reader_input = ChunkedReader::new(vec![
            b"{\"na".to_vec(),
            b"me\":".to_vec(),
            b"\"pipe\"}".to_vec(),
        ]);
        let mut reader = DocumentReader::new(reader_input);

        let mut dest = Value::Null;
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.get("name").and_then(Value::as_str), Some("pipe"));
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn eof_inside_document() {
        let mut reader = DocumentReader::new(Cursor::new(b"{\"a\":".to_vec()));
        let mut dest = Value::Null;
        assert!(matches!(
            reader.read_value(&mut dest),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = DocumentReader::new(Cursor::new(b" \n ".to_vec()));
        let mut dest = Value::Null;
        assert!(matches!(
            reader.read_value(&mut dest),
            Err(Error::EndOfStream)
        ));
    }

    #[test]
    fn malformed_input_is_json_error() {
        let mut reader = DocumentReader::new(Cursor::new(b"{\"a\" 1}".to_vec()));
        let mut dest = Value::Null;
        assert!(matches!(reader.read_value(&mut dest), Err(Error::Json(_))));
    }

    #[test]
    fn oversized_document_rejected() {
        let codec = Codec::with_config(CodecConfig {
            max_document_size: 8,
            ..CodecConfig::default()
        });
        let mut reader = codec.reader(Cursor::new(b"\"0123456789\"".to_vec()));
        let mut dest = Value::Null;
        assert!(matches!(
            reader.read_value(&mut dest),
            Err(Error::DocumentTooLarge { max: 8, .. })
        ));
    }

    #[test]
    fn oversized_partial_document_does_not_wedge_stream() {
        let codec = Codec::with_config(CodecConfig {
            max_document_size: 8,
            ..CodecConfig::default()
        });
        let reader_input = ChunkedReader::new(vec![
            b"[1,2,3,4,5,6".to_vec(),
            b"]\n".to_vec(),
            b"7\n".to_vec(),
        ]);
        let mut reader = codec.reader(reader_input);
        let mut dest = Value::Null;

        assert!(matches!(
            reader.read_value(&mut dest),
            Err(Error::DocumentTooLarge { size: 12, max: 8 })
        ));
        assert_eq!(reader.buffered(), 0);

        // The tail of the dropped document is rejected on its own.
        assert!(matches!(reader.read_value(&mut dest), Err(Error::Json(_))));

        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_number().and_then(|n| n.as_u64()), Some(7));
    }

    #[test]
    fn delimiters_inside_strings_split_across_reads() {
        let reader_input = ChunkedReader::new(vec![
            b"{\"k\":\"a]\\".to_vec(),
            b"\"}\"".to_vec(),
            b"}\n".to_vec(),
        ]);
        let mut reader = DocumentReader::new(reader_input);

        let mut dest = Value::Null;
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.get("k").and_then(Value::as_str), Some("a]\"}"));
    }

    #[test]
    fn byte_at_a_time_stream() {
        let wire = b"{\"a\":[1,{\"b\":\"}\"}],\"c\":null} true 12 \"x\"";
        let reader_input = ChunkedReader::new(wire.iter().map(|b| vec![*b]).collect());
        let mut reader = DocumentReader::new(reader_input);

        let mut dest = Value::Null;
        reader.read_value(&mut dest).unwrap();
        assert!(dest.get("c").is_some_and(Value::is_null));
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_bool(), Some(true));
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_number().and_then(|n| n.as_u64()), Some(12));
        reader.read_value(&mut dest).unwrap();
        assert_eq!(dest.as_str(), Some("x"));
        assert!(matches!(
            reader.read_value(&mut dest),
            Err(Error::EndOfStream)
        ));
    }

    #[test]
    fn scan_waits_for_value_end() {
        let mut scan = Scan::default();
        assert!(!scan.advance(b"{\"a\":[1"));
        assert!(!scan.advance(b"{\"a\":[1,\"]}\""));
        assert!(scan.advance(b"{\"a\":[1,\"]}\"]}"));

        let mut scan = Scan::default();
        assert!(!scan.advance(b" 12"));
        assert!(scan.advance(b" 12\n"));

        let mut scan = Scan::default();
        assert!(scan.advance(b"tr"));
    }

    #[test]
    fn handles_interrupted_read() {
        let mut reader = DocumentReader::new(InterruptedThenData {
            interrupted: false,
            data: Cursor::new(b"null".to_vec()),
        });
        let mut dest = Value::from("x");
        reader.read_value(&mut dest).unwrap();
        assert!(dest.is_null());
    }

    struct ChunkedReader {
        chunks: Vec<Vec<u8>>,
        next: usize,
    }

    impl ChunkedReader {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self { chunks, next: 0 }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let Some(chunk) = self.chunks.get(self.next) else {
                return Ok(0);
            };
            self.next += 1;
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.read(buf)
        }
    }
}
