use bytes::{BufMut, BytesMut};
use serde::de::IgnoredAny;

use crate::error::Result;

/// Escape sequence for the character starting `rest`, with its width in bytes.
///
/// U+2028 and U+2029 are always escaped; they are valid in JSON strings but
/// terminate lines in JavaScript.
pub(crate) fn html_escape(rest: &[u8], escape_html: bool) -> Option<(&'static [u8], usize)> {
    match rest {
        [b'<', ..] if escape_html => Some((&b"\\u003c"[..], 1)),
        [b'>', ..] if escape_html => Some((&b"\\u003e"[..], 1)),
        [b'&', ..] if escape_html => Some((&b"\\u0026"[..], 1)),
        [0xE2, 0x80, 0xA8, ..] => Some((&b"\\u2028"[..], 3)),
        [0xE2, 0x80, 0xA9, ..] => Some((&b"\\u2029"[..], 3)),
        _ => None,
    }
}

/// Append a raw JSON fragment to `dst`, checking validity first.
///
/// Insignificant whitespace is dropped and characters inside strings are
/// escaped by the same rules as ordinary encoded strings. Nothing is written
/// if `src` is not a single valid JSON value.
pub fn compact(dst: &mut BytesMut, src: &[u8], escape_html: bool) -> Result<()> {
    serde_json::from_slice::<IgnoredAny>(src)?;

    dst.reserve(src.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            } else if let Some((seq, width)) = html_escape(&src[i..], escape_html) {
                dst.put_slice(seq);
                i += width;
                continue;
            }
            dst.put_u8(b);
        } else if !matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
            in_string = b == b'"';
            dst.put_u8(b);
        }
        i += 1;
    }

    Ok(())
}
