use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeSliceError, Engine as _};

use crate::error::{Result, WireError};

/// Token opening as spliced into an output document, quote included.
pub const QUOTED_PREFIX: &[u8] = br#""\//chan("#;

/// Token closing as spliced into an output document, quote included.
pub const QUOTED_SUFFIX: &[u8] = br#")\//""#;

/// Token opening as seen in an already-unquoted string value.
pub const PREFIX: &[u8] = b"//chan(";

/// Token closing as seen in an already-unquoted string value.
pub const SUFFIX: &[u8] = b")//";

/// Decoding engine for token bodies. Unpadded URL-safe like the encoder, but
/// non-zero trailing bits in the last symbol are ignored rather than rejected.
const LENIENT_URL_SAFE_NO_PAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// The exact wire size of the quoted token carrying `payload_len` bytes.
pub fn token_len(payload_len: usize) -> Result<usize> {
    base64::encoded_len(payload_len, false)
        .and_then(|body| body.checked_add(QUOTED_PREFIX.len() + QUOTED_SUFFIX.len()))
        .ok_or(WireError::LengthOverflow(payload_len))
}

/// Wrap a payload into a quoted token.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────────┬─────────────┐
/// │ "\//chan(    │ base64url(payload), no '='   │ )\//"       │
/// └──────────────┴──────────────────────────────┴─────────────┘
/// ```
///
/// The buffer is allocated at its final size and the payload is encoded
/// directly into the space between the delimiters.
pub fn wrap(payload: &[u8]) -> Result<Vec<u8>> {
    let len = token_len(payload.len())?;
    let body_end = len - QUOTED_SUFFIX.len();

    let mut token = vec![0u8; len];
    token[..QUOTED_PREFIX.len()].copy_from_slice(QUOTED_PREFIX);
    token[body_end..].copy_from_slice(QUOTED_SUFFIX);
    URL_SAFE_NO_PAD.encode_slice(payload, &mut token[QUOTED_PREFIX.len()..body_end])?;

    Ok(token)
}

/// Returns true if an unquoted string value has the shape of a channel token.
///
/// Only the delimiters are checked; the text between them is validated when
/// the token is unwrapped.
pub fn is_wrapped(s: &[u8]) -> bool {
    s.len() >= PREFIX.len() && s.starts_with(PREFIX) && s.ends_with(SUFFIX)
}

/// The base64 text between the delimiters of an unquoted token.
pub fn interior(s: &[u8]) -> Option<&[u8]> {
    s.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)
}

/// Strip the delimiters from an unquoted token and decode its payload.
pub fn unwrap(s: &[u8]) -> Result<Vec<u8>> {
    if !is_wrapped(s) {
        return Err(WireError::NotWrapped);
    }
    let body = interior(s).ok_or(WireError::NotWrapped)?;
    decode_payload(body)
}

/// Decode the base64 text found between token delimiters.
///
/// Line breaks inside the body are skipped. Any other byte outside the
/// URL-safe alphabet, including `=`, is an error.
pub fn decode_payload(body: &[u8]) -> Result<Vec<u8>> {
    let body: Cow<'_, [u8]> = if body.iter().any(|b| matches!(b, b'\r' | b'\n')) {
        Cow::Owned(
            body.iter()
                .copied()
                .filter(|b| !matches!(b, b'\r' | b'\n'))
                .collect(),
        )
    } else {
        Cow::Borrowed(body)
    };

    let mut payload = vec![0u8; base64::decoded_len_estimate(body.len())];
    let written = LENIENT_URL_SAFE_NO_PAD
        .decode_slice(&body, &mut payload)
        .map_err(|err| match err {
            DecodeSliceError::DecodeError(err) => WireError::Base64(err),
            DecodeSliceError::OutputSliceTooSmall => WireError::BufferTooSmall,
        })?;
    payload.truncate(written);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_token() {
        let token = wrap(&[]).unwrap();
        assert_eq!(token.as_slice(), br#""\//chan()\//""#);
        assert_eq!(token.len(), token_len(0).unwrap());
    }

    #[test]
    fn test_two_byte_payload_token() {
        let token = wrap(&[0xFF, 0x00]).unwrap();
        assert_eq!(token.as_slice(), br#""\//chan(_wA)\//""#);

        let payload = unwrap(b"//chan(_wA)//").unwrap();
        assert_eq!(payload, vec![0xFF, 0x00]);
    }

    #[test]
    fn test_token_len_is_exact() {
        for len in 0..64 {
            let payload = vec![0xA5u8; len];
            assert_eq!(wrap(&payload).unwrap().len(), token_len(len).unwrap());
        }
    }

    #[test]
    fn test_token_body_is_unpadded_url_safe() {
        let payload: Vec<u8> = (0..=255u8).collect();
        for len in 0..payload.len() {
            let token = wrap(&payload[..len]).unwrap();
            let body = &token[QUOTED_PREFIX.len()..token.len() - QUOTED_SUFFIX.len()];
            assert!(body
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_'));
        }
    }

    #[test]
    fn test_roundtrip_through_unquoted_form() {
        let payload: Vec<u8> = (0..200u16).map(|i| (i * 7 % 256) as u8).collect();
        for len in [0, 1, 2, 3, 4, 5, 31, 32, 33, 200] {
            let token = wrap(&payload[..len]).unwrap();
            // Drop the quotes and un-escape the slashes the way a JSON reader would.
            let unquoted = String::from_utf8(token[1..token.len() - 1].to_vec())
                .unwrap()
                .replace("\\/", "/");
            assert_eq!(unwrap(unquoted.as_bytes()).unwrap(), &payload[..len]);
        }
    }

    #[test]
    fn test_detection_rejects_every_short_prefix() {
        let full = b"//chan()//";
        for len in 0..full.len() {
            assert!(!is_wrapped(&full[..len]), "accepted {len}-byte prefix");
        }
        assert!(is_wrapped(full));
    }

    #[test]
    fn test_detection_requires_both_delimiters() {
        assert!(!is_wrapped(b"chan(abc)"));
        assert!(!is_wrapped(b"//chan(abc)"));
        assert!(!is_wrapped(b"chan(abc)//"));
        assert!(!is_wrapped(b"/chan(abc)//"));
        assert!(!is_wrapped(b"//chan(abc)/"));
        assert!(is_wrapped(b"//chan(abc)//"));
    }

    #[test]
    fn test_interior_strips_delimiters() {
        assert_eq!(interior(b"//chan(AQID)//"), Some(&b"AQID"[..]));
        assert_eq!(interior(b"//chan()//"), Some(&b""[..]));
        assert_eq!(interior(b"chan(AQID)"), None);
    }

    #[test]
    fn test_unwrap_not_wrapped() {
        assert!(matches!(unwrap(b"chan(abc)"), Err(WireError::NotWrapped)));
        assert!(matches!(unwrap(b""), Err(WireError::NotWrapped)));
    }

    #[test]
    fn test_unwrap_rejects_padding() {
        assert!(matches!(
            unwrap(b"//chan(_w==)//"),
            Err(WireError::Base64(_))
        ));
    }

    #[test]
    fn test_unwrap_rejects_standard_alphabet() {
        assert!(matches!(
            unwrap(b"//chan(/wA)//"),
            Err(WireError::Base64(_))
        ));
        assert!(matches!(
            unwrap(b"//chan(+wA)//"),
            Err(WireError::Base64(_))
        ));
    }

    #[test]
    fn test_unwrap_rejects_impossible_length() {
        assert!(matches!(unwrap(b"//chan(A)//"), Err(WireError::Base64(_))));
    }

    #[test]
    fn test_unwrap_ignores_trailing_bits() {
        // 'B' carries a set bit below the last full byte; 'A' does not.
        assert_eq!(unwrap(b"//chan(_wB)//").unwrap(), vec![0xFF, 0x00]);
        assert_eq!(unwrap(b"//chan(AQI)//").unwrap(), vec![0x01, 0x02]);
        assert_eq!(unwrap(b"//chan(AQJ)//").unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn test_unwrap_skips_line_breaks() {
        assert_eq!(unwrap(b"//chan(AQ\r\nID)//").unwrap(), vec![1, 2, 3]);
        assert_eq!(unwrap(b"//chan(\n)//").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_unwrap_rejects_stray_bytes() {
        assert!(matches!(
            unwrap(b"//chan(AQ ID)//"),
            Err(WireError::Base64(_))
        ));
    }
}
