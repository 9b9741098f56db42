//! Hooks invoked by the encoder and decoder when they meet a channel.

use netjson_wire as wire;
use tracing::{debug, trace};

use crate::capability::BoxError;
use crate::compact::compact;
use crate::decode::DecodeState;
use crate::encode::EncodeState;
use crate::error::{Error, Result};
use crate::value::Channel;

/// Encode a channel as a wrapped token and append it to the output.
///
/// Fails with [`Error::UnsupportedType`] when no encoder is configured; any
/// encoder or validation failure becomes [`Error::Marshal`]. Both abort the
/// document.
pub(crate) fn encode_channel(state: &mut EncodeState<'_>, channel: &Channel) -> Result<()> {
    let type_name = channel.type_name();
    let Some(encoder) = state.encoder else {
        return Err(Error::UnsupportedType { type_name });
    };
    let marshal = |source: BoxError| Error::Marshal { type_name, source };

    let payload = encoder.encode_channel(channel).map_err(marshal)?;
    let token = wire::wrap(&payload).map_err(|err| marshal(err.into()))?;
    compact(&mut state.buf, &token, state.escape_html).map_err(|err| marshal(err.into()))?;

    trace!(
        channel = type_name,
        payload_len = payload.len(),
        "encoded channel token"
    );
    Ok(())
}

/// Fill `dest` from the unquoted content `s` of a string literal.
///
/// Failures are saved on the decode state and leave `dest` as it was, so
/// decoding carries on with the next value.
pub(crate) fn decode_channel(state: &mut DecodeState<'_>, s: &[u8], dest: &mut Channel) {
    let type_name = dest.type_name();
    let decoder = match state.decoder {
        Some(decoder) if wire::is_wrapped(s) => decoder,
        _ => {
            state.save_error(Error::UnmarshalType {
                value: "string",
                type_name,
                offset: state.offset(),
            });
            return;
        }
    };

    let result = wire::unwrap(s).map_err(Error::from).and_then(|payload| {
        trace!(
            channel = type_name,
            payload_len = payload.len(),
            "decoding channel token"
        );
        decoder
            .decode_channel(dest, &payload)
            .map_err(|source| Error::Decode { type_name, source })
    });

    if let Err(err) = result {
        debug!(channel = type_name, error = %err, "channel token rejected");
        state.save_error(err);
    }
}
