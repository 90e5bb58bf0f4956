//! Base64-framed JSON encoding for wire payloads, and the hex normalization
//! that goes with them.
//!
//! This is the single place nonce and signature bytes are turned into `0x`
//! hex strings and back; the signer and the middleware only ever see typed
//! values, never raw byte buffers they would otherwise have to format
//! themselves.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("payment header is not valid base64")]
    InvalidBase64(#[source] base64::DecodeError),
    #[error("payment header is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),
    #[error("payment header is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
}

/// Encodes `value` as camelCase JSON, then standard (padded) base64.
pub fn encode<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_vec(value).expect("wire types always serialize");
    STANDARD.encode(json)
}

/// Inverts [`encode`]. Fails with [`CodecError`] on bad base64 or non-UTF-8 /
/// non-JSON content — both collapse to the **MalformedFrame** error kind.
pub fn decode<T: DeserializeOwned>(encoded: &str) -> Result<T, CodecError> {
    let bytes = STANDARD.decode(encoded).map_err(CodecError::InvalidBase64)?;
    let text = std::str::from_utf8(&bytes).map_err(CodecError::InvalidUtf8)?;
    serde_json::from_str(text).map_err(CodecError::InvalidJson)
}

/// Renders raw bytes as lowercase hex with no `0x` prefix — the form the
/// signer emits during construction, before the 0x prefix is added for the
/// wire.
pub fn to_hex_no_prefix(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Adds a `0x` prefix if the string doesn't already have one. Idempotent.
pub fn with_0x_prefix(hex: &str) -> String {
    if hex.starts_with("0x") || hex.starts_with("0X") {
        hex.to_string()
    } else {
        format!("0x{hex}")
    }
}

/// Renders raw bytes as `0x`-prefixed hex directly.
pub fn to_hex_0x(bytes: &[u8]) -> String {
    with_0x_prefix(&to_hex_no_prefix(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn round_trips() {
        let value = Sample { a: 1, b: "hi".into() };
        let encoded = encode(&value);
        let decoded: Sample = decode(&encoded).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode::<Sample>("not base64!!").unwrap_err();
        assert!(matches!(err, CodecError::InvalidBase64(_)));
    }

    #[test]
    fn rejects_non_json_payload() {
        let encoded = STANDARD.encode(b"not json");
        let err = decode::<Sample>(&encoded).unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));
    }

    #[test]
    fn hex_helpers_normalize_prefix() {
        let bytes = [0xabu8, 0xcd];
        assert_eq!(to_hex_no_prefix(&bytes), "abcd");
        assert_eq!(to_hex_0x(&bytes), "0xabcd");
        assert_eq!(with_0x_prefix("0xabcd"), "0xabcd");
        assert_eq!(with_0x_prefix("abcd"), "0xabcd");
    }
}
