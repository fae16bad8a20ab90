//! Transit encoding for binary payloads
//!
//! The detection service ships documents as base64, sometimes wrapped in a
//! data URL (`data:application/pdf;base64,<payload>`). Decoding accepts
//! unpadded input and tolerates line breaks inside the payload; encoding
//! always produces padded standard base64.

use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::RedactError;

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a transit payload into raw bytes.
///
/// Anything up to and including the last `,` is treated as a scheme
/// segment and discarded. ASCII whitespace anywhere in the body is ignored.
pub fn decode(payload: &str) -> Result<Vec<u8>, RedactError> {
    let body = match payload.rfind(',') {
        Some(idx) => &payload[idx + 1..],
        None => payload,
    };

    let compact: Vec<u8> = body
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    LENIENT
        .decode(compact)
        .map_err(|e| RedactError::Decode(e.to_string()))
}

/// Encode raw bytes for transit (no scheme prefix).
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
