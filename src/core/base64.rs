//! Base64 codec for fixed-width numeric arrays
//!
//! Dynamic Depth embeds binary numeric arrays (lens distortion tables, point
//! clouds, plane boundaries) inside XML attribute values. The arrays are
//! reinterpreted as raw bytes in native endianness and base64-encoded with
//! the standard alphabet and padding. Decoding also accepts the URL-safe
//! alphabet (`-`/`_`), with padding optional but consistent when present;
//! the standard alphabet is tried first.

use crate::core::error::{DepthError, DepthResult};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

// Decoders tolerate missing padding; the encoder always pads.
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Encode raw bytes with the standard alphabet and canonical padding
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode base64 text, auto-detecting the alphabet.
///
/// The standard alphabet is tried first, then the URL-safe variant. Padding
/// is optional, but when present it must be consistent: at most two trailing
/// pad characters of one kind (`=`, or `.` for URL-safe producers), bringing
/// the input length to a multiple of four. `.`-padded input is decoded with
/// the URL-safe alphabet only. Illegal characters or an inconsistent padding
/// count fail with no partial output.
pub fn decode_base64(text: &str) -> DepthResult<Vec<u8>> {
    let (body, dot_padded) = strip_padding(text)?;
    if dot_padded {
        return URL_SAFE
            .decode(body)
            .map_err(|e| DepthError::BadValue(format!("Illegal base64 input: {}", e)));
    }
    match STANDARD.decode(body) {
        Ok(bytes) => Ok(bytes),
        Err(_) => URL_SAFE
            .decode(body)
            .map_err(|e| DepthError::BadValue(format!("Illegal base64 input: {}", e))),
    }
}

/// Validate and strip trailing padding; returns the unpadded body and
/// whether the padding used the URL-safe `.` character
fn strip_padding(text: &str) -> DepthResult<(&str, bool)> {
    let body = text.trim_end_matches(['=', '.']);
    let pad = &text.as_bytes()[body.len()..];
    let Some(&first) = pad.first() else {
        return Ok((body, false));
    };
    if pad.len() > 2 || pad.iter().any(|&b| b != first) || text.len() % 4 != 0 {
        return Err(DepthError::BadValue(
            "Inconsistent base64 padding".to_string(),
        ));
    }
    Ok((body, first == b'.'))
}

/// Encode a 32-bit integer array as base64 (native endianness)
pub fn encode_int_array(values: &[i32]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_ne_bytes());
    }
    encode_base64(&bytes)
}

/// Encode a 32-bit float array as base64 (native endianness)
pub fn encode_float_array(values: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_ne_bytes());
    }
    encode_base64(&bytes)
}

/// Encode a 64-bit float array as base64 (native endianness)
pub fn encode_double_array(values: &[f64]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_ne_bytes());
    }
    encode_base64(&bytes)
}

/// Decode base64 text into a 32-bit integer array.
///
/// Fails if the decoded byte count is not divisible by four.
pub fn decode_int_array(text: &str) -> DepthResult<Vec<i32>> {
    let bytes = decode_exact_width(text, 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decode base64 text into a 32-bit float array
pub fn decode_float_array(text: &str) -> DepthResult<Vec<f32>> {
    let bytes = decode_exact_width(text, 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Decode base64 text into a 64-bit float array
pub fn decode_double_array(text: &str) -> DepthResult<Vec<f64>> {
    let bytes = decode_exact_width(text, 8)?;
    Ok(bytes
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

fn decode_exact_width(text: &str, width: usize) -> DepthResult<Vec<u8>> {
    let bytes = decode_base64(text)?;
    if bytes.len() % width != 0 {
        return Err(DepthError::BadValue(format!(
            "Decoded length {} is not a multiple of element width {}",
            bytes.len(),
            width
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_raw_round_trip() {
        let data = b"dynamic depth".to_vec();
        let encoded = encode_base64(&data);
        assert_eq!(decode_base64(&encoded).unwrap(), data);
    }

    #[test]
    fn test_int_array_round_trip() {
        let values = vec![0, 1, -1, i32::MAX, i32::MIN];
        let encoded = encode_int_array(&values);
        assert_eq!(decode_int_array(&encoded).unwrap(), values);
    }

    #[test]
    fn test_float_array_round_trip() {
        let values = vec![0.0f32, 1.5, -2.25, f32::MAX];
        let encoded = encode_float_array(&values);
        assert_eq!(decode_float_array(&encoded).unwrap(), values);
    }

    #[test]
    fn test_double_array_round_trip() {
        let values = vec![0.0f64, 1e-300, -123.456];
        let encoded = encode_double_array(&values);
        assert_eq!(decode_double_array(&encoded).unwrap(), values);
    }

    #[test]
    fn test_url_safe_without_padding() {
        // 0xFB 0xEF 0xFF encodes to "++//" standard, "--__" url-safe
        let data = vec![0xFB, 0xEF, 0xFF, 0x01];
        let standard = encode_base64(&data);
        let url_safe = standard.replace('+', "-").replace('/', "_");
        let unpadded = url_safe.trim_end_matches('=').to_string();
        assert_eq!(decode_base64(&unpadded).unwrap(), data);
        // Dot padding, as some URL-safe producers emit
        let dotted = format!("{}..", unpadded);
        assert_eq!(decode_base64(&dotted).unwrap(), data);
    }

    #[test]
    fn test_illegal_characters() {
        assert!(decode_base64("not*base64!").is_err());
    }

    #[test]
    fn test_inconsistent_padding_rejected() {
        // Too many pad characters
        assert!(decode_base64("QUJD====").is_err());
        // Padded input whose length is not a multiple of four
        assert!(decode_base64("QQ=").is_err());
        assert!(decode_base64("QQ===").is_err());
        // Mixed pad characters
        assert!(decode_base64("QQ=.").is_err());
        // Canonical padding still decodes
        assert_eq!(decode_base64("QQ==").unwrap(), vec![0x41]);
        assert_eq!(decode_base64("QUJD").unwrap(), b"ABC".to_vec());
    }

    #[test]
    fn test_dot_padding_is_url_safe_only() {
        // Standard-alphabet characters with URL-safe dot padding
        assert!(decode_base64("++//AQ..").is_err());
    }

    #[test]
    fn test_wrong_element_width() {
        // Three decoded bytes cannot form 32-bit elements
        let encoded = encode_base64(&[1, 2, 3]);
        assert!(decode_int_array(&encoded).is_err());
        assert!(decode_float_array(&encoded).is_err());
    }
}
