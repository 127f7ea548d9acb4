//! Wire codec for device rasters.
//!
//! The prediction service exchanges rasters as base64 text: an 8-byte
//! header carrying the dimensions (rows then columns, big-endian `u32`)
//! followed by the samples in row-major order as little-endian `f32`.

use ndarray::Array2;

use crate::errors::CodecError;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode a raster into the base64 transport form.
pub fn encode_raster(raster: &Array2<f32>) -> String {
    let (rows, cols) = raster.dim();
    let mut bytes = Vec::with_capacity(8 + raster.len() * 4);
    bytes.extend_from_slice(&(rows as u32).to_be_bytes());
    bytes.extend_from_slice(&(cols as u32).to_be_bytes());
    for &sample in raster.iter() {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    base64_encode(&bytes)
}

/// Decode a raster from the base64 transport form.
pub fn decode_raster(encoded: &str) -> Result<Array2<f32>, CodecError> {
    let bytes = base64_decode(encoded)?;
    if bytes.len() < 8 {
        return Err(CodecError::TruncatedHeader { length: bytes.len() });
    }
    let rows = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let cols = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if rows == 0 || cols == 0 {
        return Err(CodecError::ZeroDimension { rows, cols });
    }

    let payload = &bytes[8..];
    let expected = rows * cols * 4;
    if payload.len() != expected {
        return Err(CodecError::PayloadSizeMismatch {
            rows,
            cols,
            expected,
            actual: payload.len(),
        });
    }

    let samples: Vec<f32> = payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    // Shape is consistent with the sample count by construction above.
    Ok(Array2::from_shape_vec((rows, cols), samples).expect("shape checked against payload"))
}

/// RFC 4648 base64 with the standard alphabet and `=` padding.
pub fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        out.push(BASE64_ALPHABET[(triple >> 18) as usize & 0x3f] as char);
        out.push(BASE64_ALPHABET[(triple >> 12) as usize & 0x3f] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[(triple >> 6) as usize & 0x3f] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[triple as usize & 0x3f] as char
        } else {
            '='
        });
    }
    out
}

/// Decode RFC 4648 base64 with the standard alphabet.
pub fn base64_decode(encoded: &str) -> Result<Vec<u8>, CodecError> {
    let input = encoded.trim().as_bytes();
    if input.len() % 4 != 0 {
        return Err(CodecError::InvalidBase64Length { length: input.len() });
    }

    let mut out = Vec::with_capacity(input.len() / 4 * 3);
    for (group_index, group) in input.chunks(4).enumerate() {
        let is_last = (group_index + 1) * 4 == input.len();
        let mut triple = 0u32;
        let mut pad = 0usize;
        for (offset, &symbol) in group.iter().enumerate() {
            let value = if symbol == b'=' {
                // Padding is only valid in the final group's tail.
                if !is_last || offset < 2 {
                    return Err(CodecError::InvalidBase64Padding);
                }
                pad += 1;
                0
            } else {
                if pad > 0 {
                    return Err(CodecError::InvalidBase64Padding);
                }
                decode_symbol(symbol).ok_or(CodecError::InvalidBase64Symbol {
                    symbol: symbol as char,
                    position: group_index * 4 + offset,
                })?
            };
            triple = (triple << 6) | value as u32;
        }

        out.push((triple >> 16) as u8);
        if pad < 2 {
            out.push((triple >> 8) as u8);
        }
        if pad < 1 {
            out.push(triple as u8);
        }
    }
    Ok(out)
}

fn decode_symbol(symbol: u8) -> Option<u8> {
    match symbol {
        b'A'..=b'Z' => Some(symbol - b'A'),
        b'a'..=b'z' => Some(symbol - b'a' + 26),
        b'0'..=b'9' => Some(symbol - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
