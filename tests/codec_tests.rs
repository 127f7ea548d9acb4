//! Tests for the raster wire codec.

use ndarray::array;
use prefab::codec::{base64_decode, base64_encode, decode_raster, encode_raster};
use prefab::errors::CodecError;

mod base64_tests {
    use super::*;

    #[test]
    fn encodes_the_rfc4648_vectors() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_encode(b"f"), "Zg==");
        assert_eq!(base64_encode(b"fo"), "Zm8=");
        assert_eq!(base64_encode(b"foo"), "Zm9v");
        assert_eq!(base64_encode(b"foob"), "Zm9vYg==");
        assert_eq!(base64_encode(b"fooba"), "Zm9vYmE=");
        assert_eq!(base64_encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn decodes_the_rfc4648_vectors() {
        assert_eq!(base64_decode("").unwrap(), b"");
        assert_eq!(base64_decode("Zg==").unwrap(), b"f");
        assert_eq!(base64_decode("Zm8=").unwrap(), b"fo");
        assert_eq!(base64_decode("Zm9v").unwrap(), b"foo");
        assert_eq!(base64_decode("Zm9vYmFy").unwrap(), b"foobar");
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(matches!(
            base64_decode("Zg"),
            Err(CodecError::InvalidBase64Length { length: 2 })
        ));
    }

    #[test]
    fn rejects_foreign_symbols() {
        assert!(matches!(
            base64_decode("Zm!v"),
            Err(CodecError::InvalidBase64Symbol { symbol: '!', position: 2 })
        ));
    }

    #[test]
    fn rejects_misplaced_padding() {
        assert!(matches!(
            base64_decode("=AAA"),
            Err(CodecError::InvalidBase64Padding)
        ));
        assert!(matches!(
            base64_decode("Zg==Zg=="),
            Err(CodecError::InvalidBase64Padding)
        ));
    }

    #[test]
    fn roundtrips_arbitrary_bytes() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        assert_eq!(base64_decode(&base64_encode(&bytes)).unwrap(), bytes);
    }
}

mod raster_codec_tests {
    use super::*;

    #[test]
    fn roundtrips_a_raster_bit_exactly() {
        let raster = array![
            [0.0f32, 0.5, -1.25],
            [3.5e-8, 1.0, 2048.0],
        ];
        let decoded = decode_raster(&encode_raster(&raster)).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn header_is_big_endian_rows_then_cols() {
        let raster = array![[1.0f32, 2.0]];
        let bytes = base64_decode(&encode_raster(&raster)).unwrap();
        assert_eq!(&bytes[..8], &[0, 0, 0, 1, 0, 0, 0, 2]);
        // Payload is little-endian f32.
        assert_eq!(&bytes[8..12], &1.0f32.to_le_bytes());
    }

    #[test]
    fn rejects_a_truncated_header() {
        let encoded = base64_encode(&[0, 0, 1]);
        assert!(matches!(
            decode_raster(&encoded),
            Err(CodecError::TruncatedHeader { length: 3 })
        ));
    }

    #[test]
    fn rejects_a_zero_dimension() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&5u32.to_be_bytes());
        assert!(matches!(
            decode_raster(&base64_encode(&bytes)),
            Err(CodecError::ZeroDimension { rows: 0, cols: 5 })
        ));
    }

    #[test]
    fn rejects_a_payload_size_mismatch() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        for value in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        assert!(matches!(
            decode_raster(&base64_encode(&bytes)),
            Err(CodecError::PayloadSizeMismatch {
                rows: 2,
                cols: 2,
                expected: 16,
                actual: 12,
            })
        ));
    }
}
