//! Binary array payloads for embedding in HTML.
//!
//! Arrays travel as base64-encoded little-endian `f32` bytes so the page's
//! JavaScript can decode them straight into a `Float32Array`.

use crate::core::io::npz::NpyArray;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

/// A float array encoded for the embedded JSON payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct F32Payload {
    pub shape: Vec<usize>,
    pub dtype: &'static str,
    pub b64: String,
}

impl F32Payload {
    pub fn from_array(array: &NpyArray) -> Self {
        let mut bytes = Vec::with_capacity(array.data.len() * 4);
        for value in &array.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self {
            shape: array.shape.clone(),
            dtype: "f32",
            b64: STANDARD.encode(&bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_encodes_little_endian_f32() {
        let array = NpyArray {
            shape: vec![1],
            data: vec![1.0],
        };
        let payload = F32Payload::from_array(&array);
        // 1.0f32 is 00 00 80 3F little-endian.
        assert_eq!(payload.b64, "AACAPw==");
        assert_eq!(payload.dtype, "f32");
        assert_eq!(payload.shape, vec![1]);
    }

    #[test]
    fn payload_pads_to_a_multiple_of_four_chars() {
        let array = NpyArray {
            shape: vec![3],
            data: vec![0.0, -1.5, 2.5],
        };
        let payload = F32Payload::from_array(&array);
        assert_eq!(payload.b64.len() % 4, 0);
        assert_eq!(payload.b64, "AAAAAAAAwL8AACBA");
    }

    #[test]
    fn payload_serializes_expected_keys() {
        let array = NpyArray {
            shape: vec![2, 2],
            data: vec![0.0, 0.0, 0.0, 0.0],
        };
        let json = serde_json::to_string(&F32Payload::from_array(&array)).unwrap();
        assert!(json.contains("\"shape\":[2,2]"));
        assert!(json.contains("\"dtype\":\"f32\""));
        assert!(json.contains("\"b64\":"));
    }
}
