//! Raw byte payloads and their base64url text form

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::error::CodecError;
use crate::value::Value;

// The wire alphabet is base64url (`-`/`_`); padding is emitted on encode and
// optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Raw bytes carried as base64url text on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Wrap a byte payload.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Bytes(bytes.into())
    }

    /// Borrow the raw bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Take the raw bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Render as padded base64url text.
    pub fn to_base64(&self) -> String {
        URL_SAFE_LENIENT.encode(&self.0)
    }

    /// Decode base64url text; padding may be present or absent.
    pub fn from_base64(text: &str) -> Result<Self, CodecError> {
        URL_SAFE_LENIENT
            .decode(text)
            .map(Bytes)
            .map_err(|_| CodecError::InvalidBytes(text.to_string()))
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Bytes {
        Bytes(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Bytes {
        Bytes(bytes.to_vec())
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Value {
        Value::Bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_safe_alphabet_decodes_high_bytes() {
        // `-` is 62 in the url-safe alphabet, so "-A==" is the byte 0xF8.
        let bytes = Bytes::from_base64("-A==").unwrap();
        assert_eq!(bytes.as_slice(), &[0xF8]);
        assert_eq!(bytes.to_base64(), "-A==");

        let bytes = Bytes::from_base64("_w==").unwrap();
        assert_eq!(bytes.as_slice(), &[0xFF]);
    }

    #[test]
    fn test_decode_accepts_missing_padding() {
        let padded = Bytes::from_base64("AQID").unwrap();
        assert_eq!(padded.as_slice(), &[1, 2, 3]);
        let unpadded = Bytes::from_base64("-A").unwrap();
        assert_eq!(unpadded.as_slice(), &[0xF8]);
    }

    #[test]
    fn test_decode_rejects_standard_alphabet_specials() {
        assert!(Bytes::from_base64("+A==").is_err());
        assert!(Bytes::from_base64("/w==").is_err());
        assert!(Bytes::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let payload: Vec<u8> = (0u8..=255).collect();
        let bytes = Bytes::new(payload.clone());
        let decoded = Bytes::from_base64(&bytes.to_base64()).unwrap();
        assert_eq!(decoded.into_vec(), payload);
    }
}
