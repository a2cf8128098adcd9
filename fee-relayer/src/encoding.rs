//! Base64 encoding and decoding utilities.
//!
//! Relay requests carry serialized transactions as standard base64 strings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

/// Base64 text, stored as its ASCII bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes the base64 text to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Encodes raw binary data into base64 text.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        Self(b64.encode(input.as_ref()).into_bytes())
    }

    /// Returns the base64 text.
    #[must_use]
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<String> for Base64Bytes {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let encoded = Base64Bytes::encode([1u8, 2, 3, 255]);
        assert_eq!(encoded.to_string(), "AQID/w==");
        assert_eq!(encoded.decode().unwrap(), vec![1, 2, 3, 255]);
    }

    #[test]
    fn test_invalid_text_fails_to_decode() {
        let text = Base64Bytes::from("not base64!".to_owned());
        assert!(text.decode().is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let encoded = Base64Bytes::encode(b"relay");
        assert_eq!(serde_json::to_value(&encoded).unwrap(), serde_json::json!("cmVsYXk="));
    }
}
