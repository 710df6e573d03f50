//! Base64 transport encoding.
//!
//! Every binary value on the wire (public key, asymmetric ciphertext,
//! symmetric ciphertext, fingerprint) uses the standard alphabet with
//! padding.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::CryptoError;

/// Encode bytes as padded standard Base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode padded standard Base64.
///
/// Surrounding whitespace is ignored; anything else outside the alphabet is
/// rejected.
pub fn decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD.decode(text.trim()).map_err(|e| CryptoError::Encoding(e.to_string()))
}
