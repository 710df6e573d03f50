//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from key generation, key transport and payload encryption.
///
/// Messages carry the library's reason string but never key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// RSA keypair generation failed (entropy or algorithm failure)
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// RSA encryption or decryption failed
    #[error("rsa operation failed: {0}")]
    Rsa(String),

    /// AES encryption or decryption failed (bad padding, truncated input)
    #[error("symmetric cipher failed: {0}")]
    Symmetric(String),

    /// Key length has no matching AES variant
    #[error("invalid symmetric key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// Malformed Base64, DER or UTF-8 input
    #[error("encoding error: {0}")]
    Encoding(String),
}
