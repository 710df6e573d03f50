//! Sealgate Cryptographic Primitives
//!
//! Building blocks for the hybrid session protocol. Pure functions over
//! bytes: no clock, no shared state, no I/O. The server holds one RSA keypair
//! at a time and uses it only to transport a client-chosen AES key; the AES
//! key then protects every payload field of a single request.
//!
//! # Key Transport
//!
//! ```text
//! client AES key (16/24/32 bytes, possibly framed with other material)
//!        │
//!        ▼
//! split into chunks of (modulus_bytes - 11)
//!        │
//!        ▼
//! RSA PKCS#1 v1.5 encrypt each chunk → blocks of modulus_bytes
//!        │
//!        ▼
//! concatenate, Base64 → asymmetric ciphertext
//! ```
//!
//! The server reverses this in [`decrypt_blocks`]: the ciphertext is cut into
//! `ceil(len / modulus_bytes)` blocks (the last one is whatever remains, it
//! is never padded), each block is decrypted on its own and the plaintexts are
//! concatenated in block order. There is no length prefix, so both sides must
//! frame identically.
//!
//! # Payload Cipher
//!
//! AES in ECB mode with PKCS#7 padding, variant selected by key length. See
//! [`SymmetricKey`].
//!
//! # Security
//!
//! - Recovered key material lives in zeroizing buffers
//! - A failed block aborts the whole recovery; no partial key is returned
//! - Errors never say which block failed

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod blocks;
pub mod encoding;
mod error;
mod keypair;
mod symmetric;

pub use blocks::{PKCS1_OVERHEAD, block_ranges, decrypt_blocks, encrypt_blocks};
pub use error::CryptoError;
pub use keypair::{DEFAULT_MODULUS_BITS, RsaKeyPair, RsaPublicKey};
pub use symmetric::SymmetricKey;
