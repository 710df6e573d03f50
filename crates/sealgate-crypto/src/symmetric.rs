//! AES payload cipher keyed by the recovered session key.

use std::fmt;

use aes::{Aes128, Aes192, Aes256};
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, block_padding::Pkcs7};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::{CryptoError, encoding};

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;
type Aes192EcbEnc = ecb::Encryptor<Aes192>;
type Aes192EcbDec = ecb::Decryptor<Aes192>;
type Aes256EcbEnc = ecb::Encryptor<Aes256>;
type Aes256EcbDec = ecb::Decryptor<Aes256>;

/// Raw symmetric key bytes recovered for one request.
///
/// Any length is accepted on construction because the bytes come straight
/// out of RSA recovery. Only 16, 24 and 32 byte keys can actually seal or
/// open; every other length fails with `InvalidKeyLength`.
///
/// Bytes are zeroized on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: impl Into<Zeroizing<Vec<u8>>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Generate a random key of `len` bytes (16, 24 or 32).
    pub fn generate<R: CryptoRngCore>(rng: &mut R, len: usize) -> Result<Self, CryptoError> {
        if !matches!(len, 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeyLength(len));
        }

        let mut bytes = Zeroizing::new(vec![0u8; len]);
        rng.fill_bytes(&mut bytes);
        Ok(Self { bytes })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length key.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 of the raw bytes, the form persisted as a fingerprint.
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.bytes)
    }

    /// Encrypt with PKCS#7 padding. Output length is a multiple of 16.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.bytes.as_slice();
        let invalid = |_| CryptoError::InvalidKeyLength(key.len());

        match key.len() {
            16 => Ok(Aes128EcbEnc::new_from_slice(key)
                .map_err(invalid)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
            24 => Ok(Aes192EcbEnc::new_from_slice(key)
                .map_err(invalid)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
            32 => Ok(Aes256EcbEnc::new_from_slice(key)
                .map_err(invalid)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
            other => Err(CryptoError::InvalidKeyLength(other)),
        }
    }

    /// Decrypt and strip PKCS#7 padding.
    ///
    /// # Errors
    ///
    /// - `Symmetric`: length is not a block multiple or padding is invalid
    /// - `InvalidKeyLength`: key has no AES variant
    pub fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.bytes.as_slice();
        let invalid = |_| CryptoError::InvalidKeyLength(key.len());
        let unpad = |_| CryptoError::Symmetric("bad padding or truncated input".to_string());

        match key.len() {
            16 => Aes128EcbDec::new_from_slice(key)
                .map_err(invalid)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(unpad),
            24 => Aes192EcbDec::new_from_slice(key)
                .map_err(invalid)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(unpad),
            32 => Aes256EcbDec::new_from_slice(key)
                .map_err(invalid)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(unpad),
            other => Err(CryptoError::InvalidKeyLength(other)),
        }
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey").field("len", &self.len()).finish_non_exhaustive()
    }
}
