//! RSA keypair used for symmetric key transport.

use std::fmt;

use rand_core::CryptoRngCore;
use rsa::{
    RsaPrivateKey,
    pkcs8::{DecodePublicKey, EncodePublicKey},
    traits::PublicKeyParts,
};

use crate::{CryptoError, encoding};

/// Modulus size used when the deployment does not override it.
pub const DEFAULT_MODULUS_BITS: usize = 1024;

/// A freshly generated RSA keypair.
///
/// The private half never leaves this type; callers decrypt through
/// [`decrypt_blocks`](crate::decrypt_blocks). Private key material is
/// zeroized when the keypair is dropped.
#[derive(Clone)]
pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl RsaKeyPair {
    /// Generate a keypair with the given modulus size.
    ///
    /// Randomness comes from the caller; production passes the OS RNG.
    ///
    /// # Errors
    ///
    /// - `KeyGeneration`: the size is unsupported or prime search failed
    pub fn generate<R: CryptoRngCore>(
        rng: &mut R,
        modulus_bits: usize,
    ) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(rng, modulus_bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from_rsa(private.to_public_key())?;

        Ok(Self { private, public })
    }

    /// The public half.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Modulus size in bytes; also the size of one ciphertext block.
    pub fn modulus_bytes(&self) -> usize {
        self.private.size()
    }

    /// Modulus size in bits.
    pub fn modulus_bits(&self) -> usize {
        self.private.size() * 8
    }

    pub(crate) fn private(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

/// RSA public key with its DER `SubjectPublicKeyInfo` encoding.
#[derive(Clone)]
pub struct RsaPublicKey {
    rsa: rsa::RsaPublicKey,
    der: Vec<u8>,
}

impl RsaPublicKey {
    fn from_rsa(rsa: rsa::RsaPublicKey) -> Result<Self, CryptoError> {
        let der = rsa
            .to_public_key_der()
            .map_err(|e| CryptoError::Encoding(e.to_string()))?
            .as_bytes()
            .to_vec();

        Ok(Self { rsa, der })
    }

    /// Parse a DER `SubjectPublicKeyInfo`.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let rsa = rsa::RsaPublicKey::from_public_key_der(der)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;

        Ok(Self { rsa, der: der.to_vec() })
    }

    /// Parse the Base64 form handed out to clients.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        Self::from_der(&encoding::decode(text)?)
    }

    /// DER `SubjectPublicKeyInfo` bytes.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Base64 of the DER encoding. This is the portable string clients fetch.
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.der)
    }

    /// Modulus size in bytes.
    pub fn modulus_bytes(&self) -> usize {
        self.rsa.size()
    }

    pub(crate) fn rsa(&self) -> &rsa::RsaPublicKey {
        &self.rsa
    }
}

impl PartialEq for RsaPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for RsaPublicKey {}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey").field("modulus_bytes", &self.modulus_bytes()).finish()
    }
}
