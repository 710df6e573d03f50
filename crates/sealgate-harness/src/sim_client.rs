//! Client side of the hybrid protocol.
//!
//! Mirrors what a real client does per request: pick a symmetric key, wrap it
//! block by block under the current public key, seal the marker with it, and
//! seal each confidential field. The same key opens the sealed response.

use sealgate_core::{DEFAULT_MARKER, Environment, HybridRequest};
use sealgate_crypto::{CryptoError, RsaPublicKey, SymmetricKey, encoding, encrypt_blocks};

/// Simulated client holding one symmetric key and one server public key.
#[derive(Debug, Clone)]
pub struct SimClient {
    public_key: RsaPublicKey,
    key: SymmetricKey,
    marker: String,
}

impl SimClient {
    /// Client with a fresh random key of `key_len` bytes (16, 24 or 32).
    ///
    /// `public_key` is the Base64 string the server hands out.
    pub fn new<E: Environment>(
        env: &E,
        public_key: &str,
        key_len: usize,
    ) -> Result<Self, CryptoError> {
        let public_key = RsaPublicKey::from_base64(public_key)?;
        let key = SymmetricKey::generate(&mut env.rng(), key_len)?;

        Ok(Self::with_key(public_key, key))
    }

    /// Client with an explicit key, including lengths no cipher accepts.
    pub fn with_key(public_key: RsaPublicKey, key: SymmetricKey) -> Self {
        Self { public_key, key, marker: DEFAULT_MARKER.to_string() }
    }

    /// Seal this marker instead of the default one.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Keep the symmetric key but wrap it under a newer public key.
    pub fn refresh_public_key(&mut self, public_key: &str) -> Result<(), CryptoError> {
        self.public_key = RsaPublicKey::from_base64(public_key)?;
        Ok(())
    }

    /// Request envelope carrying the wrapped key and sealed marker.
    ///
    /// Payload fields are added with [`HybridRequest::with_field`] and
    /// [`SimClient::seal`].
    pub fn request<E: Environment>(&self, env: &E) -> Result<HybridRequest, CryptoError> {
        Ok(HybridRequest::new(self.wrap_key(env)?, self.seal(&self.marker)?))
    }

    /// Base64 of the key encrypted block by block under the public key.
    pub fn wrap_key<E: Environment>(&self, env: &E) -> Result<String, CryptoError> {
        let blob = encrypt_blocks(&mut env.rng(), &self.public_key, self.key.as_bytes())?;
        Ok(encoding::encode(&blob))
    }

    /// Seal a payload field.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(encoding::encode(&self.key.seal(plaintext.as_bytes())?))
    }

    /// Open a sealed server response.
    pub fn open(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let plaintext = self.key.open(&encoding::decode(ciphertext)?)?;
        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Symmetric("plaintext is not UTF-8".to_string()))
    }

    /// Fingerprint the server will compute for this client's key.
    pub fn fingerprint(&self) -> String {
        self.key.to_base64()
    }

    /// The client's symmetric key.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }
}
