//! Hybrid request envelope.
//!
//! Every confidential operation arrives as three kinds of strings: the
//! asymmetric ciphertext carrying the session key, the symmetric ciphertext
//! of the marker, and one or more symmetric ciphertexts carrying payload
//! fields. Cleartext routing fields ride alongside for the business layer.
//! How these strings are transported is up to the caller.

use std::collections::BTreeMap;

use sealgate_crypto::RsaKeyPair;
use serde::{Deserialize, Serialize};

use crate::{HybridSession, SessionError, VerifiedSession};

/// Marker plaintext used when a deployment does not configure its own.
///
/// Matches what existing mobile clients encrypt.
pub const DEFAULT_MARKER: &str = "TD-SATA";

/// Protocol constants shared with clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Known plaintext the client encrypts with its session key
    pub marker: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self { marker: DEFAULT_MARKER.to_string() }
    }
}

/// One inbound confidential request, still fully encrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridRequest {
    /// Base64 RSA ciphertext of the session key
    pub key_ciphertext: String,
    /// Base64 AES ciphertext of the marker
    pub verify_ciphertext: String,
    /// Encrypted payload fields by name
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Cleartext routing fields by name
    #[serde(default)]
    pub routing: BTreeMap<String, String>,
}

impl HybridRequest {
    /// Start a request from its two key-carrying strings.
    pub fn new(key_ciphertext: impl Into<String>, verify_ciphertext: impl Into<String>) -> Self {
        Self {
            key_ciphertext: key_ciphertext.into(),
            verify_ciphertext: verify_ciphertext.into(),
            ..Self::default()
        }
    }

    /// Add an encrypted payload field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, ciphertext: impl Into<String>) -> Self {
        self.fields.insert(name.into(), ciphertext.into());
        self
    }

    /// Add a cleartext routing field.
    #[must_use]
    pub fn with_routing(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.routing.insert(name.into(), value.into());
        self
    }

    /// Recover and verify the session key.
    ///
    /// Recovery happens first, then marker verification; no payload field is
    /// decrypted before both succeed.
    pub fn open<'a>(
        &'a self,
        keypair: &RsaKeyPair,
        protocol: &ProtocolConfig,
    ) -> Result<OpenedRequest<'a>, SessionError> {
        let session = HybridSession::recover(keypair, &self.key_ciphertext)?
            .verify(&self.verify_ciphertext, &protocol.marker)?;

        Ok(OpenedRequest { request: self, session })
    }
}

/// A request whose session key has been verified.
///
/// Payload fields are decrypted lazily, one at a time.
#[derive(Debug)]
pub struct OpenedRequest<'a> {
    request: &'a HybridRequest,
    session: VerifiedSession,
}

impl OpenedRequest<'_> {
    /// Decrypt a named payload field.
    ///
    /// # Errors
    ///
    /// - `MissingField`: the request has no such field
    /// - `Decrypt`: the field did not open
    pub fn field(&self, name: &str) -> Result<String, SessionError> {
        let ciphertext = self
            .request
            .fields
            .get(name)
            .ok_or_else(|| SessionError::MissingField(name.to_string()))?;

        self.session.open(ciphertext)
    }

    /// A cleartext routing field, if present.
    pub fn routing(&self, name: &str) -> Option<&str> {
        self.request.routing.get(name).map(String::as_str)
    }

    /// The verified session, for sealing responses and fingerprinting.
    pub fn session(&self) -> &VerifiedSession {
        &self.session
    }

    /// Consume the request and keep only the session.
    pub fn into_session(self) -> VerifiedSession {
        self.session
    }
}
