//! Per-request hybrid session.
//!
//! A [`HybridSession`] holds the symmetric key recovered from one request's
//! asymmetric ciphertext. It exposes no payload operations: the only thing
//! that can be done with it is [`HybridSession::verify`], which turns it into
//! a [`VerifiedSession`] once the marker checks out. Field decryption is only
//! reachable through the verified type, so a garbage key (stale public key,
//! wrong keypair) is rejected before any business field is touched.
//!
//! Sessions are never rekeyed and never persisted. The key's only durable
//! trace is its [fingerprint](VerifiedSession::fingerprint).

use sealgate_crypto::{RsaKeyPair, SymmetricKey, decrypt_blocks, encoding};

use crate::SessionError;

/// Session whose key has been recovered but not yet verified.
#[derive(Debug)]
pub struct HybridSession {
    key: SymmetricKey,
}

impl HybridSession {
    /// Recover the session key from a Base64 asymmetric ciphertext.
    ///
    /// The blob is cut into modulus-sized blocks (short final block allowed),
    /// each block is decrypted with `keypair`, and the plaintexts are joined
    /// in order to form the raw key.
    ///
    /// # Errors
    ///
    /// - `KeyRecovery`: bad Base64, empty input, or any block failed. No
    ///   partial key is ever returned.
    pub fn recover(keypair: &RsaKeyPair, key_ciphertext: &str) -> Result<Self, SessionError> {
        let blob = encoding::decode(key_ciphertext).map_err(|_| SessionError::KeyRecovery)?;
        let bytes = decrypt_blocks(keypair, &blob).map_err(|_| SessionError::KeyRecovery)?;

        Ok(Self { key: SymmetricKey::from_bytes(bytes) })
    }

    /// Check that the key decrypts `verify_ciphertext` to `marker`.
    ///
    /// # Errors
    ///
    /// - `KeyVerification`: the marker did not open, or opened to anything
    ///   else. Cipher errors are folded into this variant.
    pub fn verify(self, verify_ciphertext: &str, marker: &str) -> Result<VerifiedSession, SessionError> {
        match open(&self.key, verify_ciphertext) {
            Ok(plaintext) if plaintext == marker => Ok(VerifiedSession { key: self.key }),
            _ => Err(SessionError::KeyVerification),
        }
    }
}

/// Session whose key decrypted the marker correctly.
///
/// The only handle through which payload fields are opened or sealed.
#[derive(Debug)]
pub struct VerifiedSession {
    key: SymmetricKey,
}

impl VerifiedSession {
    /// Decrypt a Base64 ciphertext into a UTF-8 string.
    ///
    /// # Errors
    ///
    /// - `Decrypt`: malformed Base64, wrong padding, cipher failure, or a
    ///   plaintext that is not UTF-8
    pub fn open(&self, ciphertext: &str) -> Result<String, SessionError> {
        open(&self.key, ciphertext)
    }

    /// Encrypt a string and return the Base64 ciphertext.
    pub fn seal(&self, plaintext: &str) -> Result<String, SessionError> {
        self.key
            .seal(plaintext.as_bytes())
            .map(|sealed| encoding::encode(&sealed))
            .map_err(|e| SessionError::Encrypt { reason: e.to_string() })
    }

    /// Base64 of the raw key bytes.
    ///
    /// Stored against a privileged account at login and compared on every
    /// privileged request afterwards.
    pub fn fingerprint(&self) -> String {
        self.key.to_base64()
    }

    /// The raw session key.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }
}

fn open(key: &SymmetricKey, ciphertext: &str) -> Result<String, SessionError> {
    let decrypt = |reason: String| SessionError::Decrypt { reason };

    let sealed = encoding::decode(ciphertext).map_err(|e| decrypt(e.to_string()))?;
    let plaintext = key.open(&sealed).map_err(|e| decrypt(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|_| decrypt("plaintext is not UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use sealgate_crypto::{DEFAULT_MODULUS_BITS, encrypt_blocks};

    use super::*;

    const MARKER: &str = "SEALGATE";

    fn setup(seed: u64) -> (ChaCha20Rng, RsaKeyPair) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let keypair = RsaKeyPair::generate(&mut rng, DEFAULT_MODULUS_BITS).unwrap();
        (rng, keypair)
    }

    fn wrap(rng: &mut ChaCha20Rng, keypair: &RsaKeyPair, key: &SymmetricKey) -> String {
        let blob = encrypt_blocks(rng, keypair.public_key(), key.as_bytes()).unwrap();
        encoding::encode(&blob)
    }

    fn seal_with(key: &SymmetricKey, plaintext: &str) -> String {
        encoding::encode(&key.seal(plaintext.as_bytes()).unwrap())
    }

    #[test]
    fn recover_verify_and_open() {
        let (mut rng, keypair) = setup(1);
        let key = SymmetricKey::generate(&mut rng, 32).unwrap();

        let session = HybridSession::recover(&keypair, &wrap(&mut rng, &keypair, &key)).unwrap();
        let verified = session.verify(&seal_with(&key, MARKER), MARKER).unwrap();

        assert_eq!(verified.open(&seal_with(&key, "alice")).unwrap(), "alice");
        assert_eq!(verified.fingerprint(), key.to_base64());
    }

    #[test]
    fn seal_is_readable_by_the_client_key() {
        let (mut rng, keypair) = setup(2);
        let key = SymmetricKey::generate(&mut rng, 16).unwrap();

        let verified = HybridSession::recover(&keypair, &wrap(&mut rng, &keypair, &key))
            .unwrap()
            .verify(&seal_with(&key, MARKER), MARKER)
            .unwrap();

        let sealed = verified.seal("roster: 12 members").unwrap();
        let opened = key.open(&encoding::decode(&sealed).unwrap()).unwrap();
        assert_eq!(opened, b"roster: 12 members");
    }

    #[test]
    fn bad_base64_is_a_recovery_error() {
        let (_, keypair) = setup(3);
        let err = HybridSession::recover(&keypair, "%%%").unwrap_err();
        assert_eq!(err, SessionError::KeyRecovery);
    }

    #[test]
    fn empty_ciphertext_is_a_recovery_error() {
        let (_, keypair) = setup(4);
        assert_eq!(HybridSession::recover(&keypair, "").unwrap_err(), SessionError::KeyRecovery);
    }

    #[test]
    fn key_for_other_public_key_is_a_recovery_error() {
        let (mut rng, current) = setup(5);
        let (_, stale) = setup(6);
        let key = SymmetricKey::generate(&mut rng, 32).unwrap();

        let result = HybridSession::recover(&current, &wrap(&mut rng, &stale, &key));
        assert_eq!(result.unwrap_err(), SessionError::KeyRecovery);
    }

    #[test]
    fn wrong_marker_is_a_verification_error() {
        let (mut rng, keypair) = setup(7);
        let key = SymmetricKey::generate(&mut rng, 32).unwrap();
        let session = HybridSession::recover(&keypair, &wrap(&mut rng, &keypair, &key)).unwrap();

        let err = session.verify(&seal_with(&key, "NOT-THE-MARKER"), MARKER).unwrap_err();
        assert_eq!(err, SessionError::KeyVerification);
    }

    #[test]
    fn unusable_key_length_is_a_verification_error() {
        let (mut rng, keypair) = setup(8);
        let blob = encrypt_blocks(&mut rng, keypair.public_key(), &[7u8; 20]).unwrap();

        let session = HybridSession::recover(&keypair, &encoding::encode(&blob)).unwrap();
        let err = session.verify("AAAAAAAAAAAAAAAAAAAAAA==", MARKER).unwrap_err();
        assert_eq!(err, SessionError::KeyVerification);
    }

    #[test]
    fn open_reports_malformed_fields() {
        let (mut rng, keypair) = setup(9);
        let key = SymmetricKey::generate(&mut rng, 32).unwrap();
        let verified = HybridSession::recover(&keypair, &wrap(&mut rng, &keypair, &key))
            .unwrap()
            .verify(&seal_with(&key, MARKER), MARKER)
            .unwrap();

        assert!(matches!(verified.open("not base64!"), Err(SessionError::Decrypt { .. })));
        assert!(matches!(verified.open("AAAA"), Err(SessionError::Decrypt { .. })));
    }
}
