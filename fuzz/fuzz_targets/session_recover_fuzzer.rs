//! Fuzz target for session key recovery and marker verification
//!
//! Feeds arbitrary key and marker ciphertexts through the server side of the
//! handshake, plus block-aligned blobs so that RSA decryption itself is
//! exercised rather than stopping at Base64.
//!
//! # Invariants
//!
//! - Recovery and verification NEVER panic
//! - Failures are always `KeyRecovery` or `KeyVerification`
//! - A key that passes verification can seal and open

#![no_main]

use std::sync::LazyLock;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sealgate_core::{DEFAULT_MARKER, HybridSession, SessionError};
use sealgate_crypto::{DEFAULT_MODULUS_BITS, RsaKeyPair, encoding};

static KEYPAIR: LazyLock<RsaKeyPair> = LazyLock::new(|| {
    let mut rng = ChaCha20Rng::seed_from_u64(0xF022);
    RsaKeyPair::generate(&mut rng, DEFAULT_MODULUS_BITS).expect("fuzz keypair")
});

#[derive(Debug, Arbitrary)]
enum Input {
    /// Raw strings straight off the wire
    Text { key_ciphertext: String, verify_ciphertext: String },
    /// Well-formed Base64 of arbitrary bytes
    Bytes { blob: Vec<u8>, verify_ciphertext: String },
}

fuzz_target!(|input: Input| {
    let (key_ciphertext, verify_ciphertext) = match input {
        Input::Text { key_ciphertext, verify_ciphertext } => (key_ciphertext, verify_ciphertext),
        Input::Bytes { blob, verify_ciphertext } => (encoding::encode(&blob), verify_ciphertext),
    };

    match HybridSession::recover(&KEYPAIR, &key_ciphertext) {
        Ok(session) => match session.verify(&verify_ciphertext, DEFAULT_MARKER) {
            Ok(verified) => {
                // Verified keys must be able to seal their own output.
                let sealed = verified.seal(DEFAULT_MARKER).expect("verified key seals");
                assert_eq!(verified.open(&sealed).expect("verified key opens"), DEFAULT_MARKER);
            },
            Err(err) => assert_eq!(err, SessionError::KeyVerification),
        },
        Err(err) => assert_eq!(err, SessionError::KeyRecovery),
    }
});
