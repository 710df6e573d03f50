//! Fuzz target for symmetric seal/open
//!
//! # Invariants
//!
//! - `open` NEVER panics on arbitrary ciphertext, whatever the key length
//! - For 16, 24 and 32 byte keys, `open(seal(m)) == m`
//! - For any other key length both directions fail with `InvalidKeyLength`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealgate_crypto::{CryptoError, SymmetricKey};

#[derive(Debug, Arbitrary)]
struct Input {
    key: Vec<u8>,
    ciphertext: Vec<u8>,
    plaintext: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let key = SymmetricKey::from_bytes(input.key);
    let _ = key.open(&input.ciphertext);

    match key.len() {
        16 | 24 | 32 => {
            let sealed = key.seal(&input.plaintext).expect("valid key seals");
            assert_eq!(sealed.len() % 16, 0);
            assert_eq!(key.open(&sealed).expect("valid key opens"), input.plaintext);
        },
        len => {
            assert_eq!(key.seal(&input.plaintext), Err(CryptoError::InvalidKeyLength(len)));
        },
    }
});
