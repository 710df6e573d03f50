//! Chunked RSA key transport.
//!
//! A single PKCS#1 v1.5 operation can carry at most `modulus_bytes - 11`
//! bytes, so longer key material is cut into chunks that are encrypted one
//! by one. The resulting blocks are simply concatenated: no length prefix,
//! no separators.

use std::ops::Range;

use rand_core::CryptoRngCore;
use rsa::Pkcs1v15Encrypt;
use zeroize::Zeroizing;

use crate::{CryptoError, RsaKeyPair, RsaPublicKey};

/// Bytes of PKCS#1 v1.5 padding in every encrypted block.
pub const PKCS1_OVERHEAD: usize = 11;

/// Split `len` bytes into consecutive blocks of `block_size`.
///
/// Yields `ceil(len / block_size)` ranges; the last one holds the remainder
/// and is shorter when `len` is not a multiple. Yields nothing when either
/// argument is zero.
pub fn block_ranges(len: usize, block_size: usize) -> impl Iterator<Item = Range<usize>> {
    let count = if block_size == 0 { 0 } else { len.div_ceil(block_size) };

    (0..count).map(move |i| {
        let start = i * block_size;
        start..(start + block_size).min(len)
    })
}

/// Recover plaintext from a concatenation of RSA blocks.
///
/// Every block is decrypted independently with the private key and the
/// plaintexts are joined in block order.
///
/// # Errors
///
/// - `Rsa`: input is empty or any block fails to decrypt (wrong key,
///   corrupted or truncated input). The failing block is not reported.
pub fn decrypt_blocks(
    keypair: &RsaKeyPair,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::Rsa("empty ciphertext".to_string()));
    }

    let block_size = keypair.modulus_bytes();
    let mut plaintext = Zeroizing::new(Vec::with_capacity(ciphertext.len()));

    for range in block_ranges(ciphertext.len(), block_size) {
        let block = Zeroizing::new(
            keypair
                .private()
                .decrypt(Pkcs1v15Encrypt, &ciphertext[range])
                .map_err(|_| CryptoError::Rsa("block decryption failed".to_string()))?,
        );

        plaintext.extend_from_slice(&block);
    }

    Ok(plaintext)
}

/// Client side of the framing: encrypt `plaintext` chunk by chunk.
///
/// Each chunk is at most `modulus_bytes - 11` bytes and encrypts to exactly
/// `modulus_bytes`, so the output length is always a multiple of the modulus
/// size. Padding randomness comes from `rng`.
pub fn encrypt_blocks<R: CryptoRngCore>(
    rng: &mut R,
    public_key: &RsaPublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = public_key.modulus_bytes();
    let chunk_size = block_size.saturating_sub(PKCS1_OVERHEAD);
    if chunk_size == 0 {
        return Err(CryptoError::Rsa(format!("modulus of {block_size} bytes is too small")));
    }

    let mut ciphertext = Vec::with_capacity(plaintext.len().div_ceil(chunk_size) * block_size);

    for range in block_ranges(plaintext.len(), chunk_size) {
        let block = public_key
            .rsa()
            .encrypt(rng, Pkcs1v15Encrypt, &plaintext[range])
            .map_err(|e| CryptoError::Rsa(e.to_string()))?;

        ciphertext.extend_from_slice(&block);
    }

    Ok(ciphertext)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::DEFAULT_MODULUS_BITS;

    fn keypair(seed: u64) -> RsaKeyPair {
        RsaKeyPair::generate(&mut ChaCha20Rng::seed_from_u64(seed), DEFAULT_MODULUS_BITS).unwrap()
    }

    fn seal(public_key: &RsaPublicKey, plaintext: &[u8]) -> Vec<u8> {
        encrypt_blocks(&mut ChaCha20Rng::seed_from_u64(99), public_key, plaintext).unwrap()
    }

    fn lengths(len: usize, block_size: usize) -> Vec<usize> {
        block_ranges(len, block_size).map(|r| r.len()).collect()
    }

    #[test]
    fn ranges_for_exact_multiple() {
        assert_eq!(lengths(256, 128), vec![128, 128]);
    }

    #[test]
    fn ranges_keep_short_final_block() {
        assert_eq!(lengths(300, 128), vec![128, 128, 44]);
    }

    #[test]
    fn ranges_for_empty_input() {
        assert!(lengths(0, 128).is_empty());
        assert!(lengths(10, 0).is_empty());
    }

    #[test]
    fn ranges_are_contiguous() {
        let ranges: Vec<_> = block_ranges(1000, 117).collect();

        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(1000));
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn roundtrip_single_block() {
        let pair = keypair(11);
        let key = [7u8; 32];

        let ciphertext = seal(pair.public_key(), &key);
        assert_eq!(ciphertext.len(), 128);

        let recovered = decrypt_blocks(&pair, &ciphertext).unwrap();
        assert_eq!(recovered.as_slice(), &key);
    }

    #[test]
    fn roundtrip_many_blocks_with_short_final_chunk() {
        let pair = keypair(12);
        let material: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();

        let ciphertext = seal(pair.public_key(), &material);
        assert_eq!(ciphertext.len(), 3 * 128);

        let recovered = decrypt_blocks(&pair, &ciphertext).unwrap();
        assert_eq!(recovered.as_slice(), material.as_slice());
    }

    #[test]
    fn wrong_private_key_fails() {
        let sender = keypair(13);
        let other = keypair(14);

        let ciphertext = seal(sender.public_key(), &[1u8; 16]);
        let result = decrypt_blocks(&other, &ciphertext);

        assert!(matches!(result, Err(CryptoError::Rsa(_))));
    }

    #[test]
    fn truncated_final_block_fails() {
        let pair = keypair(15);
        let mut ciphertext = seal(pair.public_key(), &[9u8; 200]);
        ciphertext.truncate(ciphertext.len() - 5);

        assert!(decrypt_blocks(&pair, &ciphertext).is_err());
    }

    #[test]
    fn empty_ciphertext_fails() {
        let pair = keypair(16);
        assert!(decrypt_blocks(&pair, &[]).is_err());
    }

    #[test]
    fn error_does_not_name_the_block() {
        let pair = keypair(17);
        let mut ciphertext = seal(pair.public_key(), &[3u8; 250]);
        ciphertext[200] ^= 0xFF;

        let err = decrypt_blocks(&pair, &ciphertext).unwrap_err();
        assert_eq!(err.to_string(), "rsa operation failed: block decryption failed");
    }
}
