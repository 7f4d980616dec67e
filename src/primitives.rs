//! Key agreement, key derivation and AEAD. Everything else in the crate is built from these four calls.
//!
//! Secrets come back wrapped in `Zeroizing`, so they are wiped when they go out of scope, including on `?` returns.

use aes_gcm::aead::{consts::U16, Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{CowmailError, Result};
use crate::sealer::MAX_MESSAGE_SIZE;

/// KEY_SIZE is 32 bytes (curve points, scalars, AES keys and hashes)
pub const KEY_SIZE: usize = 32;
/// NONCE_SIZE is 16 bytes, half of an ephemeral public key
pub const NONCE_SIZE: usize = 16;
/// TAG_SIZE is 16 bytes
pub const TAG_SIZE: usize = 16;

/// AES-256-GCM with a 128-bit nonce instead of the usual 96 bits.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// random_secret draws a fresh X25519 scalar from the OS. There is no fallback source.
pub fn random_secret() -> Result<StaticSecret> {
    let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng
        .try_fill_bytes(&mut bytes[..])
        .map_err(|_| CowmailError::RandomnessUnavailable)?;
    Ok(StaticSecret::from(*bytes))
}

/// key_agreement is plain X25519: `secret * public`.
pub fn key_agreement(secret: &StaticSecret, public: &[u8; KEY_SIZE]) -> Zeroizing<[u8; KEY_SIZE]> {
    let shared = secret.diffie_hellman(&PublicKey::from(*public));
    Zeroizing::new(shared.to_bytes())
}

/// derive_key hashes the raw shared secret into an AES key.
pub fn derive_key(shared: &[u8; KEY_SIZE]) -> Zeroizing<[u8; KEY_SIZE]> {
    Zeroizing::new(sha256(shared))
}

/// sha256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; KEY_SIZE] {
    Sha256::digest(data).into()
}

/// aead_encrypt returns `ciphertext || tag`.
pub fn aead_encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm16::new_from_slice(key)
        .map_err(|_| CowmailError::InvalidKey("aes key must be 32 bytes"))?;
    cipher
        .encrypt(Nonce::<U16>::from_slice(nonce), plaintext)
        .map_err(|_| CowmailError::MessageTooLarge { limit: MAX_MESSAGE_SIZE })
}

/// aead_decrypt checks the tag (in constant time, inside aes-gcm) and returns the plaintext.
///
/// Every failure is the same `AuthFailure`, including input shorter than a tag.
pub fn aead_decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm16::new_from_slice(key).map_err(|_| CowmailError::AuthFailure)?;
    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), ciphertext)
        .map_err(|_| CowmailError::AuthFailure)
}

/// split_nonces cuts an ephemeral public key into (hash nonce, body nonce).
pub fn split_nonces(epk: &[u8; KEY_SIZE]) -> ([u8; NONCE_SIZE], [u8; NONCE_SIZE]) {
    let mut half_a = [0u8; NONCE_SIZE];
    let mut half_b = [0u8; NONCE_SIZE];
    half_a.copy_from_slice(&epk[..NONCE_SIZE]);
    half_b.copy_from_slice(&epk[NONCE_SIZE..]);
    (half_a, half_b)
}

/* ------------------------------------------------------------------------- */

// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_agreement_is_symmetric() {
        let a = random_secret().unwrap();
        let b = random_secret().unwrap();
        let a_pub = PublicKey::from(&a).to_bytes();
        let b_pub = PublicKey::from(&b).to_bytes();
        assert_eq!(*key_agreement(&a, &b_pub), *key_agreement(&b, &a_pub));
    }

    #[test]
    fn key_agreement_is_deterministic() {
        let a = StaticSecret::from([7u8; 32]);
        let b_pub = PublicKey::from(&StaticSecret::from([9u8; 32])).to_bytes();
        assert_eq!(*key_agreement(&a, &b_pub), *key_agreement(&a, &b_pub));
    }

    #[test]
    fn derive_key_is_sha256_of_shared() {
        // sha256 of 32 zero bytes
        let expected =
            hex::decode("66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925")
                .unwrap();
        assert_eq!(derive_key(&[0u8; 32]).as_slice(), expected.as_slice());
    }

    #[test]
    fn aead_appends_tag() {
        let key = [1u8; 32];
        let nonce = [2u8; 16];
        let ct = aead_encrypt(&key, &nonce, b"hello").unwrap();
        assert_eq!(ct.len(), 5 + TAG_SIZE);
        assert_eq!(aead_decrypt(&key, &nonce, &ct).unwrap(), b"hello");
    }

    #[test]
    fn aead_rejects_wrong_key_nonce_and_tag() {
        let key = [1u8; 32];
        let nonce = [2u8; 16];
        let mut ct = aead_encrypt(&key, &nonce, b"hello").unwrap();
        assert!(matches!(aead_decrypt(&[3u8; 32], &nonce, &ct), Err(CowmailError::AuthFailure)));
        assert!(matches!(aead_decrypt(&key, &[0u8; 16], &ct), Err(CowmailError::AuthFailure)));
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert!(matches!(aead_decrypt(&key, &nonce, &ct), Err(CowmailError::AuthFailure)));
    }

    #[test]
    fn aead_rejects_truncated_input() {
        assert!(matches!(aead_decrypt(&[1u8; 32], &[2u8; 16], &[0u8; 5]), Err(CowmailError::AuthFailure)));
    }

    #[test]
    fn split_nonces_halves_the_key() {
        let mut epk = [0u8; 32];
        for (i, b) in epk.iter_mut().enumerate() {
            *b = i as u8;
        }
        let (a, b) = split_nonces(&epk);
        assert_eq!(a[0], 0);
        assert_eq!(a[15], 15);
        assert_eq!(b[0], 16);
        assert_eq!(b[15], 31);
    }
}
