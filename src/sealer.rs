//! Sender path: turn a plaintext and a recipient public key into head + body.
//!
//! Both AEAD nonces are cut out of the ephemeral public key (first half for the hash, second half for the body).
//! That is only sound because the ephemeral key is generated inside `seal_bytes` and dropped before it returns; no
//! caller can ever supply or reuse one.

use x25519_dalek::PublicKey;

use crate::config::DEFAULT_MAX_RESPONSE;
use crate::error::{CowmailError, Result};
use crate::head::{self, ENCRYPTED_HASH_SIZE};
use crate::identity::Identity;
use crate::messages::{Message, SealedMessage};
use crate::primitives::{
    aead_encrypt, derive_key, key_agreement, random_secret, sha256, split_nonces, KEY_SIZE, TAG_SIZE,
};

/// MAX_MESSAGE_SIZE is the largest plaintext whose body still fits in a default-sized GET response
pub const MAX_MESSAGE_SIZE: usize = DEFAULT_MAX_RESPONSE - TAG_SIZE;

/// seal encrypts a message for a recipient (a contact is enough, no secret key needed)
pub fn seal(message: &Message, recipient: &Identity) -> Result<SealedMessage> {
    seal_bytes(message.as_bytes(), recipient.public_key())
}

/// seal_bytes is `seal` over raw bytes and a raw public key
pub fn seal_bytes(message: &[u8], recipient_public_key: &[u8; KEY_SIZE]) -> Result<SealedMessage> {
    if message.len() > MAX_MESSAGE_SIZE {
        return Err(CowmailError::MessageTooLarge { limit: MAX_MESSAGE_SIZE });
    }
    // Single-use ephemeral keypair; the secret is wiped as soon as the shared secret exists
    let esk = random_secret()?;
    let epk = PublicKey::from(&esk).to_bytes();
    let secret = key_agreement(&esk, recipient_public_key);
    drop(esk);
    let aeskey = derive_key(&secret);
    drop(secret);
    let (half_a, half_b) = split_nonces(&epk);
    // Body first, since the head commits to the body's hash
    let body = aead_encrypt(&aeskey, &half_b, message)?;
    let body_hash = sha256(&body);
    let sealed_hash = aead_encrypt(&aeskey, &half_a, &body_hash)?;
    let mut chash = [0u8; ENCRYPTED_HASH_SIZE];
    chash.copy_from_slice(&sealed_hash);
    Ok(SealedMessage::new(head::encode(&epk, &chash), body))
}
