//! The head is the 80-byte public record the server advertises for every stored message.
//!
//! Layout: `[ephemeral public key: 32][encrypted hash: 32 + 16 tag]`. Both fields are opaque byte strings, so there is
//! no endianness to worry about.

use crate::error::{CowmailError, Result};
use crate::primitives::{KEY_SIZE, TAG_SIZE};

/// ENCRYPTED_HASH_SIZE is the sealed body hash: 32 bytes plus a tag
pub const ENCRYPTED_HASH_SIZE: usize = KEY_SIZE + TAG_SIZE;
/// HEAD_SIZE is 80 bytes
pub const HEAD_SIZE: usize = KEY_SIZE + ENCRYPTED_HASH_SIZE;

/// encode concatenates the two head fields. It cannot fail: the array types already pin the sizes.
pub fn encode(pkey: &[u8; KEY_SIZE], chash: &[u8; ENCRYPTED_HASH_SIZE]) -> [u8; HEAD_SIZE] {
    let mut head = [0u8; HEAD_SIZE];
    head[..KEY_SIZE].copy_from_slice(pkey);
    head[KEY_SIZE..].copy_from_slice(chash);
    head
}

/// decode splits a head back into (ephemeral public key, encrypted hash)
pub fn decode(bytes: &[u8]) -> Result<([u8; KEY_SIZE], [u8; ENCRYPTED_HASH_SIZE])> {
    if bytes.len() != HEAD_SIZE {
        return Err(CowmailError::MalformedHead { len: bytes.len() });
    }
    let mut pkey = [0u8; KEY_SIZE];
    let mut chash = [0u8; ENCRYPTED_HASH_SIZE];
    pkey.copy_from_slice(&bytes[..KEY_SIZE]);
    chash.copy_from_slice(&bytes[KEY_SIZE..]);
    Ok((pkey, chash))
}
