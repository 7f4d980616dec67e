//! Recipient path: trial-decrypt heads to find our mail, then decrypt the bodies we fetch.
//!
//! ### Why every head is tried against every identity
//!
//! There is no recipient field anywhere on the wire. The only way to know whether a head is ours is to run the full
//! key agreement and try to open the encrypted hash; the AEAD tag either verifies or it does not. The scan therefore
//! does the same work for every (head, identity) pair and never stops early after a match, so watching the client's
//! timing says nothing about which heads matched. Tag comparison itself is constant time inside aes-gcm.
//!
//! A failed attempt is the normal case (most heads belong to someone else), so it is not an error and not logged
//! above `trace`.

use tracing::{debug, trace, warn};
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CowmailError, Result};
use crate::head::{self, ENCRYPTED_HASH_SIZE, HEAD_SIZE};
use crate::identity::Identity;
use crate::messages::Message;
use crate::primitives::{aead_decrypt, derive_key, key_agreement, split_nonces, KEY_SIZE, NONCE_SIZE};

/// RetrievalTicket is what a successful head decryption buys: the body's hash (to GET it) plus what is needed to
/// decrypt it.
///
/// The shared secret is per-message; leaking a ticket exposes one message, never the identity's secret key. The AES
/// key is not stored, it is re-derived on every `open`. Tickets wipe themselves on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RetrievalTicket {
    hash: [u8; KEY_SIZE],
    shared_secret: [u8; KEY_SIZE],
    body_nonce: [u8; NONCE_SIZE],
    identity_index: usize,
}

impl RetrievalTicket {
    /// hash is the body hash to send in a GET
    pub fn hash(&self) -> &[u8; KEY_SIZE] {
        &self.hash
    }

    /// identity_index is the position (in the slice given to `scan`) of the identity this message is addressed to
    pub fn identity_index(&self) -> usize {
        self.identity_index
    }
}

impl std::fmt::Debug for RetrievalTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalTicket")
            .field("hash", &hex::encode(self.hash))
            .field("shared_secret", &"[REDACTED]")
            .field("identity_index", &self.identity_index)
            .finish()
    }
}

/// attempt runs one trial decryption. Secrets are `Zeroizing` and go away on both branches.
fn attempt(
    epk: &[u8; KEY_SIZE],
    chash: &[u8; ENCRYPTED_HASH_SIZE],
    secret_key: &StaticSecret,
    identity_index: usize,
) -> Option<RetrievalTicket> {
    let secret = key_agreement(secret_key, epk);
    let aeskey = derive_key(&secret);
    let (half_a, half_b) = split_nonces(epk);
    let hash = aead_decrypt(&aeskey, &half_a, chash).ok()?;
    let hash = <[u8; KEY_SIZE]>::try_from(hash.as_slice()).ok()?;
    Some(RetrievalTicket {
        hash,
        shared_secret: *secret,
        body_nonce: half_b,
        identity_index,
    })
}

/// try_open_head tests one head against one identity. `Ok(None)` means "not addressed to this identity" (or the
/// identity is a contact without a secret key); only a head of the wrong size is an error.
pub fn try_open_head(head: &[u8], identity: &Identity) -> Result<Option<RetrievalTicket>> {
    let (epk, chash) = head::decode(head)?;
    Ok(identity.secret().and_then(|sk| attempt(&epk, &chash, sk, 0)))
}

/// scan trial-decrypts every head against every identity, in order, and returns a ticket for each hit.
///
/// Identities without a secret key are skipped. A head can in principle match more than one identity (if the same
/// key was imported twice); each match produces its own ticket.
pub fn scan<'a, I>(heads: I, identities: &[Identity]) -> Vec<RetrievalTicket>
where
    I: IntoIterator<Item = &'a [u8; HEAD_SIZE]>,
{
    let mut tickets = Vec::new();
    let mut head_count = 0usize;
    for (head_index, raw) in heads.into_iter().enumerate() {
        head_count += 1;
        // fixed-size input, decode cannot fail
        let Ok((epk, chash)) = head::decode(raw) else {
            continue;
        };
        for (identity_index, identity) in identities.iter().enumerate() {
            let Some(secret_key) = identity.secret() else {
                continue;
            };
            if let Some(ticket) = attempt(&epk, &chash, secret_key, identity_index) {
                trace!(head_index, identity_index, "head opened");
                tickets.push(ticket);
            }
        }
    }
    debug!(
        heads = head_count,
        identities = identities.len(),
        tickets = tickets.len(),
        "scan finished"
    );
    tickets
}

/// open decrypts a fetched body with its ticket. Unlike a failed head, a failed body is a real problem (corrupted,
/// tampered, or not the body this ticket asked for), so it is reported as `DecryptionFailed`.
pub fn open(ticket: &RetrievalTicket, body: &[u8]) -> Result<Message> {
    let aeskey = derive_key(&ticket.shared_secret);
    match aead_decrypt(&aeskey, &ticket.body_nonce, body) {
        Ok(plaintext) => Ok(Message::new(plaintext)),
        Err(_) => {
            warn!(hash = %hex::encode(ticket.hash), body_len = body.len(), "body failed to decrypt");
            Err(CowmailError::DecryptionFailed)
        }
    }
}

/* ------------------------------------------------------------------------- */

// TESTS
