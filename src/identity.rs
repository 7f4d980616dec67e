//! An Identity is a mailbox: a long-lived X25519 keypair with a human label. A contact is the same thing without the secret half.

use anyhow;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{CowmailError, Result};
use crate::primitives::{random_secret, KEY_SIZE};

/// Identity holds a name, a public key and (for our own mailboxes) the secret key.
///
/// The secret lives in a `StaticSecret`, which wipes itself on drop. Identity is deliberately not `Clone`; use
/// `to_contact` to hand out the public half.
pub struct Identity {
    pub name: String,
    public_key: [u8; KEY_SIZE],
    secret_key: Option<StaticSecret>,
}

impl Identity {
    /// generate builds a new identity from fresh OS randomness
    pub fn generate(name: &str) -> Result<Self> {
        Ok(Self::from_static(name, random_secret()?))
    }

    /// from_secret rebuilds an identity from a stored secret key, deriving the public key
    pub fn from_secret(name: &str, secret_key: [u8; KEY_SIZE]) -> Self {
        let secret_key = Zeroizing::new(secret_key);
        Self::from_static(name, StaticSecret::from(*secret_key))
    }

    /// from_keys imports both halves. A secret that does not match the public key is rejected, since we could never
    /// open mail sent to that public key.
    pub fn from_keys(
        name: &str,
        public_key: [u8; KEY_SIZE],
        secret_key: Option<[u8; KEY_SIZE]>,
    ) -> Result<Self> {
        match secret_key {
            None => Ok(Self::contact(name, public_key)),
            Some(secret_key) => {
                let id = Self::from_secret(name, secret_key);
                if id.public_key != public_key {
                    return Err(CowmailError::InvalidKey("secret key does not match public key"));
                }
                Ok(id)
            }
        }
    }

    /// contact builds a public-only identity (someone we can write to)
    pub fn contact(name: &str, public_key: [u8; KEY_SIZE]) -> Self {
        Self {
            name: name.to_string(),
            public_key,
            secret_key: None,
        }
    }

    /// to_contact copies the public half under the same name
    pub fn to_contact(&self) -> Self {
        Self::contact(&self.name, self.public_key)
    }

    fn from_static(name: &str, secret: StaticSecret) -> Self {
        Self {
            name: name.to_string(),
            public_key: PublicKey::from(&secret).to_bytes(),
            secret_key: Some(secret),
        }
    }

    pub fn public_key(&self) -> &[u8; KEY_SIZE] {
        &self.public_key
    }

    pub fn has_secret(&self) -> bool {
        self.secret_key.is_some()
    }

    pub(crate) fn secret(&self) -> Option<&StaticSecret> {
        self.secret_key.as_ref()
    }

    /// public_key_base64 is the form users paste into each other's contact lists
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public_key)
    }

    /// secret_key_base64 exports the secret key (handle with care, the string is wiped on drop)
    pub fn secret_key_base64(&self) -> Option<Zeroizing<String>> {
        self.secret_key.as_ref().map(|secret| {
            let bytes = Zeroizing::new(secret.to_bytes());
            Zeroizing::new(BASE64.encode(bytes.as_slice()))
        })
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name)
            .field("public_key", &hex::encode(self.public_key))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// decode_key_base64 parses a base64 key as typed by a user. Anything that is not exactly 32 bytes is not a valid key.
pub fn decode_key_base64(encoded: &str) -> anyhow::Result<[u8; KEY_SIZE]> {
    let decoded = Zeroizing::new(BASE64.decode(encoded.trim())?);
    if decoded.len() != KEY_SIZE {
        anyhow::bail!("not a valid cowmail key: expected {} bytes, got {}", KEY_SIZE, decoded.len());
    }
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&decoded);
    Ok(key)
}

/* ------------------------------------------------------------------------- */

// TESTS
