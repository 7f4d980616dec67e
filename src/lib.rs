//! # Cowmail Library (Client Side)
//!
//! A pure rust implementation of the cowmail protocol for anonymous store-and-forward messaging. A sender encrypts a
//! message so that only the recipient can recognize it, and drops it on a server that cannot tell who it is for. The
//! recipient downloads every head the server has and trial-decrypts them; the ones that open are theirs.
//!
//! ### Warnings and Disclaimers
//!
//! - DO NOT USE IN PRODUCTION: this library and its protocol have NOT been audited.
//! - Senders are anonymous by design. Nothing in a message authenticates who wrote it.
//! - There is no spam or flooding defense: anyone who knows your public key can fill your mailbox.
//!
//! ### Examples / API
//!
//! Bob creates an identity and hands his public key (base64) to Alice over some trusted channel.
//!
//! ```rust
//! let bob = Identity::generate("bob")?;
//! let bob_key = bob.public_key_base64();
//! ```
//!
//! Alice adds Bob as a contact and seals a message for him. The sealed message is an 80-byte head followed by the
//! encrypted body.
//!
//! ```rust
//! let contact = Identity::contact("bob", decode_key_base64(&bob_key)?);
//! let sealed = seal(&Message::from_text("Hi Bob, did you know that cows are awesome?"), &contact)?;
//! transport::put(&config, &sealed)?;
//! ```
//!
//! Bob lists every head on the server, scans them with his identities, and fetches what matched.
//!
//! ```rust
//! let heads = transport::list(&config)?;
//! for ticket in scan(heads.iter(), &[bob]) {
//!     let body = transport::get(&config, ticket.hash())?;
//!     println!("{}", open(&ticket, &body)?.text());
//! }
//! ```
//!
//! `transport::fetch_all` does those three steps in one call.
//!
//! ### Under the Hood
//!
//! Every message gets a fresh ephemeral X25519 keypair. The sender agrees a secret with the recipient's public key,
//! hashes it (SHA-256) into an AES-256-GCM key, encrypts the body, then encrypts the body's SHA-256 and puts it in the
//! head next to the ephemeral public key. The two AEAD nonces are the two halves of the ephemeral public key, which
//! is safe because that key is never used twice.
//!
//! A head that opens yields a `RetrievalTicket`: the body hash to ask the server for, plus the per-message shared
//! secret to decrypt it with. The identity's own secret key never leaves the `Identity`, and every secret buffer is
//! wiped when it goes out of scope.

pub mod config;
pub mod error;
pub mod head;
pub mod identity;
pub mod messages;
pub mod opener;
pub mod primitives;
pub mod sealer;
pub mod transport;

#[cfg(test)]
mod proptests;

pub use config::{ClientConfig, ServerAddr, DEFAULT_PORT};
pub use error::{CowmailError, Result};
pub use identity::{decode_key_base64, Identity};
pub use messages::{Message, SealedMessage};
pub use opener::{open, scan, try_open_head, RetrievalTicket};
pub use sealer::seal;
