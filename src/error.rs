//! Error taxonomy shared by the sealer, opener and transport.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CowmailError>;

/// CowmailError covers everything the crypto core and the transport can report.
///
/// `AuthFailure` is deliberately opaque: it never says how much of a tag matched.
#[derive(Debug, Error)]
pub enum CowmailError {
    /// AEAD tag mismatch. Expected and frequent while scanning heads.
    #[error("authentication failed")]
    AuthFailure,
    /// Head codec received something other than 80 bytes.
    #[error("malformed head: expected 80 bytes, got {len}")]
    MalformedHead { len: usize },
    /// The operating system refused to hand out random bytes.
    #[error("secure randomness unavailable")]
    RandomnessUnavailable,
    /// Plaintext too long to fit in a GET response once sealed.
    #[error("message exceeds {limit} bytes")]
    MessageTooLarge { limit: usize },
    /// A fetched body did not decrypt under its ticket.
    #[error("decryption failed")]
    DecryptionFailed,
    /// Key material that is the wrong size or does not form a keypair.
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
    /// Connect/read/write failure talking to a server.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server sent more than the configured response bound.
    #[error("response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
    /// A server string that does not parse as host[:port].
    #[error("invalid server address: {0}")]
    InvalidServerAddress(String),
}

impl From<std::io::Error> for CowmailError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
