//! Stores message data: the plaintext a user writes, and the sealed blob that goes on the wire.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CowmailError, Result};
use crate::head::HEAD_SIZE;
use crate::primitives::{sha256, KEY_SIZE, TAG_SIZE};

/// Message is a plaintext payload. It is wiped when dropped.
///
/// Text messages carry a trailing NUL byte on the wire (so "hello" is 6 bytes), which keeps them readable by clients
/// that treat the payload as a C string.
#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Message {
    bytes: Vec<u8>,
}

impl Message {
    /// new wraps raw bytes as-is
    pub fn new(bytes: Vec<u8>) -> Message {
        Message { bytes }
    }

    /// from_text appends the NUL terminator
    pub fn from_text(text: &str) -> Message {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        Message { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// text drops one trailing NUL (if any) and decodes the rest as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        let trimmed = self.bytes.strip_suffix(&[0u8]).unwrap_or(&self.bytes[..]);
        String::from_utf8_lossy(trimmed).into_owned()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message({} bytes)", self.bytes.len())
    }
}

/// SealedMessage is `head || body`, where body is `ciphertext || tag`.
///
/// The head alone is what LIST hands out; the body is only ever fetched by its hash.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedMessage {
    head: [u8; HEAD_SIZE],
    body: Vec<u8>,
}

impl SealedMessage {
    pub(crate) fn new(head: [u8; HEAD_SIZE], body: Vec<u8>) -> SealedMessage {
        SealedMessage { head, body }
    }

    pub fn head(&self) -> &[u8; HEAD_SIZE] {
        &self.head
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// body_hash is the key a server stores the body under, and what a GET asks for
    pub fn body_hash(&self) -> [u8; KEY_SIZE] {
        sha256(&self.body)
    }

    pub fn len(&self) -> usize {
        HEAD_SIZE + self.body.len()
    }

    /// to_bytes produces the PUT payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.head);
        out.extend_from_slice(&self.body);
        out
    }

    /// from_bytes splits a PUT payload. Anything too short to hold a head and a tag is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<SealedMessage> {
        if bytes.len() < HEAD_SIZE + TAG_SIZE {
            return Err(CowmailError::MalformedHead { len: bytes.len() });
        }
        let mut head = [0u8; HEAD_SIZE];
        head.copy_from_slice(&bytes[..HEAD_SIZE]);
        Ok(SealedMessage {
            head,
            body: bytes[HEAD_SIZE..].to_vec(),
        })
    }
}

impl std::fmt::Debug for SealedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedMessage")
            .field("epk", &hex::encode(&self.head[..4]))
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_messages_are_nul_terminated() {
        let m = Message::from_text("hello");
        assert_eq!(m.as_bytes(), b"hello\0");
        assert_eq!(m.len(), 6);
        assert_eq!(m.text(), "hello");
    }

    #[test]
    fn text_without_terminator_is_kept_whole() {
        let m = Message::new(b"raw".to_vec());
        assert_eq!(m.text(), "raw");
        // only one terminator is stripped
        let m = Message::new(b"x\0\0".to_vec());
        assert_eq!(m.text(), "x\0");
    }

    #[test]
    fn sealed_bytes_split_back() {
        let sealed = SealedMessage::new([7u8; HEAD_SIZE], vec![9u8; 22]);
        let bytes = sealed.to_bytes();
        assert_eq!(bytes.len(), 102);
        assert_eq!(SealedMessage::from_bytes(&bytes).unwrap(), sealed);
    }

    #[test]
    fn sealed_from_short_bytes_fails() {
        assert!(SealedMessage::from_bytes(&[0u8; HEAD_SIZE + TAG_SIZE - 1]).is_err());
        assert!(SealedMessage::from_bytes(&[0u8; HEAD_SIZE + TAG_SIZE]).is_ok());
    }

    #[test]
    fn debug_hides_plaintext() {
        let m = Message::from_text("top secret");
        assert_eq!(format!("{:?}", m), "Message(11 bytes)");
    }
}
