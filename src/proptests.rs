//! Property-based tests for the sealing scheme.

use proptest::prelude::*;
use x25519_dalek::PublicKey;

use crate::error::CowmailError;
use crate::head::{self, HEAD_SIZE};
use crate::identity::Identity;
use crate::messages::Message;
use crate::opener::{open, scan, try_open_head};
use crate::primitives::key_agreement;
use crate::sealer::seal;

fn secret_bytes() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Both sides of a key agreement compute the same secret.
    #[test]
    fn key_agreement_symmetric(a in secret_bytes(), b in secret_bytes()) {
        let a = Identity::from_secret("a", a);
        let b = Identity::from_secret("b", b);
        let ab = key_agreement(a.secret().unwrap(), b.public_key());
        let ba = key_agreement(b.secret().unwrap(), a.public_key());
        prop_assert_eq!(*ab, *ba);
    }

    /// What the recipient scans and opens is what the sender sealed.
    #[test]
    fn seal_scan_open_roundtrip(seed in secret_bytes(), plaintext in prop::collection::vec(any::<u8>(), 0..2048)) {
        let recipient = Identity::from_secret("r", seed);
        let sealed = seal(&Message::new(plaintext.clone()), &recipient.to_contact()).unwrap();
        let identities = [recipient];
        let tickets = scan([sealed.head()], &identities);
        prop_assert_eq!(tickets.len(), 1);
        let opened = open(&tickets[0], sealed.body()).unwrap();
        prop_assert_eq!(opened.as_bytes(), plaintext.as_slice());
    }

    /// A head sealed for one identity never opens for another.
    #[test]
    fn non_membership(r1 in secret_bytes(), r2 in secret_bytes(), plaintext in prop::collection::vec(any::<u8>(), 0..64)) {
        let r1 = Identity::from_secret("r1", r1);
        let r2 = Identity::from_secret("r2", r2);
        prop_assume!(r1.public_key() != r2.public_key());
        let sealed = seal(&Message::new(plaintext), &r1).unwrap();
        prop_assert!(scan([sealed.head()], &[r2]).is_empty());
    }

    /// Any single bit flip in the head makes it unrecognizable.
    #[test]
    fn head_bit_flip_detected(byte in 0usize..HEAD_SIZE, bit in 0u8..8) {
        // the top bit of an X25519 u-coordinate is ignored, so flipping it does not change the key
        prop_assume!(!(byte == 31 && bit == 7));
        let me = Identity::generate("me").unwrap();
        let sealed = seal(&Message::from_text("tamper"), &me).unwrap();
        let mut tampered = *sealed.head();
        tampered[byte] ^= 1 << bit;
        prop_assert!(try_open_head(&tampered, &me).unwrap().is_none());
    }

    /// Any single bit flip in the body makes it fail to decrypt.
    #[test]
    fn body_bit_flip_detected(index in any::<prop::sample::Index>(), bit in 0u8..8) {
        let me = Identity::generate("me").unwrap();
        let sealed = seal(&Message::from_text("tamper"), &me).unwrap();
        let ticket = try_open_head(sealed.head(), &me).unwrap().unwrap();
        let mut body = sealed.body().to_vec();
        let i = index.index(body.len());
        body[i] ^= 1 << bit;
        prop_assert!(matches!(open(&ticket, &body), Err(CowmailError::DecryptionFailed)));
    }

    /// encode always gives 80 bytes; decode takes nothing else.
    #[test]
    fn head_size_fixed(pkey in secret_bytes(), chash in prop::collection::vec(any::<u8>(), 48), len in 0usize..200) {
        let mut c = [0u8; 48];
        c.copy_from_slice(&chash);
        let encoded = head::encode(&pkey, &c);
        prop_assert_eq!(encoded.len(), HEAD_SIZE);
        let decoded = head::decode(&encoded).unwrap();
        prop_assert_eq!(decoded.0, pkey);
        let other = vec![0u8; len];
        prop_assert_eq!(head::decode(&other).is_ok(), len == HEAD_SIZE);
    }

    /// The public key of an identity is always the basepoint times its secret.
    #[test]
    fn identity_keypair_invariant(seed in secret_bytes()) {
        let id = Identity::from_secret("x", seed);
        prop_assert_eq!(&PublicKey::from(id.secret().unwrap()).to_bytes(), id.public_key());
    }
}
