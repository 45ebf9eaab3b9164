//! ChaCha20-Poly1305 AEAD (IETF, 12-byte nonce)
//!
//! Two nonce conventions are in use:
//!
//! - handshake nonces are ASCII labels (`PV-Msg02`, `PV-Msg03`) zero-padded
//!   to 8 bytes and placed after 4 zero bytes
//! - session nonces are a 64-bit little-endian counter followed by 4 zero
//!   bytes
//!
//! Ciphertexts carry the 16-byte tag appended.

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{
    AEAD_NONCE_SIZE, AEAD_TAG_SIZE, CryptoError, HANDSHAKE_NONCE_LABEL_SIZE, SYMMETRIC_KEY_SIZE,
};

/// A 32-byte symmetric key.
///
/// Zeroized on drop for security.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; SYMMETRIC_KEY_SIZE],
}

impl SymmetricKey {
    /// Create a key from bytes.
    pub fn from_bytes(key: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Get the raw key bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([redacted])")
    }
}

/// Handshake nonce from an ASCII label of at most 8 bytes.
///
/// ```text
/// [ 0x00 * 4 | label, zero-padded to 8 ]
/// ```
pub fn handshake_nonce(label: &[u8]) -> Result<[u8; AEAD_NONCE_SIZE], CryptoError> {
    if label.len() > HANDSHAKE_NONCE_LABEL_SIZE {
        return Err(CryptoError::InvalidNonceLength(label.len()));
    }
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    let offset = AEAD_NONCE_SIZE - HANDSHAKE_NONCE_LABEL_SIZE;
    nonce[offset..offset + label.len()].copy_from_slice(label);
    Ok(nonce)
}

/// Session nonce from a message counter.
///
/// ```text
/// [ counter (8, LE64) | 0x00 * 4 ]
/// ```
pub fn counter_nonce(counter: u64) -> [u8; AEAD_NONCE_SIZE] {
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    nonce[..8].copy_from_slice(&counter.to_le_bytes());
    nonce
}

/// Encrypt plaintext.
///
/// # Returns
/// Ciphertext with appended 16-byte Poly1305 tag
pub fn encrypt(
    key: &SymmetricKey,
    nonce: &[u8; AEAD_NONCE_SIZE],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::EncryptionFailed)
}

/// Decrypt ciphertext with appended tag.
///
/// # Returns
/// Decrypted plaintext, or error if authentication fails
pub fn decrypt(
    key: &SymmetricKey,
    nonce: &[u8; AEAD_NONCE_SIZE],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < AEAD_TAG_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Seal a handshake message under a labelled nonce, without associated data.
pub fn seal_handshake(
    key: &SymmetricKey,
    label: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    encrypt(key, &handshake_nonce(label)?, &[], plaintext)
}

/// Open a handshake message sealed with [`seal_handshake`].
pub fn open_handshake(
    key: &SymmetricKey,
    label: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    decrypt(key, &handshake_nonce(label)?, &[], ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PV_MSG02_NONCE;
    use proptest::prelude::*;

    fn key() -> SymmetricKey {
        SymmetricKey::from_bytes([0x42; 32])
    }

    #[test]
    fn test_handshake_nonce_layout() {
        let nonce = handshake_nonce(PV_MSG02_NONCE).unwrap();
        assert_eq!(&nonce[..4], &[0, 0, 0, 0]);
        assert_eq!(&nonce[4..], b"PV-Msg02");

        let short = handshake_nonce(b"ab").unwrap();
        assert_eq!(short, [0, 0, 0, 0, b'a', b'b', 0, 0, 0, 0, 0, 0]);

        assert_eq!(
            handshake_nonce(b"PV-Msg002"),
            Err(CryptoError::InvalidNonceLength(9))
        );
    }

    #[test]
    fn test_counter_nonce_layout() {
        assert_eq!(counter_nonce(0), [0u8; 12]);
        assert_eq!(
            counter_nonce(0x0102),
            [0x02, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_rfc8439_aead_vector() {
        // RFC 8439 section 2.8.2
        let key_bytes: [u8; 32] =
            hex::decode("808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f")
                .unwrap()
                .try_into()
                .unwrap();
        let nonce: [u8; 12] = hex::decode("070000004041424344454647")
            .unwrap()
            .try_into()
            .unwrap();
        let aad = hex::decode("50515253c0c1c2c3c4c5c6c7").unwrap();
        let plaintext = b"Ladies and Gentlemen of the class of '99: If I could offer you only one tip for the future, sunscreen would be it.";

        let sealed = encrypt(&SymmetricKey::from_bytes(key_bytes), &nonce, &aad, plaintext).unwrap();
        assert_eq!(
            hex::encode(&sealed[sealed.len() - 16..]),
            "1ae10b594f09e26a7e902ecbd0600691"
        );
    }

    #[test]
    fn test_tampering_detected() {
        let nonce = counter_nonce(0);
        let mut sealed = encrypt(&key(), &nonce, &[0x06, 0x07], b"credentials").unwrap();

        assert_eq!(
            decrypt(&key(), &nonce, &[0x06, 0x07], &sealed).unwrap(),
            b"credentials"
        );
        assert_eq!(
            decrypt(&key(), &nonce, &[0x06, 0x08], &sealed),
            Err(CryptoError::DecryptionFailed)
        );

        sealed[3] ^= 0x01;
        assert_eq!(
            decrypt(&key(), &nonce, &[0x06, 0x07], &sealed),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_empty_plaintext_is_bare_tag() {
        let sealed = seal_handshake(&key(), b"PV-Msg03", &[]).unwrap();
        assert_eq!(sealed.len(), AEAD_TAG_SIZE);
        assert!(open_handshake(&key(), b"PV-Msg03", &sealed).unwrap().is_empty());
        assert!(open_handshake(&key(), b"PV-Msg02", &sealed).is_err());
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        assert_eq!(
            decrypt(&key(), &counter_nonce(0), &[], &[0u8; 15]),
            Err(CryptoError::DecryptionFailed)
        );
    }

    proptest! {
        #[test]
        fn test_any_flipped_bit_is_rejected(
            plaintext in proptest::collection::vec(any::<u8>(), 0..64),
            bit in any::<prop::sample::Index>(),
        ) {
            let nonce = counter_nonce(0);
            let mut sealed = encrypt(&key(), &nonce, &[0x06, 0x07], &plaintext).unwrap();
            // body and tag alike
            let bit = bit.index(sealed.len() * 8);
            sealed[bit / 8] ^= 1 << (bit % 8);
            prop_assert_eq!(
                decrypt(&key(), &nonce, &[0x06, 0x07], &sealed),
                Err(CryptoError::DecryptionFailed)
            );
        }
    }
}
