//! Counter-nonce session cipher
//!
//! Each direction has its own key and 64-bit message counter. A counter
//! advances only after its operation succeeds, so a rejected ciphertext does
//! not desynchronise the receiver. The first message in each direction uses
//! the all-zero nonce, which is the nonce of the single PWS3/PWS4 exchange.

use super::aead::{SymmetricKey, counter_nonce, decrypt, encrypt};
use crate::core::CryptoError;

/// Bidirectional session cipher.
pub struct SessionCipher {
    send_key: SymmetricKey,
    recv_key: SymmetricKey,
    send_nonce: u64,
    recv_nonce: u64,
}

impl SessionCipher {
    /// Create a cipher with both counters at zero.
    pub fn new(send_key: SymmetricKey, recv_key: SymmetricKey) -> Self {
        Self {
            send_key,
            recv_key,
            send_nonce: 0,
            recv_nonce: 0,
        }
    }

    /// Encrypt the next outbound message.
    pub fn encrypt(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let next = self
            .send_nonce
            .checked_add(1)
            .ok_or(CryptoError::CounterExhaustion)?;
        let sealed = encrypt(&self.send_key, &counter_nonce(self.send_nonce), aad, plaintext)?;
        self.send_nonce = next;
        Ok(sealed)
    }

    /// Decrypt the next inbound message.
    pub fn decrypt(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let next = self
            .recv_nonce
            .checked_add(1)
            .ok_or(CryptoError::CounterExhaustion)?;
        let opened = decrypt(&self.recv_key, &counter_nonce(self.recv_nonce), aad, ciphertext)?;
        self.recv_nonce = next;
        Ok(opened)
    }

    /// Counter of the next outbound message.
    pub fn send_nonce(&self) -> u64 {
        self.send_nonce
    }

    /// Counter of the next inbound message.
    pub fn recv_nonce(&self) -> u64 {
        self.recv_nonce
    }
}

impl std::fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCipher")
            .field("send_nonce", &self.send_nonce)
            .field("recv_nonce", &self.recv_nonce)
            .finish_non_exhaustive()
    }
}
