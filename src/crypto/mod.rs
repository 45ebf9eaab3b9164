//! Security layer
//!
//! - Ephemeral X25519 key agreement and Ed25519 account signing
//! - HKDF-SHA512 key schedule
//! - ChaCha20-Poly1305 with labelled handshake nonces and counter session
//!   nonces

mod aead;
mod kdf;
mod keys;
mod session;

pub use aead::{
    SymmetricKey, counter_nonce, decrypt, encrypt, handshake_nonce, open_handshake,
    seal_handshake,
};
pub use kdf::{ApplicationKeys, hkdf_sha512, pair_verify_key};
pub use keys::{EphemeralKeypair, SharedSecret, SigningIdentity, verify_ed25519};
pub use session::SessionCipher;

/// Role in a password sharing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Knows the network credentials and shares them.
    Grantor,
    /// Asks for the network credentials.
    Requestor,
}

impl Role {
    /// The other side of the session.
    pub fn peer(self) -> Self {
        match self {
            Role::Grantor => Role::Requestor,
            Role::Requestor => Role::Grantor,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Grantor => f.write_str("grantor"),
            Role::Requestor => f.write_str("requestor"),
        }
    }
}
