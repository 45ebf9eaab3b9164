//! HKDF-SHA512 key schedule
//!
//! Every key is 32 bytes of HKDF-SHA512 output. From the X25519 shared
//! secret:
//!
//! | Key          | Salt                       | Info                       |
//! |--------------|----------------------------|----------------------------|
//! | pair-verify  | `Pair-Verify-Encrypt-Salt` | `Pair-Verify-Encrypt-Info` |
//! | write        | `WriteKeySalt`             | `WriteKeyInfo`             |
//! | read         | `ReadKeySalt`              | `ReadKeyInfo`              |
//!
//! The write key protects Grantor-to-Requestor payloads (PWS3), the read key
//! Requestor-to-Grantor payloads (PWS4).

use hkdf::Hkdf;
use sha2::Sha512;

use super::aead::SymmetricKey;
use super::keys::SharedSecret;
use super::session::SessionCipher;
use super::Role;
use crate::core::{
    CryptoError, PAIR_VERIFY_INFO, PAIR_VERIFY_SALT, READ_KEY_INFO, READ_KEY_SALT,
    SYMMETRIC_KEY_SIZE, WRITE_KEY_INFO, WRITE_KEY_SALT,
};

/// Expand `ikm` into a 32-byte key.
pub fn hkdf_sha512(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<SymmetricKey, CryptoError> {
    let hk = Hkdf::<Sha512>::new(Some(salt), ikm);
    let mut okm = [0u8; SYMMETRIC_KEY_SIZE];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;
    Ok(SymmetricKey::from_bytes(okm))
}

/// Handshake key sealing M2 and authenticating M3.
pub fn pair_verify_key(shared: &SharedSecret) -> Result<SymmetricKey, CryptoError> {
    hkdf_sha512(shared.as_bytes(), PAIR_VERIFY_SALT, PAIR_VERIFY_INFO)
}

/// The two application keys of an established session.
pub struct ApplicationKeys {
    /// Grantor to Requestor.
    pub write: SymmetricKey,
    /// Requestor to Grantor.
    pub read: SymmetricKey,
}

impl ApplicationKeys {
    /// Derive both keys from the shared secret.
    pub fn derive(shared: &SharedSecret) -> Result<Self, CryptoError> {
        Ok(Self {
            write: hkdf_sha512(shared.as_bytes(), WRITE_KEY_SALT, WRITE_KEY_INFO)?,
            read: hkdf_sha512(shared.as_bytes(), READ_KEY_SALT, READ_KEY_INFO)?,
        })
    }

    /// Session cipher for `role`: the Grantor sends with the write key and
    /// receives with the read key, the Requestor the other way round.
    pub fn into_cipher(self, role: Role) -> SessionCipher {
        match role {
            Role::Grantor => SessionCipher::new(self.write, self.read),
            Role::Requestor => SessionCipher::new(self.read, self.write),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_depends_on_info() {
        let a = hkdf_sha512(b"ikm", b"salt", b"info").unwrap();
        let b = hkdf_sha512(b"ikm", b"salt", b"info").unwrap();
        let c = hkdf_sha512(b"ikm", b"salt", b"other").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_application_keys_differ() {
        let a = super::super::EphemeralKeypair::generate(true).unwrap();
        let b = super::super::EphemeralKeypair::generate(true).unwrap();
        let shared = a.diffie_hellman(b.public_key()).unwrap();

        let keys = ApplicationKeys::derive(&shared).unwrap();
        let pv = pair_verify_key(&shared).unwrap();
        assert_ne!(keys.write.as_bytes(), keys.read.as_bytes());
        assert_ne!(keys.write.as_bytes(), pv.as_bytes());
    }
}
