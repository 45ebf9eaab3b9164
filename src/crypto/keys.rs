//! Key material
//!
//! Ephemeral X25519 keys for pair-verify and the Ed25519 signing identity
//! behind an account.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey, Signature};
use rand::{RngCore, rngs::OsRng};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::hkdf_sha512;
use crate::core::{CryptoError, ECDH_INFO, ECDH_SALT, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// An ephemeral X25519 keypair, fresh for every session.
///
/// The private key is zeroized on drop for security.
pub struct EphemeralKeypair {
    /// Private key (32 bytes) - zeroized on drop
    secret: [u8; PRIVATE_KEY_SIZE],
    /// Public key (32 bytes)
    public: [u8; PUBLIC_KEY_SIZE],
}

impl EphemeralKeypair {
    /// Generate a keypair from 32 random bytes.
    ///
    /// With `mix_entropy` the random bytes first pass through
    /// HKDF-SHA512 (salt `Pair-Verify-ECDH-Salt`, info `Pair-Verify-ECDH-Info`).
    pub fn generate(mix_entropy: bool) -> Result<Self, CryptoError> {
        let mut random = [0u8; PRIVATE_KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut random)
            .map_err(|_| CryptoError::KeyGeneration)?;

        let keypair = if mix_entropy {
            let mixed = hkdf_sha512(&random, ECDH_SALT, ECDH_INFO)?;
            Self::from_secret(*mixed.as_bytes())
        } else {
            Self::from_secret(random)
        };
        random.zeroize();
        Ok(keypair)
    }

    /// Create a keypair from existing secret bytes.
    pub fn from_secret(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        let public = PublicKey::from(&StaticSecret::from(secret));
        Self {
            secret,
            public: *public.as_bytes(),
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public
    }

    /// X25519 with a peer public key.
    pub fn diffie_hellman(&self, peer_public: &[u8]) -> Result<SharedSecret, CryptoError> {
        let peer: [u8; PUBLIC_KEY_SIZE] = peer_public
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let shared = StaticSecret::from(self.secret).diffie_hellman(&PublicKey::from(peer));
        Ok(SharedSecret(*shared.as_bytes()))
    }
}

impl Drop for EphemeralKeypair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public", &hex::encode(self.public))
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// An X25519 shared secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Get the raw secret bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Ed25519 key that signs pair-verify transcripts on behalf of an account.
#[derive(Clone)]
pub struct SigningIdentity {
    key: SigningKey,
}

impl SigningIdentity {
    /// Generate a random identity.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load from a 32-byte secret or a 64-byte `secret || public` pair.
    ///
    /// A 64-byte input whose public half does not match the secret is
    /// rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret: [u8; 32] = bytes
            .get(..32)
            .and_then(|s| s.try_into().ok())
            .ok_or(CryptoError::InvalidPublicKey)?;
        let key = SigningKey::from_bytes(&secret);
        match bytes.len() {
            32 => Ok(Self { key }),
            64 if key.verifying_key().as_bytes()[..] == bytes[32..] => Ok(Self { key }),
            _ => Err(CryptoError::InvalidPublicKey),
        }
    }

    /// Secret key bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Public verification key.
    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("public", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature.
pub fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(public) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&public) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp1 = EphemeralKeypair::generate(true).unwrap();
        let kp2 = EphemeralKeypair::generate(false).unwrap();

        // Keys should be different
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_shared_secret_agrees() {
        let a = EphemeralKeypair::generate(true).unwrap();
        let b = EphemeralKeypair::generate(true).unwrap();
        let ab = a.diffie_hellman(b.public_key()).unwrap();
        let ba = b.diffie_hellman(a.public_key()).unwrap();
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn test_rejects_short_peer_key() {
        let a = EphemeralKeypair::generate(true).unwrap();
        assert!(matches!(
            a.diffie_hellman(&[0u8; 31]),
            Err(CryptoError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_rfc7748_base_point_vector() {
        // RFC 7748 section 6.1, Alice
        let secret: [u8; 32] =
            hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a")
                .unwrap()
                .try_into()
                .unwrap();
        let kp = EphemeralKeypair::from_secret(secret);
        assert_eq!(
            hex::encode(kp.public_key()),
            "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
        );
    }

    #[test]
    fn test_signing_identity_round_trip() {
        let id = SigningIdentity::generate();
        let sig = id.sign(b"transcript");
        assert!(verify_ed25519(&id.public_key(), b"transcript", &sig));
        assert!(!verify_ed25519(&id.public_key(), b"other", &sig));
    }

    #[test]
    fn test_signing_identity_from_pair() {
        let id = SigningIdentity::generate();
        let mut pair = id.secret_bytes().to_vec();
        pair.extend_from_slice(&id.public_key());
        assert_eq!(
            SigningIdentity::from_bytes(&pair).unwrap().public_key(),
            id.public_key()
        );

        pair[40] ^= 0xff;
        assert!(SigningIdentity::from_bytes(&pair).is_err());
        assert!(SigningIdentity::from_bytes(&[0u8; 10]).is_err());
    }
}
