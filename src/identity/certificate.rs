//! Account certificates and the trust anchor that issues them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::record::{ENC_DS_ID_FIELD, SignedRecord, ValidationRecord};
use crate::core::IdentityError;
use crate::crypto::SigningIdentity;

/// Prefix of every account certificate subject.
pub const SUBJECT_PREFIX: &str = "com.apple.idms.appleid.prd.";

/// Account id derived from an account name: uppercase hex of the first 8
/// bytes of SHA-256.
pub fn enc_ds_id(account_id: &str) -> String {
    hex::encode_upper(&Sha256::digest(account_id.as_bytes())[..8])
}

/// A certificate binding an Ed25519 key to an account subject, signed by
/// the issuing anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Subject common name.
    pub subject: String,
    /// Ed25519 public key of the account.
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    /// Public key of the issuing anchor.
    #[serde(with = "hex::serde")]
    pub issuer: Vec<u8>,
    /// Anchor signature over [`Certificate::signed_bytes`].
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl Certificate {
    /// Bytes covered by the issuer signature: the subject, a zero byte,
    /// then the account key.
    pub fn signed_bytes(subject: &str, public_key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(subject.len() + 1 + public_key.len());
        out.extend_from_slice(subject.as_bytes());
        out.push(0);
        out.extend_from_slice(public_key);
        out
    }

    /// Encode to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IdentityError> {
        serde_json::to_vec(self).map_err(|e| IdentityError::MalformedCertificate(e.to_string()))
    }

    /// Decode from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        serde_json::from_slice(bytes).map_err(|e| IdentityError::MalformedCertificate(e.to_string()))
    }
}

/// Certificate and validation record issued for one account.
#[derive(Debug, Clone)]
pub struct IssuedIdentity {
    /// Encoded [`Certificate`].
    pub certificate: Vec<u8>,
    /// Encoded signed validation record.
    pub validation_record: Vec<u8>,
}

/// An Ed25519 key that signs certificates and validation records.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    key: SigningIdentity,
}

impl TrustAnchor {
    /// Generate a new anchor.
    pub fn generate() -> Self {
        Self {
            key: SigningIdentity::generate(),
        }
    }

    /// Wrap an existing key.
    pub fn from_identity(key: SigningIdentity) -> Self {
        Self { key }
    }

    /// Public key verifiers must trust.
    pub fn public_key(&self) -> [u8; 32] {
        self.key.public_key()
    }

    /// Signing key of the anchor.
    pub fn identity(&self) -> &SigningIdentity {
        &self.key
    }

    /// Issue a certificate and validation record for `account_id` bound to
    /// `account_key`.
    pub fn issue(
        &self,
        account_id: &str,
        account_key: &SigningIdentity,
    ) -> Result<IssuedIdentity, IdentityError> {
        let ds_id = enc_ds_id(account_id);
        let subject = format!("{SUBJECT_PREFIX}{ds_id}");
        let public_key = account_key.public_key().to_vec();
        let certificate = Certificate {
            signature: self
                .key
                .sign(&Certificate::signed_bytes(&subject, &public_key))
                .to_vec(),
            issuer: self.key.public_key().to_vec(),
            subject,
            public_key,
        };
        let record = ValidationRecord::new().with_field(ENC_DS_ID_FIELD, &ds_id);
        Ok(IssuedIdentity {
            certificate: certificate.to_bytes()?,
            validation_record: self.sign_record(&record)?,
        })
    }

    /// Sign an arbitrary record.
    pub fn sign_record(&self, record: &ValidationRecord) -> Result<Vec<u8>, IdentityError> {
        let payload =
            serde_json::to_vec(record).map_err(|e| IdentityError::Signing(e.to_string()))?;
        SignedRecord {
            issuer: self.key.public_key().to_vec(),
            signature: self.key.sign(&payload).to_vec(),
            payload,
        }
        .to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enc_ds_id_format() {
        let id = enc_ds_id("user@example.com");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(id, enc_ds_id("user@example.com"));
    }

    #[test]
    fn test_issued_certificate_subject() {
        let anchor = TrustAnchor::generate();
        let account = SigningIdentity::generate();
        let issued = anchor.issue("user@example.com", &account).unwrap();

        let cert = Certificate::from_bytes(&issued.certificate).unwrap();
        assert!(cert.subject.starts_with(SUBJECT_PREFIX));
        assert!(cert.subject.ends_with(&enc_ds_id("user@example.com")));
        assert_eq!(cert.public_key, account.public_key().to_vec());
        assert_eq!(cert.issuer, anchor.public_key().to_vec());
        assert!(crate::crypto::verify_ed25519(
            &cert.issuer,
            &Certificate::signed_bytes(&cert.subject, &cert.public_key),
            &cert.signature,
        ));
    }

    #[test]
    fn test_malformed_certificate() {
        assert!(matches!(
            Certificate::from_bytes(b"{"),
            Err(IdentityError::MalformedCertificate(_))
        ));
    }
}
