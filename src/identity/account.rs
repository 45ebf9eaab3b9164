//! Local account identity and its on-disk bundle.

use serde::{Deserialize, Serialize};

use super::certificate::TrustAnchor;
use crate::core::{AccountIdentity, IdentityError};
use crate::crypto::SigningIdentity;

/// An account identity held in memory.
#[derive(Debug, Clone)]
pub struct LocalAccountIdentity {
    key: SigningIdentity,
    certificate: Vec<u8>,
    validation_record: Vec<u8>,
}

impl LocalAccountIdentity {
    /// Assemble an identity from its parts.
    pub fn new(key: SigningIdentity, certificate: Vec<u8>, validation_record: Vec<u8>) -> Self {
        Self {
            key,
            certificate,
            validation_record,
        }
    }

    /// Generate a key for `account_id` and have `anchor` certify it.
    pub fn provision(anchor: &TrustAnchor, account_id: &str) -> Result<Self, IdentityError> {
        let key = SigningIdentity::generate();
        let issued = anchor.issue(account_id, &key)?;
        Ok(Self::new(key, issued.certificate, issued.validation_record))
    }
}

impl AccountIdentity for LocalAccountIdentity {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(self.key.sign(message).to_vec())
    }

    fn certificate(&self) -> Result<Vec<u8>, IdentityError> {
        Ok(self.certificate.clone())
    }

    fn validation_record(&self) -> Result<Vec<u8>, IdentityError> {
        Ok(self.validation_record.clone())
    }
}

/// Serialized form of a [`LocalAccountIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBundle {
    /// Account the identity was issued for.
    pub account_id: String,
    /// Ed25519 secret key.
    #[serde(with = "hex::serde")]
    pub signing_key: Vec<u8>,
    /// Encoded certificate.
    #[serde(with = "hex::serde")]
    pub certificate: Vec<u8>,
    /// Encoded signed validation record.
    #[serde(with = "hex::serde")]
    pub validation_record: Vec<u8>,
}

impl IdentityBundle {
    /// Capture an identity for storage.
    pub fn from_identity(account_id: &str, identity: &LocalAccountIdentity) -> Self {
        Self {
            account_id: account_id.to_owned(),
            signing_key: identity.key.secret_bytes().to_vec(),
            certificate: identity.certificate.clone(),
            validation_record: identity.validation_record.clone(),
        }
    }

    /// Restore the identity.
    pub fn into_identity(self) -> Result<LocalAccountIdentity, IdentityError> {
        let key = SigningIdentity::from_bytes(&self.signing_key)
            .map_err(|e| IdentityError::Signing(e.to_string()))?;
        Ok(LocalAccountIdentity::new(
            key,
            self.certificate,
            self.validation_record,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_restores_identity() {
        let anchor = TrustAnchor::generate();
        let identity = LocalAccountIdentity::provision(&anchor, "user@example.com").unwrap();
        let bundle = IdentityBundle::from_identity("user@example.com", &identity);

        let json = serde_json::to_string(&bundle).unwrap();
        let restored: IdentityBundle = serde_json::from_str(&json).unwrap();
        let restored = restored.into_identity().unwrap();

        assert_eq!(
            restored.sign(b"m").unwrap(),
            identity.sign(b"m").unwrap()
        );
        assert_eq!(restored.certificate().unwrap(), identity.certificate().unwrap());
    }

    #[test]
    fn test_bundle_rejects_bad_key() {
        let bundle = IdentityBundle {
            account_id: "a".into(),
            signing_key: vec![1, 2, 3],
            certificate: vec![],
            validation_record: vec![],
        };
        assert!(matches!(
            bundle.into_identity(),
            Err(IdentityError::Signing(_))
        ));
    }
}
