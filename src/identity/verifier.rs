//! Ed25519 [`IdentityVerifier`].

use tracing::trace;

use super::certificate::Certificate;
use super::record::{SignedRecord, ValidationRecord};
use crate::core::{IdentityError, IdentityVerifier};
use crate::crypto::verify_ed25519;

/// Verifies certificates and validation records against a set of trusted
/// anchor keys.
#[derive(Debug, Clone, Default)]
pub struct Ed25519IdentityVerifier {
    anchors: Vec<[u8; 32]>,
}

impl Ed25519IdentityVerifier {
    /// Trust a single anchor.
    pub fn new(anchor: [u8; 32]) -> Self {
        Self {
            anchors: vec![anchor],
        }
    }

    /// Trust an additional anchor.
    pub fn with_anchor(mut self, anchor: [u8; 32]) -> Self {
        self.anchors.push(anchor);
        self
    }

    fn is_trusted(&self, issuer: &[u8]) -> bool {
        self.anchors.iter().any(|anchor| anchor[..] == issuer[..])
    }

    /// Parse `certificate` and require an anchor signature over its
    /// subject and key.
    fn trusted_certificate(&self, certificate: &[u8]) -> Result<Certificate, IdentityError> {
        let cert = Certificate::from_bytes(certificate)?;
        if !self.is_trusted(&cert.issuer) {
            return Err(IdentityError::UntrustedCertificate("unknown issuer".into()));
        }
        let signed = Certificate::signed_bytes(&cert.subject, &cert.public_key);
        if !verify_ed25519(&cert.issuer, &signed, &cert.signature) {
            return Err(IdentityError::UntrustedCertificate(
                "bad issuer signature".into(),
            ));
        }
        Ok(cert)
    }
}

impl IdentityVerifier for Ed25519IdentityVerifier {
    fn verify_signature(
        &self,
        certificate: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, IdentityError> {
        let cert = self.trusted_certificate(certificate)?;
        Ok(verify_ed25519(&cert.public_key, message, signature))
    }

    fn verify_signed_record(&self, record: &[u8]) -> Result<ValidationRecord, IdentityError> {
        let signed = SignedRecord::from_bytes(record)?;
        if !self.is_trusted(&signed.issuer) {
            return Err(IdentityError::UntrustedRecord("unknown issuer".into()));
        }
        if !verify_ed25519(&signed.issuer, &signed.payload, &signed.signature) {
            return Err(IdentityError::UntrustedRecord("bad issuer signature".into()));
        }
        trace!(issuer = %hex::encode(&signed.issuer), "validation record verified");
        serde_json::from_slice(&signed.payload)
            .map_err(|e| IdentityError::UntrustedRecord(e.to_string()))
    }

    fn certificate_subject(&self, certificate: &[u8]) -> Result<String, IdentityError> {
        Ok(self.trusted_certificate(certificate)?.subject)
    }
}
