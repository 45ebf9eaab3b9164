//! Account identity proofs.
//!
//! The Requestor proves in M2 that its ephemeral key belongs to an account:
//! it signs the two handshake public keys and attaches a certificate and a
//! validation record. The Grantor checks the signature with the certificate
//! key, checks the record against its trust anchors and requires the
//! certificate subject to end with the record's account id.
//!
//! Anchors sign certificates as well as records, and the certificate key is
//! only used once the certificate signature verifies.
//!
//! The implementations here use Ed25519 throughout and are meant for labs
//! and tests. Production verifiers plug in through
//! [`IdentityVerifier`](crate::core::IdentityVerifier) and
//! [`AccountIdentity`](crate::core::AccountIdentity).

mod account;
mod certificate;
mod record;
mod verifier;

pub use account::{IdentityBundle, LocalAccountIdentity};
pub use certificate::{Certificate, IssuedIdentity, SUBJECT_PREFIX, TrustAnchor, enc_ds_id};
pub use record::{ENC_DS_ID_FIELD, ValidationRecord};
pub use verifier::Ed25519IdentityVerifier;
