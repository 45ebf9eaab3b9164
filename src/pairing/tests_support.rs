//! Session fixtures for unit tests.

use std::sync::Arc;

use super::{GrantorShareInfo, PairingSession, RequestorShareInfo, SessionConfig};
use crate::identity::{Ed25519IdentityVerifier, LocalAccountIdentity, TrustAnchor};

pub(crate) const ACCOUNT: &str = "user@example.com";

/// Grantor sharing `lambda`/`secret` and a Requestor it trusts, both
/// under `config`.
pub(crate) fn sessions(config: SessionConfig) -> (PairingSession, PairingSession) {
    let anchor = TrustAnchor::generate();
    pair(config, &anchor, &anchor)
}

/// Like [`sessions`], but the Grantor trusts a different anchor.
pub(crate) fn untrusted_sessions(config: SessionConfig) -> (PairingSession, PairingSession) {
    pair(config, &TrustAnchor::generate(), &TrustAnchor::generate())
}

fn pair(
    config: SessionConfig,
    trusted: &TrustAnchor,
    issuer: &TrustAnchor,
) -> (PairingSession, PairingSession) {
    let verifier = Ed25519IdentityVerifier::new(trusted.public_key());
    let grantor = PairingSession::grantor(
        GrantorShareInfo::new("lambda", "secret"),
        config.clone(),
        Arc::new(verifier),
    )
    .unwrap();

    let identity = LocalAccountIdentity::provision(issuer, ACCOUNT).unwrap();
    let requestor = PairingSession::requestor(
        RequestorShareInfo::new(ACCOUNT, "127.0.0.1:8080"),
        config,
        Arc::new(identity),
    )
    .unwrap();
    (grantor, requestor)
}
