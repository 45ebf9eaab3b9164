//! Grantor side of the exchange.
//!
//! ```text
//! Grantor                         Requestor
//!   PWS1 -------------------------->
//!        <-------------------------- PWS2
//!   M1 (publicKey, state=1) ------->
//!        <------------------------- M2 (publicKey, encryptedData, state=2)
//!   [verify account identity]
//!   M3 (encryptedData, state=3) --->
//!        <------------------------- M4 (state=4)
//!   PWS3 (encrypted) -------------->
//!        <------------------------- PWS4 (encrypted)
//! ```

use tracing::{debug, info, trace, warn};

use super::config::ConfigFlag;
use super::error::ProtocolError;
use super::messages::{self, PairVerifyTlv, pv_state};
use super::session::{PairingSession, RoleContext};
use super::state::HandshakeState;
use crate::core::{
    IdentityError, IdentityVerifier, PV_MSG02_NONCE, PV_MSG03_NONCE, PwsResult, Transport,
};
use crate::crypto::{ApplicationKeys, Role, open_handshake, seal_handshake};
use crate::encoding::Tlv8Box;
use crate::transport::{FrameType, ServiceType, SessionFrame};

impl PairingSession {
    pub(crate) fn start_grantor<T: Transport + ?Sized>(&mut self, transport: &mut T) -> PwsResult<()> {
        self.send_dict(FrameType::Pws1, &messages::pws1(), transport)?;
        self.transition(HandshakeState::AwaitingPws2);
        Ok(())
    }

    pub(crate) fn grantor_on_pws2<T: Transport + ?Sized>(
        &mut self,
        payload: &[u8],
        transport: &mut T,
    ) -> PwsResult<()> {
        let pws2 = self.codec.decode(payload)?;
        trace!(shv = ?pws2.get_str(messages::keys::SHARING_VERSION), "PWS2");

        let mut tlv = Tlv8Box::new();
        tlv.add(PairVerifyTlv::PublicKey.as_byte(), self.keys.public_key())?;
        tlv.add_int(PairVerifyTlv::State.as_byte(), pv_state::M1);
        let m1 = messages::pair_verify_envelope(&tlv, true);
        self.send_dict(FrameType::PairVerifyStart, &m1, transport)?;
        self.transition(HandshakeState::AwaitingM2);
        Ok(())
    }

    /// M2 and M4 share a frame type; the state item tells them apart.
    pub(crate) fn grantor_on_pair_verify<T: Transport + ?Sized>(
        &mut self,
        frame: &SessionFrame,
        transport: &mut T,
    ) -> PwsResult<()> {
        let dict = self.codec.decode(&frame.payload)?;
        let tlv = messages::open_pair_verify_envelope(&dict)?;
        let value = messages::pair_verify_state(&tlv)?;

        match (self.state, value) {
            (HandshakeState::AwaitingM2, pv_state::M2) => self.grantor_on_m2(&tlv, transport),
            (HandshakeState::AwaitingM4, pv_state::M4) => self.grantor_on_m4(transport),
            (HandshakeState::AwaitingM2, pv_state::M1..=pv_state::M4) => {
                Err(ProtocolError::WrongState {
                    expected: pv_state::M2,
                    actual: value,
                }
                .into())
            }
            (_, pv_state::M1..=pv_state::M4) => Err(ProtocolError::WrongState {
                expected: pv_state::M4,
                actual: value,
            }
            .into()),
            (_, other) => Err(ProtocolError::UnknownState(other).into()),
        }
    }

    fn grantor_on_m2<T: Transport + ?Sized>(&mut self, tlv: &Tlv8Box, transport: &mut T) -> PwsResult<()> {
        let peer = messages::require(tlv, PairVerifyTlv::PublicKey, "publicKey")?;
        let sealed = messages::require(tlv, PairVerifyTlv::EncryptedData, "encryptedData")?;
        self.accept_peer_key(&peer)?;

        let plaintext = open_handshake(self.handshake_key()?, PV_MSG02_NONCE, &sealed)?;
        let inner = Tlv8Box::deserialize(&plaintext)?;
        let signature = messages::require(&inner, PairVerifyTlv::Signature, "signature")?;
        let certificate = messages::require(&inner, PairVerifyTlv::Certificate, "certificate")?;
        let record = messages::require(&inner, PairVerifyTlv::ValidationRecord, "validationRecord")?;
        let certificate = self.compressor.decompress(&certificate)?;
        let record = self.compressor.decompress(&record)?;
        debug!(
            certificate = certificate.len(),
            record = record.len(),
            "M2 identity payload"
        );

        let RoleContext::Grantor { verifier, .. } = &self.context else {
            return Err(ProtocolError::Failed.into());
        };
        let transcript = self.transcript()?;
        match verify_peer(verifier.as_ref(), &certificate, &record, &signature, &transcript) {
            Ok(subject) => info!(%subject, "peer identity verified"),
            Err(e) if self.config.has(ConfigFlag::IgnoreInvalidPeerValidation) => {
                warn!(error = %e, "peer identity did not verify, continuing");
            }
            Err(e) => return Err(e.into()),
        }

        let mut m3 = Tlv8Box::new();
        let proof = seal_handshake(self.handshake_key()?, PV_MSG03_NONCE, &[])?;
        m3.add(PairVerifyTlv::EncryptedData.as_byte(), &proof)?;
        m3.add_int(PairVerifyTlv::State.as_byte(), pv_state::M3);
        let m3 = messages::pair_verify_envelope(&m3, false);
        self.send_dict(FrameType::PairVerify, &m3, transport)?;
        self.transition(HandshakeState::AwaitingM4);
        Ok(())
    }

    fn grantor_on_m4<T: Transport + ?Sized>(&mut self, transport: &mut T) -> PwsResult<()> {
        let shared = self
            .shared
            .as_ref()
            .ok_or(ProtocolError::MissingField("publicKey"))?;
        self.cipher = Some(ApplicationKeys::derive(shared)?.into_cipher(Role::Grantor));
        self.transition(HandshakeState::Established);
        info!(role = %self.role, "pair-verify complete");

        let RoleContext::Grantor { share, .. } = &self.context else {
            return Err(ProtocolError::Failed.into());
        };
        let pws3 = messages::pws3(share, &self.config);
        trace!(fields = ?pws3.keys().collect::<Vec<_>>(), "PWS3");
        let plaintext = self.codec.encode(&pws3)?;
        let aad = SessionFrame::header(FrameType::PwsPayload, ServiceType::PasswordSharing);
        let ciphertext = self.session_cipher()?.encrypt(&aad, &plaintext)?;
        self.send_frame(FrameType::PwsPayload, ciphertext, transport)?;
        self.transition(HandshakeState::AwaitingPws4);
        Ok(())
    }

    pub(crate) fn grantor_on_pws4(&mut self, payload: &[u8]) -> PwsResult<()> {
        let aad = SessionFrame::header(FrameType::PwsPayload, ServiceType::PasswordSharing);
        let plaintext = self.session_cipher()?.decrypt(&aad, payload)?;
        let pws4 = self.codec.decode(&plaintext)?;
        messages::check_pws4(&pws4)?;
        self.transition(HandshakeState::Complete);
        info!(role = %self.role, "credentials accepted by peer");
        Ok(())
    }
}

/// Check the Requestor's account proof and return the certificate subject.
///
/// The certificate must be one the verifier trusts, and the signature
/// must cover `transcript` under its key. The validation record must be
/// trust-anchored and the subject must end with the record's `encDsID`.
fn verify_peer(
    verifier: &dyn IdentityVerifier,
    certificate: &[u8],
    record: &[u8],
    signature: &[u8],
    transcript: &[u8],
) -> Result<String, IdentityError> {
    if !verifier.verify_signature(certificate, transcript, signature)? {
        return Err(IdentityError::InvalidSignature);
    }
    let record = verifier.verify_signed_record(record)?;
    let ds_id = record.enc_ds_id()?;
    let subject = verifier.certificate_subject(certificate)?;
    if !subject.ends_with(ds_id) {
        return Err(IdentityError::IdentityMismatch {
            subject,
            ds_id: ds_id.to_owned(),
        });
    }
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SigningIdentity;
    use crate::identity::{Ed25519IdentityVerifier, TrustAnchor};

    #[test]
    fn test_verify_peer_accepts_issued_identity() {
        let anchor = TrustAnchor::generate();
        let key = SigningIdentity::generate();
        let issued = anchor.issue("user@example.com", &key).unwrap();
        let verifier = Ed25519IdentityVerifier::new(anchor.public_key());

        let sig = key.sign(b"transcript");
        let subject = verify_peer(
            &verifier,
            &issued.certificate,
            &issued.validation_record,
            &sig,
            b"transcript",
        )
        .unwrap();
        assert!(subject.starts_with("com.apple.idms.appleid.prd."));
    }

    #[test]
    fn test_verify_peer_rejects_wrong_transcript() {
        let anchor = TrustAnchor::generate();
        let key = SigningIdentity::generate();
        let issued = anchor.issue("user@example.com", &key).unwrap();
        let verifier = Ed25519IdentityVerifier::new(anchor.public_key());

        let sig = key.sign(b"transcript");
        assert!(matches!(
            verify_peer(&verifier, &issued.certificate, &issued.validation_record, &sig, b"other"),
            Err(IdentityError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_peer_rejects_foreign_record() {
        let anchor = TrustAnchor::generate();
        let key = SigningIdentity::generate();
        let mine = anchor.issue("user@example.com", &key).unwrap();
        let theirs = anchor.issue("other@example.com", &key).unwrap();
        let verifier = Ed25519IdentityVerifier::new(anchor.public_key());

        let sig = key.sign(b"transcript");
        assert!(matches!(
            verify_peer(&verifier, &mine.certificate, &theirs.validation_record, &sig, b"transcript"),
            Err(IdentityError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_peer_rejects_untrusted_anchor() {
        let anchor = TrustAnchor::generate();
        let key = SigningIdentity::generate();
        let issued = anchor.issue("user@example.com", &key).unwrap();
        let verifier = Ed25519IdentityVerifier::new(TrustAnchor::generate().public_key());

        let sig = key.sign(b"transcript");
        assert!(matches!(
            verify_peer(&verifier, &issued.certificate, &issued.validation_record, &sig, b"transcript"),
            Err(IdentityError::UntrustedCertificate(_))
        ));
    }
}
