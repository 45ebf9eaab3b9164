//! Requestor side of the exchange.
//!
//! The Requestor proves its account identity in M2. It does not check the
//! Grantor beyond M3 carrying a proof item and PWS3 decrypting under the
//! derived keys.

use tracing::{debug, info, trace};

use super::error::ProtocolError;
use super::messages::{self, PairVerifyTlv, pv_state};
use super::session::{PairingSession, RoleContext};
use super::share::ReceivedCredentials;
use super::state::HandshakeState;
use crate::core::{PV_MSG02_NONCE, PwsResult, Transport};
use crate::crypto::{ApplicationKeys, Role, seal_handshake};
use crate::encoding::Tlv8Box;
use crate::transport::{FrameType, ServiceType, SessionFrame};

impl PairingSession {
    pub(crate) fn requestor_on_pws1<T: Transport + ?Sized>(
        &mut self,
        payload: &[u8],
        transport: &mut T,
    ) -> PwsResult<()> {
        let pws1 = self.codec.decode(payload)?;
        trace!(
            sid = ?pws1.get_int(messages::keys::SESSION_ID),
            shv = ?pws1.get_str(messages::keys::SHARING_VERSION),
            "PWS1"
        );
        self.send_dict(FrameType::Pws2, &messages::pws2(), transport)?;
        self.transition(HandshakeState::AwaitingM1);
        Ok(())
    }

    pub(crate) fn requestor_on_m1<T: Transport + ?Sized>(
        &mut self,
        payload: &[u8],
        transport: &mut T,
    ) -> PwsResult<()> {
        let dict = self.codec.decode(payload)?;
        let tlv = messages::open_pair_verify_envelope(&dict)?;
        let value = messages::pair_verify_state(&tlv)?;
        if value != pv_state::M1 {
            return Err(ProtocolError::WrongState {
                expected: pv_state::M1,
                actual: value,
            }
            .into());
        }
        let peer = messages::require(&tlv, PairVerifyTlv::PublicKey, "publicKey")?;
        self.accept_peer_key(&peer)?;

        let RoleContext::Requestor { identity, .. } = &self.context else {
            return Err(ProtocolError::Failed.into());
        };
        let transcript = self.transcript()?;
        let signature = identity.sign(&transcript)?;
        let certificate = self.compressor.compress(&identity.certificate()?)?;
        let record = self.compressor.compress(&identity.validation_record()?)?;
        debug!(
            certificate = certificate.len(),
            record = record.len(),
            "M2 identity payload"
        );

        let mut inner = Tlv8Box::new();
        inner.add_big_value(PairVerifyTlv::Signature.as_byte(), &signature);
        inner.add_big_value(PairVerifyTlv::ValidationRecord.as_byte(), &record);
        inner.add_big_value(PairVerifyTlv::Certificate.as_byte(), &certificate);
        let sealed = seal_handshake(self.handshake_key()?, PV_MSG02_NONCE, &inner.serialize())?;

        let mut tlv = Tlv8Box::new();
        tlv.add(PairVerifyTlv::PublicKey.as_byte(), self.keys.public_key())?;
        tlv.add_big_value(PairVerifyTlv::EncryptedData.as_byte(), &sealed);
        tlv.add_int(PairVerifyTlv::State.as_byte(), pv_state::M2);
        let m2 = messages::pair_verify_envelope(&tlv, false);
        self.send_dict(FrameType::PairVerify, &m2, transport)?;
        self.transition(HandshakeState::AwaitingM3);
        Ok(())
    }

    pub(crate) fn requestor_on_m3<T: Transport + ?Sized>(
        &mut self,
        frame: &SessionFrame,
        transport: &mut T,
    ) -> PwsResult<()> {
        let dict = self.codec.decode(&frame.payload)?;
        let tlv = messages::open_pair_verify_envelope(&dict)?;
        match messages::pair_verify_state(&tlv)? {
            pv_state::M3 => {}
            value @ pv_state::M1..=pv_state::M4 => {
                return Err(ProtocolError::WrongState {
                    expected: pv_state::M3,
                    actual: value,
                }
                .into());
            }
            other => return Err(ProtocolError::UnknownState(other).into()),
        }
        messages::require(&tlv, PairVerifyTlv::EncryptedData, "encryptedData")?;

        let shared = self
            .shared
            .as_ref()
            .ok_or(ProtocolError::MissingField("publicKey"))?;
        self.cipher = Some(ApplicationKeys::derive(shared)?.into_cipher(Role::Requestor));
        self.transition(HandshakeState::Established);
        info!(role = %self.role, "pair-verify complete");

        let mut m4 = Tlv8Box::new();
        m4.add_int(PairVerifyTlv::State.as_byte(), pv_state::M4);
        let m4 = messages::pair_verify_envelope(&m4, false);
        self.send_dict(FrameType::PairVerify, &m4, transport)?;
        self.transition(HandshakeState::AwaitingPws3);
        Ok(())
    }

    pub(crate) fn requestor_on_pws3<T: Transport + ?Sized>(
        &mut self,
        payload: &[u8],
        transport: &mut T,
    ) -> PwsResult<()> {
        let aad = SessionFrame::header(FrameType::PwsPayload, ServiceType::PasswordSharing);
        let plaintext = self.session_cipher()?.decrypt(&aad, payload)?;
        let pws3 = self.codec.decode(&plaintext)?;
        trace!(fields = ?pws3.keys().collect::<Vec<_>>(), "PWS3");
        let credentials = ReceivedCredentials::from_dict(&pws3);
        if let RoleContext::Requestor { share, .. } = &self.context {
            share.check_network(&credentials)?;
        }
        info!(ssid = ?credentials.ssid, "credentials received");
        self.credentials = Some(credentials);

        let reply = self.codec.encode(&messages::pws4())?;
        let ciphertext = self.session_cipher()?.encrypt(&aad, &reply)?;
        self.send_frame(FrameType::PwsPayload, ciphertext, transport)?;
        self.transition(HandshakeState::Complete);
        Ok(())
    }
}
