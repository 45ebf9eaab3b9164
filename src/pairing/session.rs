//! The pairing session.
//!
//! A [`PairingSession`] is sans-IO: it consumes [`TransportEvent`]s and
//! writes through a [`Transport`]. Framing, flow control and crypto are
//! shared; the role decides which frames are expected and how they are
//! built (see the `grantor` and `requestor` modules).

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::config::SessionConfig;
use super::error::ProtocolError;
use super::share::{GrantorShareInfo, ReceivedCredentials, RequestorShareInfo};
use super::state::HandshakeState;
use crate::core::{
    AccountIdentity, Compressor, IdentityVerifier, ObjectCodec, PUBLIC_KEY_SIZE, PwsError,
    PwsResult, Transport,
};
use crate::crypto::{
    EphemeralKeypair, Role, SessionCipher, SharedSecret, SymmetricKey, pair_verify_key,
};
use crate::encoding::{Dictionary, JsonObjectCodec};
use crate::transport::{
    ChunkSender, FrameAssembler, FrameType, NearbyFrame, ServiceType, SessionFrame,
    TransportEvent,
};

/// Role-specific inputs.
pub(crate) enum RoleContext {
    Grantor {
        share: GrantorShareInfo,
        verifier: Arc<dyn IdentityVerifier>,
    },
    Requestor {
        share: RequestorShareInfo,
        identity: Arc<dyn AccountIdentity>,
    },
}

/// Result of a completed session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Local role.
    pub role: Role,
    /// Peer's ephemeral public key.
    pub peer_public_key: [u8; PUBLIC_KEY_SIZE],
    /// Credentials received (Requestor only).
    pub credentials: Option<ReceivedCredentials>,
}

/// One Grantor or Requestor session.
pub struct PairingSession {
    pub(crate) role: Role,
    pub(crate) config: SessionConfig,
    pub(crate) state: HandshakeState,
    pub(crate) keys: EphemeralKeypair,
    pub(crate) peer_public: Option<[u8; PUBLIC_KEY_SIZE]>,
    pub(crate) shared: Option<SharedSecret>,
    pub(crate) pv_key: Option<SymmetricKey>,
    pub(crate) cipher: Option<SessionCipher>,
    pub(crate) credentials: Option<ReceivedCredentials>,
    pub(crate) codec: Arc<dyn ObjectCodec>,
    pub(crate) compressor: Arc<dyn Compressor>,
    pub(crate) context: RoleContext,
    assembler: FrameAssembler,
    sender: ChunkSender,
}

impl PairingSession {
    /// Create a Grantor session sharing `share`.
    pub fn grantor(
        share: GrantorShareInfo,
        config: SessionConfig,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> PwsResult<Self> {
        Self::new(
            Role::Grantor,
            config,
            RoleContext::Grantor { share, verifier },
        )
    }

    /// Create a Requestor session proving `identity`.
    pub fn requestor(
        share: RequestorShareInfo,
        config: SessionConfig,
        identity: Arc<dyn AccountIdentity>,
    ) -> PwsResult<Self> {
        Self::new(
            Role::Requestor,
            config,
            RoleContext::Requestor { share, identity },
        )
    }

    fn new(role: Role, config: SessionConfig, context: RoleContext) -> PwsResult<Self> {
        config.validate()?;
        let keys = EphemeralKeypair::generate(config.mix_ephemeral_entropy())?;
        debug!(%role, public = %hex::encode(keys.public_key()), "session created");
        Ok(Self {
            role,
            assembler: FrameAssembler::new(config.max_frame_len()),
            config,
            state: HandshakeState::Idle,
            keys,
            peer_public: None,
            shared: None,
            pv_key: None,
            cipher: None,
            credentials: None,
            codec: Arc::new(JsonObjectCodec),
            compressor: default_compressor(),
            context,
            sender: ChunkSender::new(),
        })
    }

    /// Replace the session dictionary codec.
    pub fn with_codec(mut self, codec: Arc<dyn ObjectCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the certificate/record compressor.
    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Local role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Local ephemeral public key.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.keys.public_key()
    }

    /// X25519 shared secret, once the peer key is known.
    pub fn shared_secret(&self) -> Option<&SharedSecret> {
        self.shared.as_ref()
    }

    /// Session cipher, once established.
    pub fn cipher(&self) -> Option<&SessionCipher> {
        self.cipher.as_ref()
    }

    /// Check if the exchange is complete and every chunk was delivered.
    pub fn is_finished(&self) -> bool {
        self.state == HandshakeState::Complete && self.sender.is_idle()
    }

    /// Outcome of a completed session.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        if self.state != HandshakeState::Complete {
            return None;
        }
        Some(SessionOutcome {
            role: self.role,
            peer_public_key: self.peer_public?,
            credentials: self.credentials.clone(),
        })
    }

    /// Process one transport event.
    ///
    /// Any error aborts the session: the state becomes
    /// [`HandshakeState::Failed`] and later events return
    /// [`ProtocolError::Failed`].
    pub fn handle_event<T: Transport + ?Sized>(
        &mut self,
        event: TransportEvent,
        transport: &mut T,
    ) -> PwsResult<()> {
        if self.state == HandshakeState::Failed {
            return Err(ProtocolError::Failed.into());
        }
        let result = match event {
            TransportEvent::Ready => self.on_ready(transport),
            TransportEvent::DataReceived(bytes) => self.on_data(&bytes, transport),
            TransportEvent::ChunkDelivered => {
                self.sender.on_delivered(transport).map_err(PwsError::from)
            }
            TransportEvent::Disconnected => self.on_disconnect(),
        };
        if let Err(e) = &result {
            warn!(role = %self.role, state = %self.state, error = %e, "session failed");
            self.state = HandshakeState::Failed;
            self.assembler.reset();
        }
        result
    }

    fn on_ready<T: Transport + ?Sized>(&mut self, transport: &mut T) -> PwsResult<()> {
        if self.state != HandshakeState::Idle {
            debug!(state = %self.state, "transport ready again, ignoring");
            return Ok(());
        }
        info!(role = %self.role, "transport ready, starting session");
        match self.role {
            Role::Grantor => self.start_grantor(transport),
            Role::Requestor => {
                self.transition(HandshakeState::AwaitingPws1);
                Ok(())
            }
        }
    }

    fn on_disconnect(&mut self) -> PwsResult<()> {
        if self.state == HandshakeState::Complete {
            debug!(role = %self.role, "transport closed after completion");
            return Ok(());
        }
        Err(ProtocolError::SessionClosed(self.state).into())
    }

    fn on_data<T: Transport + ?Sized>(&mut self, bytes: &[u8], transport: &mut T) -> PwsResult<()> {
        trace!(len = bytes.len(), "chunk received");
        for body in self.assembler.push(bytes)? {
            let frame = SessionFrame::parse(&body)?;
            debug!(
                role = %self.role,
                frame_type = ?frame.frame_type,
                len = frame.payload.len(),
                "frame received"
            );
            self.dispatch(frame, transport)?;
        }
        Ok(())
    }

    fn dispatch<T: Transport + ?Sized>(
        &mut self,
        frame: SessionFrame,
        transport: &mut T,
    ) -> PwsResult<()> {
        use HandshakeState as S;

        if matches!(
            frame.frame_type,
            FrameType::Heartbeat | FrameType::PairVerifyHeartbeatA | FrameType::PairVerifyHeartbeatB
        ) {
            trace!(frame_type = ?frame.frame_type, "heartbeat");
            return Ok(());
        }

        match (self.role, self.state, frame.frame_type) {
            (Role::Grantor, S::AwaitingPws2, FrameType::Pws2) => {
                self.grantor_on_pws2(&frame.payload, transport)
            }
            (Role::Grantor, S::AwaitingM2 | S::AwaitingM4, FrameType::PairVerify) => {
                self.grantor_on_pair_verify(&frame, transport)
            }
            (Role::Grantor, S::AwaitingPws4, FrameType::PwsPayload) => {
                self.grantor_on_pws4(&frame.payload)
            }
            (Role::Requestor, S::AwaitingPws1, FrameType::Pws1) => {
                self.requestor_on_pws1(&frame.payload, transport)
            }
            (Role::Requestor, S::AwaitingM1, FrameType::PairVerifyStart) => {
                self.requestor_on_m1(&frame.payload, transport)
            }
            (Role::Requestor, S::AwaitingM3, FrameType::PairVerify) => {
                self.requestor_on_m3(&frame, transport)
            }
            (Role::Requestor, S::AwaitingPws3, FrameType::PwsPayload) => {
                self.requestor_on_pws3(&frame.payload, transport)
            }
            _ => Err(self.unexpected(&frame).into()),
        }
    }

    pub(crate) fn unexpected(&self, frame: &SessionFrame) -> ProtocolError {
        ProtocolError::UnexpectedFrame {
            frame_type: frame.frame_type,
            service_type: frame.service_type,
            state: self.state,
        }
    }

    pub(crate) fn transition(&mut self, to: HandshakeState) {
        debug!(role = %self.role, from = %self.state, %to, "state transition");
        self.state = to;
    }

    /// Frame, chunk and queue one session frame.
    pub(crate) fn send_frame<T: Transport + ?Sized>(
        &mut self,
        frame_type: FrameType,
        payload: Vec<u8>,
        transport: &mut T,
    ) -> PwsResult<()> {
        let body = SessionFrame::new(frame_type, ServiceType::PasswordSharing, payload).encode();
        let wire = NearbyFrame::new(body)?.encode();
        debug!(role = %self.role, ?frame_type, len = wire.len(), "frame sent");
        self.sender.enqueue(&wire, transport)?;
        Ok(())
    }

    /// Encode and send a dictionary frame.
    pub(crate) fn send_dict<T: Transport + ?Sized>(
        &mut self,
        frame_type: FrameType,
        dict: &Dictionary,
        transport: &mut T,
    ) -> PwsResult<()> {
        let payload = self.codec.encode(dict)?;
        self.send_frame(frame_type, payload, transport)
    }

    /// Record the peer key and derive the shared secret and handshake key.
    pub(crate) fn accept_peer_key(&mut self, peer: &[u8]) -> PwsResult<()> {
        let shared = self.keys.diffie_hellman(peer)?;
        let mut public = [0u8; PUBLIC_KEY_SIZE];
        public.copy_from_slice(peer);
        self.pv_key = Some(pair_verify_key(&shared)?);
        self.shared = Some(shared);
        self.peer_public = Some(public);
        Ok(())
    }

    /// Transcript both sides sign and verify: Requestor key, then Grantor key.
    pub(crate) fn transcript(&self) -> PwsResult<Vec<u8>> {
        let peer = self
            .peer_public
            .ok_or(ProtocolError::MissingField("publicKey"))?;
        let local = self.keys.public_key();
        let (requestor, grantor) = match self.role {
            Role::Grantor => (&peer, local),
            Role::Requestor => (local, &peer),
        };
        Ok([&requestor[..], &grantor[..]].concat())
    }

    pub(crate) fn handshake_key(&self) -> PwsResult<&SymmetricKey> {
        self.pv_key
            .as_ref()
            .ok_or_else(|| ProtocolError::MissingField("publicKey").into())
    }

    pub(crate) fn session_cipher(&mut self) -> PwsResult<&mut SessionCipher> {
        self.cipher
            .as_mut()
            .ok_or_else(|| ProtocolError::MissingField("sessionKeys").into())
    }
}

impl std::fmt::Debug for PairingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingSession")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("keys", &self.keys)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "compression")]
fn default_compressor() -> Arc<dyn Compressor> {
    Arc::new(crate::encoding::ZstdCompressor::new())
}

#[cfg(not(feature = "compression"))]
fn default_compressor() -> Arc<dyn Compressor> {
    Arc::new(crate::encoding::PassthroughCompressor)
}
