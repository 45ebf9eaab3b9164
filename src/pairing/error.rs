//! Handshake state machine errors.

use thiserror::Error;

use super::state::HandshakeState;
use crate::transport::{FrameType, ServiceType};

/// Errors raised by the pairing state machines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A frame arrived that the current state does not expect.
    #[error("unexpected {frame_type:?}/{service_type:?} frame in state {state:?}")]
    UnexpectedFrame {
        /// Received frame type.
        frame_type: FrameType,
        /// Received service type.
        service_type: ServiceType,
        /// State at the time of receipt.
        state: HandshakeState,
    },

    /// A pair-verify TLV carried a state value with no meaning.
    #[error("unknown pair-verify state value: {0}")]
    UnknownState(u8),

    /// A required dictionary key or TLV item is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A pair-verify TLV carried the wrong state value.
    #[error("wrong pair-verify state: expected {expected}, got {actual}")]
    WrongState {
        /// Expected state value.
        expected: u8,
        /// Received state value.
        actual: u8,
    },

    /// PWS4 did not acknowledge the share.
    #[error("unexpected reply: op={op:?} re={re:?}")]
    UnexpectedReply {
        /// Received operation code.
        op: Option<i64>,
        /// Received reply code.
        re: Option<i64>,
    },

    /// PWS3 carried credentials for a network other than the one asked for.
    #[error("credentials for {received:?}, requested {requested:?}")]
    UnexpectedNetwork {
        /// Network the Requestor asked for.
        requested: String,
        /// Network named in PWS3.
        received: String,
    },

    /// The transport closed before the session completed.
    #[error("session closed in state {0:?}")]
    SessionClosed(HandshakeState),

    /// The session already failed.
    #[error("session has failed")]
    Failed,
}
