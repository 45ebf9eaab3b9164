//! Handshake states.

/// Position of a session in the PWS1..PWS4 / M1..M4 exchange.
///
/// ```text
/// Grantor:   Idle → AwaitingPws2 → AwaitingM2 → AwaitingM4 → Established → AwaitingPws4 → Complete
/// Requestor: Idle → AwaitingPws1 → AwaitingM1 → AwaitingM3 → Established → AwaitingPws3 → Complete
/// ```
///
/// Any failure moves either role to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Waiting for the transport to become ready.
    Idle,
    /// Requestor: waiting for PWS1.
    AwaitingPws1,
    /// Grantor: PWS1 sent, waiting for PWS2.
    AwaitingPws2,
    /// Requestor: PWS2 sent, waiting for M1.
    AwaitingM1,
    /// Grantor: M1 sent, waiting for M2.
    AwaitingM2,
    /// Requestor: M2 sent, waiting for M3.
    AwaitingM3,
    /// Grantor: M3 sent, waiting for M4.
    AwaitingM4,
    /// Pair-verify finished and application keys derived.
    Established,
    /// Requestor: M4 sent, waiting for PWS3.
    AwaitingPws3,
    /// Grantor: PWS3 sent, waiting for PWS4.
    AwaitingPws4,
    /// The credential exchange finished.
    Complete,
    /// The session aborted.
    Failed,
}

impl HandshakeState {
    /// Check if no further frames will be accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, HandshakeState::Complete | HandshakeState::Failed)
    }

    /// Check if application keys exist.
    pub fn is_established(self) -> bool {
        matches!(
            self,
            HandshakeState::Established
                | HandshakeState::AwaitingPws3
                | HandshakeState::AwaitingPws4
                | HandshakeState::Complete
        )
    }
}

impl std::fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
