//! Async session driver.

use tracing::{debug, info};

use super::error::ProtocolError;
use super::session::{PairingSession, SessionOutcome};
use crate::core::PwsResult;
use crate::transport::{TransportError, TransportLink};

/// Drive `session` over `link` until it completes or fails.
///
/// Every link event is handed to [`PairingSession::handle_event`] in
/// arrival order. Returns once the session is complete and its last chunk
/// was delivered.
pub async fn run_session(
    mut session: PairingSession,
    mut link: TransportLink,
) -> PwsResult<SessionOutcome> {
    info!(role = %session.role(), "session driver started");
    while let Some(event) = link.events.recv().await {
        session.handle_event(event, &mut link.transport)?;
        if session.is_finished() {
            return session
                .outcome()
                .ok_or_else(|| ProtocolError::SessionClosed(session.state()).into());
        }
    }
    debug!(state = %session.state(), "link closed");
    match session.outcome() {
        Some(outcome) => Ok(outcome),
        None => Err(TransportError::ChannelClosed.into()),
    }
}
