//! Synchronous in-process pairing.
//!
//! Two sessions wired through [`LoopbackTransport`]s. Every chunk one side
//! writes is delivered to the other and acknowledged to the writer, in
//! order, until neither side has anything left to say.

use std::collections::VecDeque;

use tracing::trace;

use super::error::ProtocolError;
use super::session::{PairingSession, SessionOutcome};
use crate::core::{GATT_WRITE_CHUNK, PwsResult};
use crate::transport::{LoopbackTransport, TransportEvent};

/// Run `grantor` and `requestor` against each other with
/// [`GATT_WRITE_CHUNK`]-sized writes.
pub fn run_in_memory(
    grantor: &mut PairingSession,
    requestor: &mut PairingSession,
) -> PwsResult<(SessionOutcome, SessionOutcome)> {
    run_in_memory_with(grantor, requestor, GATT_WRITE_CHUNK)
}

/// [`run_in_memory`] with an explicit chunk size.
pub fn run_in_memory_with(
    grantor: &mut PairingSession,
    requestor: &mut PairingSession,
    chunk_size: usize,
) -> PwsResult<(SessionOutcome, SessionOutcome)> {
    let mut sides = [
        Side::new(grantor, chunk_size),
        Side::new(requestor, chunk_size),
    ];

    loop {
        let mut progressed = false;
        for i in 0..2 {
            if let Some(event) = sides[i].inbox.pop_front() {
                progressed = true;
                let side = &mut sides[i];
                side.session.handle_event(event, &mut side.transport)?;
            }
            let written = sides[i].transport.take_sent();
            for chunk in written {
                progressed = true;
                trace!(from = %sides[i].session.role(), len = chunk.len(), "ferry chunk");
                sides[1 - i].inbox.push_back(TransportEvent::DataReceived(chunk));
                sides[i].inbox.push_back(TransportEvent::ChunkDelivered);
            }
        }
        if !progressed {
            break;
        }
    }

    let [g, r] = sides;
    match (g.session.outcome(), r.session.outcome()) {
        (Some(g_out), Some(r_out)) if g.session.is_finished() && r.session.is_finished() => {
            Ok((g_out, r_out))
        }
        _ => {
            let stalled = if g.session.is_finished() {
                r.session.state()
            } else {
                g.session.state()
            };
            Err(ProtocolError::SessionClosed(stalled).into())
        }
    }
}

struct Side<'a> {
    session: &'a mut PairingSession,
    transport: LoopbackTransport,
    inbox: VecDeque<TransportEvent>,
}

impl<'a> Side<'a> {
    fn new(session: &'a mut PairingSession, chunk_size: usize) -> Self {
        Self {
            session,
            transport: LoopbackTransport::new(chunk_size),
            inbox: VecDeque::from([TransportEvent::Ready]),
        }
    }
}
