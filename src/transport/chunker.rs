//! Flow-controlled chunked writes.
//!
//! An encoded nearby frame is cut into transport-sized chunks. At most one
//! chunk is outstanding: the next one is written only after the transport
//! reports the previous one delivered. Frames queued while chunks are in
//! flight go out strictly after them.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::error::TransportError;
use crate::core::Transport;

/// Outbound chunk queue.
#[derive(Debug, Default)]
pub struct ChunkSender {
    queue: VecDeque<Vec<u8>>,
    in_flight: bool,
}

impl ChunkSender {
    /// Create an idle sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `frame` into chunks and start sending if nothing is in flight.
    pub fn enqueue<T: Transport + ?Sized>(
        &mut self,
        frame: &[u8],
        transport: &mut T,
    ) -> Result<(), TransportError> {
        let chunk_size = transport.chunk_size().max(1);
        self.queue
            .extend(frame.chunks(chunk_size).map(<[u8]>::to_vec));
        debug!(
            bytes = frame.len(),
            queued = self.queue.len(),
            "frame queued"
        );
        self.send_next(transport)
    }

    /// Record delivery of the outstanding chunk and send the next one.
    pub fn on_delivered<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<(), TransportError> {
        if !self.in_flight {
            trace!("delivery report with nothing in flight");
            return Ok(());
        }
        self.in_flight = false;
        self.send_next(transport)
    }

    /// Check if every queued chunk has been delivered.
    pub fn is_idle(&self) -> bool {
        !self.in_flight && self.queue.is_empty()
    }

    /// Chunks waiting behind the outstanding one.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn send_next<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        if self.in_flight {
            return Ok(());
        }
        if let Some(chunk) = self.queue.pop_front() {
            trace!(len = chunk.len(), remaining = self.queue.len(), "writing chunk");
            // a failed write leaves nothing in flight; the session treats it as fatal
            transport.send(chunk)?;
            self.in_flight = true;
        }
        Ok(())
    }
}
