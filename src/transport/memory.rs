//! In-memory transport.

use std::collections::VecDeque;

use super::error::TransportError;
use crate::core::Transport;

/// Transport that records written chunks for a caller to ferry elsewhere.
#[derive(Debug)]
pub struct LoopbackTransport {
    chunk_size: usize,
    sent: VecDeque<Vec<u8>>,
}

impl LoopbackTransport {
    /// Create a loopback transport with the given chunk size.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            sent: VecDeque::new(),
        }
    }

    /// Drain every chunk written so far.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        self.sent.drain(..).collect()
    }

    /// Oldest written chunk.
    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.pop_front()
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, chunk: Vec<u8>) -> Result<(), TransportError> {
        if chunk.len() > self.chunk_size {
            return Err(TransportError::ChunkTooLarge {
                len: chunk.len(),
                limit: self.chunk_size,
            });
        }
        self.sent.push_back(chunk);
        Ok(())
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_oversized_chunk() {
        let mut t = LoopbackTransport::new(2);
        assert!(matches!(
            t.send(vec![0; 3]),
            Err(TransportError::ChunkTooLarge { len: 3, limit: 2 })
        ));
        t.send(vec![1, 2]).unwrap();
        assert_eq!(t.pop_sent(), Some(vec![1, 2]));
    }
}
