//! Nearby frames.
//!
//! Every message on the characteristic is a nearby frame:
//!
//! ```text
//! [ declared_length (2, LE16) | body (declared_length) ]
//! ```
//!
//! A frame arrives as one or more chunks. The first chunk carries the length
//! prefix; later chunks are appended until the body reaches the declared
//! length.

use thiserror::Error;

use crate::core::NEARBY_LENGTH_PREFIX_SIZE;

/// Frame parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Input is shorter than the fixed header it must carry.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// Body exceeds what the length prefix or configuration allows.
    #[error("frame too large: {0} bytes")]
    TooLarge(usize),

    /// Session frame type byte is not recognised.
    #[error("unknown frame type: 0x{0:02x}")]
    UnknownFrameType(u8),

    /// Session frame service byte is not recognised.
    #[error("unknown service type: 0x{0:02x}")]
    UnknownServiceType(u8),
}

/// A (possibly partial) nearby frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyFrame {
    declared_length: u16,
    body: Vec<u8>,
}

impl NearbyFrame {
    /// Frame an outgoing body. The declared length is the body length.
    pub fn new(body: Vec<u8>) -> Result<Self, FrameError> {
        let declared_length =
            u16::try_from(body.len()).map_err(|_| FrameError::TooLarge(body.len()))?;
        Ok(Self {
            declared_length,
            body,
        })
    }

    /// Start a frame from the first received chunk.
    pub fn parse(first_chunk: &[u8]) -> Result<Self, FrameError> {
        if first_chunk.len() < NEARBY_LENGTH_PREFIX_SIZE {
            return Err(FrameError::TooShort {
                expected: NEARBY_LENGTH_PREFIX_SIZE,
                actual: first_chunk.len(),
            });
        }
        let declared_length = u16::from_le_bytes([first_chunk[0], first_chunk[1]]);
        Ok(Self {
            declared_length,
            body: first_chunk[NEARBY_LENGTH_PREFIX_SIZE..].to_vec(),
        })
    }

    /// Append a continuation chunk.
    pub fn append(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    /// Check if the body has reached the declared length.
    pub fn is_complete(&self) -> bool {
        self.body.len() >= self.declared_length as usize
    }

    /// Length announced by the prefix.
    pub fn declared_length(&self) -> u16 {
        self.declared_length
    }

    /// Body bytes received so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Wire encoding: length prefix followed by the body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NEARBY_LENGTH_PREFIX_SIZE + self.body.len());
        out.extend_from_slice(&self.declared_length.to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    /// Split a complete frame into its body and any bytes received past the
    /// declared length.
    fn split_surplus(mut self) -> (Vec<u8>, Vec<u8>) {
        let surplus = self.body.split_off(self.declared_length as usize);
        (self.body, surplus)
    }
}

/// Reassembles nearby frames from a chunk stream.
#[derive(Debug)]
pub struct FrameAssembler {
    current: Option<NearbyFrame>,
    /// Leading bytes of a length prefix split across reads.
    prefix: Vec<u8>,
    max_frame_len: usize,
}

impl FrameAssembler {
    /// Create an assembler accepting frames up to `max_frame_len` bytes.
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            current: None,
            prefix: Vec::new(),
            max_frame_len,
        }
    }

    /// Check if a partial frame is buffered.
    pub fn is_mid_frame(&self) -> bool {
        self.current.is_some() || !self.prefix.is_empty()
    }

    /// Feed one received chunk, returning every frame body it completes.
    ///
    /// Bytes past a frame's declared length start the next frame.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>, FrameError> {
        let mut complete = Vec::new();
        let mut frame = match self.current.take() {
            Some(mut frame) => {
                frame.append(chunk);
                frame
            }
            None => {
                self.prefix.extend_from_slice(chunk);
                if self.prefix.len() < NEARBY_LENGTH_PREFIX_SIZE {
                    return Ok(complete);
                }
                let start = std::mem::take(&mut self.prefix);
                self.start(&start)?
            }
        };

        while frame.is_complete() {
            let (body, surplus) = frame.split_surplus();
            complete.push(body);
            if surplus.len() < NEARBY_LENGTH_PREFIX_SIZE {
                self.prefix = surplus;
                return Ok(complete);
            }
            frame = self.start(&surplus)?;
        }
        self.current = Some(frame);
        Ok(complete)
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.current = None;
        self.prefix.clear();
    }

    fn start(&self, chunk: &[u8]) -> Result<NearbyFrame, FrameError> {
        let frame = NearbyFrame::parse(chunk)?;
        if frame.declared_length() as usize > self.max_frame_len {
            return Err(FrameError::TooLarge(frame.declared_length() as usize));
        }
        Ok(frame)
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(u16::MAX as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_prefix_is_little_endian() {
        let frame = NearbyFrame::new(vec![0xaa; 0x0102]).unwrap();
        let encoded = frame.encode();
        assert_eq!(&encoded[..2], &[0x02, 0x01]);
        assert_eq!(encoded.len(), 2 + 0x0102);
    }

    #[test]
    fn test_body_too_large() {
        assert_eq!(
            NearbyFrame::new(vec![0; 70_000]),
            Err(FrameError::TooLarge(70_000))
        );
    }

    #[test]
    fn test_parse_needs_length_prefix() {
        assert_eq!(
            NearbyFrame::parse(&[0x05]),
            Err(FrameError::TooShort {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_reassembly_across_chunks() {
        let mut assembler = FrameAssembler::default();
        let body: Vec<u8> = (0..250u8).collect();
        let wire = NearbyFrame::new(body.clone()).unwrap().encode();

        let mut frames = Vec::new();
        for chunk in wire.chunks(99) {
            frames.extend(assembler.push(chunk).unwrap());
        }
        assert_eq!(frames, vec![body]);
        assert!(!assembler.is_mid_frame());
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut assembler = FrameAssembler::default();
        assert!(assembler.push(&[0x04, 0x00, 0x17]).unwrap().is_empty());
        assert!(assembler.is_mid_frame());
        assert_eq!(
            assembler.push(&[0x07, 0x01, 0x02]).unwrap(),
            vec![vec![0x17, 0x07, 0x01, 0x02]]
        );
    }

    #[test]
    fn test_split_length_prefix() {
        let mut assembler = FrameAssembler::default();
        assert!(assembler.push(&[0x02]).unwrap().is_empty());
        assert!(assembler.is_mid_frame());
        assert_eq!(assembler.push(&[0x00, 0xaa, 0xbb, 0x01]).unwrap(), vec![vec![0xaa, 0xbb]]);
        assert!(assembler.is_mid_frame());
        assert_eq!(assembler.push(&[0x00, 0xcc]).unwrap(), vec![vec![0xcc]]);
        assert!(!assembler.is_mid_frame());
    }

    #[test]
    fn test_surplus_starts_next_frame() {
        let mut assembler = FrameAssembler::default();
        let mut wire = NearbyFrame::new(vec![1, 2]).unwrap().encode();
        wire.extend(NearbyFrame::new(vec![3, 4, 5]).unwrap().encode());
        assert_eq!(
            assembler.push(&wire).unwrap(),
            vec![vec![1, 2], vec![3, 4, 5]]
        );
    }

    #[test]
    fn test_rejects_oversized_declaration() {
        let mut assembler = FrameAssembler::new(16);
        assert_eq!(
            assembler.push(&[0x00, 0x01, 0x00]),
            Err(FrameError::TooLarge(256))
        );
    }

    proptest! {
        #[test]
        fn test_arbitrary_chunking_recovers_body(
            body in proptest::collection::vec(any::<u8>(), 0..1500),
            sizes in proptest::collection::vec(2usize..120, 1..40),
        ) {
            let wire = NearbyFrame::new(body.clone()).unwrap().encode();
            let mut assembler = FrameAssembler::default();
            let mut frames = Vec::new();
            let mut offset = 0;
            let mut i = 0;
            while offset < wire.len() {
                let size = sizes[i % sizes.len()];
                let end = (offset + size).min(wire.len());
                frames.extend(assembler.push(&wire[offset..end]).unwrap());
                offset = end;
                i += 1;
            }
            prop_assert_eq!(frames, vec![body]);
        }
    }
}
