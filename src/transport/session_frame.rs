//! Session frames.
//!
//! The body of every nearby frame is a session frame:
//!
//! ```text
//! [ frame_type (1) | service_type (1) | payload ]
//! ```

use super::frame::FrameError;
use crate::core::SESSION_HEADER_SIZE;

/// Session frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Encrypted application payload (PWS3, PWS4).
    PwsPayload = 0x06,
    /// Pair-verify M1.
    PairVerifyStart = 0x12,
    /// Pair-verify M2, M3 and M4; told apart by the TLV state value.
    PairVerify = 0x13,
    /// Pair-verify heartbeat, first half.
    PairVerifyHeartbeatA = 0x15,
    /// Pair-verify heartbeat, second half.
    PairVerifyHeartbeatB = 0x16,
    /// Session start (Grantor to Requestor).
    Pws1 = 0x17,
    /// Session start acknowledgement (Requestor to Grantor).
    Pws2 = 0x18,
    /// Keep-alive.
    Heartbeat = 0x1e,
}

impl FrameType {
    /// Parse frame type from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x06 => Some(Self::PwsPayload),
            0x12 => Some(Self::PairVerifyStart),
            0x13 => Some(Self::PairVerify),
            0x15 => Some(Self::PairVerifyHeartbeatA),
            0x16 => Some(Self::PairVerifyHeartbeatB),
            0x17 => Some(Self::Pws1),
            0x18 => Some(Self::Pws2),
            0x1e => Some(Self::Heartbeat),
            _ => None,
        }
    }

    /// Convert frame type to its byte representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Service identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceType {
    /// Wi-Fi password sharing.
    PasswordSharing = 0x07,
}

impl ServiceType {
    /// Parse service type from a byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x07 => Some(Self::PasswordSharing),
            _ => None,
        }
    }

    /// Convert service type to its byte representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A decoded session frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFrame {
    /// Frame type.
    pub frame_type: FrameType,
    /// Service type.
    pub service_type: ServiceType,
    /// Payload following the two header bytes.
    pub payload: Vec<u8>,
}

impl SessionFrame {
    /// Create a session frame.
    pub fn new(frame_type: FrameType, service_type: ServiceType, payload: Vec<u8>) -> Self {
        Self {
            frame_type,
            service_type,
            payload,
        }
    }

    /// Parse a complete nearby frame body.
    pub fn parse(body: &[u8]) -> Result<Self, FrameError> {
        if body.len() < SESSION_HEADER_SIZE {
            return Err(FrameError::TooShort {
                expected: SESSION_HEADER_SIZE,
                actual: body.len(),
            });
        }
        let frame_type =
            FrameType::from_byte(body[0]).ok_or(FrameError::UnknownFrameType(body[0]))?;
        let service_type =
            ServiceType::from_byte(body[1]).ok_or(FrameError::UnknownServiceType(body[1]))?;
        Ok(Self {
            frame_type,
            service_type,
            payload: body[SESSION_HEADER_SIZE..].to_vec(),
        })
    }

    /// The two header bytes, which double as AEAD associated data for
    /// application payloads.
    pub fn header(frame_type: FrameType, service_type: ServiceType) -> [u8; SESSION_HEADER_SIZE] {
        [frame_type.as_byte(), service_type.as_byte()]
    }

    /// Encode to the nearby frame body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SESSION_HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&Self::header(self.frame_type, self.service_type));
        out.extend_from_slice(&self.payload);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_bytes() {
        for byte in [0x06, 0x12, 0x13, 0x15, 0x16, 0x17, 0x18, 0x1e] {
            assert_eq!(FrameType::from_byte(byte).unwrap().as_byte(), byte);
        }
        assert_eq!(FrameType::from_byte(0x01), None);
    }

    #[test]
    fn test_parse_header_and_payload() {
        let frame = SessionFrame::parse(&[0x12, 0x07, 0xaa, 0xbb]).unwrap();
        assert_eq!(frame.frame_type, FrameType::PairVerifyStart);
        assert_eq!(frame.service_type, ServiceType::PasswordSharing);
        assert_eq!(frame.payload, vec![0xaa, 0xbb]);
        assert_eq!(frame.encode(), vec![0x12, 0x07, 0xaa, 0xbb]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            SessionFrame::parse(&[0x17]),
            Err(FrameError::TooShort {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            SessionFrame::parse(&[0x99, 0x07]),
            Err(FrameError::UnknownFrameType(0x99))
        );
        assert_eq!(
            SessionFrame::parse(&[0x17, 0x01]),
            Err(FrameError::UnknownServiceType(0x01))
        );
    }

    #[test]
    fn test_payload_header_is_aad() {
        assert_eq!(
            SessionFrame::header(FrameType::PwsPayload, ServiceType::PasswordSharing),
            [0x06, 0x07]
        );
    }
}
