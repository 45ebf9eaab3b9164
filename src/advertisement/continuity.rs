//! Apple manufacturer data and continuity messages.
//!
//! ```text
//! manufacturer data: [ 0x4c 0x00 | TLV8 continuity messages ]
//! nearby action:     [ flags (1) | action_type (1) | auth_tag (3) | parameters ]
//! PWS parameters:    [ mail (3) | phone (3) | apple_id (3) | ssid (3) ]
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::{
    APPLE_COMPANY_ID, MIN_MANUFACTURER_DATA_SIZE, MIN_NEARBY_ACTION_SIZE, MIN_PWS_PARAMETER_SIZE,
    NEARBY_ACTION_TYPE, PWS_ACTION_TYPE, SHORT_HASH_SIZE,
};
use crate::encoding::{Tlv8Box, TlvError};

/// Flags byte the Requestor advertises with.
pub const PWS_ADVERTISEMENT_FLAGS: u8 = 0xc0;

/// A three-byte truncated SHA-256.
pub type ShortHash = [u8; SHORT_HASH_SIZE];

/// Errors from advertisement decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvertisementError {
    /// Advertisement or one of its messages is truncated.
    #[error("advertisement too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// The continuity TLV stream is malformed.
    #[error("continuity tlv: {0}")]
    Tlv(#[from] TlvError),
}

/// First three bytes of SHA-256 over `input`.
pub fn short_hash(input: &[u8]) -> ShortHash {
    let digest = Sha256::digest(input);
    let mut hash = [0u8; SHORT_HASH_SIZE];
    hash.copy_from_slice(&digest[..SHORT_HASH_SIZE]);
    hash
}

/// Hashes carried by a Wi-Fi password request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwsAdvertisement {
    /// Truncated hash of the Requestor's mail address.
    pub mail_hash: ShortHash,
    /// Truncated hash of the Requestor's phone number.
    pub phone_hash: ShortHash,
    /// Truncated hash of the Requestor's account id.
    pub apple_id_hash: ShortHash,
    /// Truncated hash of the requested SSID.
    pub ssid_hash: ShortHash,
}

impl PwsAdvertisement {
    /// Decode from nearby-action parameters.
    pub fn parse(parameters: &[u8]) -> Result<Self, AdvertisementError> {
        if parameters.len() < MIN_PWS_PARAMETER_SIZE {
            return Err(AdvertisementError::TooShort {
                expected: MIN_PWS_PARAMETER_SIZE,
                actual: parameters.len(),
            });
        }
        let hash = |i: usize| {
            let mut h = [0u8; SHORT_HASH_SIZE];
            h.copy_from_slice(&parameters[i * SHORT_HASH_SIZE..(i + 1) * SHORT_HASH_SIZE]);
            h
        };
        Ok(Self {
            mail_hash: hash(0),
            phone_hash: hash(1),
            apple_id_hash: hash(2),
            ssid_hash: hash(3),
        })
    }

    /// Hashes for a Requestor looking for `ssid`.
    pub fn for_request(contact: &str, ssid: &str) -> Self {
        let contact_hash = short_hash(contact.as_bytes());
        Self {
            mail_hash: contact_hash,
            phone_hash: contact_hash,
            apple_id_hash: contact_hash,
            ssid_hash: short_hash(ssid.as_bytes()),
        }
    }

    /// Encode as nearby-action parameters.
    pub fn encode(&self) -> Vec<u8> {
        [self.mail_hash, self.phone_hash, self.apple_id_hash, self.ssid_hash].concat()
    }
}

/// A nearby-action continuity message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyActionFrame {
    /// Flags byte.
    pub flags: u8,
    /// Action type.
    pub action_type: u8,
    /// Authentication tag.
    pub auth_tag: [u8; 3],
    /// Action-specific parameters.
    pub parameters: Vec<u8>,
    /// Decoded parameters of a Wi-Fi password request.
    pub pws: Option<PwsAdvertisement>,
}

impl NearbyActionFrame {
    /// Decode a nearby-action message value.
    pub fn parse(data: &[u8]) -> Result<Self, AdvertisementError> {
        if data.len() < MIN_NEARBY_ACTION_SIZE {
            return Err(AdvertisementError::TooShort {
                expected: MIN_NEARBY_ACTION_SIZE,
                actual: data.len(),
            });
        }
        let parameters = data[MIN_NEARBY_ACTION_SIZE..].to_vec();
        let action_type = data[1];
        let pws = if action_type == PWS_ACTION_TYPE {
            Some(PwsAdvertisement::parse(&parameters)?)
        } else {
            None
        };
        Ok(Self {
            flags: data[0],
            action_type,
            auth_tag: [data[2], data[3], data[4]],
            parameters,
            pws,
        })
    }

    /// Wi-Fi password request frame with a zero auth tag.
    pub fn password_request(pws: PwsAdvertisement) -> Self {
        Self {
            flags: PWS_ADVERTISEMENT_FLAGS,
            action_type: PWS_ACTION_TYPE,
            auth_tag: [0; 3],
            parameters: pws.encode(),
            pws: Some(pws),
        }
    }

    /// Encode as a continuity message value.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_NEARBY_ACTION_SIZE + self.parameters.len());
        out.push(self.flags);
        out.push(self.action_type);
        out.extend_from_slice(&self.auth_tag);
        out.extend_from_slice(&self.parameters);
        out
    }
}

/// One continuity message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuityMessage {
    /// Nearby action (type 0x0f).
    NearbyAction(NearbyActionFrame),
    /// Any other message type, kept undecoded.
    Other {
        /// Message type.
        message_type: u8,
        /// Raw value.
        data: Vec<u8>,
    },
}

impl ContinuityMessage {
    /// Message type byte.
    pub fn message_type(&self) -> u8 {
        match self {
            ContinuityMessage::NearbyAction(_) => NEARBY_ACTION_TYPE,
            ContinuityMessage::Other { message_type, .. } => *message_type,
        }
    }
}

/// Decoded Apple manufacturer data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleAdvertisement {
    /// Messages in first-appearance order of their type.
    pub messages: Vec<ContinuityMessage>,
}

impl AppleAdvertisement {
    /// Decode manufacturer data.
    ///
    /// Returns `Ok(None)` when the company identifier is not Apple's.
    pub fn parse(data: &[u8]) -> Result<Option<Self>, AdvertisementError> {
        if data.len() < MIN_MANUFACTURER_DATA_SIZE {
            return Err(AdvertisementError::TooShort {
                expected: MIN_MANUFACTURER_DATA_SIZE,
                actual: data.len(),
            });
        }
        if data[..2] != APPLE_COMPANY_ID {
            return Ok(None);
        }

        let tlv = Tlv8Box::deserialize(&data[2..])?;
        let mut messages = Vec::new();
        for message_type in tlv.get_types() {
            let value = tlv.get_value(message_type).unwrap_or_default();
            let message = if message_type == NEARBY_ACTION_TYPE {
                ContinuityMessage::NearbyAction(NearbyActionFrame::parse(&value)?)
            } else {
                ContinuityMessage::Other {
                    message_type,
                    data: value,
                }
            };
            messages.push(message);
        }
        Ok(Some(Self { messages }))
    }

    /// The nearby-action message, if present.
    pub fn nearby_action(&self) -> Option<&NearbyActionFrame> {
        self.messages.iter().find_map(|m| match m {
            ContinuityMessage::NearbyAction(frame) => Some(frame),
            _ => None,
        })
    }

    /// Wi-Fi password request parameters, if present.
    pub fn pws(&self) -> Option<&PwsAdvertisement> {
        self.nearby_action().and_then(|frame| frame.pws.as_ref())
    }

    /// Encode as manufacturer data.
    pub fn encode(&self) -> Vec<u8> {
        let mut tlv = Tlv8Box::new();
        for message in &self.messages {
            let value = match message {
                ContinuityMessage::NearbyAction(frame) => frame.encode(),
                ContinuityMessage::Other { data, .. } => data.clone(),
            };
            tlv.add_big_value(message.message_type(), &value);
        }
        let mut out = APPLE_COMPANY_ID.to_vec();
        out.extend(tlv.serialize());
        out
    }
}
