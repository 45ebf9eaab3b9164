//! # PWS Protocol
//!
//! **P**ass**W**ord **S**haring over Bluetooth Low Energy.
//!
//! A Grantor that already knows a Wi-Fi network shares its SSID and
//! pre-shared key with a nearby Requestor. The crate implements every layer
//! above the radio:
//!
//! - **Discovery**: decoding of Apple manufacturer data and the PWS
//!   nearby-action advertisement
//! - **Framing**: TLV8, the LE16 length-prefixed nearby frame, the two-byte
//!   session frame header, flow-controlled chunked writes
//! - **Handshake**: ephemeral X25519 pair-verify (M1..M4) with an
//!   account-identity proof
//! - **Credentials**: the encrypted PWS3/PWS4 exchange
//!
//! The protocol engine is sans-IO: a [`pairing::PairingSession`] consumes
//! [`transport::TransportEvent`]s and writes chunks through a
//! [`core::Transport`]. The `transport` feature adds a tokio driver and a TCP
//! bridge to a GATT relay.
//!
//! ## Feature Flags
//!
//! - `transport` (default): async driver and TCP GATT bridge
//! - `compression` (default): zstd-backed compressor
//!
//! ## Modules
//!
//! - [`core`]: constants, error types and collaborator traits
//! - [`encoding`]: TLV8 and the protocol dictionary model
//! - [`transport`]: nearby/session frames and chunked delivery
//! - [`advertisement`]: manufacturer-data parsing and discovery
//! - [`crypto`]: key schedule, AEAD and session cipher
//! - [`identity`]: account identity proofs
//! - [`pairing`]: the Grantor and Requestor state machines
//!
//! ## Example Usage
//!
//! ```rust
//! use pws_protocol::prelude::*;
//!
//! let frame = SessionFrame::new(FrameType::Pws1, ServiceType::PasswordSharing, vec![]);
//! let encoded = frame.encode();
//! assert_eq!(&encoded[..2], &[0x17, 0x07]);
//!
//! let mut tlv = Tlv8Box::new();
//! tlv.add_int(PairVerifyTlv::State as u8, 1);
//! assert_eq!(tlv.serialize(), vec![0x06, 0x01, 0x01]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod advertisement;
pub mod crypto;
pub mod encoding;
pub mod identity;
pub mod pairing;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;

    pub use crate::advertisement::{
        AppleAdvertisement, ContinuityMessage, Discovery, NearbyActionFrame, PwsAdvertisement,
    };
    pub use crate::crypto::{EphemeralKeypair, SessionCipher, SigningIdentity};
    pub use crate::encoding::{Dictionary, Tlv8Box, Value};
    pub use crate::pairing::{
        ConfigFlag, GrantorShareInfo, HandshakeState, PairVerifyTlv, PairingSession,
        ReceivedCredentials, RequestorShareInfo, Role, SessionConfig, SessionOutcome,
    };
    pub use crate::transport::{
        ChunkSender, FrameAssembler, FrameType, NearbyFrame, ServiceType, SessionFrame,
        TransportEvent,
    };
}

// Re-export commonly used items at crate root
pub use crate::core::{PwsError, PwsResult};
pub use crate::pairing::{PairingSession, Role, SessionConfig};
