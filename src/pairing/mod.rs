//! Pairing layer
//!
//! The Grantor and Requestor state machines:
//! - Session configuration and flags
//! - Share info each role brings
//! - PWS1..PWS4 and M1..M4 message contents
//! - The sans-IO [`PairingSession`] plus in-memory and async drivers

mod config;
mod error;
mod grantor;
mod loopback;
pub mod messages;
mod requestor;
mod session;
mod share;
mod state;

#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod driver;

#[cfg(test)]
pub(crate) mod tests_support;

pub use config::{ConfigFlag, SessionConfig};
pub use error::ProtocolError;
pub use loopback::{run_in_memory, run_in_memory_with};
pub use messages::PairVerifyTlv;
pub use session::{PairingSession, SessionOutcome};
pub use share::{GrantorShareInfo, ReceivedCredentials, RequestorShareInfo};
pub use state::HandshakeState;

pub use crate::crypto::Role;

#[cfg(feature = "transport")]
pub use driver::run_session;
