//! Transport layer.
//!
//! Nearby frames and their reassembly, session frames, flow-controlled
//! chunked writes and the link event model. With the `transport` feature
//! this module also provides channel-backed links and the TCP GATT bridge.

mod chunker;
mod error;
mod event;
mod frame;
mod memory;
mod session_frame;

#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod bridge;

pub use chunker::ChunkSender;
pub use error::{TransportError, TransportResult};
pub use event::TransportEvent;
pub use frame::{FrameAssembler, FrameError, NearbyFrame};
pub use memory::LoopbackTransport;
pub use session_frame::{FrameType, ServiceType, SessionFrame};

#[cfg(feature = "transport")]
pub use bridge::{ChannelTransport, TransportLink};
