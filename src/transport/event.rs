//! Link notifications consumed by a pairing session.

/// Notifications a transport delivers to its session, in link order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The link can carry data (GATT subscription active, bridge connected).
    Ready,
    /// A chunk of inbound bytes.
    DataReceived(Vec<u8>),
    /// The oldest outstanding outbound chunk was delivered.
    ChunkDelivered,
    /// The link closed.
    Disconnected,
}
