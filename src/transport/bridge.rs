//! Channel-backed links and the TCP GATT bridge.
//!
//! A [`TransportLink`] pairs an outbound [`ChannelTransport`] with the
//! stream of [`TransportEvent`]s for the same link. Background tasks move
//! bytes between the channels and the socket.
//!
//! The TCP bridge speaks the GATT relay's framing:
//!
//! - relay to client: fixed 256-byte records, `len (1) | payload (len) |
//!   zero padding`; a zero `len` means the relay closed the characteristic
//! - client to relay: raw chunks, one socket write per chunk
//!
//! [`connect`] is the client end (the Requestor behind a relay),
//! [`accept`] the relay end.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::error::TransportError;
use super::event::TransportEvent;
use crate::core::{GATT_WRITE_CHUNK, TCP_BRIDGE_CHUNK, TCP_BRIDGE_RECORD_SIZE, Transport};

/// Outbound half of a channel-backed link.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    chunk_size: usize,
}

impl ChannelTransport {
    /// Wrap an outbound channel.
    pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>, chunk_size: usize) -> Self {
        Self { tx, chunk_size }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, chunk: Vec<u8>) -> Result<(), TransportError> {
        if chunk.len() > self.chunk_size {
            return Err(TransportError::ChunkTooLarge {
                len: chunk.len(),
                limit: self.chunk_size,
            });
        }
        self.tx.send(chunk).map_err(|_| TransportError::ChannelClosed)
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

/// One end of a link: where to write, and what happened.
#[derive(Debug)]
pub struct TransportLink {
    /// Outbound chunks.
    pub transport: ChannelTransport,
    /// Inbound notifications.
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl TransportLink {
    /// Two in-process links wired to each other.
    ///
    /// A chunk written on one end is delivered to the other, then reported
    /// delivered to the writer. Both ends start with [`TransportEvent::Ready`].
    pub fn pair(chunk_size: usize) -> (TransportLink, TransportLink) {
        let (a_out_tx, a_out_rx) = mpsc::unbounded_channel();
        let (b_out_tx, b_out_rx) = mpsc::unbounded_channel();
        let (a_ev_tx, a_ev_rx) = mpsc::unbounded_channel();
        let (b_ev_tx, b_ev_rx) = mpsc::unbounded_channel();

        let _ = a_ev_tx.send(TransportEvent::Ready);
        let _ = b_ev_tx.send(TransportEvent::Ready);

        tokio::spawn(forward(a_out_rx, a_ev_tx.clone(), b_ev_tx.clone()));
        tokio::spawn(forward(b_out_rx, b_ev_tx, a_ev_tx));

        (
            TransportLink {
                transport: ChannelTransport::new(a_out_tx, chunk_size),
                events: a_ev_rx,
            },
            TransportLink {
                transport: ChannelTransport::new(b_out_tx, chunk_size),
                events: b_ev_rx,
            },
        )
    }
}

async fn forward(
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    writer_events: mpsc::UnboundedSender<TransportEvent>,
    reader_events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(chunk) = outbound.recv().await {
        if reader_events.send(TransportEvent::DataReceived(chunk)).is_err() {
            break;
        }
        if writer_events.send(TransportEvent::ChunkDelivered).is_err() {
            break;
        }
    }
    let _ = reader_events.send(TransportEvent::Disconnected);
}

/// Connect to a GATT relay as its client.
pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<TransportLink, TransportError> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    debug!(peer = ?stream.peer_addr().ok(), "connected to relay");
    Ok(spawn_link(stream, LinkSide::Client))
}

/// Accept one client on `listener`, acting as the relay end.
pub async fn accept(listener: &TcpListener) -> Result<TransportLink, TransportError> {
    let (stream, peer) = listener.accept().await?;
    stream.set_nodelay(true)?;
    debug!(%peer, "relay client connected");
    Ok(spawn_link(stream, LinkSide::Relay))
}

#[derive(Debug, Clone, Copy)]
enum LinkSide {
    Client,
    Relay,
}

fn spawn_link(stream: TcpStream, side: LinkSide) -> TransportLink {
    let (read_half, write_half) = stream.into_split();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (ev_tx, ev_rx) = mpsc::unbounded_channel();
    let _ = ev_tx.send(TransportEvent::Ready);

    let chunk_size = match side {
        LinkSide::Client => TCP_BRIDGE_CHUNK,
        LinkSide::Relay => GATT_WRITE_CHUNK,
    };

    match side {
        LinkSide::Client => {
            tokio::spawn(read_records(read_half, ev_tx.clone()));
            tokio::spawn(write_raw(write_half, out_rx, ev_tx));
        }
        LinkSide::Relay => {
            tokio::spawn(read_raw(read_half, ev_tx.clone()));
            tokio::spawn(write_records(write_half, out_rx, ev_tx));
        }
    }

    TransportLink {
        transport: ChannelTransport::new(out_tx, chunk_size),
        events: ev_rx,
    }
}

async fn read_records(mut socket: OwnedReadHalf, events: mpsc::UnboundedSender<TransportEvent>) {
    let mut record = [0u8; TCP_BRIDGE_RECORD_SIZE];
    loop {
        if let Err(e) = socket.read_exact(&mut record).await {
            if e.kind() != io::ErrorKind::UnexpectedEof {
                warn!(error = %e, "relay read failed");
            }
            break;
        }
        let len = record[0] as usize;
        if len == 0 {
            debug!("relay closed the characteristic");
            break;
        }
        let payload = record[1..1 + len].to_vec();
        if events.send(TransportEvent::DataReceived(payload)).is_err() {
            return;
        }
    }
    let _ = events.send(TransportEvent::Disconnected);
}

async fn read_raw(mut socket: OwnedReadHalf, events: mpsc::UnboundedSender<TransportEvent>) {
    let mut buf = vec![0u8; 1024];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if events.send(TransportEvent::DataReceived(buf[..n].to_vec())).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "client read failed");
                break;
            }
        }
    }
    let _ = events.send(TransportEvent::Disconnected);
}

async fn write_raw(
    mut socket: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(chunk) = outbound.recv().await {
        if let Err(e) = write_chunk(&mut socket, &chunk).await {
            warn!(error = %e, "relay write failed");
            let _ = events.send(TransportEvent::Disconnected);
            return;
        }
        if events.send(TransportEvent::ChunkDelivered).is_err() {
            return;
        }
    }
}

async fn write_records(
    mut socket: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(chunk) = outbound.recv().await {
        let result = match encode_record(&chunk) {
            Some(record) => write_chunk(&mut socket, &record).await,
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "chunk does not fit a relay record",
            )),
        };
        if let Err(e) = result {
            warn!(error = %e, "record write failed");
            let _ = events.send(TransportEvent::Disconnected);
            return;
        }
        if events.send(TransportEvent::ChunkDelivered).is_err() {
            return;
        }
    }
    // tell the client we are done
    let _ = socket.write_all(&[0u8; TCP_BRIDGE_RECORD_SIZE]).await;
}

async fn write_chunk(socket: &mut OwnedWriteHalf, bytes: &[u8]) -> io::Result<()> {
    socket.write_all(bytes).await?;
    socket.flush().await
}

/// Pack one chunk into a relay record.
fn encode_record(chunk: &[u8]) -> Option<[u8; TCP_BRIDGE_RECORD_SIZE]> {
    if chunk.is_empty() || chunk.len() >= TCP_BRIDGE_RECORD_SIZE {
        return None;
    }
    let mut record = [0u8; TCP_BRIDGE_RECORD_SIZE];
    record[0] = chunk.len() as u8;
    record[1..1 + chunk.len()].copy_from_slice(chunk);
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let record = encode_record(&[0xaa, 0xbb]).unwrap();
        assert_eq!(&record[..3], &[0x02, 0xaa, 0xbb]);
        assert!(record[3..].iter().all(|b| *b == 0));
        assert!(encode_record(&[]).is_none());
        assert!(encode_record(&[0u8; 256]).is_none());
    }

    #[tokio::test]
    async fn test_pair_delivers_and_acknowledges() {
        let (mut a, mut b) = TransportLink::pair(8);
        assert_eq!(a.events.recv().await, Some(TransportEvent::Ready));
        assert_eq!(b.events.recv().await, Some(TransportEvent::Ready));

        a.transport.send(vec![1, 2, 3]).unwrap();
        assert_eq!(
            b.events.recv().await,
            Some(TransportEvent::DataReceived(vec![1, 2, 3]))
        );
        assert_eq!(a.events.recv().await, Some(TransportEvent::ChunkDelivered));
    }

    #[tokio::test]
    async fn test_tcp_bridge_both_directions() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (client, relay) = tokio::join!(connect(addr), accept(&listener));
        let (mut client, mut relay) = (client.unwrap(), relay.unwrap());
        assert_eq!(client.events.recv().await, Some(TransportEvent::Ready));
        assert_eq!(relay.events.recv().await, Some(TransportEvent::Ready));
        assert_eq!(client.transport.chunk_size(), TCP_BRIDGE_CHUNK);

        relay.transport.send(vec![0x17, 0x07]).unwrap();
        assert_eq!(relay.events.recv().await, Some(TransportEvent::ChunkDelivered));
        assert_eq!(
            client.events.recv().await,
            Some(TransportEvent::DataReceived(vec![0x17, 0x07]))
        );

        client.transport.send(vec![9; 10]).unwrap();
        assert_eq!(client.events.recv().await, Some(TransportEvent::ChunkDelivered));
        let mut received = Vec::new();
        while received.len() < 10 {
            match relay.events.recv().await {
                Some(TransportEvent::DataReceived(bytes)) => received.extend(bytes),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(received, vec![9; 10]);
    }
}
