//! # Network Client
//!
//! The connection-scoped core: owns the socket, the obfuscation
//! processor for this session, and the background receive loop that
//! reassembles length-prefixed frames and hands decoded packets to the
//! registered sink.
//!
//! The receive loop is frame-driven: each iteration reads the 2-byte
//! encoded length, then exactly that many body bytes. A short or
//! malformed read abandons the frame and re-synchronizes on the next
//! length prefix instead of tearing the connection down.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use eoclient_core::Result;
use eoclient_protocol::{decode_number, InitializationData, Packet, PacketProcessor};

use super::config::ClientConfig;
use super::transport::{AsyncSocket, ConnectResult};

/// Where decoded inbound packets go
///
/// The receive loop never interprets packets beyond decoding them; the
/// sink decides whether a packet feeds a waiting request/reply call or
/// an out-of-band handler.
pub trait PacketSink: Send + Sync {
    fn enqueue_packet_for_handling(&self, packet: Packet);

    /// Called once when the receive loop exits, for any reason
    fn connection_ended(&self);
}

/// One client connection to a game server
pub struct NetworkClient {
    socket: AsyncSocket,
    processor: Mutex<PacketProcessor>,
    config: ClientConfig,
    cancel: Mutex<CancellationToken>,
    needs_reconnect: AtomicBool,
    sink: Arc<dyn PacketSink>,
}

impl NetworkClient {
    pub fn new(config: ClientConfig, sink: Arc<dyn PacketSink>) -> Self {
        Self {
            socket: AsyncSocket::new(),
            processor: Mutex::new(PacketProcessor::new()),
            config,
            cancel: Mutex::new(CancellationToken::new()),
            needs_reconnect: AtomicBool::new(false),
            sink,
        }
    }

    /// Connect to `host:port`, resolving a hostname when needed
    ///
    /// Each successful connect starts a fresh session: a new processor
    /// with no sequence or multiples, and a new cancellation token for
    /// the receive loop.
    pub async fn connect_to_server(&self, host: &str, port: u16) -> ConnectResult {
        let addr = match self.resolve(host, port).await {
            Some(addr) => addr,
            None => {
                warn!("could not resolve {}:{}", host, port);
                self.needs_reconnect.store(true, Ordering::SeqCst);
                return ConnectResult::InvalidEndpoint;
            }
        };

        let result = self.socket.connect(addr, self.config.connect_timeout).await;
        match result {
            ConnectResult::Success => {
                info!("connected to {}:{}", host, port);
                *self.processor.lock() = PacketProcessor::new();
                *self.cancel.lock() = CancellationToken::new();
                self.needs_reconnect.store(false, Ordering::SeqCst);
            }
            ConnectResult::AlreadyConnected => {}
            _ => {
                self.needs_reconnect.store(true, Ordering::SeqCst);
            }
        }
        result
    }

    async fn resolve(&self, host: &str, port: u16) -> Option<SocketAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Some(SocketAddr::new(ip, port));
        }

        let addrs = tokio::net::lookup_host((host, port)).await.ok()?;
        first_ipv4(addrs)
    }

    /// Drive the receive loop until cancellation or disconnect
    ///
    /// Run this on its own task after connecting. It exits when the
    /// token is cancelled or the liveness probe reports the peer gone,
    /// and notifies the sink exactly once on the way out.
    pub async fn run_receive_loop(&self) {
        let token = self.cancel.lock().clone();

        while !token.is_cancelled() {
            if !self
                .socket
                .check_is_connected(self.config.liveness_timeout)
                .await
            {
                debug!("connection lost, stopping receive loop");
                self.needs_reconnect.store(true, Ordering::SeqCst);
                break;
            }

            let length_bytes = self
                .socket
                .receive(2, &token, self.config.receive_timeout)
                .await;
            if length_bytes.len() < 2 {
                continue;
            }

            let length = decode_number(&length_bytes) as usize;
            if length == 0 {
                continue;
            }

            let body = self
                .socket
                .receive(length, &token, self.config.receive_timeout)
                .await;
            if body.len() < length {
                debug!(
                    "abandoning truncated frame: expected {} bytes, got {}",
                    length,
                    body.len()
                );
                continue;
            }

            let packet = match self.processor.lock().decode_data(&body) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("dropping undecodable frame: {}", e);
                    continue;
                }
            };

            debug!(
                "recv {:?}/{:?} ({} bytes): {:02X?}",
                packet.family(),
                packet.action(),
                packet.len(),
                body
            );
            self.sink.enqueue_packet_for_handling(packet);
        }

        self.sink.connection_ended();
    }

    /// Stop the receive loop; the in-flight read is abandoned
    pub fn cancel_background_receive_loop(&self) {
        self.cancel.lock().cancel();
    }

    /// Encode and send a packet, returning the bytes written
    ///
    /// Zero bytes means the socket refused the data; an `Err` means the
    /// processor refused to encode (not yet handshaken, for instance)
    /// and nothing was sent.
    pub async fn send(&self, packet: &Packet) -> Result<usize> {
        let bytes = self.processor.lock().encode_packet(packet)?;
        debug!(
            "send {:?}/{:?}: {:02X?}",
            packet.family(),
            packet.action(),
            bytes
        );
        Ok(self.socket.send(&bytes, self.config.send_timeout).await)
    }

    /// Send a packet framed but without sequence or obfuscation
    pub async fn send_raw(&self, packet: &Packet) -> Result<usize> {
        let bytes = self.processor.lock().encode_raw_packet(packet);
        debug!(
            "send raw {:?}/{:?}: {:02X?}",
            packet.family(),
            packet.action(),
            bytes
        );
        Ok(self.socket.send(&bytes, self.config.send_timeout).await)
    }

    /// Apply the server's Init reply to this session's processor
    pub fn complete_handshake(&self, data: &InitializationData) -> Result<()> {
        let mut processor = self.processor.lock();
        processor.set_initial_sequence_number(data.sequence_byte1, data.sequence_byte2);
        processor.set_encode_multiples(data.receive_multiple, data.send_multiple)
    }

    /// Replace the rolling sequence start mid-session
    pub fn set_sequence_start(&self, start: u32) {
        self.processor.lock().set_sequence_start(start);
    }

    pub async fn is_connected(&self) -> bool {
        self.socket
            .check_is_connected(self.config.liveness_timeout)
            .await
    }

    /// Latched when a connect fails or the peer drops the connection
    pub fn needs_reconnect(&self) -> bool {
        self.needs_reconnect.load(Ordering::SeqCst)
    }

    pub async fn disconnect(&self) {
        self.cancel.lock().cancel();
        self.socket.disconnect().await;
    }
}

/// Pick the first IPv4 result; a host that resolves to none is an
/// invalid endpoint, never an IPv6 connect attempt
fn first_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    addrs.into_iter().find(|addr| addr.is_ipv4())
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient")
            .field("needs_reconnect", &self.needs_reconnect.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
