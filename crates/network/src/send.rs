//! # Packet Send Service
//!
//! Request/reply orchestration over the client and the in-band queue,
//! with a tagged error type that keeps the two expected failure shapes
//! (nothing sent, nothing received) distinct from real protocol errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use eoclient_core::EoClientError;
use eoclient_protocol::Packet;

use super::client::NetworkClient;
use super::queue::{InBandPacketQueue, QueuedPacket};

/// Why a send-and-wait call produced no reply
#[derive(thiserror::Error, Debug)]
pub enum SendWaitError {
    /// The socket accepted none of the outgoing bytes
    #[error("no data sent to the server")]
    NoDataSent,

    /// The wait ended without a reply packet
    #[error("no reply received from the server")]
    EmptyReply,

    /// Encoding or session-state failure, nothing reached the wire
    #[error(transparent)]
    Client(#[from] EoClientError),
}

/// Sends packets and correlates replies through the in-band queue
#[derive(Debug, Clone)]
pub struct PacketSendService {
    client: Arc<NetworkClient>,
    queue: Arc<InBandPacketQueue>,
}

impl PacketSendService {
    pub fn new(client: Arc<NetworkClient>, queue: Arc<InBandPacketQueue>) -> Self {
        Self { client, queue }
    }

    /// Fire-and-forget encoded send
    pub async fn send_packet(&self, packet: &Packet) -> Result<usize, SendWaitError> {
        let sent = self.client.send(packet).await?;
        if sent == 0 {
            return Err(SendWaitError::NoDataSent);
        }
        Ok(sent)
    }

    /// Encoded send, then wait for the next in-band reply
    ///
    /// Fails fast with `NoDataSent` before ever touching the queue, so a
    /// dead connection never costs the caller the full reply timeout.
    pub async fn send_encoded_packet_and_wait(
        &self,
        packet: &Packet,
        wait: Option<Duration>,
    ) -> Result<Packet, SendWaitError> {
        let sent = self.client.send(packet).await?;
        self.wait_after_send(packet, sent, wait).await
    }

    /// Raw (handshake-phase) send, then wait for the next in-band reply
    pub async fn send_raw_packet_and_wait(
        &self,
        packet: &Packet,
        wait: Option<Duration>,
    ) -> Result<Packet, SendWaitError> {
        let sent = self.client.send_raw(packet).await?;
        self.wait_after_send(packet, sent, wait).await
    }

    async fn wait_after_send(
        &self,
        packet: &Packet,
        sent: usize,
        wait: Option<Duration>,
    ) -> Result<Packet, SendWaitError> {
        if sent == 0 {
            debug!(
                "no data sent for {:?}/{:?}, skipping reply wait",
                packet.family(),
                packet.action()
            );
            return Err(SendWaitError::NoDataSent);
        }

        match self.queue.wait_for_packet_and_dequeue(wait).await {
            QueuedPacket::Packet(reply) => Ok(reply),
            QueuedPacket::Empty => Err(SendWaitError::EmptyReply),
        }
    }
}

/// Run a request/reply operation with recovery hooks for the two
/// connection-shaped failures
///
/// - `Ok(Some(value))` when the operation succeeds
/// - `Ok(None)` after `NoDataSent`/`EmptyReply`, with the matching hook
///   invoked first (reconnect prompts, UI notices)
/// - `Err` for protocol or session-state failures, which no hook can
///   paper over
pub async fn safe_in_band_operation<T, Op, Fut, OnSent, OnReply>(
    operation: Op,
    on_no_data_sent: OnSent,
    on_empty_reply: OnReply,
) -> Result<Option<T>, EoClientError>
where
    Op: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, SendWaitError>>,
    OnSent: FnOnce(&SendWaitError),
    OnReply: FnOnce(&SendWaitError),
{
    match operation().await {
        Ok(value) => Ok(Some(value)),
        Err(e @ SendWaitError::NoDataSent) => {
            on_no_data_sent(&e);
            Ok(None)
        }
        Err(e @ SendWaitError::EmptyReply) => {
            on_empty_reply(&e);
            Ok(None)
        }
        Err(SendWaitError::Client(e)) => Err(e),
    }
}
