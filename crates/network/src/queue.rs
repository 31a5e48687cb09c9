//! # In-Band Packet Queue
//!
//! Hand-off point between the background receive loop and a caller
//! waiting synchronously for a reply.
//!
//! The queue holds at most one packet. In-band flows are strictly
//! request/reply, so a second packet arriving before the first was
//! consumed means the caller already stopped caring about it; the
//! newest one is dropped and logged rather than buffered.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex as TokioMutex;
use tracing::warn;

use eoclient_protocol::Packet;

use super::client::PacketSink;

/// A dequeued item
///
/// `Empty` means no packet arrived: the wait timed out, the connection
/// ended, or the queue was shut down.
#[derive(Debug)]
pub enum QueuedPacket {
    Packet(Packet),
    Empty,
}

impl QueuedPacket {
    pub fn is_empty(&self) -> bool {
        matches!(self, QueuedPacket::Empty)
    }
}

/// Single-slot queue for request/reply packet flows
#[derive(Debug)]
pub struct InBandPacketQueue {
    tx: mpsc::Sender<QueuedPacket>,
    rx: TokioMutex<mpsc::Receiver<QueuedPacket>>,
}

impl InBandPacketQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: TokioMutex::new(rx),
        }
    }

    /// Offer a packet; dropped with a warning if the slot is occupied
    pub fn enqueue(&self, packet: Packet) {
        if let Err(mpsc::error::TrySendError::Full(dropped)) =
            self.tx.try_send(QueuedPacket::Packet(packet))
        {
            if let QueuedPacket::Packet(p) = dropped {
                warn!(
                    "dropping unconsumed in-band packet {:?}/{:?}",
                    p.family(),
                    p.action()
                );
            }
        }
    }

    /// Wait for the next packet, bounded by `wait` when given
    ///
    /// `None` waits until a packet arrives or the queue shuts down.
    pub async fn wait_for_packet_and_dequeue(&self, wait: Option<Duration>) -> QueuedPacket {
        let mut rx = self.rx.lock().await;
        let received = match wait {
            Some(deadline) => match tokio::time::timeout(deadline, rx.recv()).await {
                Ok(item) => item,
                Err(_) => return QueuedPacket::Empty,
            },
            None => rx.recv().await,
        };
        received.unwrap_or(QueuedPacket::Empty)
    }
}

impl Default for InBandPacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSink for InBandPacketQueue {
    fn enqueue_packet_for_handling(&self, packet: Packet) {
        self.enqueue(packet);
    }

    fn connection_ended(&self) {
        // wake any blocked waiter with an Empty marker
        let _ = self.tx.try_send(QueuedPacket::Empty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoclient_protocol::{PacketAction, PacketBuilder, PacketFamily};

    fn ping() -> Packet {
        PacketBuilder::new(PacketFamily::Connection, PacketAction::Ping).build()
    }

    fn pong() -> Packet {
        PacketBuilder::new(PacketFamily::Connection, PacketAction::Pong).build()
    }

    #[tokio::test]
    async fn dequeue_returns_the_enqueued_packet() {
        let queue = InBandPacketQueue::new();
        queue.enqueue(ping());

        match queue.wait_for_packet_and_dequeue(None).await {
            QueuedPacket::Packet(p) => {
                assert_eq!(p.family(), PacketFamily::Connection);
                assert_eq!(p.action(), PacketAction::Ping);
            }
            QueuedPacket::Empty => panic!("expected a packet"),
        }
    }

    #[tokio::test]
    async fn second_enqueue_is_dropped_while_the_slot_is_full() {
        let queue = InBandPacketQueue::new();
        queue.enqueue(ping());
        queue.enqueue(pong());

        match queue.wait_for_packet_and_dequeue(None).await {
            QueuedPacket::Packet(p) => assert_eq!(p.action(), PacketAction::Ping),
            QueuedPacket::Empty => panic!("expected the first packet"),
        }

        let next = queue
            .wait_for_packet_and_dequeue(Some(Duration::from_millis(50)))
            .await;
        assert!(next.is_empty());
    }

    #[tokio::test]
    async fn bounded_wait_on_an_idle_queue_comes_back_empty() {
        let queue = InBandPacketQueue::new();
        let item = queue
            .wait_for_packet_and_dequeue(Some(Duration::from_millis(20)))
            .await;
        assert!(item.is_empty());
    }

    #[tokio::test]
    async fn connection_end_wakes_a_waiter_with_empty() {
        let queue = InBandPacketQueue::new();
        queue.connection_ended();
        let item = queue.wait_for_packet_and_dequeue(None).await;
        assert!(item.is_empty());
    }
}
