//! # EOClient Network Library
//!
//! Async networking core for an Endless Online client: connection
//! management, the background receive loop, and request/reply packet
//! orchestration on top of [`eoclient_protocol`].
//!
//! ## Architecture
//!
//! ### 1. Transport ([`transport`])
//! The raw TCP socket with split read/write halves. Every operation is
//! bounded by a timeout or a cancellation token and reports failure as
//! "nothing happened" rather than an error.
//!
//! ### 2. Client ([`client`], [`config`])
//! [`NetworkClient`] owns the socket and the session's packet processor,
//! and drives the frame-reassembling receive loop. Decoded packets go to
//! a [`PacketSink`]; the loop itself never interprets them.
//!
//! ### 3. Request/Reply ([`queue`], [`send`])
//! [`InBandPacketQueue`] is the single-slot hand-off between the receive
//! loop and a waiting caller. [`PacketSendService`] combines the send
//! path with the queue and tags the two connection-shaped failures
//! (`NoDataSent`, `EmptyReply`) so [`safe_in_band_operation`] can route
//! them to recovery hooks instead of bubbling them as hard errors.

pub mod client;
pub mod config;
pub mod queue;
pub mod send;
pub mod transport;

// Re-export commonly used items
pub use client::{NetworkClient, PacketSink};
pub use config::ClientConfig;
pub use queue::{InBandPacketQueue, QueuedPacket};
pub use send::{safe_in_band_operation, PacketSendService, SendWaitError};
pub use transport::{AsyncSocket, ConnectResult};
