//! # Async Socket Transport
//!
//! Raw TCP connect/send/receive with cancellation and timeout support.
//!
//! Every operation is bounded: a cancelled or timed-out call returns a
//! "nothing happened" result (zero bytes sent, a short or empty read)
//! rather than an error. Converting those outcomes into typed failures is
//! the job of the send-service boundary, not this layer.
//!
//! The stream is split so the background receive loop and concurrent
//! senders never contend for the same half.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex as TokioMutex;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Enumerated outcome of a connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectResult {
    /// Connection established
    Success,
    /// The configured deadline elapsed before the connection completed
    Timeout,
    /// The endpoint could not be resolved or refused the connection
    InvalidEndpoint,
    /// A connection is already open on this socket
    AlreadyConnected,
}

/// One TCP connection's send/receive endpoints
///
/// All methods take `&self`; the two halves are independently locked so a
/// blocked read never stalls a send. `disconnect` is idempotent and safe
/// to call when not connected.
#[derive(Debug, Default)]
pub struct AsyncSocket {
    read_half: TokioMutex<Option<OwnedReadHalf>>,
    write_half: TokioMutex<Option<OwnedWriteHalf>>,
}

impl AsyncSocket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to `addr` within `deadline`
    pub async fn connect(&self, addr: SocketAddr, deadline: Duration) -> ConnectResult {
        let mut write_guard = self.write_half.lock().await;
        if write_guard.is_some() {
            return ConnectResult::AlreadyConnected;
        }

        match timeout(deadline, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                // low latency matters more than throughput for game traffic
                let _ = stream.set_nodelay(true);
                let (read, write) = stream.into_split();
                *self.read_half.lock().await = Some(read);
                *write_guard = Some(write);
                debug!("connected to {}", addr);
                ConnectResult::Success
            }
            Ok(Err(e)) => {
                debug!("connect to {} failed: {}", addr, e);
                ConnectResult::InvalidEndpoint
            }
            Err(_) => ConnectResult::Timeout,
        }
    }

    /// Send `bytes`, returning how many went out
    ///
    /// Zero signals the peer rejected/closed the connection or the
    /// deadline elapsed; the caller decides what that means.
    pub async fn send(&self, bytes: &[u8], deadline: Duration) -> usize {
        let mut guard = self.write_half.lock().await;
        let Some(write_half) = guard.as_mut() else {
            return 0;
        };

        match timeout(deadline, write_half.write_all(bytes)).await {
            Ok(Ok(())) => bytes.len(),
            Ok(Err(e)) => {
                debug!("send failed: {}", e);
                0
            }
            Err(_) => 0,
        }
    }

    /// Receive exactly `count` bytes, or fewer on disconnect/cancel/timeout
    ///
    /// A short result means "this attempt yielded nothing usable", never a
    /// partial packet to be completed later.
    pub async fn receive(
        &self,
        count: usize,
        token: &CancellationToken,
        deadline: Duration,
    ) -> Vec<u8> {
        let mut guard = self.read_half.lock().await;
        let Some(read_half) = guard.as_mut() else {
            return Vec::new();
        };

        let mut buf = vec![0u8; count];
        let mut filled = 0usize;
        let stop_at = Instant::now() + deadline;

        while filled < count {
            let remaining = stop_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            tokio::select! {
                _ = token.cancelled() => break,
                result = timeout(remaining, read_half.read(&mut buf[filled..])) => {
                    match result {
                        Ok(Ok(0)) => break, // peer closed
                        Ok(Ok(n)) => filled += n,
                        Ok(Err(_)) | Err(_) => break,
                    }
                }
            }
        }

        buf.truncate(filled);
        buf
    }

    /// Non-blocking liveness probe bounded by `deadline`
    ///
    /// Peeks the socket: pending data or a quiet-but-open connection is
    /// alive; end-of-stream or a socket error is not.
    pub async fn check_is_connected(&self, deadline: Duration) -> bool {
        let mut guard = self.read_half.lock().await;
        let Some(read_half) = guard.as_mut() else {
            return false;
        };

        let mut probe = [0u8; 1];
        match timeout(deadline, read_half.peek(&mut probe)).await {
            Ok(Ok(0)) => false,
            Ok(Ok(_)) => true,
            Ok(Err(_)) => false,
            // nothing arrived inside the probe window, connection is open
            Err(_) => true,
        }
    }

    /// Close the connection; safe to call repeatedly or when not connected
    pub async fn disconnect(&self) {
        if let Some(mut write_half) = self.write_half.lock().await.take() {
            let _ = write_half.shutdown().await;
        }
        self.read_half.lock().await.take();
    }
}
