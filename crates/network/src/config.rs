//! # Client Configuration
//!
//! Configuration options for the EO client networking layer.
//!
//! # Example
//!
//! ```rust
//! use eoclient_network::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig {
//!     connect_timeout: Duration::from_secs(5),
//!     send_timeout: Duration::from_millis(1500),
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

/// Client configuration options
///
/// # Default Values
///
/// The defaults match the reference client's constants:
/// - 5-second connect timeout
/// - 1.5-second send timeout
/// - 5-second per-iteration receive timeout
///
/// Every blocking socket operation in this crate is bounded by one of
/// these values; none of them blocks indefinitely.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long a connect attempt may take before it reports `Timeout`
    ///
    /// # Default
    /// 5 seconds
    pub connect_timeout: Duration,

    /// How long a single send may take before it reports zero bytes sent
    ///
    /// # Default
    /// 1.5 seconds
    ///
    /// # Notes
    /// - A timed-out send is indistinguishable from a rejected one on
    ///   purpose: both surface as "no data sent" at the send boundary
    pub send_timeout: Duration,

    /// Per-iteration bound on the receive loop's length/body reads
    ///
    /// # Default
    /// 5 seconds
    ///
    /// # Notes
    /// - A read that yields fewer bytes than requested within this window
    ///   abandons the iteration; the loop itself keeps running
    pub receive_timeout: Duration,

    /// Bound on the non-blocking liveness probe
    ///
    /// # Default
    /// 500 milliseconds
    ///
    /// # Notes
    /// - The probe peeks the socket; an idle-but-open connection is
    ///   reported alive when the window elapses without data
    pub liveness_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            send_timeout: Duration::from_millis(1500),
            receive_timeout: Duration::from_secs(5),
            liveness_timeout: Duration::from_millis(500),
        }
    }
}
