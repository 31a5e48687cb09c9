//! # Sequence Number State
//!
//! The server seeds a rolling sequence at handshake time; every encoded
//! send stamps the current sequence value into the packet and advances a
//! counter. The server verifies the stamp against its own copy of the
//! state, so the client-side mutations must happen exactly once per
//! physical send, in send order.
//!
//! Session-scoped, no persistence. The start value can be overwritten
//! mid-session by an explicit server instruction carried in a
//! variable-length account reply.

/// Rolling obfuscation sequence for one connection
///
/// Two evolving integers: a `start` value reseeded occasionally by the
/// server, and a running counter advanced per use with a fixed modulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceState {
    start: u32,
    counter: u32,
}

/// Counter wraps after this many sends
const COUNTER_MODULUS: u32 = 10;

impl SequenceState {
    /// Seed from the two sequence bytes of the handshake reply
    ///
    /// The combining rule is a compatibility contract with the reference
    /// server: `start = s1 * 7 - 11 + s2 - 2`.
    pub fn from_init_bytes(s1: u8, s2: u8) -> Self {
        let start = (s1 as i64 * 7 - 11 + s2 as i64 - 2).max(0) as u32;
        Self { start, counter: 0 }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    /// Overwrite the start value from a server instruction
    ///
    /// Observed during the account-name-check flow: a 7-byte Continue
    /// reply carries a replacement start as a char field.
    pub fn set_start(&mut self, start: u32) {
        self.start = start;
    }

    /// Current sequence value, advancing the counter for the next use
    pub fn next_sequence(&mut self) -> u32 {
        let sequence = self.start + self.counter;
        self.counter = (self.counter + 1) % COUNTER_MODULUS;
        sequence
    }
}
