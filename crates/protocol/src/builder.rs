//! # Packet Builder
//!
//! Fluent construction of outgoing packets with exact byte compatibility
//! with the reference server.
//!
//! ## Usage
//!
//! ```rust
//! use eoclient_protocol::{PacketBuilder, PacketFamily, PacketAction};
//!
//! let packet = PacketBuilder::new(PacketFamily::Login, PacketAction::Request)
//!     .add_break_string("username")
//!     .add_break_string("password")
//!     .build();
//! ```

use bytes::{BufMut, BytesMut};

use super::codecs::{write_char, write_int, write_short, write_three, BREAK_BYTE};
use super::packet::{Packet, PacketAction, PacketFamily};

/// Accumulates typed fields into a byte buffer, then freezes into a [`Packet`]
#[derive(Debug)]
pub struct PacketBuilder {
    family: PacketFamily,
    action: PacketAction,
    data: BytesMut,
}

impl PacketBuilder {
    pub fn new(family: PacketFamily, action: PacketAction) -> Self {
        Self {
            family,
            action,
            data: BytesMut::with_capacity(32),
        }
    }

    /// Append a raw byte, no encoding
    pub fn add_byte(mut self, value: u8) -> Self {
        self.data.put_u8(value);
        self
    }

    /// Append a char field (1 byte, offset convention)
    pub fn add_char(mut self, value: u8) -> Self {
        write_char(&mut self.data, value);
        self
    }

    /// Append a short field (2-byte encoded number, max 64008)
    pub fn add_short(mut self, value: u32) -> Self {
        write_short(&mut self.data, value);
        self
    }

    /// Append a three field (3-byte encoded number, max 16194276)
    pub fn add_three(mut self, value: u32) -> Self {
        write_three(&mut self.data, value);
        self
    }

    /// Append an int field (4-byte encoded number)
    pub fn add_int(mut self, value: u32) -> Self {
        write_int(&mut self.data, value);
        self
    }

    /// Append a string followed by the 0xFF field-break sentinel
    ///
    /// The string itself must not contain the sentinel byte.
    pub fn add_break_string(mut self, value: &str) -> Self {
        debug_assert!(
            !value.as_bytes().contains(&BREAK_BYTE),
            "break string contains the break sentinel"
        );
        self.data.put_slice(value.as_bytes());
        self.data.put_u8(BREAK_BYTE);
        self
    }

    /// Append a string with no terminator
    pub fn add_string(mut self, value: &str) -> Self {
        self.data.put_slice(value.as_bytes());
        self
    }

    /// Freeze into an immutable [`Packet`]
    pub fn build(self) -> Packet {
        Packet::from_parts(self.family, self.action, self.data.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_packet_carries_header_and_encoded_fields() {
        let packet = PacketBuilder::new(PacketFamily::Account, PacketAction::Create)
            .add_short(1337)
            .add_byte(42)
            .build();

        // short 1337 = 5*253 + 72 -> [73, 6]
        assert_eq!(packet.raw_data(), vec![2, 6, 73, 6, 42]);
    }

    #[test]
    fn break_string_emits_the_sentinel_byte() {
        let packet = PacketBuilder::new(PacketFamily::Login, PacketAction::Request)
            .add_break_string("abc")
            .build();

        assert_eq!(packet.raw_data(), vec![4, 1, b'a', b'b', b'c', 0xFF]);
    }

    #[test]
    fn plain_string_has_no_terminator() {
        let packet = PacketBuilder::new(PacketFamily::Account, PacketAction::Request)
            .add_string("ab")
            .build();

        assert_eq!(packet.raw_data(), vec![2, 1, b'a', b'b']);
    }
}
