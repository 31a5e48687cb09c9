//! # EO Packet Definitions
//!
//! A packet is identified by a two-byte tag: the family (message category)
//! followed by the action (message verb). The body is a sequence of typed
//! fields encoded with the codecs in [`super::codecs`].
//!
//! Packets are immutable once built. Reading is sequential: every `read_*`
//! consumes the matching field width and advances an internal cursor, and
//! reading past the end is an `InvalidData` error. Protocol handlers must
//! treat that error as "drop the packet and continue", never as fatal to
//! the connection.

use bytes::Bytes;
use eoclient_core::{EoClientError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::codecs::{decode_char, decode_number, BREAK_BYTE};

/// Message category byte
///
/// Values correspond to the reference server's family IDs. Unknown values
/// are preserved as [`PacketFamily::Unrecognized`]; a client must never
/// fail on a family it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketFamily {
    /// Connection management (ping/pong, player ID assignment)
    Connection,
    /// Account creation and name checks
    Account,
    /// Character creation and deletion
    Character,
    /// Account login
    Login,
    /// Character selection and world entry
    Welcome,
    /// Connection initialization handshake
    Init,
    /// Any family byte this client does not recognize
    Unrecognized(u8),
}

impl PacketFamily {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PacketFamily::Connection,
            2 => PacketFamily::Account,
            3 => PacketFamily::Character,
            4 => PacketFamily::Login,
            5 => PacketFamily::Welcome,
            255 => PacketFamily::Init,
            other => PacketFamily::Unrecognized(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PacketFamily::Connection => 1,
            PacketFamily::Account => 2,
            PacketFamily::Character => 3,
            PacketFamily::Login => 4,
            PacketFamily::Welcome => 5,
            PacketFamily::Init => 255,
            PacketFamily::Unrecognized(other) => other,
        }
    }
}

/// Message verb byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketAction {
    Request,
    Accept,
    Reply,
    Remove,
    Agree,
    Create,
    Add,
    Player,
    Take,
    Use,
    Message,
    Ping,
    Pong,
    Init,
    Unrecognized(u8),
}

impl PacketAction {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PacketAction::Request,
            2 => PacketAction::Accept,
            3 => PacketAction::Reply,
            4 => PacketAction::Remove,
            5 => PacketAction::Agree,
            6 => PacketAction::Create,
            7 => PacketAction::Add,
            8 => PacketAction::Player,
            9 => PacketAction::Take,
            10 => PacketAction::Use,
            17 => PacketAction::Message,
            240 => PacketAction::Ping,
            241 => PacketAction::Pong,
            255 => PacketAction::Init,
            other => PacketAction::Unrecognized(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            PacketAction::Request => 1,
            PacketAction::Accept => 2,
            PacketAction::Reply => 3,
            PacketAction::Remove => 4,
            PacketAction::Agree => 5,
            PacketAction::Create => 6,
            PacketAction::Add => 7,
            PacketAction::Player => 8,
            PacketAction::Take => 9,
            PacketAction::Use => 10,
            PacketAction::Message => 17,
            PacketAction::Ping => 240,
            PacketAction::Pong => 241,
            PacketAction::Init => 255,
            PacketAction::Unrecognized(other) => other,
        }
    }
}

/// An immutable protocol message with a sequential read cursor
///
/// The cursor starts at the first body byte (after family/action) and is
/// interior-mutable so reads work through shared references, matching how
/// a packet is handed to exactly one consumer and discarded.
#[derive(Debug)]
pub struct Packet {
    family: PacketFamily,
    action: PacketAction,
    data: Bytes,
    cursor: AtomicUsize,
}

impl Packet {
    /// Reassemble a packet from a decoded body (`[family][action][data]`)
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        if body.len() < 2 {
            return Err(EoClientError::InvalidData(format!(
                "packet body too short: {} bytes",
                body.len()
            )));
        }

        Ok(Self {
            family: PacketFamily::from_u8(body[0]),
            action: PacketAction::from_u8(body[1]),
            data: Bytes::copy_from_slice(&body[2..]),
            cursor: AtomicUsize::new(0),
        })
    }

    pub(crate) fn from_parts(family: PacketFamily, action: PacketAction, data: Bytes) -> Self {
        Self {
            family,
            action,
            data,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn family(&self) -> PacketFamily {
        self.family
    }

    pub fn action(&self) -> PacketAction {
        self.action
    }

    /// Total length including the family/action header bytes
    ///
    /// Never less than 2; variable-length reply forms are distinguished
    /// by this total, header included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len() + 2
    }

    /// Whether the packet carries no bytes beyond the header
    pub fn has_empty_body(&self) -> bool {
        self.data.is_empty()
    }

    /// The exact `[family][action][body]` byte sequence, for diagnostics
    /// and for the encode pipeline. Not for field access.
    pub fn raw_data(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.len());
        raw.push(self.family.as_u8());
        raw.push(self.action.as_u8());
        raw.extend_from_slice(&self.data);
        raw
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor.load(Ordering::Relaxed)
    }

    fn take(&self, count: usize) -> Result<&[u8]> {
        let start = self.cursor.load(Ordering::Relaxed);
        if start + count > self.data.len() {
            return Err(EoClientError::InvalidData(format!(
                "read of {} bytes past end of packet ({} remaining)",
                count,
                self.data.len() - start
            )));
        }
        self.cursor.store(start + count, Ordering::Relaxed);
        Ok(&self.data[start..start + count])
    }

    /// Read a raw byte
    pub fn read_byte(&self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a char field (1 byte, offset convention)
    pub fn read_char(&self) -> Result<u8> {
        Ok(decode_char(self.take(1)?[0]))
    }

    /// Read a short field (2-byte encoded number)
    pub fn read_short(&self) -> Result<u32> {
        Ok(decode_number(self.take(2)?))
    }

    /// Read a three field (3-byte encoded number)
    pub fn read_three(&self) -> Result<u32> {
        Ok(decode_number(self.take(3)?))
    }

    /// Read an int field (4-byte encoded number)
    pub fn read_int(&self) -> Result<u32> {
        Ok(decode_number(self.take(4)?))
    }

    /// Read a string terminated by the 0xFF break sentinel
    ///
    /// Consumes the sentinel; a missing sentinel is a malformed packet.
    pub fn read_break_string(&self) -> Result<String> {
        let start = self.cursor.load(Ordering::Relaxed);
        let rest = &self.data[start..];
        let break_pos = rest.iter().position(|&b| b == BREAK_BYTE).ok_or_else(|| {
            EoClientError::InvalidData("break string missing 0xFF terminator".into())
        })?;

        self.cursor.store(start + break_pos + 1, Ordering::Relaxed);
        Ok(String::from_utf8_lossy(&rest[..break_pos]).into_owned())
    }

    /// Read all remaining bytes as an unterminated string
    pub fn read_end_string(&self) -> Result<String> {
        let start = self.cursor.load(Ordering::Relaxed);
        self.cursor.store(self.data.len(), Ordering::Relaxed);
        Ok(String::from_utf8_lossy(&self.data[start..]).into_owned())
    }
}
