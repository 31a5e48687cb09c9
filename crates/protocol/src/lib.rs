//! # EOClient Protocol Library
//!
//! Byte-exact implementation of the Endless Online client wire protocol.
//!
//! ## Architecture
//!
//! The protocol is organized into several layers:
//!
//! ### 1. Codecs Layer ([`codecs`])
//! The base-253 variable-width number encoding shared by every field type:
//! - char: 1 byte, offset convention
//! - short: 2 bytes (max 64,008)
//! - three: 3 bytes (max 16,194,276)
//! - int: 4 bytes (max 4,097,152,080)
//! - break string: raw bytes terminated by the 0xFF sentinel
//!
//! ### 2. Packets ([`packet`], [`builder`])
//! Immutable [`Packet`] values tagged with a family/action pair, built
//! fluently and read back field by field through a cursor.
//!
//! ### 3. Obfuscation Pipeline ([`processor`], [`sequence`])
//! The session-scoped encode/decode transform: sequence stamping plus the
//! interleave / flip-MSB / swap-multiples shuffle, parameterized by the
//! handshake's encode multiples, and the 2-byte length framing.
//!
//! ### 4. Handshake Structures ([`handshake`])
//! Typed views over the Init, Login and Account replies the network core
//! has to understand itself.
//!
//! ## Protocol Compatibility
//!
//! All encodings are a compatibility contract with the reference server:
//! the number codec, the char-field offset quirk, the sequence arithmetic
//! and the byte shuffle are reproduced from the legacy implementation and
//! pinned by worked byte vectors in the test suites.

pub mod builder;
pub mod codecs;
pub mod handshake;
pub mod packet;
pub mod processor;
pub mod sequence;

// Re-export commonly used items
pub use builder::PacketBuilder;
pub use codecs::{decode_number, encode_number, BREAK_BYTE, CHAR_MAX, SHORT_MAX, THREE_MAX};
pub use handshake::{
    AccountLoginData, AccountNameData, AccountReply, CharacterSummary, InitializationData,
    InitializationDataKey, LoginReply,
};
pub use packet::{Packet, PacketAction, PacketFamily};
pub use processor::{PacketProcessor, ProcessorState};
pub use sequence::SequenceState;
