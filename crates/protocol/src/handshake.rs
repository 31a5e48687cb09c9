//! # Handshake and reply structures
//!
//! Typed views over the handful of packets the network core itself has to
//! understand: the Init reply that configures the session, the login reply
//! that carries the character list, and the account reply whose
//! variable-length form reseeds the sequence start. Field layouts are a
//! fixed external contract with the reference server.

use eoclient_core::{EoClientError, Result};

use super::packet::{Packet, PacketAction, PacketFamily};

/// Keys into the handshake reply's field set
///
/// External fixed key -> value contract; consumers look values up by key
/// rather than re-parsing the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitializationDataKey {
    SequenceByte1,
    SequenceByte2,
    ReceiveMultiple,
    SendMultiple,
    ClientId,
    HashResponse,
}

/// Parsed Init reply
///
/// # Packet Format
/// ```text
/// {255}{255}{byte seq1}{byte seq2}{byte recv_multiple}{byte send_multiple}
/// {short client_id}{three hash_response}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializationData {
    pub sequence_byte1: u8,
    pub sequence_byte2: u8,
    pub receive_multiple: u8,
    pub send_multiple: u8,
    pub client_id: u32,
    pub hash_response: u32,
}

impl InitializationData {
    pub fn from_packet(packet: &Packet) -> Result<Self> {
        if packet.family() != PacketFamily::Init {
            return Err(EoClientError::InvalidData(format!(
                "expected Init reply, got {:?}/{:?}",
                packet.family(),
                packet.action()
            )));
        }

        Ok(Self {
            sequence_byte1: packet.read_byte()?,
            sequence_byte2: packet.read_byte()?,
            receive_multiple: packet.read_byte()?,
            send_multiple: packet.read_byte()?,
            client_id: packet.read_short()?,
            hash_response: packet.read_three()?,
        })
    }

    /// Keyed access per the external contract
    pub fn get(&self, key: InitializationDataKey) -> u32 {
        match key {
            InitializationDataKey::SequenceByte1 => self.sequence_byte1 as u32,
            InitializationDataKey::SequenceByte2 => self.sequence_byte2 as u32,
            InitializationDataKey::ReceiveMultiple => self.receive_multiple as u32,
            InitializationDataKey::SendMultiple => self.send_multiple as u32,
            InitializationDataKey::ClientId => self.client_id,
            InitializationDataKey::HashResponse => self.hash_response,
        }
    }
}

/// Server verdict on a login request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReply {
    WrongUser,
    WrongPassword,
    Ok,
    LoggedIn,
    Busy,
    Unrecognized(u32),
}

impl LoginReply {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => LoginReply::WrongUser,
            2 => LoginReply::WrongPassword,
            3 => LoginReply::Ok,
            5 => LoginReply::LoggedIn,
            6 => LoginReply::Busy,
            other => LoginReply::Unrecognized(other),
        }
    }
}

/// One entry in the login reply's character list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSummary {
    pub name: String,
    pub id: u32,
    pub level: u8,
    pub gender: u8,
    pub hair_style: u8,
    pub hair_color: u8,
    pub race: u8,
    pub admin_level: u8,
    pub boots: u32,
    pub armor: u32,
    pub hat: u32,
    pub shield: u32,
    pub weapon: u32,
}

impl CharacterSummary {
    fn from_packet(packet: &Packet) -> Result<Self> {
        let summary = Self {
            name: packet.read_break_string()?,
            id: packet.read_int()?,
            level: packet.read_char()?,
            gender: packet.read_char()?,
            hair_style: packet.read_char()?,
            hair_color: packet.read_char()?,
            race: packet.read_char()?,
            admin_level: packet.read_char()?,
            boots: packet.read_short()?,
            armor: packet.read_short()?,
            hat: packet.read_short()?,
            shield: packet.read_short()?,
            weapon: packet.read_short()?,
        };
        // record terminator
        packet.read_byte()?;
        Ok(summary)
    }
}

/// Parsed Login reply
///
/// # Packet Format
/// ```text
/// {short reply}
/// on Ok: {char count}{byte 2}{byte 255}
///        count * [{break name}{int id}{char level}{char gender}
///                 {char hair_style}{char hair_color}{char race}
///                 {char admin}{short boots}{short armor}{short hat}
///                 {short shield}{short weapon}{byte 255}]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLoginData {
    pub reply: LoginReply,
    pub characters: Vec<CharacterSummary>,
}

impl AccountLoginData {
    pub fn from_packet(packet: &Packet) -> Result<Self> {
        if packet.family() != PacketFamily::Login || packet.action() != PacketAction::Reply {
            return Err(EoClientError::InvalidData(format!(
                "expected Login reply, got {:?}/{:?}",
                packet.family(),
                packet.action()
            )));
        }

        let reply = LoginReply::from_u32(packet.read_short()?);
        let mut characters = Vec::new();

        if reply == LoginReply::Ok {
            let count = packet.read_char()?;
            packet.read_byte()?;
            packet.read_byte()?;
            for _ in 0..count {
                characters.push(CharacterSummary::from_packet(packet)?);
            }
        }

        Ok(Self { reply, characters })
    }
}

/// Server verdict on an account request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountReply {
    Exists,
    NotApproved,
    Created,
    ChangeFailed,
    Changed,
    Continue,
    Unrecognized(u32),
}

impl AccountReply {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => AccountReply::Exists,
            2 => AccountReply::NotApproved,
            3 => AccountReply::Created,
            5 => AccountReply::ChangeFailed,
            6 => AccountReply::Changed,
            1000 => AccountReply::Continue,
            other => AccountReply::Unrecognized(other),
        }
    }
}

/// Parsed Account reply from a name-check request
///
/// Some server builds reseed the rolling sequence here: a Continue reply
/// one byte longer than usual carries a replacement sequence start as a
/// char field before the trailing "OK". The caller must apply
/// `new_sequence_start` to the processor before the next encoded send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNameData {
    pub reply: AccountReply,
    pub new_sequence_start: Option<u8>,
}

impl AccountNameData {
    pub fn from_packet(packet: &Packet) -> Result<Self> {
        if packet.family() != PacketFamily::Account || packet.action() != PacketAction::Reply {
            return Err(EoClientError::InvalidData(format!(
                "expected Account reply, got {:?}/{:?}",
                packet.family(),
                packet.action()
            )));
        }

        let mut reply = AccountReply::from_u32(packet.read_short()?);
        let mut new_sequence_start = None;

        if reply == AccountReply::Continue {
            // the longer form carries the replacement sequence start
            if packet.len() == 7 {
                new_sequence_start = Some(packet.read_char()?);
            }
            if packet.read_end_string()? != "OK" {
                reply = AccountReply::NotApproved;
            }
        }

        Ok(Self {
            reply,
            new_sequence_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PacketBuilder;

    #[test]
    fn init_reply_fields_parse_in_wire_order() {
        let packet = PacketBuilder::new(PacketFamily::Init, PacketAction::Init)
            .add_byte(10)
            .add_byte(20)
            .add_byte(4)
            .add_byte(7)
            .add_short(123)
            .add_three(456_789)
            .build();

        let data = InitializationData::from_packet(&packet).unwrap();
        assert_eq!(data.get(InitializationDataKey::SequenceByte1), 10);
        assert_eq!(data.get(InitializationDataKey::SequenceByte2), 20);
        assert_eq!(data.get(InitializationDataKey::ReceiveMultiple), 4);
        assert_eq!(data.get(InitializationDataKey::SendMultiple), 7);
        assert_eq!(data.get(InitializationDataKey::ClientId), 123);
        assert_eq!(data.get(InitializationDataKey::HashResponse), 456_789);
    }

    fn login_ok_packet(names: &[&str]) -> Packet {
        let mut builder = PacketBuilder::new(PacketFamily::Login, PacketAction::Reply)
            .add_short(3)
            .add_char(names.len() as u8)
            .add_byte(2)
            .add_byte(255);
        for (i, name) in names.iter().enumerate() {
            builder = builder
                .add_break_string(name)
                .add_int(100 + i as u32)
                .add_char(10)
                .add_char(0)
                .add_char(1)
                .add_char(2)
                .add_char(0)
                .add_char(0)
                .add_short(1)
                .add_short(2)
                .add_short(3)
                .add_short(4)
                .add_short(5)
                .add_byte(255);
        }
        builder.build()
    }

    #[test]
    fn login_reply_yields_characters_in_wire_order() {
        let packet = login_ok_packet(&["alpha", "beta", "gamma"]);
        let data = AccountLoginData::from_packet(&packet).unwrap();

        assert_eq!(data.reply, LoginReply::Ok);
        assert_eq!(data.characters.len(), 3);
        assert_eq!(data.characters[0].name, "alpha");
        assert_eq!(data.characters[1].name, "beta");
        assert_eq!(data.characters[2].name, "gamma");
        assert_eq!(data.characters[2].id, 102);
        assert_eq!(data.characters[0].weapon, 5);
    }

    #[test]
    fn failed_login_has_no_character_list() {
        let packet = PacketBuilder::new(PacketFamily::Login, PacketAction::Reply)
            .add_short(2)
            .build();
        let data = AccountLoginData::from_packet(&packet).unwrap();
        assert_eq!(data.reply, LoginReply::WrongPassword);
        assert!(data.characters.is_empty());
    }

    #[test]
    fn account_continue_short_form_has_no_reseed() {
        let packet = PacketBuilder::new(PacketFamily::Account, PacketAction::Reply)
            .add_short(1000)
            .add_string("OK")
            .build();
        let data = AccountNameData::from_packet(&packet).unwrap();
        assert_eq!(data.reply, AccountReply::Continue);
        assert_eq!(data.new_sequence_start, None);
    }

    #[test]
    fn account_continue_long_form_carries_a_new_sequence_start() {
        let packet = PacketBuilder::new(PacketFamily::Account, PacketAction::Reply)
            .add_short(1000)
            .add_char(42)
            .add_string("OK")
            .build();
        assert_eq!(packet.len(), 7);

        let data = AccountNameData::from_packet(&packet).unwrap();
        assert_eq!(data.reply, AccountReply::Continue);
        assert_eq!(data.new_sequence_start, Some(42));
    }

    #[test]
    fn account_continue_without_ok_downgrades_to_not_approved() {
        let packet = PacketBuilder::new(PacketFamily::Account, PacketAction::Reply)
            .add_short(1000)
            .add_string("NO")
            .build();
        let data = AccountNameData::from_packet(&packet).unwrap();
        assert_eq!(data.reply, AccountReply::NotApproved);
    }

    #[test]
    fn wrong_family_is_rejected() {
        let packet = PacketBuilder::new(PacketFamily::Welcome, PacketAction::Reply)
            .add_short(3)
            .build();
        assert!(AccountLoginData::from_packet(&packet).is_err());
        assert!(AccountNameData::from_packet(&packet).is_err());
    }
}
