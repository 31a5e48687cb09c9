//! # Packet Processor
//!
//! The encode/decode pipeline between typed packets and the bytes that go
//! on the wire. Outgoing packets are stamped with the current sequence
//! number and run through the session's byte-shuffling transform; incoming
//! bodies are run through the exact inverse.
//!
//! The transform itself is a compatibility contract with the reference
//! server and is reproduced from the legacy algorithm rather than
//! redesigned: interleave, flip the most significant bit of every byte,
//! then reverse every run of consecutive bytes divisible by the session's
//! multiple. Worked byte-level examples live in the test module.
//!
//! ## Frame format
//!
//! ```text
//! [2-byte encoded length][body]
//! body = [family:1][action:1][sequence:2 (encoded sends only)][payload]
//! ```
//!
//! ## State machine
//!
//! `Uninitialized -> SequenceSet -> Ready`. The encoded send path fails
//! fast before `Ready`; Init/Init packets travel raw (that is how the
//! handshake itself is carried). Decoding before the multiples are known
//! is a pass-through, since the handshake reply arrives unobfuscated.

use eoclient_core::{EoClientError, Result};
use tracing::trace;

use super::codecs::encode_number;
use super::packet::{Packet, PacketAction, PacketFamily};
use super::sequence::SequenceState;

/// Where the processor is in its handshake-driven lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// No handshake data applied yet
    Uninitialized,
    /// Sequence seed applied, multiples still unknown
    SequenceSet,
    /// Fully configured for the session
    Ready,
}

/// Interleave bytes alternately from the front and the back
///
/// `[1,2,3,4,5]` becomes `[1,5,2,4,3]`: the first half of the input fills
/// the even positions left to right, the second half fills the odd
/// positions right to left.
pub fn interleave(data: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; data.len()];
    let mut ii = 0;

    let mut i = 0;
    while i < data.len() {
        buf[i] = data[ii];
        ii += 1;
        i += 2;
    }

    let mut i = if data.len() % 2 != 0 {
        data.len().wrapping_sub(2)
    } else {
        data.len().wrapping_sub(1)
    } as isize;
    while i >= 0 {
        buf[i as usize] = data[ii];
        ii += 1;
        i -= 2;
    }

    buf
}

/// Exact inverse of [`interleave`]
pub fn deinterleave(data: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; data.len()];
    let mut ii = 0;

    let mut i = 0;
    while i < data.len() {
        buf[ii] = data[i];
        ii += 1;
        i += 2;
    }

    let mut i = if data.len() % 2 != 0 {
        data.len().wrapping_sub(2)
    } else {
        data.len().wrapping_sub(1)
    } as isize;
    while i >= 0 {
        buf[ii] = data[i as usize];
        ii += 1;
        i -= 2;
    }

    buf
}

/// Flip the most significant bit of every byte (self-inverse)
pub fn flip_msb(data: &mut [u8]) {
    for b in data.iter_mut() {
        *b ^= 0x80;
    }
}

/// Reverse every run of two or more consecutive bytes divisible by `multiple`
///
/// Self-inverse for a fixed multiple. A multiple of zero is the identity.
pub fn swap_multiples(data: &mut [u8], multiple: u8) {
    if multiple == 0 {
        return;
    }

    let mut run = 0usize;
    for i in 0..=data.len() {
        if i < data.len() && data[i] % multiple == 0 {
            run += 1;
            continue;
        }
        if run > 1 {
            data[i - run..i].reverse();
        }
        run = 0;
    }
}

/// Forward transform applied to outgoing bodies
pub fn obfuscate(data: &[u8], multiple: u8) -> Vec<u8> {
    let mut out = interleave(data);
    flip_msb(&mut out);
    swap_multiples(&mut out, multiple);
    out
}

/// Inverse transform applied to incoming bodies
pub fn deobfuscate(data: &[u8], multiple: u8) -> Vec<u8> {
    let mut out = data.to_vec();
    swap_multiples(&mut out, multiple);
    flip_msb(&mut out);
    deinterleave(&out)
}

/// Session-scoped encode/decode pipeline
///
/// Owns the sequence state and the two encode multiples. One instance per
/// connection; mutations must track the physical send order, which the
/// caller-level single-flight discipline guarantees.
#[derive(Debug)]
pub struct PacketProcessor {
    state: ProcessorState,
    sequence: SequenceState,
    receive_multiple: u8,
    send_multiple: u8,
}

impl Default for PacketProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketProcessor {
    pub fn new() -> Self {
        Self {
            state: ProcessorState::Uninitialized,
            sequence: SequenceState::from_init_bytes(0, 0),
            receive_multiple: 0,
            send_multiple: 0,
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    /// Seed the sequence from the two handshake bytes
    pub fn set_initial_sequence_number(&mut self, s1: u8, s2: u8) {
        self.sequence = SequenceState::from_init_bytes(s1, s2);
        if self.state == ProcessorState::Uninitialized {
            self.state = ProcessorState::SequenceSet;
        }
    }

    /// Apply the receive/send multiples, completing the handshake
    pub fn set_encode_multiples(&mut self, receive_multiple: u8, send_multiple: u8) -> Result<()> {
        if self.state == ProcessorState::Uninitialized {
            return Err(EoClientError::InvalidUsage(
                "encode multiples set before the sequence seed".into(),
            ));
        }
        self.receive_multiple = receive_multiple;
        self.send_multiple = send_multiple;
        self.state = ProcessorState::Ready;
        Ok(())
    }

    /// Overwrite the sequence start from a mid-session server instruction
    pub fn set_sequence_start(&mut self, start: u32) {
        self.sequence.set_start(start);
    }

    /// Encode a packet for sending: sequence stamp, obfuscation, framing
    ///
    /// Init/Init packets take the raw path regardless of state; anything
    /// else before `Ready` is invalid usage.
    pub fn encode_packet(&mut self, packet: &Packet) -> Result<Vec<u8>> {
        if packet.family() == PacketFamily::Init && packet.action() == PacketAction::Init {
            return Ok(self.encode_raw_packet(packet));
        }
        if self.state != ProcessorState::Ready {
            return Err(EoClientError::InvalidUsage(format!(
                "encoded send in processor state {:?}",
                self.state
            )));
        }

        let sequence = self.sequence.next_sequence();
        trace!(sequence, "stamping outgoing packet");

        let raw = packet.raw_data();
        let mut body = Vec::with_capacity(raw.len() + 2);
        body.extend_from_slice(&raw[..2]);
        body.extend_from_slice(&encode_number(sequence, 2));
        body.extend_from_slice(&raw[2..]);

        Ok(frame(&obfuscate(&body, self.send_multiple)))
    }

    /// Frame a packet without sequence or obfuscation (handshake path)
    pub fn encode_raw_packet(&self, packet: &Packet) -> Vec<u8> {
        frame(&packet.raw_data())
    }

    /// Decode a received frame body back into a packet
    ///
    /// Before the multiples are known this is a pass-through; the
    /// handshake reply is the only traffic in that window.
    pub fn decode_data(&self, body: &[u8]) -> Result<Packet> {
        if self.receive_multiple == 0 {
            return Packet::from_bytes(body);
        }
        Packet::from_bytes(&deobfuscate(body, self.receive_multiple))
    }
}

/// Prefix a body with its 2-byte encoded length
fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(&encode_number(body.len() as u32, 2));
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PacketBuilder;
    use crate::codecs::decode_number;
    use crate::packet::PacketAction;
    use rand::Rng;

    #[test]
    fn interleave_matches_worked_examples() {
        assert_eq!(interleave(&[1, 2, 3, 4, 5]), vec![1, 5, 2, 4, 3]);
        assert_eq!(interleave(&[1, 2, 3, 4]), vec![1, 4, 2, 3]);
        assert_eq!(interleave(&[7]), vec![7]);
        assert_eq!(interleave(&[]), Vec::<u8>::new());
    }

    #[test]
    fn deinterleave_inverts_interleave() {
        for len in 0..64usize {
            let data: Vec<u8> = (0..len as u8).collect();
            assert_eq!(deinterleave(&interleave(&data)), data, "failed for len {}", len);
        }
    }

    #[test]
    fn obfuscation_matches_worked_byte_vector() {
        // [1,2,3,4,5]
        //   interleave        -> [0x01, 0x05, 0x02, 0x04, 0x03]
        //   flip MSB          -> [0x81, 0x85, 0x82, 0x84, 0x83]
        //   swap multiples(2) -> [0x81, 0x85, 0x84, 0x82, 0x83]
        //     (the run [0x82, 0x84] is the only stretch of 2+ even bytes)
        assert_eq!(
            obfuscate(&[1, 2, 3, 4, 5], 2),
            vec![0x81, 0x85, 0x84, 0x82, 0x83]
        );
        // multiple 0 skips the swap stage entirely
        assert_eq!(
            obfuscate(&[1, 2, 3, 4], 0),
            vec![0x81, 0x84, 0x82, 0x83]
        );
    }

    #[test]
    fn swap_multiples_reverses_each_divisible_run() {
        let mut data = vec![3, 6, 9, 5, 12, 3, 5];
        swap_multiples(&mut data, 3);
        assert_eq!(data, vec![9, 6, 3, 5, 3, 12, 5]);

        // applying it again restores the original
        swap_multiples(&mut data, 3);
        assert_eq!(data, vec![3, 6, 9, 5, 12, 3, 5]);
    }

    #[test]
    fn transform_is_an_involution_for_all_multiples() {
        let mut rng = rand::thread_rng();
        for multiple in 0..=12u8 {
            for _ in 0..200 {
                let len = rng.gen_range(0..128usize);
                let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
                assert_eq!(
                    deobfuscate(&obfuscate(&data, multiple), multiple),
                    data,
                    "failed for multiple {}",
                    multiple
                );
            }
        }
    }

    fn ready_processor() -> PacketProcessor {
        let mut processor = PacketProcessor::new();
        processor.set_initial_sequence_number(10, 20);
        processor.set_encode_multiples(4, 7).unwrap();
        processor
    }

    #[test]
    fn encoded_send_before_ready_fails_fast() {
        let mut processor = PacketProcessor::new();
        let packet = PacketBuilder::new(PacketFamily::Connection, PacketAction::Ping).build();
        assert!(processor.encode_packet(&packet).is_err());

        processor.set_initial_sequence_number(1, 1);
        assert!(processor.encode_packet(&packet).is_err());

        processor.set_encode_multiples(4, 7).unwrap();
        assert!(processor.encode_packet(&packet).is_ok());
    }

    #[test]
    fn multiples_before_sequence_is_invalid_usage() {
        let mut processor = PacketProcessor::new();
        assert!(processor.set_encode_multiples(4, 7).is_err());
    }

    #[test]
    fn init_packets_bypass_sequence_and_obfuscation() {
        let mut processor = PacketProcessor::new();
        let packet = PacketBuilder::new(PacketFamily::Init, PacketAction::Init)
            .add_byte(6)
            .build();

        let bytes = processor.encode_packet(&packet).unwrap();
        assert_eq!(decode_number(&bytes[..2]) as usize, bytes.len() - 2);
        assert_eq!(&bytes[2..], &[255, 255, 6]);
    }

    #[test]
    fn init_family_with_another_action_is_encoded_normally() {
        let packet = PacketBuilder::new(PacketFamily::Init, PacketAction::Reply).build();

        // the bypass is for the Init/Init handshake only
        let mut processor = PacketProcessor::new();
        assert!(processor.encode_packet(&packet).is_err());

        let mut processor = ready_processor();
        let bytes = processor.encode_packet(&packet).unwrap();
        let body = deobfuscate(&bytes[2..], 7);
        assert_eq!(body[0], 255, "family");
        assert_eq!(body[1], 3, "action");
        assert_eq!(decode_number(&body[2..4]), 77, "sequence is stamped");
    }

    #[test]
    fn encode_stamps_the_sequence_after_the_header() {
        let mut processor = ready_processor();
        let packet = PacketBuilder::new(PacketFamily::Login, PacketAction::Request)
            .add_break_string("abc")
            .build();

        let bytes = processor.encode_packet(&packet).unwrap();
        let body_len = decode_number(&bytes[..2]) as usize;
        assert_eq!(body_len, bytes.len() - 2, "length prefix covers the body");

        // undo the send-side transform the way the server would
        let body = deobfuscate(&bytes[2..], 7);
        assert_eq!(body[0], 4, "family");
        assert_eq!(body[1], 1, "action");
        // SequenceState::from_init_bytes(10, 20) starts at 77
        assert_eq!(decode_number(&body[2..4]), 77);
        assert_eq!(&body[4..], &[b'a', b'b', b'c', 0xFF]);
    }

    #[test]
    fn sequence_advances_once_per_encoded_send() {
        let mut processor = ready_processor();
        let stamps: Vec<u32> = (0..3)
            .map(|_| {
                let packet =
                    PacketBuilder::new(PacketFamily::Connection, PacketAction::Ping).build();
                let bytes = processor.encode_packet(&packet).unwrap();
                let body = deobfuscate(&bytes[2..], 7);
                decode_number(&body[2..4])
            })
            .collect();
        assert_eq!(stamps, vec![77, 78, 79]);
    }

    #[test]
    fn decode_inverts_the_receive_transform() {
        let mut processor = PacketProcessor::new();
        processor.set_initial_sequence_number(1, 1);
        processor.set_encode_multiples(4, 7).unwrap();

        // server -> client traffic is produced with the receive multiple
        let body = obfuscate(&[5, 3, 1, 254, b'o', b'k'], 4);
        let packet = processor.decode_data(&body).unwrap();
        assert_eq!(packet.family(), PacketFamily::Welcome);
        assert_eq!(packet.action(), PacketAction::Reply);
        assert_eq!(packet.read_short().unwrap(), 0);
        assert_eq!(packet.read_end_string().unwrap(), "ok");
    }

    #[test]
    fn decode_is_a_pass_through_before_multiples_are_known() {
        let processor = PacketProcessor::new();
        let packet = processor.decode_data(&[255, 255, 2, 9]).unwrap();
        assert_eq!(packet.family(), PacketFamily::Init);
        assert_eq!(packet.read_byte().unwrap(), 2);
        assert_eq!(packet.read_byte().unwrap(), 9);
    }
}
