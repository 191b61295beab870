//! UDP multicast packet framing: `[seq_num: u64 BE][frame_len: u32 BE]
//! [binary payload]`. `seq_num` starts at 1 and increments per packet sent,
//! letting a receiver detect gaps from dropped datagrams.

use crate::binary;
use crate::error::DecodeError;
use engine_core::OutputMessage;

/// Assigns the monotonic `seq_num` for outbound multicast packets. Owned
/// by the transport's multicast fan-out task; never shared across threads.
pub struct MulticastSequencer {
    next_seq: u64,
}

impl Default for MulticastSequencer {
    fn default() -> MulticastSequencer {
        MulticastSequencer { next_seq: 1 }
    }
}

impl MulticastSequencer {
    pub fn new() -> MulticastSequencer {
        MulticastSequencer::default()
    }

    /// Encodes `msg` into one framed multicast packet and advances the
    /// sequence counter.
    pub fn encode(&mut self, msg: &OutputMessage) -> Vec<u8> {
        let seq = self.next_seq;
        self.next_seq += 1;

        let payload = binary::encode_output(msg);
        let mut packet = Vec::with_capacity(8 + 4 + payload.len());
        packet.extend_from_slice(&seq.to_be_bytes());
        packet.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        packet.extend_from_slice(&payload);
        packet
    }
}

/// Decodes one multicast datagram into `(seq_num, OutputMessage)`. A
/// receiver compares `seq_num` against its last-seen value to detect gaps;
/// this function itself is stateless.
pub fn decode(packet: &[u8]) -> Result<(u64, OutputMessage), DecodeError> {
    if packet.len() < 12 {
        return Err(DecodeError::TruncatedFrame { expected: 12 });
    }
    let seq_num = u64::from_be_bytes(packet[0..8].try_into().unwrap());
    let frame_len = u32::from_be_bytes(packet[8..12].try_into().unwrap()) as usize;
    let payload = &packet[12..];
    if payload.len() != frame_len {
        return Err(DecodeError::TruncatedFrame { expected: frame_len });
    }
    let msg = binary::decode_output(payload)?;
    Ok((seq_num, msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Side, Symbol};

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let mut seq = MulticastSequencer::new();
        let ack = OutputMessage::ack(1, 1, Symbol::pack("IBM"));

        let (seq1, _) = decode(&seq.encode(&ack)).unwrap();
        let (seq2, _) = decode(&seq.encode(&ack)).unwrap();
        assert_eq!(seq1, 1);
        assert_eq!(seq2, 2);
    }

    #[test]
    fn packet_round_trips_message() {
        let mut seq = MulticastSequencer::new();
        let tob = OutputMessage::top_of_book(Symbol::pack("IBM"), Side::Buy, 100, 50);
        let packet = seq.encode(&tob);
        let (_, decoded) = decode(&packet).unwrap();
        assert_eq!(decoded, tob);
    }

    #[test]
    fn gap_is_detectable_from_seq_num() {
        let mut seq = MulticastSequencer::new();
        let ack = OutputMessage::ack(1, 1, Symbol::pack("IBM"));
        let _first = seq.encode(&ack); // seq 1, dropped by the receiver
        let (seq2, _) = decode(&seq.encode(&ack)).unwrap();
        assert_eq!(seq2, 2, "receiver sees seq jump from nothing to 2, detecting the drop");
    }
}
