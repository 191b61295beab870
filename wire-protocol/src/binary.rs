//! Big-endian, length-prefixed binary frame protocol.
//!
//! A frame is `[frame_len: u32 BE][payload]`, where `frame_len` counts only
//! the payload that follows. Every payload starts with a 1-byte magic
//! (`0x4D`) and a 1-byte message type; `read_frame`/`write_frame` handle the
//! length prefix, the codecs here handle only the payload.
//!
//! Fixed-size payloads: NEW_ORDER 27, CANCEL 18, FLUSH 2, ACK/CANCEL_ACK 18,
//! TRADE 34, TOP_OF_BOOK 20, TOP_OF_BOOK_QUERY 10. CANCEL carries an 8-byte
//! reserved symbol-hint field the engine never consults, purely so its
//! frame is the same size as ACK/CANCEL_ACK; TOP_OF_BOOK carries a trailing
//! pad byte once the elimination flag is folded into
//! `price == 0 && quantity == 0` rather than wire-encoded separately.
//!
//! Manual big-endian field reads (`read_u32_be` etc.) over packed
//! `[u8; 8]` symbols, rather than a derive-based serializer, keep the wire
//! layout exact and independent of any in-memory struct layout.

use engine_core::{Cancel, InputMessage, NewOrder, OutputMessage, Side, Symbol, TopOfBookQuery};

use crate::error::DecodeError;

pub const MAGIC: u8 = 0x4D;

const TYPE_NEW_ORDER: u8 = 0x01;
const TYPE_CANCEL: u8 = 0x02;
const TYPE_FLUSH: u8 = 0x03;
const TYPE_TOP_OF_BOOK_QUERY: u8 = 0x04;

const TYPE_ACK: u8 = 0x11;
const TYPE_CANCEL_ACK: u8 = 0x12;
const TYPE_TRADE: u8 = 0x13;
const TYPE_TOP_OF_BOOK: u8 = 0x14;

fn side_byte(side: Side) -> u8 {
    match side {
        Side::Buy => 0,
        Side::Sell => 1,
    }
}

fn byte_side(byte: u8) -> Result<Side, DecodeError> {
    match byte {
        0 => Ok(Side::Buy),
        1 => Ok(Side::Sell),
        other => Err(DecodeError::MalformedCsvField {
            field: "side",
            detail: format!("expected 0 (buy) or 1 (sell), got {other}"),
        }),
    }
}

fn require_len(payload: &[u8], expected: usize) -> Result<(), DecodeError> {
    if payload.len() != expected {
        return Err(DecodeError::TruncatedFrame { expected });
    }
    Ok(())
}

fn require_header(payload: &[u8], expected_type: u8) -> Result<(), DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::TruncatedFrame { expected: 2 });
    }
    if payload[0] != MAGIC {
        return Err(DecodeError::BadMagic { got: payload[0] });
    }
    if payload.len() < 2 {
        return Err(DecodeError::TruncatedFrame { expected: 2 });
    }
    if payload[1] != expected_type {
        return Err(DecodeError::UnknownMessageType { got: payload[1] });
    }
    Ok(())
}

/// Encodes one input message as a binary payload (no frame-length prefix).
pub fn encode_input(msg: &InputMessage) -> Vec<u8> {
    match msg {
        InputMessage::NewOrder(o) => {
            let mut buf = Vec::with_capacity(27);
            buf.push(MAGIC);
            buf.push(TYPE_NEW_ORDER);
            buf.extend_from_slice(&o.user_id.to_be_bytes());
            buf.extend_from_slice(&o.user_order_id.to_be_bytes());
            buf.extend_from_slice(&o.symbol.as_u64().to_be_bytes());
            buf.extend_from_slice(&o.price.to_be_bytes());
            buf.extend_from_slice(&o.quantity.to_be_bytes());
            buf.push(side_byte(o.side));
            buf
        }
        InputMessage::Cancel(c) => {
            let mut buf = Vec::with_capacity(18);
            buf.push(MAGIC);
            buf.push(TYPE_CANCEL);
            buf.extend_from_slice(&c.user_id.to_be_bytes());
            buf.extend_from_slice(&c.user_order_id.to_be_bytes());
            buf.extend_from_slice(&Symbol::UNKNOWN.as_u64().to_be_bytes());
            buf
        }
        InputMessage::Flush => vec![MAGIC, TYPE_FLUSH],
        InputMessage::TopOfBookQuery(q) => {
            let mut buf = Vec::with_capacity(10);
            buf.push(MAGIC);
            buf.push(TYPE_TOP_OF_BOOK_QUERY);
            buf.extend_from_slice(&q.symbol.as_u64().to_be_bytes());
            buf
        }
    }
}

/// Decodes one binary input payload (without the frame-length prefix).
pub fn decode_input(payload: &[u8]) -> Result<InputMessage, DecodeError> {
    if payload.len() < 2 {
        return Err(DecodeError::TruncatedFrame { expected: 2 });
    }
    if payload[0] != MAGIC {
        return Err(DecodeError::BadMagic { got: payload[0] });
    }

    match payload[1] {
        TYPE_NEW_ORDER => {
            require_len(payload, 27)?;
            Ok(InputMessage::NewOrder(NewOrder {
                user_id: u32::from_be_bytes(payload[2..6].try_into().unwrap()),
                user_order_id: u32::from_be_bytes(payload[6..10].try_into().unwrap()),
                symbol: Symbol::from_u64(u64::from_be_bytes(payload[10..18].try_into().unwrap())),
                price: u32::from_be_bytes(payload[18..22].try_into().unwrap()),
                quantity: u32::from_be_bytes(payload[22..26].try_into().unwrap()),
                side: byte_side(payload[26])?,
            }))
        }
        TYPE_CANCEL => {
            require_len(payload, 18)?;
            Ok(InputMessage::Cancel(Cancel {
                user_id: u32::from_be_bytes(payload[2..6].try_into().unwrap()),
                user_order_id: u32::from_be_bytes(payload[6..10].try_into().unwrap()),
            }))
        }
        TYPE_FLUSH => {
            require_len(payload, 2)?;
            Ok(InputMessage::Flush)
        }
        TYPE_TOP_OF_BOOK_QUERY => {
            require_len(payload, 10)?;
            Ok(InputMessage::TopOfBookQuery(TopOfBookQuery {
                symbol: Symbol::from_u64(u64::from_be_bytes(payload[2..10].try_into().unwrap())),
            }))
        }
        other => Err(DecodeError::UnknownMessageType { got: other }),
    }
}

/// Encodes one output message as a binary payload (no frame-length prefix).
pub fn encode_output(msg: &OutputMessage) -> Vec<u8> {
    match msg {
        OutputMessage::Ack(a) => {
            let mut buf = Vec::with_capacity(18);
            buf.push(MAGIC);
            buf.push(TYPE_ACK);
            buf.extend_from_slice(&a.user_id.to_be_bytes());
            buf.extend_from_slice(&a.user_order_id.to_be_bytes());
            buf.extend_from_slice(&a.symbol.as_u64().to_be_bytes());
            buf
        }
        OutputMessage::CancelAck(x) => {
            let mut buf = Vec::with_capacity(18);
            buf.push(MAGIC);
            buf.push(TYPE_CANCEL_ACK);
            buf.extend_from_slice(&x.user_id.to_be_bytes());
            buf.extend_from_slice(&x.user_order_id.to_be_bytes());
            buf.extend_from_slice(&x.symbol.as_u64().to_be_bytes());
            buf
        }
        OutputMessage::Trade(t) => {
            let mut buf = Vec::with_capacity(34);
            buf.push(MAGIC);
            buf.push(TYPE_TRADE);
            buf.extend_from_slice(&t.symbol.as_u64().to_be_bytes());
            buf.extend_from_slice(&t.buy_user_id.to_be_bytes());
            buf.extend_from_slice(&t.buy_user_order_id.to_be_bytes());
            buf.extend_from_slice(&t.sell_user_id.to_be_bytes());
            buf.extend_from_slice(&t.sell_user_order_id.to_be_bytes());
            buf.extend_from_slice(&t.price.to_be_bytes());
            buf.extend_from_slice(&t.quantity.to_be_bytes());
            buf
        }
        OutputMessage::TopOfBook(b) => {
            let mut buf = Vec::with_capacity(20);
            buf.push(MAGIC);
            buf.push(TYPE_TOP_OF_BOOK);
            buf.extend_from_slice(&b.symbol.as_u64().to_be_bytes());
            buf.push(side_byte(b.side));
            buf.extend_from_slice(&b.price.to_be_bytes());
            buf.extend_from_slice(&b.quantity.to_be_bytes());
            buf.push(0); // trailing pad byte
            buf
        }
    }
}

/// Decodes one binary output payload (without the frame-length prefix).
pub fn decode_output(payload: &[u8]) -> Result<OutputMessage, DecodeError> {
    if payload.len() < 2 {
        return Err(DecodeError::TruncatedFrame { expected: 2 });
    }
    if payload[0] != MAGIC {
        return Err(DecodeError::BadMagic { got: payload[0] });
    }

    match payload[1] {
        TYPE_ACK => {
            require_len(payload, 18)?;
            Ok(OutputMessage::ack(
                u32::from_be_bytes(payload[2..6].try_into().unwrap()),
                u32::from_be_bytes(payload[6..10].try_into().unwrap()),
                Symbol::from_u64(u64::from_be_bytes(payload[10..18].try_into().unwrap())),
            ))
        }
        TYPE_CANCEL_ACK => {
            require_len(payload, 18)?;
            Ok(OutputMessage::cancel_ack(
                u32::from_be_bytes(payload[2..6].try_into().unwrap()),
                u32::from_be_bytes(payload[6..10].try_into().unwrap()),
                Symbol::from_u64(u64::from_be_bytes(payload[10..18].try_into().unwrap())),
            ))
        }
        TYPE_TRADE => {
            require_len(payload, 34)?;
            Ok(OutputMessage::trade(
                Symbol::from_u64(u64::from_be_bytes(payload[2..10].try_into().unwrap())),
                u32::from_be_bytes(payload[10..14].try_into().unwrap()),
                u32::from_be_bytes(payload[14..18].try_into().unwrap()),
                u32::from_be_bytes(payload[18..22].try_into().unwrap()),
                u32::from_be_bytes(payload[22..26].try_into().unwrap()),
                u32::from_be_bytes(payload[26..30].try_into().unwrap()),
                u32::from_be_bytes(payload[30..34].try_into().unwrap()),
            ))
        }
        TYPE_TOP_OF_BOOK => {
            require_len(payload, 20)?;
            let symbol = Symbol::from_u64(u64::from_be_bytes(payload[2..10].try_into().unwrap()));
            let side = byte_side(payload[10])?;
            let price = u32::from_be_bytes(payload[11..15].try_into().unwrap());
            let quantity = u32::from_be_bytes(payload[15..19].try_into().unwrap());
            if price == 0 && quantity == 0 {
                Ok(OutputMessage::top_of_book_eliminated(symbol, side))
            } else {
                Ok(OutputMessage::top_of_book(symbol, side, price, quantity))
            }
        }
        other => Err(DecodeError::UnknownMessageType { got: other }),
    }
}

/// Reads one length-prefixed frame's payload from `buf` starting at byte 0,
/// returning `(payload, bytes_consumed)`. `Ok(None)` means not enough bytes
/// have accumulated yet for a full frame (the caller should read more).
pub fn try_read_frame(buf: &[u8]) -> Result<Option<(&[u8], usize)>, DecodeError> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let frame_len = u32::from_be_bytes(buf[0..4].try_into().unwrap()) as usize;
    let total = 4 + frame_len;
    if buf.len() < total {
        return Ok(None);
    }
    Ok(Some((&buf[4..total], total)))
}

/// Writes `payload` as a length-prefixed frame.
pub fn write_frame(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}
