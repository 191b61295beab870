//! Line-oriented, comma-separated text protocol: a letter tag per line
//! (`N`/`C`/`F`/`Q` in, `A`/`X`/`T`/`B` out). Fields are trimmed of
//! surrounding whitespace; a leading `#` marks a comment line, and blank
//! lines are ignored — both surface as `DecodeError::BlankLine` so the
//! caller can skip them without logging a warning.

use engine_core::{Cancel, InputMessage, NewOrder, OutputMessage, Side, Symbol, TopOfBookQuery};

use crate::error::DecodeError;

const UNKNOWN_SYMBOL_TEXT: &str = "<UNK>";

fn encode_symbol(symbol: Symbol) -> String {
    if symbol.is_unknown() {
        UNKNOWN_SYMBOL_TEXT.to_string()
    } else {
        symbol.unpack()
    }
}

fn decode_symbol(text: &str) -> Symbol {
    if text == UNKNOWN_SYMBOL_TEXT {
        Symbol::UNKNOWN
    } else {
        Symbol::pack(text)
    }
}

fn encode_side(side: Side) -> char {
    match side {
        Side::Buy => 'B',
        Side::Sell => 'S',
    }
}

fn decode_side(field: &str) -> Result<Side, DecodeError> {
    match field {
        "B" => Ok(Side::Buy),
        "S" => Ok(Side::Sell),
        _ => Err(DecodeError::MalformedCsvField {
            field: "side",
            detail: format!("expected `B` or `S`, got `{field}`"),
        }),
    }
}

fn parse_u32(field: &str, name: &'static str) -> Result<u32, DecodeError> {
    field.parse::<u32>().map_err(|e| DecodeError::MalformedCsvField {
        field: name,
        detail: e.to_string(),
    })
}

/// Encodes one input message as a CSV line (no trailing newline).
pub fn encode_input(msg: &InputMessage) -> String {
    match msg {
        InputMessage::NewOrder(o) => format!(
            "N,{},{},{},{},{},{}",
            o.user_id,
            o.symbol.unpack(),
            o.price,
            o.quantity,
            encode_side(o.side),
            o.user_order_id
        ),
        InputMessage::Cancel(c) => format!("C,{},{}", c.user_id, c.user_order_id),
        InputMessage::Flush => "F".to_string(),
        InputMessage::TopOfBookQuery(q) => format!("Q,{}", q.symbol.unpack()),
    }
}

/// Decodes one CSV line into an input message. Comment (`#`) and blank
/// lines yield `DecodeError::BlankLine`, which the caller should skip
/// silently rather than counting as a malformed-input metric.
pub fn decode_input(line: &str) -> Result<InputMessage, DecodeError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(DecodeError::BlankLine);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    match fields[0] {
        "N" => {
            if fields.len() != 7 {
                return Err(DecodeError::WrongFieldCount {
                    detail: format!("NEW_ORDER expects 7 fields, got {}", fields.len()),
                });
            }
            Ok(InputMessage::NewOrder(NewOrder {
                user_id: parse_u32(fields[1], "user_id")?,
                symbol: decode_symbol(fields[2]),
                price: parse_u32(fields[3], "price")?,
                quantity: parse_u32(fields[4], "quantity")?,
                side: decode_side(fields[5])?,
                user_order_id: parse_u32(fields[6], "user_order_id")?,
            }))
        }
        "C" => {
            if fields.len() != 3 {
                return Err(DecodeError::WrongFieldCount {
                    detail: format!("CANCEL expects 3 fields, got {}", fields.len()),
                });
            }
            Ok(InputMessage::Cancel(Cancel {
                user_id: parse_u32(fields[1], "user_id")?,
                user_order_id: parse_u32(fields[2], "user_order_id")?,
            }))
        }
        "F" => {
            if fields.len() != 1 {
                return Err(DecodeError::WrongFieldCount {
                    detail: format!("FLUSH expects 1 field, got {}", fields.len()),
                });
            }
            Ok(InputMessage::Flush)
        }
        "Q" => {
            if fields.len() != 2 {
                return Err(DecodeError::WrongFieldCount {
                    detail: format!("TOP_OF_BOOK_QUERY expects 2 fields, got {}", fields.len()),
                });
            }
            Ok(InputMessage::TopOfBookQuery(TopOfBookQuery {
                symbol: decode_symbol(fields[1]),
            }))
        }
        other => Err(DecodeError::MalformedCsvField {
            field: "type",
            detail: format!("unknown input line type `{other}`"),
        }),
    }
}

/// Encodes one output message as a CSV line (no trailing newline).
pub fn encode_output(msg: &OutputMessage) -> String {
    match msg {
        OutputMessage::Ack(a) => format!("A,{},{},{}", a.user_id, a.user_order_id, encode_symbol(a.symbol)),
        OutputMessage::CancelAck(x) => format!("X,{},{},{}", x.user_id, x.user_order_id, encode_symbol(x.symbol)),
        OutputMessage::Trade(t) => format!(
            "T,{},{},{},{},{},{},{}",
            t.symbol.unpack(),
            t.buy_user_id,
            t.buy_user_order_id,
            t.sell_user_id,
            t.sell_user_order_id,
            t.price,
            t.quantity
        ),
        OutputMessage::TopOfBook(b) => {
            if b.eliminated {
                format!("B,{},{},-,-", b.symbol.unpack(), encode_side(b.side))
            } else {
                format!("B,{},{},{},{}", b.symbol.unpack(), encode_side(b.side), b.price, b.quantity)
            }
        }
    }
}

/// Decodes one CSV response line. Used by clients reading server output.
pub fn decode_output(line: &str) -> Result<OutputMessage, DecodeError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(DecodeError::BlankLine);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    match fields[0] {
        "A" => Ok(OutputMessage::ack(
            parse_u32(fields[1], "user_id")?,
            parse_u32(fields[2], "user_order_id")?,
            decode_symbol(fields[3]),
        )),
        "X" => Ok(OutputMessage::cancel_ack(
            parse_u32(fields[1], "user_id")?,
            parse_u32(fields[2], "user_order_id")?,
            decode_symbol(fields[3]),
        )),
        "T" => Ok(OutputMessage::trade(
            decode_symbol(fields[1]),
            parse_u32(fields[2], "buy_user_id")?,
            parse_u32(fields[3], "buy_user_order_id")?,
            parse_u32(fields[4], "sell_user_id")?,
            parse_u32(fields[5], "sell_user_order_id")?,
            parse_u32(fields[6], "price")?,
            parse_u32(fields[7], "quantity")?,
        )),
        "B" => {
            let symbol = decode_symbol(fields[1]);
            let side = decode_side(fields[2])?;
            if fields[3] == "-" {
                Ok(OutputMessage::top_of_book_eliminated(symbol, side))
            } else {
                Ok(OutputMessage::top_of_book(
                    symbol,
                    side,
                    parse_u32(fields[3], "price")?,
                    parse_u32(fields[4], "quantity")?,
                ))
            }
        }
        other => Err(DecodeError::MalformedCsvField {
            field: "type",
            detail: format!("unknown output line type `{other}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Side;

    #[test]
    fn new_order_round_trips() {
        let msg = InputMessage::NewOrder(NewOrder {
            user_id: 1,
            user_order_id: 7,
            symbol: Symbol::pack("IBM"),
            price: 100,
            quantity: 50,
            side: Side::Buy,
        });
        let line = encode_input(&msg);
        assert_eq!(line, "N,1,IBM,100,50,B,7");
        assert_eq!(decode_input(&line).unwrap(), msg);
    }

    #[test]
    fn cancel_round_trips() {
        let msg = InputMessage::Cancel(Cancel {
            user_id: 3,
            user_order_id: 4,
        });
        assert_eq!(encode_input(&msg), "C,3,4");
        assert_eq!(decode_input("C,3,4").unwrap(), msg);
    }

    #[test]
    fn flush_round_trips() {
        assert_eq!(encode_input(&InputMessage::Flush), "F");
        assert_eq!(decode_input("F").unwrap(), InputMessage::Flush);
    }

    #[test]
    fn top_of_book_query_round_trips() {
        let msg = InputMessage::TopOfBookQuery(TopOfBookQuery {
            symbol: Symbol::pack("IBM"),
        });
        assert_eq!(encode_input(&msg), "Q,IBM");
        assert_eq!(decode_input("Q,IBM").unwrap(), msg);
    }

    #[test]
    fn blank_and_comment_lines_are_reported_distinctly() {
        assert_eq!(decode_input(""), Err(DecodeError::BlankLine));
        assert_eq!(decode_input("   "), Err(DecodeError::BlankLine));
        assert_eq!(decode_input("# a comment"), Err(DecodeError::BlankLine));
    }

    #[test]
    fn scenario_one_single_match() {
        let a = decode_input("N,1,IBM,100,50,B,1").unwrap();
        let b = decode_input("N,2,IBM,100,50,S,1").unwrap();
        assert_eq!(
            a,
            InputMessage::NewOrder(NewOrder {
                user_id: 1,
                user_order_id: 1,
                symbol: Symbol::pack("IBM"),
                price: 100,
                quantity: 50,
                side: Side::Buy,
            })
        );
        assert_eq!(
            b,
            InputMessage::NewOrder(NewOrder {
                user_id: 2,
                user_order_id: 1,
                symbol: Symbol::pack("IBM"),
                price: 100,
                quantity: 50,
                side: Side::Sell,
            })
        );
    }

    #[test]
    fn output_trade_and_tob_encode_as_expected_literals() {
        let trade = OutputMessage::trade(Symbol::pack("IBM"), 1, 1, 2, 1, 100, 50);
        assert_eq!(encode_output(&trade), "T,IBM,1,1,2,1,100,50");

        let tob = OutputMessage::top_of_book(Symbol::pack("IBM"), Side::Buy, 100, 50);
        assert_eq!(encode_output(&tob), "B,IBM,B,100,50");

        let elim = OutputMessage::top_of_book_eliminated(Symbol::pack("IBM"), Side::Buy);
        assert_eq!(encode_output(&elim), "B,IBM,B,-,-");
    }

    #[test]
    fn unknown_cancel_ack_uses_unk_literal() {
        let ack = OutputMessage::cancel_ack(7, 7, Symbol::UNKNOWN);
        assert_eq!(encode_output(&ack), "X,7,7,<UNK>");
        assert_eq!(decode_output("X,7,7,<UNK>").unwrap(), ack);
    }

    #[test]
    fn output_round_trips() {
        for msg in [
            OutputMessage::ack(1, 1, Symbol::pack("IBM")),
            OutputMessage::cancel_ack(1, 1, Symbol::pack("IBM")),
            OutputMessage::trade(Symbol::pack("IBM"), 1, 1, 2, 1, 100, 50),
            OutputMessage::top_of_book(Symbol::pack("IBM"), Side::Sell, 101, 20),
            OutputMessage::top_of_book_eliminated(Symbol::pack("IBM"), Side::Sell),
        ] {
            let line = encode_output(&msg);
            assert_eq!(decode_output(&line).unwrap(), msg);
        }
    }
}
