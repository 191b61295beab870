//! Transport-agnostic input/output sum types.
//!
//! A four-variant closed set on each side; every output variant carries
//! its own `symbol` so a downstream listener can route without extra
//! context. Wire encoders (CSV, binary) live in the `wire-protocol` crate;
//! this module stays purely logical.

use crate::order::Side;
use crate::symbol::Symbol;

/// A request admitted to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputMessage {
    NewOrder(NewOrder),
    Cancel(Cancel),
    Flush,
    TopOfBookQuery(TopOfBookQuery),
}

/// An event produced by the engine in response to one `InputMessage`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputMessage {
    Ack(Ack),
    CancelAck(CancelAck),
    Trade(Trade),
    TopOfBook(TopOfBook),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: u32,
    pub user_order_id: u32,
    pub symbol: Symbol,
    /// `0` => market order, `>0` => limit order.
    pub price: u32,
    pub quantity: u32,
    pub side: Side,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cancel {
    pub user_id: u32,
    pub user_order_id: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopOfBookQuery {
    pub symbol: Symbol,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ack {
    pub user_id: u32,
    pub user_order_id: u32,
    pub symbol: Symbol,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelAck {
    pub user_id: u32,
    pub user_order_id: u32,
    /// `Symbol::UNKNOWN` when the order id had no index entry.
    pub symbol: Symbol,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trade {
    pub symbol: Symbol,
    pub buy_user_id: u32,
    pub buy_user_order_id: u32,
    pub sell_user_id: u32,
    pub sell_user_order_id: u32,
    pub price: u32,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopOfBook {
    pub symbol: Symbol,
    pub side: Side,
    /// `0` iff `eliminated` (side has no resting orders).
    pub price: u32,
    /// `0` iff `eliminated`.
    pub quantity: u32,
    pub eliminated: bool,
}

impl OutputMessage {
    pub fn ack(user_id: u32, user_order_id: u32, symbol: Symbol) -> OutputMessage {
        OutputMessage::Ack(Ack {
            user_id,
            user_order_id,
            symbol,
        })
    }

    pub fn cancel_ack(user_id: u32, user_order_id: u32, symbol: Symbol) -> OutputMessage {
        OutputMessage::CancelAck(CancelAck {
            user_id,
            user_order_id,
            symbol,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn trade(
        symbol: Symbol,
        buy_user_id: u32,
        buy_user_order_id: u32,
        sell_user_id: u32,
        sell_user_order_id: u32,
        price: u32,
        quantity: u32,
    ) -> OutputMessage {
        OutputMessage::Trade(Trade {
            symbol,
            buy_user_id,
            buy_user_order_id,
            sell_user_id,
            sell_user_order_id,
            price,
            quantity,
        })
    }

    pub fn top_of_book(symbol: Symbol, side: Side, price: u32, quantity: u32) -> OutputMessage {
        OutputMessage::TopOfBook(TopOfBook {
            symbol,
            side,
            price,
            quantity,
            eliminated: false,
        })
    }

    pub fn top_of_book_eliminated(symbol: Symbol, side: Side) -> OutputMessage {
        OutputMessage::TopOfBook(TopOfBook {
            symbol,
            side,
            price: 0,
            quantity: 0,
            eliminated: true,
        })
    }
}
