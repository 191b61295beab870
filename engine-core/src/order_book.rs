//! Per-symbol order book: price-time-priority matching, book maintenance,
//! and top-of-book change detection.
//!
//! Levels are sorted `Vec<PriceLevel>` rather than a
//! `BTreeMap<price, VecDeque<Order>>`: a level is a first-class owned
//! object so cancel can hand back a stable handle into it, not just an
//! entry in a whole-book map.

use crate::error::EngineError;
use crate::limits::EngineLimits;
use crate::messages::{NewOrder, OutputMessage};
use crate::order::{Order, Side};
use crate::price_level::PriceLevel;
use crate::symbol::Symbol;

/// A stable reference to a resting order, handed back by `add_order` (via
/// the engine's cancel index) so a later `cancel` doesn't need to rescan
/// every price level. Holds only the lookup key (side + price), never the
/// order itself — ownership of the `Order` stays exclusively with the
/// `PriceLevel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderHandle {
    pub side: Side,
    pub price: u32,
}

/// Snapshot of one side's best price and aggregate quantity there. `0/0`
/// means the side is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
struct TopOfBookSnapshot {
    bid_price: u32,
    bid_qty: u32,
    ask_price: u32,
    ask_qty: u32,
}

/// One symbol's order book.
pub struct OrderBook {
    symbol: Symbol,
    /// Index 0 is the best bid (highest price); strictly descending.
    bids: Vec<PriceLevel>,
    /// Index 0 is the best ask (lowest price); strictly ascending.
    asks: Vec<PriceLevel>,
    prev_top: TopOfBookSnapshot,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> OrderBook {
        OrderBook {
            symbol,
            bids: Vec::new(),
            asks: Vec::new(),
            prev_top: TopOfBookSnapshot::default(),
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Processes one `NEW_ORDER`, returning ack, trades, any top-of-book
    /// changes (in that exact order), and the resting/removal index deltas
    /// the caller must apply.
    ///
    /// The returned `Option<OrderHandle>` is the handle to insert into the
    /// engine's cancel index when the order rests with
    /// `remaining_quantity > 0`; `None` when it was fully filled
    /// immediately (a fully-filled order is never cancellable) or when it
    /// was a market order (which never rests). The returned
    /// `Vec<(user_id, user_order_id)>` lists every *passive* (resting)
    /// order that `match_aggressive` fully filled and removed from its
    /// price level — the caller must remove each from the cancel index in
    /// the same step, or a later cancel of an already-filled order would
    /// still resolve and emit a bogus ack naming this book's symbol
    /// instead of the unknown-order sentinel.
    pub fn add_order(
        &mut self,
        msg: &NewOrder,
        sequence: u64,
        limits: &EngineLimits,
    ) -> Result<(Vec<OutputMessage>, Option<OrderHandle>, Vec<(u32, u32)>), EngineError> {
        let mut outputs = Vec::new();

        outputs.push(OutputMessage::ack(msg.user_id, msg.user_order_id, self.symbol));

        let mut order = Order::new(
            msg.user_id,
            msg.user_order_id,
            self.symbol,
            msg.price,
            msg.quantity,
            msg.side,
            sequence,
        );

        let (trade_outputs, filled_passive_keys) = self.match_aggressive(&mut order, limits)?;
        outputs.extend(trade_outputs);

        let mut handle = None;
        if order.remaining_quantity > 0 && order.order_type() == crate::order::OrderType::Limit {
            handle = Some(self.insert_resting(order, limits)?);
        }

        outputs.extend(self.check_top_of_book_changes());

        Ok((outputs, handle, filled_passive_keys))
    }

    /// Cancels a resting order previously located via `handle`. Always
    /// succeeds if the handle is valid (the caller / engine index is the
    /// sole authority on whether the order still exists).
    pub fn cancel_at(&mut self, handle: OrderHandle, user_id: u32, user_order_id: u32) -> Vec<OutputMessage> {
        let mut outputs = Vec::new();

        let levels = match handle.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        if let Ok(idx) = levels.binary_search_by(|lvl| {
            let ord = lvl.price().cmp(&handle.price);
            match handle.side {
                Side::Buy => ord.reverse(),
                Side::Sell => ord,
            }
        }) {
            levels[idx].remove_by_identity(user_id, user_order_id);
            if levels[idx].is_empty() {
                levels.remove(idx);
            }
        }

        outputs.push(OutputMessage::cancel_ack(user_id, user_order_id, self.symbol));
        outputs.extend(self.check_top_of_book_changes());
        outputs
    }

    /// Clears both sides. Emits a top-of-book elimination for each side
    /// that was non-empty, per the FLUSH policy chosen in DESIGN.md (no
    /// per-order `CancelAck`s).
    pub fn flush(&mut self) -> Vec<OutputMessage> {
        self.bids.clear();
        self.asks.clear();
        self.check_top_of_book_changes()
    }

    /// `(best_bid_price, aggregate_at_best_bid, best_ask_price,
    /// aggregate_at_best_ask)`, `0/0` for an empty side.
    pub fn top_of_book(&self) -> (u32, u32, u32, u32) {
        let snap = self.snapshot();
        (snap.bid_price, snap.bid_qty, snap.ask_price, snap.ask_qty)
    }

    /// Emits both sides' top-of-book, in elimination form for an empty or
    /// missing side. Used by `TOP_OF_BOOK_QUERY`, so a querying client
    /// always gets exactly two messages back.
    pub fn top_of_book_query_outputs(&self) -> Vec<OutputMessage> {
        let snap = self.snapshot();
        vec![
            Self::tob_message(self.symbol, Side::Buy, snap.bid_price, snap.bid_qty),
            Self::tob_message(self.symbol, Side::Sell, snap.ask_price, snap.ask_qty),
        ]
    }

    fn tob_message(symbol: Symbol, side: Side, price: u32, qty: u32) -> OutputMessage {
        if price == 0 {
            OutputMessage::top_of_book_eliminated(symbol, side)
        } else {
            OutputMessage::top_of_book(symbol, side, price, qty)
        }
    }

    fn snapshot(&self) -> TopOfBookSnapshot {
        let (bid_price, bid_qty) = self
            .bids
            .first()
            .map(|lvl| (lvl.price(), lvl.aggregate_quantity() as u32))
            .unwrap_or((0, 0));
        let (ask_price, ask_qty) = self
            .asks
            .first()
            .map(|lvl| (lvl.price(), lvl.aggregate_quantity() as u32))
            .unwrap_or((0, 0));
        TopOfBookSnapshot {
            bid_price,
            bid_qty,
            ask_price,
            ask_qty,
        }
    }

    fn check_top_of_book_changes(&mut self) -> Vec<OutputMessage> {
        let mut outputs = Vec::new();
        let current = self.snapshot();

        if current.bid_price != self.prev_top.bid_price || current.bid_qty != self.prev_top.bid_qty {
            outputs.push(Self::tob_message(self.symbol, Side::Buy, current.bid_price, current.bid_qty));
        }
        if current.ask_price != self.prev_top.ask_price || current.ask_qty != self.prev_top.ask_qty {
            outputs.push(Self::tob_message(self.symbol, Side::Sell, current.ask_price, current.ask_qty));
        }

        self.prev_top = current;
        outputs
    }

    /// Price-time-priority matching of `aggressor` against the opposing
    /// side. Trades always print at the passive (resting) order's price.
    ///
    /// Returns, alongside the trade/ack outputs, the `(user_id,
    /// user_order_id)` of every passive order this call fully filled and
    /// removed from its level — the engine's cancel index must drop these
    /// in the same step that it (maybe) inserts the aggressor's own handle.
    fn match_aggressive(
        &mut self,
        aggressor: &mut Order,
        limits: &EngineLimits,
    ) -> Result<(Vec<OutputMessage>, Vec<(u32, u32)>), EngineError> {
        let mut outputs = Vec::new();
        let mut filled_passive_keys = Vec::new();
        let opposing = match aggressor.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };

        let mut iterations = 0usize;

        while aggressor.remaining_quantity > 0 && !opposing.is_empty() {
            let level_price = opposing[0].price();
            if !aggressor.can_match_against(level_price) {
                break;
            }

            {
                let level = &mut opposing[0];
                while aggressor.remaining_quantity > 0 && !level.is_empty() {
                    iterations += 1;
                    if iterations > limits.max_match_iterations {
                        return Err(EngineError::MatchIterationsExceeded {
                            max: limits.max_match_iterations,
                        });
                    }

                    let (passive_user_id, passive_order_id, fill_qty, passive_filled) = {
                        let passive = level.front_mut().expect("level just checked non-empty");
                        let fill_qty = aggressor.remaining_quantity.min(passive.remaining_quantity);
                        passive.fill(fill_qty)?;
                        (passive.user_id, passive.user_order_id, fill_qty, passive.is_filled())
                    };
                    aggressor.fill(fill_qty)?;
                    level.on_fill(fill_qty);

                    if passive_filled {
                        filled_passive_keys.push((passive_user_id, passive_order_id));
                    }

                    let (buy_user, buy_oid, sell_user, sell_oid) = match aggressor.side {
                        Side::Buy => (
                            aggressor.user_id,
                            aggressor.user_order_id,
                            passive_user_id,
                            passive_order_id,
                        ),
                        Side::Sell => (
                            passive_user_id,
                            passive_order_id,
                            aggressor.user_id,
                            aggressor.user_order_id,
                        ),
                    };
                    outputs.push(OutputMessage::trade(
                        self.symbol,
                        buy_user,
                        buy_oid,
                        sell_user,
                        sell_oid,
                        level_price,
                        fill_qty,
                    ));

                    if level.front().map(|o| o.is_filled()).unwrap_or(false) {
                        level.pop_filled_prefix();
                    }
                }
            }

            if opposing[0].is_empty() {
                opposing.remove(0);
            }
        }

        Ok((outputs, filled_passive_keys))
    }

    /// Inserts a resting limit order at its exact price (appending to an
    /// existing level) or creates a new level at the sorted position.
    fn insert_resting(&mut self, order: Order, limits: &EngineLimits) -> Result<OrderHandle, EngineError> {
        let side = order.side;
        let price = order.price;
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        // Bids are kept descending, asks ascending; `partition_point`
        // finds the first index that should *not* precede `price`.
        let pos = levels.partition_point(|lvl| match side {
            Side::Buy => lvl.price() > price,
            Side::Sell => lvl.price() < price,
        });

        if pos < levels.len() && levels[pos].price() == price {
            if levels[pos].order_count() >= limits.max_orders_per_price_level {
                return Err(EngineError::OrdersPerLevelCapacityExceeded {
                    max: limits.max_orders_per_price_level,
                });
            }
            levels[pos].append(order)?;
        } else {
            if levels.len() >= limits.max_price_levels_per_side {
                return Err(EngineError::PriceLevelCapacityExceeded {
                    max: limits.max_price_levels_per_side,
                });
            }
            let mut level = PriceLevel::new(price);
            level.append(order)?;
            levels.insert(pos, level);
        }

        Ok(OrderHandle { side, price })
    }
}
