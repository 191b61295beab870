//! The resting/aggressing order record.
//!
//! Orders are pure data: they don't know which book or price level they
//! live in. A `Symbol` is attached for convenience when an order is looked
//! up by `(user_id, user_order_id)` alone, but matching itself always
//! happens within a single `OrderBook` that already knows its own symbol.

use crate::error::EngineError;
use crate::symbol::Symbol;

/// Which side of the book an order rests on or aggresses against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Whether an order is a resting limit order or a sweep-and-discard market
/// order. Always derived from `price`: never set independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderType {
    Limit,
    Market,
}

/// A single order admitted to the engine.
///
/// `sequence` is assigned once, by the `MatchingEngine`, at admission time
/// and never changes; it is the sole source of time priority, since all
/// orders at a level are already in arrival order (the engine is
/// single-threaded, so appends happen in sequence order for free).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub user_id: u32,
    pub user_order_id: u32,
    pub symbol: Symbol,
    pub price: u32,
    pub original_quantity: u32,
    pub remaining_quantity: u32,
    pub side: Side,
    pub sequence: u64,
}

impl Order {
    /// Constructs a new, fully-unfilled order. `order_type()` derives from
    /// `price` rather than being stored separately.
    pub fn new(
        user_id: u32,
        user_order_id: u32,
        symbol: Symbol,
        price: u32,
        quantity: u32,
        side: Side,
        sequence: u64,
    ) -> Order {
        Order {
            user_id,
            user_order_id,
            symbol,
            price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            side,
            sequence,
        }
    }

    /// `LIMIT` iff `price > 0`.
    pub fn order_type(&self) -> OrderType {
        if self.price > 0 {
            OrderType::Limit
        } else {
            OrderType::Market
        }
    }

    /// Decrements `remaining_quantity` by `n` and returns the amount filled.
    ///
    /// Requires `0 < n <= remaining_quantity`; the matching loop never
    /// offers more than `min(aggressor.remaining, passive.remaining)`, so
    /// this can never be violated by a correct caller. Checked (not
    /// `debug_assert!`) since a violation here would silently wrap
    /// `remaining_quantity` in a release build instead of failing loudly.
    pub fn fill(&mut self, n: u32) -> Result<u32, EngineError> {
        if n == 0 || n > self.remaining_quantity {
            return Err(EngineError::InvariantViolation {
                detail: format!(
                    "fill({n}) invalid for order {}/{} with {} remaining",
                    self.user_id, self.user_order_id, self.remaining_quantity
                ),
            });
        }
        self.remaining_quantity -= n;
        Ok(n)
    }

    /// Whether this order can trade against a passive order resting at
    /// `passive_price`. Market orders always can; limit orders require the
    /// price to not be worse than the passive order's price.
    pub fn can_match_against(&self, passive_price: u32) -> bool {
        match self.order_type() {
            OrderType::Market => true,
            OrderType::Limit => match self.side {
                Side::Buy => self.price >= passive_price,
                Side::Sell => self.price <= passive_price,
            },
        }
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(price: u32, qty: u32, side: Side) -> Order {
        Order::new(1, 1, Symbol::pack("IBM"), price, qty, side, 1)
    }

    #[test]
    fn market_order_has_zero_price() {
        let o = order(0, 10, Side::Buy);
        assert_eq!(o.order_type(), OrderType::Market);
    }

    #[test]
    fn limit_order_has_nonzero_price() {
        let o = order(100, 10, Side::Sell);
        assert_eq!(o.order_type(), OrderType::Limit);
    }

    #[test]
    fn fill_decrements_remaining_and_returns_amount() {
        let mut o = order(100, 50, Side::Buy);
        assert_eq!(o.fill(20).unwrap(), 20);
        assert_eq!(o.remaining_quantity, 30);
        assert!(!o.is_filled());
        assert_eq!(o.fill(30).unwrap(), 30);
        assert!(o.is_filled());
    }

    #[test]
    fn fill_beyond_remaining_is_an_invariant_violation() {
        let mut o = order(100, 10, Side::Buy);
        assert!(o.fill(11).is_err());
    }

    #[test]
    fn fill_of_zero_is_an_invariant_violation() {
        let mut o = order(100, 10, Side::Buy);
        assert!(o.fill(0).is_err());
    }

    #[test]
    fn market_order_always_matches() {
        let o = order(0, 10, Side::Buy);
        assert!(o.can_match_against(1_000_000));
        let o = order(0, 10, Side::Sell);
        assert!(o.can_match_against(1));
    }

    #[test]
    fn limit_buy_matches_only_at_or_below_its_price() {
        let o = order(100, 10, Side::Buy);
        assert!(o.can_match_against(100));
        assert!(o.can_match_against(99));
        assert!(!o.can_match_against(101));
    }

    #[test]
    fn limit_sell_matches_only_at_or_above_its_price() {
        let o = order(100, 10, Side::Sell);
        assert!(o.can_match_against(100));
        assert!(o.can_match_against(101));
        assert!(!o.can_match_against(99));
    }
}
