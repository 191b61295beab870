//! Hard caps enforced as invariant violations.
//!
//! These exist purely for safety: a correctly-sized deployment should never
//! come close to them. Any request that would exceed one is treated as a
//! fatal invariant violation, not a recoverable/backpressure condition.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_symbols: usize,
    pub max_price_levels_per_side: usize,
    pub max_orders_per_price_level: usize,
    pub max_match_iterations: usize,
}

impl Default for EngineLimits {
    fn default() -> EngineLimits {
        EngineLimits {
            max_symbols: 4_096,
            max_price_levels_per_side: 8_192,
            max_orders_per_price_level: 65_536,
            max_match_iterations: 1_000_000,
        }
    }
}
