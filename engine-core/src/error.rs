//! Typed engine errors.
//!
//! One variant per failure kind, with structured fields instead of
//! free-text messages. Every variant here is a fatal invariant violation:
//! the engine thread logs it and panics. Recoverable conditions (unknown
//! cancel target, queue backpressure, wire-decode errors) are *not*
//! represented here — they are handled locally where they occur and never
//! reach this type.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("order remaining quantity exceeds original: {detail}")]
    InvariantViolation { detail: String },

    #[error("symbol capacity exceeded: at most {max} symbols may be registered")]
    SymbolCapacityExceeded { max: usize },

    #[error("price level capacity exceeded on one side: at most {max} levels")]
    PriceLevelCapacityExceeded { max: usize },

    #[error("orders-per-level capacity exceeded: at most {max} orders at one price")]
    OrdersPerLevelCapacityExceeded { max: usize },

    #[error("matching loop exceeded {max} iterations without converging")]
    MatchIterationsExceeded { max: usize },
}
