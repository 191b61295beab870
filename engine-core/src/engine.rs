//! The matching engine: a registry of per-symbol order books plus the
//! cross-symbol `(user_id, user_order_id) -> location` index that lets a
//! `Cancel` find its order without knowing the symbol.
//!
//! A plain `HashMap<Symbol, OrderBook>` is enough here since the engine
//! runs on a single dedicated thread and has no need for interior
//! mutability or concurrent access from multiple callers.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::EngineError;
use crate::limits::EngineLimits;
use crate::messages::{InputMessage, OutputMessage};
use crate::order_book::{OrderBook, OrderHandle};
use crate::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct OrderKey {
    user_id: u32,
    user_order_id: u32,
}

struct IndexEntry {
    symbol: Symbol,
    handle: OrderHandle,
}

/// Owns every symbol's order book and assigns the monotonic sequence number
/// that establishes time priority across the whole engine.
pub struct MatchingEngine {
    limits: EngineLimits,
    books: HashMap<Symbol, OrderBook>,
    index: HashMap<OrderKey, IndexEntry>,
    next_sequence: u64,
}

impl MatchingEngine {
    pub fn new(limits: EngineLimits) -> MatchingEngine {
        MatchingEngine {
            limits,
            books: HashMap::new(),
            index: HashMap::new(),
            next_sequence: 1,
        }
    }

    /// Looks up a symbol's book, creating it (subject to
    /// `max_symbols`) on first reference. A book is created lazily on the
    /// first `NewOrder` or `TopOfBookQuery` that names it; `Cancel` never
    /// creates one, since it can only ever resolve an existing resting
    /// order.
    fn book_mut(&mut self, symbol: Symbol) -> Result<&mut OrderBook, EngineError> {
        if !self.books.contains_key(&symbol) {
            if self.books.len() >= self.limits.max_symbols {
                warn!(max = self.limits.max_symbols, "symbol registry full; refusing new book");
                return Err(EngineError::SymbolCapacityExceeded {
                    max: self.limits.max_symbols,
                });
            }
            info!(symbol = symbol.as_u64(), "registering new symbol book");
            self.books.insert(symbol, OrderBook::new(symbol));
        }
        Ok(self.books.get_mut(&symbol).expect("just inserted"))
    }

    /// Explicitly registers `symbol`'s book, subject to `max_symbols`.
    /// Idempotent: registering a symbol that already has a book is a no-op.
    /// `NewOrder`/`TopOfBookQuery` register their symbol lazily on first
    /// use; this lets a caller pre-warm a known symbol list (or simply
    /// reserve its slot against the cap) ahead of the first order.
    pub fn register_symbol(&mut self, symbol: Symbol) -> Result<(), EngineError> {
        self.book_mut(symbol)?;
        Ok(())
    }

    /// Dispatches one admitted message, returning the output messages in
    /// wire order: ack/cancel-ack first, then trades in match order, then
    /// zero, one, or two top-of-book updates.
    pub fn process(&mut self, message: InputMessage) -> Result<Vec<OutputMessage>, EngineError> {
        match message {
            InputMessage::NewOrder(new_order) => self.process_new_order(new_order),
            InputMessage::Cancel(cancel) => Ok(self.process_cancel(cancel)),
            InputMessage::Flush => Ok(self.process_flush()),
            InputMessage::TopOfBookQuery(query) => self.process_top_of_book_query(query),
        }
    }

    fn process_new_order(
        &mut self,
        new_order: crate::messages::NewOrder,
    ) -> Result<Vec<OutputMessage>, EngineError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let symbol = new_order.symbol;
        let key = OrderKey {
            user_id: new_order.user_id,
            user_order_id: new_order.user_order_id,
        };

        let book = self.book_mut(symbol)?;
        let (outputs, handle, filled_passive_keys) = book.add_order(&new_order, sequence, &self.limits)?;

        for (user_id, user_order_id) in filled_passive_keys {
            self.index.remove(&OrderKey { user_id, user_order_id });
        }

        if let Some(handle) = handle {
            self.index.insert(key, IndexEntry { symbol, handle });
        }

        Ok(outputs)
    }

    fn process_cancel(&mut self, cancel: crate::messages::Cancel) -> Vec<OutputMessage> {
        let key = OrderKey {
            user_id: cancel.user_id,
            user_order_id: cancel.user_order_id,
        };

        match self.index.remove(&key) {
            Some(entry) => {
                let book = self
                    .books
                    .get_mut(&entry.symbol)
                    .expect("index entry always names a live book");
                book.cancel_at(entry.handle, cancel.user_id, cancel.user_order_id)
            }
            None => vec![OutputMessage::cancel_ack(
                cancel.user_id,
                cancel.user_order_id,
                Symbol::UNKNOWN,
            )],
        }
    }

    fn process_flush(&mut self) -> Vec<OutputMessage> {
        info!(symbols = self.books.len(), "flushing every book");
        self.index.clear();
        let mut outputs = Vec::new();
        let mut symbols: Vec<Symbol> = self.books.keys().copied().collect();
        symbols.sort_by_key(|s| s.as_u64());
        for symbol in symbols {
            let book = self.books.get_mut(&symbol).expect("collected from books");
            outputs.extend(book.flush());
        }
        outputs
    }

    fn process_top_of_book_query(
        &mut self,
        query: crate::messages::TopOfBookQuery,
    ) -> Result<Vec<OutputMessage>, EngineError> {
        let book = self.book_mut(query.symbol)?;
        Ok(book.top_of_book_query_outputs())
    }
}
