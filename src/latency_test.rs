//! Latency and throughput measurements for the matching engine.
//!
//! Exercises `engine-core`'s `MatchingEngine`/`OrderBook` API directly,
//! using `user_id`/`user_order_id` identity and `u32` price/quantity
//! fields throughout.

use std::time::Instant;

use engine_core::{EngineLimits, InputMessage, MatchingEngine, NewOrder, OrderBook, Side, Symbol};

/// Runs the full latency test suite.
pub fn run_latency_tests() {
    println!("Matching Engine - Latency Tests\n");

    test_top_of_book_latency();
    test_order_submission_latency();
    test_order_matching_latency();
    test_cancellation_latency();
}

fn new_order(user_id: u32, user_order_id: u32, side: Side, price: u32, quantity: u32) -> InputMessage {
    InputMessage::NewOrder(NewOrder {
        user_id,
        user_order_id,
        symbol: Symbol::pack("AAPL"),
        price,
        quantity,
        side,
    })
}

/// Measures the cost of `OrderBook::top_of_book`, the zero-allocation read
/// path a real market-data poller would use (as opposed to
/// `MatchingEngine::process(TopOfBookQuery)`, which allocates an output
/// `Vec` and is meant for the wire protocol, not hot-path reads).
fn test_top_of_book_latency() {
    println!("Top-of-book read latency");

    let mut book = OrderBook::new(Symbol::pack("AAPL"));
    let limits = EngineLimits::default();
    for i in 0..100u32 {
        let ask = NewOrder {
            user_id: i,
            user_order_id: i,
            symbol: Symbol::pack("AAPL"),
            price: 10_000 + i,
            quantity: 100,
            side: Side::Sell,
        };
        book.add_order(&ask, i as u64, &limits).unwrap();
        let bid = NewOrder {
            user_id: i + 100,
            user_order_id: i + 100,
            symbol: Symbol::pack("AAPL"),
            price: 9_999 - i,
            quantity: 100,
            side: Side::Buy,
        };
        book.add_order(&bid, (i + 100) as u64, &limits).unwrap();
    }

    let iterations = 1_000_000;
    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(book.top_of_book());
    }
    let elapsed = start.elapsed();

    println!(
        "  top_of_book(): {:.2} ns/call\n",
        elapsed.as_nanos() as f64 / iterations as f64
    );
}

/// Measures submission latency for non-crossing limit orders, one fresh
/// book per sample to isolate the insertion cost from prior fills.
fn test_order_submission_latency() {
    println!("Order submission latency (non-crossing)");

    let iterations = 10_000;
    let mut total_ns = 0u128;

    for i in 0..iterations {
        let mut engine = MatchingEngine::new(EngineLimits::default());
        let order = new_order(1, i as u32, Side::Buy, 10_000 - i as u32, 100);

        let start = Instant::now();
        std::hint::black_box(engine.process(order).unwrap());
        total_ns += start.elapsed().as_nanos();
    }

    let avg_ns = total_ns as f64 / iterations as f64;
    println!("  Average: {:.2} ns", avg_ns);
    println!("  Throughput: {:.0} orders/second\n", 1_000_000_000.0 / avg_ns);
}

/// Measures the cost of a crossing order that sweeps multiple resting
/// price levels.
fn test_order_matching_latency() {
    println!("Order matching latency (crossing through 10 levels)");

    let iterations = 1_000;
    let mut total_ns = 0u128;

    for i in 0..iterations {
        let mut engine = MatchingEngine::new(EngineLimits::default());
        for j in 0..10u32 {
            engine.process(new_order(1, j, Side::Sell, 10_000 + j, 100)).unwrap();
        }

        let crossing = new_order(2, 1000 + i as u32, Side::Buy, 10_005, 500);
        let start = Instant::now();
        let outputs = engine.process(crossing).unwrap();
        total_ns += start.elapsed().as_nanos();
        std::hint::black_box(outputs);
    }

    println!("  Average: {:.2} ns\n", total_ns as f64 / iterations as f64);
}

/// Measures cancel latency for a resting order found via the engine's
/// `(user_id, user_order_id)` index.
fn test_cancellation_latency() {
    println!("Cancellation latency");

    let iterations = 10_000;
    let mut total_ns = 0u128;

    for i in 0..iterations {
        let mut engine = MatchingEngine::new(EngineLimits::default());
        engine.process(new_order(1, i as u32, Side::Buy, 10_000, 100)).unwrap();

        let cancel = InputMessage::Cancel(engine_core::Cancel {
            user_id: 1,
            user_order_id: i as u32,
        });
        let start = Instant::now();
        let outputs = engine.process(cancel).unwrap();
        total_ns += start.elapsed().as_nanos();
        std::hint::black_box(outputs);
    }

    println!("  Average: {:.2} ns\n", total_ns as f64 / iterations as f64);
}

/// Runs a fixed-duration sustained-throughput test with a mixed workload:
/// 25% each of non-crossing bids, non-crossing asks, crossing bids, and
/// crossing asks.
pub fn run_throughput_test(duration: std::time::Duration) {
    println!("Sustained throughput test ({:.0}s)", duration.as_secs_f64());

    let mut engine = MatchingEngine::new(EngineLimits::default());
    let mut order_id = 1u32;
    let mut orders_processed = 0u64;
    let mut trades_executed = 0u64;

    let start_time = Instant::now();
    while start_time.elapsed() < duration {
        let outputs = match order_id % 4 {
            0 => engine
                .process(new_order(1, order_id, Side::Buy, 9_999 - (order_id % 100), 100))
                .unwrap(),
            1 => engine
                .process(new_order(2, order_id, Side::Sell, 10_001 + (order_id % 100), 100))
                .unwrap(),
            2 => engine.process(new_order(3, order_id, Side::Buy, 10_001, 50)).unwrap(),
            3 => engine.process(new_order(4, order_id, Side::Sell, 9_999, 50)).unwrap(),
            _ => unreachable!(),
        };
        trades_executed += outputs
            .iter()
            .filter(|m| matches!(m, engine_core::OutputMessage::Trade(_)))
            .count() as u64;

        order_id += 1;
        orders_processed += 1;
    }

    let elapsed = start_time.elapsed();
    println!("  Duration: {:.1}s", elapsed.as_secs_f64());
    println!("  Orders processed: {orders_processed}");
    println!("  Trades executed: {trades_executed}");
    println!(
        "  Order throughput: {:.0} orders/second",
        orders_processed as f64 / elapsed.as_secs_f64()
    );
    println!(
        "  Trade throughput: {:.0} trades/second\n",
        trades_executed as f64 / elapsed.as_secs_f64()
    );
}
