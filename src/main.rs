//! Matching engine performance lab.
//!
//! Runs the latency/throughput test suite followed by a small scripted
//! demo of order placement, matching, and trade execution.

use engine_core::{EngineLimits, InputMessage, MatchingEngine, NewOrder, OutputMessage, Side, Symbol};

mod latency_test;

fn main() {
    println!("=== Matching Engine Performance Lab ===\n");

    latency_test::run_latency_tests();
    latency_test::run_throughput_test(std::time::Duration::from_secs(10));

    println!("=== Basic Demo ===");
    run_basic_demo();
}

/// Demonstrates order placement and matching against a fresh engine.
fn run_basic_demo() {
    let mut engine = MatchingEngine::new(EngineLimits::default());
    let symbol = Symbol::pack("AAPL");

    let ask = InputMessage::NewOrder(NewOrder {
        user_id: 1,
        user_order_id: 1,
        symbol,
        price: 15_000,
        quantity: 100,
        side: Side::Sell,
    });
    println!("Submitting ask: 100 @ 15000");
    for out in engine.process(ask).unwrap() {
        print_output(&out);
    }

    let bid = InputMessage::NewOrder(NewOrder {
        user_id: 2,
        user_order_id: 1,
        symbol,
        price: 14_950,
        quantity: 50,
        side: Side::Buy,
    });
    println!("Submitting bid: 50 @ 14950 (below the ask, rests)");
    for out in engine.process(bid).unwrap() {
        print_output(&out);
    }

    let crossing_bid = InputMessage::NewOrder(NewOrder {
        user_id: 3,
        user_order_id: 1,
        symbol,
        price: 15_000,
        quantity: 75,
        side: Side::Buy,
    });
    println!("Submitting crossing bid: 75 @ 15000 (partial fill of the resting ask)");
    for out in engine.process(crossing_bid).unwrap() {
        print_output(&out);
    }
}

fn print_output(out: &OutputMessage) {
    match out {
        OutputMessage::Ack(a) => println!("  ACK user={} order={}", a.user_id, a.user_order_id),
        OutputMessage::CancelAck(x) => println!("  CANCEL_ACK user={} order={}", x.user_id, x.user_order_id),
        OutputMessage::Trade(t) => println!(
            "  TRADE {} shares @ {} (buy user={} order={}, sell user={} order={})",
            t.quantity, t.price, t.buy_user_id, t.buy_user_order_id, t.sell_user_id, t.sell_user_order_id
        ),
        OutputMessage::TopOfBook(b) if b.eliminated => println!("  TOB {:?} side eliminated", b.side),
        OutputMessage::TopOfBook(b) => println!("  TOB {:?}: {} @ {}", b.side, b.quantity, b.price),
    }
}
