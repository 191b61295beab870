use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine_core::{EngineLimits, InputMessage, MatchingEngine, NewOrder, Side, Symbol};

fn order(user: u32, symbol: Symbol, side: Side, price: u32, qty: u32) -> InputMessage {
    InputMessage::NewOrder(NewOrder {
        user_id: user,
        user_order_id: user,
        symbol,
        price,
        quantity: qty,
        side,
    })
}

fn bench_order_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_submission");
    let symbol = Symbol::pack("AAPL");

    for &num_orders in [100u32, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("non_crossing_orders", num_orders),
            &num_orders,
            |b, &num_orders| {
                b.iter(|| {
                    let mut engine = MatchingEngine::new(EngineLimits::default());
                    for i in 0..num_orders {
                        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                        let price = if i % 2 == 0 { 10_000 - i } else { 10_100 + i };
                        black_box(engine.process(order(i, symbol, side, price, 100)).unwrap());
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_order_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_matching");
    let symbol = Symbol::pack("AAPL");

    for &depth in [10u32, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("crossing_orders", depth), &depth, |b, &depth| {
            b.iter_batched(
                || {
                    let mut engine = MatchingEngine::new(EngineLimits::default());
                    for i in 0..depth {
                        engine
                            .process(order(i, symbol, Side::Sell, 10_000 + i, 100))
                            .unwrap();
                        engine
                            .process(order(i + depth, symbol, Side::Buy, 9_999 - i, 100))
                            .unwrap();
                    }
                    engine
                },
                |mut engine| {
                    black_box(
                        engine
                            .process(order(depth * 2, symbol, Side::Buy, 10_000 + depth, depth * 50))
                            .unwrap(),
                    )
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_order_submission, bench_order_matching);
criterion_main!(benches);
