use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

use exchange_server::domains::cex::engine::{Matcher, SettlementCoordinator};
use exchange_server::domains::cex::models::{Order, OrderSide, OrderStatus};

#[path = "../tests/common/mod.rs"]
mod bench_common;

use bench_common::{create_user, place, setup_test};

const BOOK_SIZES: [usize; 3] = [100, 1_000, 10_000];

/// 가격이 겹치는 오더북 생성 (매수 95~104, 매도 96~105)
fn crossing_book(size: usize) -> (Vec<Order>, Vec<Order>) {
    let base = Utc::now() - Duration::hours(1);
    let make = |id: usize, side: OrderSide, price: i64| Order {
        id: id as u64,
        user_id: (id % 50) as u64,
        side,
        asset: "BTC".to_string(),
        price: Decimal::new(price, 0),
        quantity: Decimal::new((id % 7 + 1) as i64, 1),
        status: OrderStatus::Open,
        created_at: base + Duration::milliseconds(id as i64),
        updated_at: base,
        completed_at: None,
        deleted_at: None,
    };

    let buys = (0..size).map(|i| make(i * 2, OrderSide::Buy, 95 + (i % 10) as i64)).collect();
    let sells = (0..size).map(|i| make(i * 2 + 1, OrderSide::Sell, 96 + (i % 10) as i64)).collect();
    (buys, sells)
}

fn bench_match_orders(c: &mut Criterion) {
    let matcher = Matcher::new();
    let mut group = c.benchmark_group("match_orders");

    for &size in BOOK_SIZES.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || crossing_book(size),
                |(buys, sells)| black_box(matcher.match_orders(buys, sells, Utc::now())),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// 메모리 저장소에서 정산 사이클 전체 (매칭 + 잔고 + 잠금)
fn bench_settlement_cycle(c: &mut Criterion) {
    let rt = Runtime::new().expect("Failed to create Tokio runtime");
    let mut group = c.benchmark_group("settlement_cycle");
    group.sample_size(20);

    for &pairs in [10usize, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(pairs), &pairs, |b, &pairs| {
            b.iter_batched(
                || {
                    rt.block_on(async {
                        let (store, state) = setup_test();
                        for i in 0..pairs {
                            let buyer = create_user(&state, 0, 10_000).await;
                            let seller = create_user(&state, 100, 0).await;
                            let price = 100 + (i % 5) as i64;
                            place(&state, buyer, "buy", price, 2).await;
                            place(&state, seller, "sell", price, 2).await;
                        }
                        SettlementCoordinator::new(store)
                    })
                },
                |coordinator| {
                    rt.block_on(async {
                        black_box(coordinator.process_transactions().await.expect("cycle failed"))
                    })
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_match_orders, bench_settlement_cycle);
criterion_main!(benches);
