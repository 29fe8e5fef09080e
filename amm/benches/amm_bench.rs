use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tally_amm::{AmmParams, LiquidityPoolEngine, Pool};
use tally_ledger::{InMemoryLedger, TokenLedger};
use tally_types::{AccountId, PoolId, Timestamp, TokenId};

fn seeded_engine(reserve: u128) -> (LiquidityPoolEngine, InMemoryLedger) {
    let mut engine = LiquidityPoolEngine::new(AmmParams::default(), AccountId::new("gov"));
    let mut ledger = InMemoryLedger::new();
    let minter = AccountId::new("mint");
    for token in ["A", "B"] {
        let token = TokenId::new(token);
        ledger.authorize_minter(&token, &minter);
        ledger.mint(&minter, &AccountId::new("lp"), &token, reserve).unwrap();
        ledger.mint(&minter, &AccountId::new("trader"), &token, u64::MAX as u128).unwrap();
    }
    engine
        .add_liquidity(
            &mut ledger,
            &AccountId::new("lp"),
            &PoolId::new("A", "B"),
            reserve,
            reserve,
            Timestamp::EPOCH,
        )
        .unwrap();
    (engine, ledger)
}

fn bench_quote(c: &mut Criterion) {
    let mut group = c.benchmark_group("amm_quote");

    for reserve in [1_000u128, 1_000_000, 1_000_000_000_000] {
        let (engine, _) = seeded_engine(reserve);
        let pool: &Pool = engine.pool(&PoolId::new("A", "B")).unwrap();

        group.bench_with_input(BenchmarkId::new("quote_swap", reserve), &reserve, |b, _| {
            b.iter(|| black_box(pool.quote_swap(black_box(reserve / 100), black_box(true))));
        });
    }

    group.finish();
}

fn bench_swap_round_trip(c: &mut Criterion) {
    let pool_id = PoolId::new("A", "B");
    let trader = AccountId::new("trader");
    let (mut engine, mut ledger) = seeded_engine(1_000_000_000_000);

    c.bench_function("amm_swap_alternating", |b| {
        let mut input_is_a = true;
        b.iter(|| {
            let receipt = engine
                .swap(&mut ledger, &trader, &pool_id, black_box(1_000_000), input_is_a, None)
                .unwrap();
            input_is_a = !input_is_a;
            black_box(receipt)
        });
    });
}

fn bench_add_liquidity(c: &mut Criterion) {
    let pool_id = PoolId::new("A", "B");
    let provider = AccountId::new("trader");
    let (mut engine, mut ledger) = seeded_engine(1_000_000_000_000);

    c.bench_function("amm_add_liquidity", |b| {
        b.iter(|| {
            black_box(
                engine
                    .add_liquidity(&mut ledger, &provider, &pool_id, 1_000, 1_000, Timestamp::EPOCH)
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_quote, bench_swap_round_trip, bench_add_liquidity);
criterion_main!(benches);
