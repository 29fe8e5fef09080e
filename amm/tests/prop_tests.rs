use proptest::prelude::*;

use tally_amm::{AmmError, AmmParams, LiquidityPoolEngine};
use tally_ledger::{InMemoryLedger, TokenLedger};
use tally_types::{AccountId, PoolId, Timestamp, TokenId};

const FUNDING: u128 = 1_000_000_000_000;

fn setup(fee_bps: u32) -> (LiquidityPoolEngine, InMemoryLedger) {
    let params = AmmParams {
        default_fee_bps: fee_bps,
        ratio_tolerance_bps: 10_000,
        ..AmmParams::default()
    };
    let engine = LiquidityPoolEngine::new(params, AccountId::new("gov"));
    let mut ledger = InMemoryLedger::new();
    let minter = AccountId::new("mint");
    for token in ["A", "B"] {
        let token = TokenId::new(token);
        ledger.authorize_minter(&token, &minter);
        for who in ["lp0", "lp1", "lp2", "trader"] {
            ledger.mint(&minter, &AccountId::new(who), &token, FUNDING).unwrap();
        }
    }
    (engine, ledger)
}

fn pair() -> PoolId {
    PoolId::new("A", "B")
}

proptest! {
    /// A completed swap never decreases reserve_a * reserve_b, and strictly
    /// increases it whenever a fee was taken.
    #[test]
    fn swaps_never_decrease_k(
        fee_bps in 0u32..1_000,
        reserve_a in 1_000u128..1_000_000_000,
        reserve_b in 1_000u128..1_000_000_000,
        swaps in prop::collection::vec((1u128..10_000_000, any::<bool>()), 1..20),
    ) {
        let (mut engine, mut ledger) = setup(fee_bps);
        let lp = AccountId::new("lp0");
        let trader = AccountId::new("trader");
        engine
            .add_liquidity(&mut ledger, &lp, &pair(), reserve_a, reserve_b, Timestamp::EPOCH)
            .unwrap();

        for (amount_in, input_is_a) in swaps {
            let (a0, b0) = engine.get_reserves(&pair()).unwrap();
            match engine.swap(&mut ledger, &trader, &pair(), amount_in, input_is_a, None) {
                Ok(receipt) => {
                    let (a1, b1) = engine.get_reserves(&pair()).unwrap();
                    let (k0, k1) = (a0 * b0, a1 * b1);
                    if fee_bps > 0 {
                        prop_assert!(receipt.fee_amount > 0);
                        prop_assert!(k1 > k0, "k did not grow with fee: {} -> {}", k0, k1);
                    } else {
                        prop_assert!(k1 >= k0, "k decreased: {} -> {}", k0, k1);
                    }
                    prop_assert_eq!((a1, b1), (receipt.reserve_a, receipt.reserve_b));
                }
                Err(AmmError::InsufficientLiquidity(_)) => {
                    prop_assert_eq!(engine.get_reserves(&pair()).unwrap(), (a0, b0));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }

    /// Provider shares always sum to total_shares, and custody holds the reserves.
    #[test]
    fn share_sum_matches_total(
        ops in prop::collection::vec((0usize..3, any::<bool>(), 1u128..1_000_000), 1..30),
    ) {
        let (mut engine, mut ledger) = setup(30);
        let providers: Vec<AccountId> =
            (0..3).map(|i| AccountId::new(format!("lp{i}"))).collect();
        let first = &providers[0];
        engine
            .add_liquidity(&mut ledger, first, &pair(), 1_000_000, 2_000_000, Timestamp::EPOCH)
            .unwrap();

        for (who, deposit, size) in ops {
            let provider = &providers[who];
            if deposit {
                let _ = engine.add_liquidity(
                    &mut ledger,
                    provider,
                    &pair(),
                    size,
                    size * 2,
                    Timestamp::EPOCH,
                );
            } else {
                let held = engine.shares_of(&pair(), provider);
                let burn = size.min(held);
                if burn > 0 {
                    let _ = engine.remove_liquidity(&mut ledger, provider, &pair(), burn);
                }
            }
            let pool = engine.pool(&pair()).unwrap();
            prop_assert!(pool.shares_consistent());

            let custody = pair().custody_account();
            prop_assert_eq!(ledger.balance_of(&custody, &TokenId::new("A")), pool.reserve_a);
            prop_assert_eq!(ledger.balance_of(&custody, &TokenId::new("B")), pool.reserve_b);
        }
    }

    /// Quoting never mutates, and a swap delivers exactly the quoted output.
    #[test]
    fn quote_matches_swap(
        fee_bps in 0u32..1_000,
        amount_in in 1_000u128..1_000_000,
        input_is_a in any::<bool>(),
    ) {
        let (mut engine, mut ledger) = setup(fee_bps);
        let lp = AccountId::new("lp0");
        engine
            .add_liquidity(&mut ledger, &lp, &pair(), 5_000_000, 7_000_000, Timestamp::EPOCH)
            .unwrap();
        let quote = engine.quote(&pair(), amount_in, input_is_a).unwrap();
        prop_assert_eq!(engine.get_reserves(&pair()).unwrap(), (5_000_000, 7_000_000));

        let receipt = engine
            .swap(&mut ledger, &AccountId::new("trader"), &pair(), amount_in, input_is_a, None)
            .unwrap();
        prop_assert_eq!(receipt.amount_out, quote.amount_out);
        prop_assert_eq!(receipt.fee_amount + quote.effective_in, amount_in);
    }
}
