//! Liquidity pool engine.

use crate::error::AmmError;
use crate::params::AmmParams;
use crate::pool::{Pool, Redemption, SwapQuote};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_ledger::{LedgerOp, TokenLedger};
use tally_types::{AccountId, Amount, BasisPoints, PoolId, Timestamp, TokenId};

/// Result of a completed swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub pool: PoolId,
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: Amount,
    pub fee_amount: Amount,
    pub amount_out: Amount,
    pub reserve_a: Amount,
    pub reserve_b: Amount,
}

/// Owns every pool and moves reserves through the token ledger.
///
/// Each mutating operation prices the change against a read-only view of the
/// pool, submits one ledger batch, and writes the pool only if the batch
/// succeeded. A rejected batch therefore leaves pools untouched.
pub struct LiquidityPoolEngine {
    pools: BTreeMap<PoolId, Pool>,
    params: AmmParams,
    /// Only this account may change pool fees.
    fee_authority: AccountId,
}

impl LiquidityPoolEngine {
    pub fn new(params: AmmParams, fee_authority: AccountId) -> Self {
        Self {
            pools: BTreeMap::new(),
            params,
            fee_authority,
        }
    }

    pub fn params(&self) -> &AmmParams {
        &self.params
    }

    pub fn fee_authority(&self) -> &AccountId {
        &self.fee_authority
    }

    pub fn pool(&self, pool_id: &PoolId) -> Option<&Pool> {
        self.pools.get(pool_id)
    }

    /// All pools, ordered by id.
    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    /// Replace the pool table, e.g. when restoring a snapshot.
    pub fn restore_pools(&mut self, pools: impl IntoIterator<Item = Pool>) {
        self.pools = pools.into_iter().map(|p| (p.id.clone(), p)).collect();
    }

    pub fn get_reserves(&self, pool_id: &PoolId) -> Result<(Amount, Amount), AmmError> {
        let pool = self.existing(pool_id)?;
        Ok((pool.reserve_a, pool.reserve_b))
    }

    pub fn shares_of(&self, pool_id: &PoolId, provider: &AccountId) -> Amount {
        self.pools
            .get(pool_id)
            .map(|p| p.shares_of(provider))
            .unwrap_or(0)
    }

    /// Preview a swap without moving anything.
    pub fn quote(
        &self,
        pool_id: &PoolId,
        amount_in: Amount,
        input_is_a: bool,
    ) -> Result<SwapQuote, AmmError> {
        self.existing(pool_id)?.quote_swap(amount_in, input_is_a)
    }

    /// Deposit both tokens and mint pool shares. The first deposit creates
    /// the pool and sets its price.
    pub fn add_liquidity<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        provider: &AccountId,
        pool_id: &PoolId,
        amount_a: Amount,
        amount_b: Amount,
        now: Timestamp,
    ) -> Result<Amount, AmmError> {
        if pool_id.is_degenerate() {
            return Err(AmmError::IdenticalTokens(pool_id.clone()));
        }

        let fresh;
        let pool = match self.pools.get(pool_id) {
            Some(pool) => pool,
            None => {
                fresh = Pool::new(pool_id.clone(), self.params.default_fee_bps, now);
                &fresh
            }
        };
        let plan = pool.plan_deposit(amount_a, amount_b, self.params.ratio_tolerance_bps)?;

        let custody = pool_id.custody_account();
        ledger.apply_batch(&[
            LedgerOp::Transfer {
                from: provider.clone(),
                to: custody.clone(),
                token: pool_id.token_a.clone(),
                amount: amount_a,
            },
            LedgerOp::Transfer {
                from: provider.clone(),
                to: custody,
                token: pool_id.token_b.clone(),
                amount: amount_b,
            },
        ])?;

        let default_fee = self.params.default_fee_bps;
        let pool = self
            .pools
            .entry(pool_id.clone())
            .or_insert_with(|| Pool::new(pool_id.clone(), default_fee, now));
        pool.commit_deposit(provider, &plan);

        if plan.bootstrap {
            tracing::info!(
                pool = %pool_id,
                provider = %provider,
                reserve_a = plan.reserve_a,
                reserve_b = plan.reserve_b,
                shares = plan.shares,
                "pool bootstrapped"
            );
        } else {
            tracing::debug!(
                pool = %pool_id,
                provider = %provider,
                shares = plan.shares,
                total_shares = plan.total_shares,
                "liquidity added"
            );
        }
        Ok(plan.shares)
    }

    /// Burn `shares` and return the proportional reserves to `provider`.
    pub fn remove_liquidity<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        provider: &AccountId,
        pool_id: &PoolId,
        shares: Amount,
    ) -> Result<Redemption, AmmError> {
        let redemption = self.existing(pool_id)?.plan_redemption(provider, shares)?;

        let custody = pool_id.custody_account();
        let ops: Vec<LedgerOp> = [
            (&pool_id.token_a, redemption.amount_a),
            (&pool_id.token_b, redemption.amount_b),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .map(|(token, amount)| LedgerOp::Transfer {
            from: custody.clone(),
            to: provider.clone(),
            token: token.clone(),
            amount,
        })
        .collect();
        ledger.apply_batch(&ops)?;

        let pool = self.existing_mut(pool_id)?;
        pool.commit_redemption(provider, shares, &redemption);
        tracing::debug!(
            pool = %pool_id,
            provider = %provider,
            shares,
            amount_a = redemption.amount_a,
            amount_b = redemption.amount_b,
            "liquidity removed"
        );
        Ok(redemption)
    }

    /// Swap `amount_in` of one side for the other.
    pub fn swap<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        trader: &AccountId,
        pool_id: &PoolId,
        amount_in: Amount,
        input_is_a: bool,
        min_amount_out: Option<Amount>,
    ) -> Result<SwapReceipt, AmmError> {
        let quote = self.existing(pool_id)?.quote_swap(amount_in, input_is_a)?;
        if let Some(min_amount_out) = min_amount_out {
            if quote.amount_out < min_amount_out {
                return Err(AmmError::SlippageExceeded {
                    amount_out: quote.amount_out,
                    min_amount_out,
                });
            }
        }

        let (token_in, token_out) = if input_is_a {
            (pool_id.token_a.clone(), pool_id.token_b.clone())
        } else {
            (pool_id.token_b.clone(), pool_id.token_a.clone())
        };
        let custody = pool_id.custody_account();
        ledger.apply_batch(&[
            LedgerOp::Transfer {
                from: trader.clone(),
                to: custody.clone(),
                token: token_in.clone(),
                amount: amount_in,
            },
            LedgerOp::Transfer {
                from: custody,
                to: trader.clone(),
                token: token_out.clone(),
                amount: quote.amount_out,
            },
        ])?;

        self.existing_mut(pool_id)?.commit_swap(&quote);
        tracing::debug!(
            pool = %pool_id,
            trader = %trader,
            amount_in,
            amount_out = quote.amount_out,
            fee = quote.fee_amount,
            "swap executed"
        );
        Ok(SwapReceipt {
            pool: pool_id.clone(),
            token_in,
            token_out,
            amount_in,
            fee_amount: quote.fee_amount,
            amount_out: quote.amount_out,
            reserve_a: quote.reserve_a,
            reserve_b: quote.reserve_b,
        })
    }

    /// Change a pool's fee. Returns the previous fee.
    pub fn set_fee(
        &mut self,
        caller: &AccountId,
        pool_id: &PoolId,
        fee_bps: BasisPoints,
        now: Timestamp,
    ) -> Result<BasisPoints, AmmError> {
        if *caller != self.fee_authority {
            return Err(AmmError::Unauthorized(caller.to_string()));
        }
        if fee_bps > self.params.max_fee_bps {
            return Err(AmmError::FeeTooHigh {
                fee_bps,
                max_bps: self.params.max_fee_bps,
            });
        }
        let cooldown = self.params.fee_change_cooldown_secs;
        let pool = self.existing_mut(pool_id)?;
        if let Some(last) = pool.last_fee_change {
            if !last.has_expired(cooldown, now) {
                return Err(AmmError::CooldownNotMet {
                    ready_at: last.plus_secs(cooldown),
                });
            }
        }

        let old = pool.fee_bps;
        pool.fee_bps = fee_bps;
        pool.last_fee_change = Some(now);
        tracing::info!(
            pool = %pool_id,
            old_fee_bps = old,
            new_fee_bps = fee_bps,
            "pool fee changed"
        );
        Ok(old)
    }

    fn existing(&self, pool_id: &PoolId) -> Result<&Pool, AmmError> {
        self.pools
            .get(pool_id)
            .ok_or_else(|| AmmError::PoolNotFound(pool_id.clone()))
    }

    fn existing_mut(&mut self, pool_id: &PoolId) -> Result<&mut Pool, AmmError> {
        self.pools
            .get_mut(pool_id)
            .ok_or_else(|| AmmError::PoolNotFound(pool_id.clone()))
    }
}
