//! Pool state and the pure arithmetic behind deposits, redemptions and swaps.
//!
//! Nothing in this module touches the ledger. Every `plan_*`/`quote_*`
//! method is read-only and returns the complete post-operation values; the
//! engine commits them only after the matching ledger batch succeeds.

use crate::error::AmmError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_types::{
    isqrt, mul_div_floor, AccountId, Amount, BasisPoints, PoolId, Timestamp, BPS_DENOMINATOR,
};

/// A two-token constant-product pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub reserve_a: Amount,
    pub reserve_b: Amount,
    pub total_shares: Amount,
    pub fee_bps: BasisPoints,
    /// Provider → share balance. Zero balances are removed.
    pub providers: BTreeMap<AccountId, Amount>,
    pub created_at: Timestamp,
    pub last_fee_change: Option<Timestamp>,
}

/// Outcome of a deposit, computed before anything moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositPlan {
    pub shares: Amount,
    pub reserve_a: Amount,
    pub reserve_b: Amount,
    pub total_shares: Amount,
    pub bootstrap: bool,
}

/// Tokens released by burning shares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub amount_a: Amount,
    pub amount_b: Amount,
}

/// A priced swap against the current reserves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub amount_in: Amount,
    pub effective_in: Amount,
    pub fee_amount: Amount,
    pub amount_out: Amount,
    pub reserve_a: Amount,
    pub reserve_b: Amount,
}

impl Pool {
    pub fn new(id: PoolId, fee_bps: BasisPoints, created_at: Timestamp) -> Self {
        Self {
            id,
            reserve_a: 0,
            reserve_b: 0,
            total_shares: 0,
            fee_bps,
            providers: BTreeMap::new(),
            created_at,
            last_fee_change: None,
        }
    }

    pub fn shares_of(&self, provider: &AccountId) -> Amount {
        self.providers.get(provider).copied().unwrap_or(0)
    }

    /// The constant product `reserve_a × reserve_b`.
    pub fn k(&self) -> Option<u128> {
        constant_product(self.reserve_a, self.reserve_b)
    }

    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    /// `sum(providers) == total_shares`.
    pub fn shares_consistent(&self) -> bool {
        self.providers
            .values()
            .try_fold(0u128, |acc, s| acc.checked_add(*s))
            == Some(self.total_shares)
    }

    /// Price a deposit of `amount_a`/`amount_b`.
    pub fn plan_deposit(
        &self,
        amount_a: Amount,
        amount_b: Amount,
        ratio_tolerance_bps: BasisPoints,
    ) -> Result<DepositPlan, AmmError> {
        if amount_a == 0 || amount_b == 0 {
            return Err(AmmError::InvalidAmount("both deposit amounts must be positive"));
        }

        let reserve_a = self
            .reserve_a
            .checked_add(amount_a)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let reserve_b = self
            .reserve_b
            .checked_add(amount_b)
            .ok_or(AmmError::ArithmeticOverflow)?;

        if self.is_empty() {
            let product = amount_a
                .checked_mul(amount_b)
                .ok_or(AmmError::ArithmeticOverflow)?;
            let shares = isqrt(product);
            return Ok(DepositPlan {
                shares,
                reserve_a,
                reserve_b,
                total_shares: shares,
                bootstrap: true,
            });
        }

        if self.reserve_a == 0 || self.reserve_b == 0 {
            return Err(AmmError::InsufficientLiquidity(self.id.clone()));
        }

        // Cross-multiplied ratio check: a/b against reserve_a/reserve_b.
        let lhs = amount_a
            .checked_mul(self.reserve_b)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let rhs = amount_b
            .checked_mul(self.reserve_a)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let diff = lhs.abs_diff(rhs);
        let larger = lhs.max(rhs);
        let scaled_diff = diff
            .checked_mul(BPS_DENOMINATOR)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let allowed = larger
            .checked_mul(ratio_tolerance_bps as u128)
            .ok_or(AmmError::ArithmeticOverflow)?;
        if scaled_diff > allowed {
            return Err(AmmError::RatioMismatch {
                deviation_bps: scaled_diff / larger,
                tolerance_bps: ratio_tolerance_bps,
            });
        }

        let by_a = mul_div_floor(amount_a, self.total_shares, self.reserve_a)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let by_b = mul_div_floor(amount_b, self.total_shares, self.reserve_b)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let shares = by_a.min(by_b);
        if shares == 0 {
            return Err(AmmError::InvalidAmount("deposit too small to mint a share"));
        }
        let total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(AmmError::ArithmeticOverflow)?;

        Ok(DepositPlan {
            shares,
            reserve_a,
            reserve_b,
            total_shares,
            bootstrap: false,
        })
    }

    /// Price burning `shares` held by `provider`.
    pub fn plan_redemption(
        &self,
        provider: &AccountId,
        shares: Amount,
    ) -> Result<Redemption, AmmError> {
        if shares == 0 {
            return Err(AmmError::InvalidAmount("shares must be positive"));
        }
        let have = self.shares_of(provider);
        if shares > have {
            return Err(AmmError::InsufficientShares { have, need: shares });
        }
        let amount_a = mul_div_floor(self.reserve_a, shares, self.total_shares)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let amount_b = mul_div_floor(self.reserve_b, shares, self.total_shares)
            .ok_or(AmmError::ArithmeticOverflow)?;
        if amount_a == 0 && amount_b == 0 {
            return Err(AmmError::InvalidAmount("redemption would return nothing"));
        }
        Ok(Redemption { amount_a, amount_b })
    }

    /// Price a swap of `amount_in` into side A (`input_is_a`) or side B.
    pub fn quote_swap(&self, amount_in: Amount, input_is_a: bool) -> Result<SwapQuote, AmmError> {
        if amount_in == 0 {
            return Err(AmmError::InvalidAmount("swap input must be positive"));
        }
        if self.reserve_a == 0 || self.reserve_b == 0 {
            return Err(AmmError::InsufficientLiquidity(self.id.clone()));
        }
        let (reserve_in, reserve_out) = if input_is_a {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        };

        let fee_complement = BPS_DENOMINATOR.saturating_sub(self.fee_bps as u128);
        let effective_in = mul_div_floor(amount_in, fee_complement, BPS_DENOMINATOR)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let fee_amount = amount_in - effective_in;

        let denominator = reserve_in
            .checked_add(effective_in)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let amount_out = mul_div_floor(reserve_out, effective_in, denominator)
            .ok_or(AmmError::ArithmeticOverflow)?;
        if amount_out == 0 || amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity(self.id.clone()));
        }

        let new_in = reserve_in
            .checked_add(amount_in)
            .ok_or(AmmError::ArithmeticOverflow)?;
        let new_out = reserve_out - amount_out;
        let (reserve_a, reserve_b) = if input_is_a {
            (new_in, new_out)
        } else {
            (new_out, new_in)
        };

        let k_before = self.k().ok_or(AmmError::ArithmeticOverflow)?;
        let k_after =
            constant_product(reserve_a, reserve_b).ok_or(AmmError::ArithmeticOverflow)?;
        if k_after < k_before {
            return Err(AmmError::KInvariantViolation);
        }

        Ok(SwapQuote {
            amount_in,
            effective_in,
            fee_amount,
            amount_out,
            reserve_a,
            reserve_b,
        })
    }

    pub(crate) fn commit_deposit(&mut self, provider: &AccountId, plan: &DepositPlan) {
        self.reserve_a = plan.reserve_a;
        self.reserve_b = plan.reserve_b;
        self.total_shares = plan.total_shares;
        *self.providers.entry(provider.clone()).or_insert(0) += plan.shares;
    }

    pub(crate) fn commit_redemption(
        &mut self,
        provider: &AccountId,
        shares: Amount,
        redemption: &Redemption,
    ) {
        self.reserve_a -= redemption.amount_a;
        self.reserve_b -= redemption.amount_b;
        self.total_shares -= shares;
        if let Some(held) = self.providers.get_mut(provider) {
            *held -= shares;
            if *held == 0 {
                self.providers.remove(provider);
            }
        }
    }

    pub(crate) fn commit_swap(&mut self, quote: &SwapQuote) {
        self.reserve_a = quote.reserve_a;
        self.reserve_b = quote.reserve_b;
    }
}

fn constant_product(reserve_a: Amount, reserve_b: Amount) -> Option<u128> {
    reserve_a.checked_mul(reserve_b)
}
