//! Liquidity-pool errors.

use tally_ledger::LedgerError;
use tally_types::{PoolId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("a pool needs two distinct tokens, got {0}")]
    IdenticalTokens(PoolId),

    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("insufficient shares: have {have}, need {need}")]
    InsufficientShares { have: u128, need: u128 },

    #[error("insufficient liquidity in pool {0}")]
    InsufficientLiquidity(PoolId),

    #[error("deposit ratio deviates from pool ratio by {deviation_bps} bps (tolerance {tolerance_bps} bps)")]
    RatioMismatch {
        deviation_bps: u128,
        tolerance_bps: u32,
    },

    #[error("slippage exceeded: output {amount_out} below minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u128, min_amount_out: u128 },

    #[error("fee {fee_bps} bps exceeds maximum {max_bps} bps")]
    FeeTooHigh { fee_bps: u32, max_bps: u32 },

    #[error("fee change not allowed before {ready_at}")]
    CooldownNotMet { ready_at: Timestamp },

    #[error("caller {0} is not the fee authority")]
    Unauthorized(String),

    #[error("constant product decreased across swap")]
    KInvariantViolation,

    #[error("arithmetic overflow in pool computation")]
    ArithmeticOverflow,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
