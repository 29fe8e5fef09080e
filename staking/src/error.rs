//! Staking errors.

use tally_ledger::LedgerError;
use tally_types::{AccountId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("insufficient stake token balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("{0} has no active stake")]
    NoActiveStake(AccountId),

    #[error("{0} is not the staking owner")]
    Unauthorized(AccountId),

    #[error("timestamp {at} precedes {earliest}, the earliest time still open to change")]
    InvalidTimestamp { at: Timestamp, earliest: Timestamp },

    #[error("arithmetic overflow in reward computation")]
    ArithmeticOverflow,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
