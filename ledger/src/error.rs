use tally_types::{AccountId, TokenId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("insufficient {token} balance: need {needed}, available {available}")]
    InsufficientBalance {
        token: TokenId,
        needed: u128,
        available: u128,
    },

    #[error("insufficient {token} allowance: need {needed}, available {available}")]
    InsufficientAllowance {
        token: TokenId,
        needed: u128,
        available: u128,
    },

    #[error("{account} is not authorized to mint {token}")]
    Unauthorized { account: AccountId, token: TokenId },

    #[error("arithmetic overflow in ledger update")]
    ArithmeticOverflow,

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
