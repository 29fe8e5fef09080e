//! The `TokenLedger` trait and the batch operation type.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use tally_types::{AccountId, Amount, TokenId};

/// One balance movement inside an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    /// Move `amount` of `token` from `from` to `to`.
    Transfer {
        from: AccountId,
        to: AccountId,
        token: TokenId,
        amount: Amount,
    },
    /// Move `amount` on behalf of `from`, consuming `spender`'s allowance.
    TransferFrom {
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        token: TokenId,
        amount: Amount,
    },
    /// Create `amount` of `token` for `to`. `minter` must be authorized.
    Mint {
        minter: AccountId,
        to: AccountId,
        token: TokenId,
        amount: Amount,
    },
}

impl LedgerOp {
    pub fn amount(&self) -> Amount {
        match self {
            Self::Transfer { amount, .. }
            | Self::TransferFrom { amount, .. }
            | Self::Mint { amount, .. } => *amount,
        }
    }
}

/// Per-account, per-token balance ledger with allowances and gated minting.
///
/// Implementations must make [`apply_batch`](TokenLedger::apply_batch)
/// all-or-nothing: when it returns an error, no balance, allowance or supply
/// has changed. Operations inside a batch are applied in order, so a later
/// operation may spend what an earlier one credited.
pub trait TokenLedger {
    /// Balance of `account` in `token` (zero for unknown accounts).
    fn balance_of(&self, account: &AccountId, token: &TokenId) -> Amount;

    /// Total minted supply of `token`.
    fn total_supply(&self, token: &TokenId) -> Amount;

    /// Remaining amount `spender` may move out of `owner`'s balance.
    fn allowance(&self, owner: &AccountId, spender: &AccountId, token: &TokenId) -> Amount;

    /// Set (overwrite) `spender`'s allowance over `owner`'s `token`.
    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Apply every operation in `ops`, or none of them.
    fn apply_batch(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError>;

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.apply_batch(&[LedgerOp::Transfer {
            from: from.clone(),
            to: to.clone(),
            token: token.clone(),
            amount,
        }])
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.apply_batch(&[LedgerOp::TransferFrom {
            spender: spender.clone(),
            from: from.clone(),
            to: to.clone(),
            token: token.clone(),
            amount,
        }])
    }

    fn mint(
        &mut self,
        minter: &AccountId,
        to: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.apply_batch(&[LedgerOp::Mint {
            minter: minter.clone(),
            to: to.clone(),
            token: token.clone(),
            amount,
        }])
    }
}
