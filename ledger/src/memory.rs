//! In-memory reference ledger.
//!
//! Used by the runtime, the replay daemon and every test. Maps are ordered so
//! that snapshots of equal states encode to identical bytes.

use crate::error::LedgerError;
use crate::ledger::{LedgerOp, TokenLedger};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tally_types::{AccountId, Amount, TokenId};

type BalanceKey = (AccountId, TokenId);
type AllowanceKey = (AccountId, AccountId, TokenId);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<BalanceKey, Amount>,
    /// (owner, spender, token) → remaining allowance.
    allowances: BTreeMap<AllowanceKey, Amount>,
    supplies: BTreeMap<TokenId, Amount>,
    minters: BTreeSet<(TokenId, AccountId)>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `account` to mint `token`.
    pub fn authorize_minter(&mut self, token: &TokenId, account: &AccountId) {
        self.minters.insert((token.clone(), account.clone()));
    }

    pub fn is_minter(&self, token: &TokenId, account: &AccountId) -> bool {
        self.minters.contains(&(token.clone(), account.clone()))
    }

    /// All non-zero balances of `token`, ordered by account.
    pub fn holders(&self, token: &TokenId) -> Vec<(AccountId, Amount)> {
        self.balances
            .iter()
            .filter(|((_, t), _)| t == token)
            .map(|((a, _), amount)| (a.clone(), *amount))
            .collect()
    }
}

/// Pending writes for one batch, layered over the committed state.
struct Overlay<'a> {
    base: &'a InMemoryLedger,
    balances: BTreeMap<BalanceKey, Amount>,
    allowances: BTreeMap<AllowanceKey, Amount>,
    supplies: BTreeMap<TokenId, Amount>,
}

impl<'a> Overlay<'a> {
    fn new(base: &'a InMemoryLedger) -> Self {
        Self {
            base,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            supplies: BTreeMap::new(),
        }
    }

    fn balance(&self, key: &BalanceKey) -> Amount {
        self.balances
            .get(key)
            .or_else(|| self.base.balances.get(key))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, key: &AllowanceKey) -> Amount {
        self.allowances
            .get(key)
            .or_else(|| self.base.allowances.get(key))
            .copied()
            .unwrap_or(0)
    }

    fn supply(&self, token: &TokenId) -> Amount {
        self.supplies
            .get(token)
            .or_else(|| self.base.supplies.get(token))
            .copied()
            .unwrap_or(0)
    }

    fn debit(
        &mut self,
        account: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let key = (account.clone(), token.clone());
        let available = self.balance(&key);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                token: token.clone(),
                needed: amount,
                available,
            })?;
        self.balances.insert(key, remaining);
        Ok(())
    }

    fn credit(
        &mut self,
        account: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let key = (account.clone(), token.clone());
        let updated = self
            .balance(&key)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.balances.insert(key, updated);
        Ok(())
    }

    fn apply(&mut self, op: &LedgerOp) -> Result<(), LedgerError> {
        if op.amount() == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        match op {
            LedgerOp::Transfer { from, to, token, amount } => {
                self.debit(from, token, *amount)?;
                self.credit(to, token, *amount)
            }
            LedgerOp::TransferFrom { spender, from, to, token, amount } => {
                let key = (from.clone(), spender.clone(), token.clone());
                let available = self.allowance(&key);
                let remaining =
                    available
                        .checked_sub(*amount)
                        .ok_or_else(|| LedgerError::InsufficientAllowance {
                            token: token.clone(),
                            needed: *amount,
                            available,
                        })?;
                self.debit(from, token, *amount)?;
                self.credit(to, token, *amount)?;
                self.allowances.insert(key, remaining);
                Ok(())
            }
            LedgerOp::Mint { minter, to, token, amount } => {
                if !self.base.is_minter(token, minter) {
                    return Err(LedgerError::Unauthorized {
                        account: minter.clone(),
                        token: token.clone(),
                    });
                }
                let supply = self
                    .supply(token)
                    .checked_add(*amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
                self.credit(to, token, *amount)?;
                self.supplies.insert(token.clone(), supply);
                Ok(())
            }
        }
    }

    fn into_writes(
        self,
    ) -> (
        BTreeMap<BalanceKey, Amount>,
        BTreeMap<AllowanceKey, Amount>,
        BTreeMap<TokenId, Amount>,
    ) {
        (self.balances, self.allowances, self.supplies)
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.balances
            .get(&(account.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self, token: &TokenId) -> Amount {
        self.supplies.get(token).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId, token: &TokenId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let key = (owner.clone(), spender.clone(), token.clone());
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
        Ok(())
    }

    fn apply_batch(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
        let mut overlay = Overlay::new(self);
        for op in ops {
            overlay.apply(op)?;
        }
        let (balances, allowances, supplies) = overlay.into_writes();

        for (key, amount) in balances {
            if amount == 0 {
                self.balances.remove(&key);
            } else {
                self.balances.insert(key, amount);
            }
        }
        for (key, amount) in allowances {
            if amount == 0 {
                self.allowances.remove(&key);
            } else {
                self.allowances.insert(key, amount);
            }
        }
        self.supplies.extend(supplies);
        tracing::trace!(ops = ops.len(), "ledger batch committed");
        Ok(())
    }
}
