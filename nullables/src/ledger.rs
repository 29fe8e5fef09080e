//! Fault-injecting ledger.

use tally_ledger::{InMemoryLedger, LedgerError, LedgerOp, TokenLedger};
use tally_types::{AccountId, Amount, TokenId};

/// An [`InMemoryLedger`] that can be told to reject upcoming batches.
///
/// Reads and approvals always succeed. A rejected batch changes nothing,
/// exactly like a batch the inner ledger itself refuses.
#[derive(Debug, Default)]
pub struct FaultyLedger {
    inner: InMemoryLedger,
    /// Batches to let through before failing one.
    fail_after: Option<usize>,
    batches_seen: usize,
}

impl FaultyLedger {
    pub fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            fail_after: None,
            batches_seen: 0,
        }
    }

    /// Reject the next batch.
    pub fn fail_next_batch(&mut self) {
        self.fail_after = Some(0);
    }

    /// Let `n` batches through, then reject one.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(n);
    }

    /// Cancel any armed failure.
    pub fn heal(&mut self) {
        self.fail_after = None;
    }

    /// Total batches submitted, including rejected ones.
    pub fn batches_seen(&self) -> usize {
        self.batches_seen
    }

    pub fn inner(&self) -> &InMemoryLedger {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut InMemoryLedger {
        &mut self.inner
    }
}

impl TokenLedger for FaultyLedger {
    fn balance_of(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.inner.balance_of(account, token)
    }

    fn total_supply(&self, token: &TokenId) -> Amount {
        self.inner.total_supply(token)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId, token: &TokenId) -> Amount {
        self.inner.allowance(owner, spender, token)
    }

    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.inner.approve(owner, spender, token, amount)
    }

    fn apply_batch(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
        self.batches_seen += 1;
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                tracing::debug!(ops = ops.len(), "injected ledger failure");
                Err(LedgerError::Unavailable("injected failure".to_string()))
            }
            Some(n) => {
                self.fail_after = Some(n - 1);
                self.inner.apply_batch(ops)
            }
            None => self.inner.apply_batch(ops),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn funded() -> FaultyLedger {
        let token = TokenId::new("TAL");
        let mut inner = InMemoryLedger::new();
        inner.authorize_minter(&token, &acct("treasury"));
        inner.mint(&acct("treasury"), &acct("alice"), &token, 100).unwrap();
        FaultyLedger::new(inner)
    }

    #[test]
    fn fails_exactly_once() {
        let mut ledger = funded();
        let token = TokenId::new("TAL");
        ledger.fail_next_batch();
        assert!(matches!(
            ledger.transfer(&acct("alice"), &acct("bob"), &token, 10),
            Err(LedgerError::Unavailable(_))
        ));
        assert_eq!(ledger.balance_of(&acct("alice"), &token), 100);

        ledger.transfer(&acct("alice"), &acct("bob"), &token, 10).unwrap();
        assert_eq!(ledger.balance_of(&acct("bob"), &token), 10);
        assert_eq!(ledger.batches_seen(), 2);
    }

    #[test]
    fn fail_after_counts_batches() {
        let mut ledger = funded();
        let token = TokenId::new("TAL");
        ledger.fail_after(2);
        ledger.transfer(&acct("alice"), &acct("bob"), &token, 1).unwrap();
        ledger.transfer(&acct("alice"), &acct("bob"), &token, 1).unwrap();
        assert!(ledger.transfer(&acct("alice"), &acct("bob"), &token, 1).is_err());
        ledger.transfer(&acct("alice"), &acct("bob"), &token, 1).unwrap();
        assert_eq!(ledger.inner().balance_of(&acct("bob"), &token), 3);
    }

    #[test]
    fn heal_disarms_and_inner_mut_reaches_state() {
        let mut ledger = funded();
        let token = TokenId::new("TAL");
        ledger.fail_after(1);
        ledger.heal();
        ledger.transfer(&acct("alice"), &acct("bob"), &token, 5).unwrap();
        ledger.transfer(&acct("alice"), &acct("bob"), &token, 5).unwrap();
        assert_eq!(ledger.balance_of(&acct("bob"), &token), 10);

        let fresh = TokenId::new("NEW");
        ledger.inner_mut().authorize_minter(&fresh, &acct("bob"));
        ledger.mint(&acct("bob"), &acct("carol"), &fresh, 7).unwrap();
        assert_eq!(ledger.total_supply(&fresh), 7);
        assert_eq!(ledger.batches_seen(), 3);
    }
}
