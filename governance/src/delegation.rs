//! Vote delegation.
//!
//! Each delegator has at most one delegate. Delegation is one hop: if A
//! delegates to B and B delegates to C, A's balance votes through B only.

use crate::error::GovernanceError;
use std::collections::{BTreeMap, BTreeSet};
use tally_types::AccountId;

#[derive(Clone, Debug, Default)]
pub struct DelegationEngine {
    /// delegator → delegate.
    delegations: BTreeMap<AccountId, AccountId>,
    /// Reverse index: delegate → direct delegators.
    reverse_delegations: BTreeMap<AccountId, BTreeSet<AccountId>>,
}

impl DelegationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a delegator → delegate table.
    pub fn from_delegations(delegations: BTreeMap<AccountId, AccountId>) -> Self {
        let mut reverse = BTreeMap::<AccountId, BTreeSet<AccountId>>::new();
        for (from, to) in &delegations {
            reverse.entry(to.clone()).or_default().insert(from.clone());
        }
        Self {
            delegations,
            reverse_delegations: reverse,
        }
    }

    /// Set or replace `from`'s delegate.
    pub fn delegate(&mut self, from: &AccountId, to: &AccountId) -> Result<(), GovernanceError> {
        if from == to {
            return Err(GovernanceError::SelfDelegation(from.clone()));
        }
        self.unlink(from);
        self.delegations.insert(from.clone(), to.clone());
        self.reverse_delegations
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        Ok(())
    }

    /// Remove `from`'s delegation, returning the previous delegate.
    pub fn undelegate(&mut self, from: &AccountId) -> Option<AccountId> {
        self.unlink(from)
    }

    pub fn delegate_of(&self, delegator: &AccountId) -> Option<&AccountId> {
        self.delegations.get(delegator)
    }

    /// Accounts delegating directly to `delegate`, in order.
    pub fn delegators_of(&self, delegate: &AccountId) -> impl Iterator<Item = &AccountId> {
        self.reverse_delegations
            .get(delegate)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    pub fn delegations(&self) -> &BTreeMap<AccountId, AccountId> {
        &self.delegations
    }

    /// Accounts whose balance `voter` casts: itself unless it delegated
    /// away, plus its direct delegators.
    pub fn contributors(&self, voter: &AccountId) -> Vec<AccountId> {
        let own = (!self.delegations.contains_key(voter)).then(|| voter.clone());
        own.into_iter().chain(self.delegators_of(voter).cloned()).collect()
    }

    fn unlink(&mut self, from: &AccountId) -> Option<AccountId> {
        let old_to = self.delegations.remove(from)?;
        if let Some(set) = self.reverse_delegations.get_mut(&old_to) {
            set.remove(from);
            if set.is_empty() {
                self.reverse_delegations.remove(&old_to);
            }
        }
        Some(old_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(name: &str) -> AccountId {
        AccountId::new(name)
    }

    #[test]
    fn test_simple_delegation() {
        let mut engine = DelegationEngine::new();
        let a = wallet("a");
        let b = wallet("b");
        engine.delegate(&a, &b).unwrap();

        assert_eq!(engine.delegate_of(&a), Some(&b));
        assert_eq!(engine.contributors(&b), vec![b.clone(), a.clone()]);
        assert!(engine.contributors(&a).is_empty());
    }

    #[test]
    fn test_self_delegation_rejected() {
        let mut engine = DelegationEngine::new();
        let a = wallet("a");
        assert_eq!(engine.delegate(&a, &a), Err(GovernanceError::SelfDelegation(a.clone())));
        assert!(engine.delegations().is_empty());
    }

    #[test]
    fn test_update_delegation_moves_reverse_entry() {
        let mut engine = DelegationEngine::new();
        let a = wallet("a");
        let b = wallet("b");
        let c = wallet("c");
        engine.delegate(&a, &b).unwrap();
        engine.delegate(&a, &c).unwrap();

        assert_eq!(engine.delegate_of(&a), Some(&c));
        assert_eq!(engine.delegators_of(&b).count(), 0);
        assert_eq!(engine.delegators_of(&c).collect::<Vec<_>>(), vec![&a]);
    }

    #[test]
    fn test_undelegate() {
        let mut engine = DelegationEngine::new();
        let a = wallet("a");
        let b = wallet("b");
        engine.delegate(&a, &b).unwrap();

        assert_eq!(engine.undelegate(&a), Some(b.clone()));
        assert_eq!(engine.undelegate(&a), None);
        assert_eq!(engine.contributors(&a), vec![a.clone()]);
        assert_eq!(engine.contributors(&b), vec![b.clone()]);
    }

    #[test]
    fn test_chains_are_one_hop() {
        let mut engine = DelegationEngine::new();
        let a = wallet("a");
        let b = wallet("b");
        let c = wallet("c");
        engine.delegate(&a, &b).unwrap();
        engine.delegate(&b, &c).unwrap();

        assert_eq!(engine.contributors(&c), vec![c.clone(), b.clone()]);
        assert_eq!(engine.contributors(&b), vec![a.clone()]);
    }

    #[test]
    fn test_rebuild_from_table() {
        let mut engine = DelegationEngine::new();
        engine.delegate(&wallet("a"), &wallet("z")).unwrap();
        engine.delegate(&wallet("b"), &wallet("z")).unwrap();

        let rebuilt = DelegationEngine::from_delegations(engine.delegations().clone());
        assert_eq!(
            rebuilt.delegators_of(&wallet("z")).collect::<Vec<_>>(),
            vec![&wallet("a"), &wallet("b")]
        );
    }
}
