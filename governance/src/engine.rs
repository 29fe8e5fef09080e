//! Governance engine: proposal storage, weighted voting, execution gating.

use crate::delegation::DelegationEngine;
use crate::error::GovernanceError;
use crate::params::GovernanceParams;
use crate::proposal::{Proposal, ProposalAction, ProposalState};
use std::collections::{BTreeMap, BTreeSet};
use tally_ledger::TokenLedger;
use tally_types::{AccountId, Amount, ProposalId, Timestamp, TokenId};

pub struct GovernanceEngine {
    params: GovernanceParams,
    /// Token whose balances weigh votes.
    token: TokenId,
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: ProposalId,
    delegation: DelegationEngine,
}

impl GovernanceEngine {
    pub fn new(params: GovernanceParams, token: TokenId) -> Self {
        Self {
            params,
            token,
            proposals: BTreeMap::new(),
            next_id: 0,
            delegation: DelegationEngine::new(),
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn token(&self) -> &TokenId {
        &self.token
    }

    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    pub fn get_proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn delegation(&self) -> &DelegationEngine {
        &self.delegation
    }

    pub fn delegate_of(&self, delegator: &AccountId) -> Option<&AccountId> {
        self.delegation.delegate_of(delegator)
    }

    pub fn delegators_of(&self, delegate: &AccountId) -> Vec<AccountId> {
        self.delegation.delegators_of(delegate).cloned().collect()
    }

    /// Replace proposals and delegations, e.g. when restoring a snapshot.
    pub fn restore(
        &mut self,
        proposals: impl IntoIterator<Item = Proposal>,
        next_id: ProposalId,
        delegations: BTreeMap<AccountId, AccountId>,
    ) {
        self.proposals = proposals.into_iter().map(|p| (p.id, p)).collect();
        self.next_id = next_id;
        self.delegation = DelegationEngine::from_delegations(delegations);
    }

    /// Weight `account` would cast on a proposal nobody has voted on yet.
    pub fn voting_power<L: TokenLedger>(
        &self,
        ledger: &L,
        account: &AccountId,
    ) -> Result<Amount, GovernanceError> {
        self.delegation
            .contributors(account)
            .iter()
            .try_fold(0u128, |acc, c| acc.checked_add(ledger.balance_of(c, &self.token)))
            .ok_or(GovernanceError::ArithmeticOverflow)
    }

    pub fn create_proposal<L: TokenLedger>(
        &mut self,
        ledger: &L,
        proposer: &AccountId,
        description: &str,
        action: ProposalAction,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        if description.trim().is_empty() {
            return Err(GovernanceError::EmptyDescription);
        }
        let have = ledger.balance_of(proposer, &self.token);
        if have < self.params.proposal_threshold {
            return Err(GovernanceError::InsufficientBalance {
                have,
                need: self.params.proposal_threshold,
            });
        }
        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or(GovernanceError::ArithmeticOverflow)?;

        let proposal = Proposal {
            id,
            proposer: proposer.clone(),
            description: description.to_string(),
            action,
            created_at: now,
            voting_ends_at: now.plus_secs(self.params.voting_period_secs),
            votes_for: 0,
            votes_against: 0,
            voters: BTreeSet::new(),
            counted: BTreeSet::new(),
            state: ProposalState::Open,
            executed_at: None,
        };
        tracing::debug!(
            id,
            proposer = %proposer,
            ends_at = %proposal.voting_ends_at,
            "proposal created"
        );
        self.proposals.insert(id, proposal);
        self.next_id = next_id;
        Ok(id)
    }

    /// Cast `voter`'s weight for or against a proposal. Returns the weight.
    pub fn vote<L: TokenLedger>(
        &mut self,
        ledger: &L,
        voter: &AccountId,
        id: ProposalId,
        support: bool,
        now: Timestamp,
    ) -> Result<Amount, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::NonexistentProposal(id))?;
        if !proposal.accepts_votes(now) {
            return Err(GovernanceError::ProposalNotOpen(id));
        }
        if proposal.voters.contains(voter) {
            return Err(GovernanceError::DuplicateVote {
                voter: voter.clone(),
                proposal: id,
            });
        }

        let fresh: Vec<AccountId> = self
            .delegation
            .contributors(voter)
            .into_iter()
            .filter(|c| !proposal.counted.contains(c))
            .collect();
        let weight = fresh
            .iter()
            .try_fold(0u128, |acc, c| acc.checked_add(ledger.balance_of(c, &self.token)))
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        if weight == 0 {
            return Err(GovernanceError::NoVotingPower(voter.clone()));
        }

        let (votes_for, votes_against) = if support {
            (
                proposal
                    .votes_for
                    .checked_add(weight)
                    .ok_or(GovernanceError::ArithmeticOverflow)?,
                proposal.votes_against,
            )
        } else {
            (
                proposal.votes_for,
                proposal
                    .votes_against
                    .checked_add(weight)
                    .ok_or(GovernanceError::ArithmeticOverflow)?,
            )
        };

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NonexistentProposal(id))?;
        proposal.votes_for = votes_for;
        proposal.votes_against = votes_against;
        proposal.voters.insert(voter.clone());
        proposal.counted.extend(fresh);
        tracing::debug!(id, voter = %voter, support, weight, "vote recorded");
        Ok(weight)
    }

    pub fn delegate_vote(
        &mut self,
        delegator: &AccountId,
        delegate: &AccountId,
    ) -> Result<(), GovernanceError> {
        self.delegation.delegate(delegator, delegate)?;
        tracing::debug!(delegator = %delegator, delegate = %delegate, "vote delegated");
        Ok(())
    }

    /// Returns the previous delegate, if any.
    pub fn undelegate(&mut self, delegator: &AccountId) -> Option<AccountId> {
        let previous = self.delegation.undelegate(delegator);
        if let Some(previous) = &previous {
            tracing::debug!(delegator = %delegator, previous = %previous, "delegation removed");
        }
        previous
    }

    /// Close voting and record the outcome once the deadline has passed.
    pub fn finalize(
        &mut self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalState, GovernanceError> {
        let quorum = self.params.quorum;
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NonexistentProposal(id))?;
        if proposal.state != ProposalState::Open {
            return Err(GovernanceError::ProposalNotOpen(id));
        }
        if now < proposal.voting_ends_at {
            return Err(GovernanceError::VotingNotEnded {
                ends_at: proposal.voting_ends_at,
            });
        }
        let state = match tally_outcome(proposal, quorum) {
            Ok(()) => ProposalState::Passed,
            Err(_) => ProposalState::Rejected,
        };
        proposal.state = state;
        tracing::info!(
            id,
            votes_for = proposal.votes_for,
            votes_against = proposal.votes_against,
            outcome = ?state,
            "proposal finalized"
        );
        Ok(state)
    }

    /// Validate that a proposal may execute now, without changing it.
    ///
    /// Open proposals execute as soon as their tally clears; they need not
    /// be finalized first.
    pub fn check_execution(&self, id: ProposalId) -> Result<&ProposalAction, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::NonexistentProposal(id))?;
        match proposal.state {
            ProposalState::Open | ProposalState::Passed => {}
            ProposalState::Rejected | ProposalState::Executed => {
                return Err(GovernanceError::ProposalNotOpen(id))
            }
        }
        tally_outcome(proposal, self.params.quorum)?;
        Ok(&proposal.action)
    }

    /// Mark a proposal executed after its side effect has been applied.
    pub fn mark_executed(&mut self, id: ProposalId, now: Timestamp) -> Result<(), GovernanceError> {
        self.check_execution(id)?;
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NonexistentProposal(id))?;
        proposal.state = ProposalState::Executed;
        proposal.executed_at = Some(now);
        tracing::info!(id, action = ?proposal.action, "proposal executed");
        Ok(())
    }

    /// Check and mark executed in one step. Returns the action for the
    /// caller to apply.
    pub fn execute_proposal(
        &mut self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalAction, GovernanceError> {
        let action = self.check_execution(id)?.clone();
        self.mark_executed(id, now)?;
        Ok(action)
    }
}

/// Quorum first, then strict majority.
fn tally_outcome(proposal: &Proposal, quorum: Amount) -> Result<(), GovernanceError> {
    let total = proposal
        .total_votes()
        .ok_or(GovernanceError::ArithmeticOverflow)?;
    if total < quorum {
        return Err(GovernanceError::QuorumNotMet {
            have: total,
            need: quorum,
        });
    }
    if proposal.votes_for <= proposal.votes_against {
        return Err(GovernanceError::NotPassed {
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
        });
    }
    Ok(())
}
