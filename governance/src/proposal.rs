//! Proposals and their lifecycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tally_types::{AccountId, Amount, BasisPoints, PoolId, ProposalId, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Accepting votes, or past its deadline but not yet finalized.
    Open,
    /// Finalized with quorum and a majority in favour; awaiting execution.
    Passed,
    /// Finalized without quorum or majority. Terminal.
    Rejected,
    /// Side effect applied. Terminal.
    Executed,
}

/// What a proposal changes once executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalAction {
    /// Signalling only.
    Text,
    SetPoolFee { pool: PoolId, fee_bps: BasisPoints },
    SetRewardRate { rate: Amount },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: AccountId,
    pub description: String,
    pub action: ProposalAction,
    pub created_at: Timestamp,
    pub voting_ends_at: Timestamp,
    pub votes_for: Amount,
    pub votes_against: Amount,
    /// Accounts that cast a vote.
    pub voters: BTreeSet<AccountId>,
    /// Accounts whose balance already contributed weight, directly or
    /// through a delegate.
    pub counted: BTreeSet<AccountId>,
    pub state: ProposalState,
    pub executed_at: Option<Timestamp>,
}

impl Proposal {
    pub fn is_executed(&self) -> bool {
        self.state == ProposalState::Executed
    }

    /// Whether votes are still accepted at `now`.
    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        self.state == ProposalState::Open && now < self.voting_ends_at
    }

    pub fn total_votes(&self) -> Option<Amount> {
        self.votes_for.checked_add(self.votes_against)
    }
}
