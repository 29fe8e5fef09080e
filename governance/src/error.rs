use tally_types::{AccountId, ProposalId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("proposal {0} does not exist")]
    NonexistentProposal(ProposalId),

    #[error("proposal {0} is not open")]
    ProposalNotOpen(ProposalId),

    #[error("{voter} has already voted on proposal {proposal}")]
    DuplicateVote { voter: AccountId, proposal: ProposalId },

    #[error("{0} cannot delegate to itself")]
    SelfDelegation(AccountId),

    #[error("quorum not met: {have} < {need} votes")]
    QuorumNotMet { have: u128, need: u128 },

    #[error("proposal did not pass: {votes_for} for, {votes_against} against")]
    NotPassed { votes_for: u128, votes_against: u128 },

    #[error("{0} has no voting power left on this proposal")]
    NoVotingPower(AccountId),

    #[error("proposal description must not be empty")]
    EmptyDescription,

    #[error("voting is still open until {ends_at}")]
    VotingNotEnded { ends_at: Timestamp },

    #[error("insufficient governance tokens to propose: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },

    #[error("arithmetic overflow in vote tally")]
    ArithmeticOverflow,
}
