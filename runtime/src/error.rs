use tally_amm::AmmError;
use tally_governance::GovernanceError;
use tally_ledger::LedgerError;
use tally_staking::StakingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("pool error: {0}")]
    Amm(#[from] AmmError),

    #[error("staking error: {0}")]
    Staking(#[from] StakingError),

    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EconomyError {
    /// Stable, flat name of the failure, independent of which engine
    /// raised it.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ledger(e) => ledger_kind(e),
            Self::Amm(e) => match e {
                AmmError::PoolNotFound(_) => "PoolNotFound",
                AmmError::IdenticalTokens(_) => "IdenticalTokens",
                AmmError::InvalidAmount(_) => "InvalidAmount",
                AmmError::InsufficientShares { .. } => "InsufficientShares",
                AmmError::InsufficientLiquidity(_) => "InsufficientLiquidity",
                AmmError::RatioMismatch { .. } => "RatioMismatch",
                AmmError::SlippageExceeded { .. } => "SlippageExceeded",
                AmmError::FeeTooHigh { .. } => "FeeTooHigh",
                AmmError::CooldownNotMet { .. } => "CooldownNotMet",
                AmmError::Unauthorized(_) => "Unauthorized",
                AmmError::KInvariantViolation => "KInvariantViolation",
                AmmError::ArithmeticOverflow => "ArithmeticOverflow",
                AmmError::Ledger(e) => ledger_kind(e),
            },
            Self::Staking(e) => match e {
                StakingError::InvalidAmount => "InvalidAmount",
                StakingError::InsufficientBalance { .. } => "InsufficientBalance",
                StakingError::NoActiveStake(_) => "NoActiveStake",
                StakingError::Unauthorized(_) => "Unauthorized",
                StakingError::InvalidTimestamp { .. } => "InvalidTimestamp",
                StakingError::ArithmeticOverflow => "ArithmeticOverflow",
                StakingError::Ledger(e) => ledger_kind(e),
            },
            Self::Governance(e) => match e {
                GovernanceError::NonexistentProposal(_) => "NonexistentProposal",
                GovernanceError::ProposalNotOpen(_) => "ProposalNotOpen",
                GovernanceError::DuplicateVote { .. } => "DuplicateVote",
                GovernanceError::SelfDelegation(_) => "SelfDelegation",
                GovernanceError::QuorumNotMet { .. } => "QuorumNotMet",
                GovernanceError::NotPassed { .. } => "NotPassed",
                GovernanceError::NoVotingPower(_) => "NoVotingPower",
                GovernanceError::EmptyDescription => "EmptyDescription",
                GovernanceError::VotingNotEnded { .. } => "VotingNotEnded",
                GovernanceError::InsufficientBalance { .. } => "InsufficientBalance",
                GovernanceError::ArithmeticOverflow => "ArithmeticOverflow",
            },
            Self::Config(_) => "Config",
            Self::Snapshot(_) => "Snapshot",
            Self::Io(_) => "Io",
        }
    }
}

fn ledger_kind(e: &LedgerError) -> &'static str {
    match e {
        LedgerError::InvalidAmount => "InvalidAmount",
        LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
        LedgerError::InsufficientAllowance { .. } => "InsufficientAllowance",
        LedgerError::Unauthorized { .. } => "Unauthorized",
        LedgerError::ArithmeticOverflow => "ArithmeticOverflow",
        LedgerError::Unavailable(_) => "LedgerUnavailable",
    }
}
