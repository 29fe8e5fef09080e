//! Token-weighted governance.
//!
//! Proposals move through `Open → {Passed | Rejected} → Executed`. Vote
//! weight is the governance-token balance of the voter plus the balances of
//! accounts that delegate directly to them. Each account's balance counts at
//! most once per proposal, whether it arrives directly or through a delegate.
//!
//! Execution is split in two so the caller can apply a proposal's side
//! effect between the check and the state change: [`GovernanceEngine::check_execution`]
//! validates without mutating, [`GovernanceEngine::mark_executed`] commits.

pub mod delegation;
pub mod engine;
pub mod error;
pub mod params;
pub mod proposal;

pub use delegation::DelegationEngine;
pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use params::GovernanceParams;
pub use proposal::{Proposal, ProposalAction, ProposalState};
