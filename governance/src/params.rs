//! Governance thresholds and periods.

use tally_types::Amount;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernanceParams {
    /// Minimum `votes_for + votes_against`, in governance-token units.
    pub quorum: Amount,
    pub voting_period_secs: u64,
    /// Governance-token balance a proposer must hold.
    pub proposal_threshold: Amount,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            quorum: 1,
            voting_period_secs: 3 * 24 * 60 * 60,
            proposal_threshold: 0,
        }
    }
}
