//! Per-account stake positions.

use serde::{Deserialize, Serialize};
use tally_types::{AccountId, Amount, Timestamp};

/// One account's staked principal and settled rewards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub owner: AccountId,
    pub principal: Amount,
    pub stake_start_time: Timestamp,
    /// Rewards settled up to `last_accrual_time` and not yet paid out.
    pub accrued_rewards: Amount,
    pub last_accrual_time: Timestamp,
}

impl StakePosition {
    pub fn new(owner: AccountId, now: Timestamp) -> Self {
        Self {
            owner,
            principal: 0,
            stake_start_time: now,
            accrued_rewards: 0,
            last_accrual_time: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.principal > 0
    }
}
