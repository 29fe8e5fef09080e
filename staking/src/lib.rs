//! Staking with time-weighted rewards.
//!
//! Stakers lock principal of the stake token in a custody account and earn
//! reward-token units at a global rate per staked unit per second:
//!
//! `accrued += principal × Σ(rate_i × overlap_i)`
//!
//! where the sum runs over the rate history segments intersected with
//! `[last_accrual_time, now]`. Accrual is lazy: it is settled only when a
//! position is touched, so a rate change is O(1) regardless of how many
//! positions exist.

pub mod engine;
pub mod error;
pub mod position;
pub mod rate;

pub use engine::{Payout, StakingEngine};
pub use error::StakingError;
pub use position::StakePosition;
pub use rate::{RateHistory, RateSegment};
