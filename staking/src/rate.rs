//! Global reward rate history.

use crate::error::StakingError;
use serde::{Deserialize, Serialize};
use tally_types::{Amount, Timestamp};

/// A span of time during which one reward rate applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSegment {
    /// Reward units per staked unit per second.
    pub rate: Amount,
    pub start: Timestamp,
    /// `None` while this is the active segment.
    pub end: Option<Timestamp>,
}

/// Rate segments shared by every position.
///
/// A rate change closes the active segment and appends a new one, so it
/// costs O(1). Settling a position walks the segments overlapping its
/// accrual window, O(k) in the number of rate changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateHistory {
    segments: Vec<RateSegment>,
}

impl RateHistory {
    pub fn new(initial_rate: Amount, genesis: Timestamp) -> Self {
        Self {
            segments: vec![RateSegment {
                rate: initial_rate,
                start: genesis,
                end: None,
            }],
        }
    }

    pub fn segments(&self) -> &[RateSegment] {
        &self.segments
    }

    pub fn current_rate(&self) -> Amount {
        self.segments.last().map(|s| s.rate).unwrap_or(0)
    }

    /// Start of the active segment.
    pub fn active_since(&self) -> Timestamp {
        self.segments.last().map(|s| s.start).unwrap_or(Timestamp::EPOCH)
    }

    /// Close the active segment at `change_at` and start `new_rate` there.
    ///
    /// Changing twice at the same instant leaves an empty segment behind,
    /// which contributes nothing to accrual.
    pub fn apply_rate_change(
        &mut self,
        new_rate: Amount,
        change_at: Timestamp,
    ) -> Result<(), StakingError> {
        if let Some(current) = self.segments.last_mut() {
            if change_at < current.start {
                return Err(StakingError::InvalidTimestamp {
                    at: change_at,
                    earliest: current.start,
                });
            }
            current.end = Some(change_at);
        }
        self.segments.push(RateSegment {
            rate: new_rate,
            start: change_at,
            end: None,
        });
        Ok(())
    }

    /// `Σ(rate_i × overlap_i)` over `[from, to]`, or `None` on overflow.
    ///
    /// Multiplying by a principal gives the reward earned in that window.
    pub fn accrual_factor(&self, from: Timestamp, to: Timestamp) -> Option<u128> {
        let mut total: u128 = 0;
        for seg in &self.segments {
            let start = seg.start.max(from);
            let end = seg.end.unwrap_or(to).min(to);
            if start >= end {
                continue;
            }
            let duration = (end.as_secs() - start.as_secs()) as u128;
            total = total.checked_add(seg.rate.checked_mul(duration)?)?;
        }
        Some(total)
    }
}

impl Default for RateHistory {
    fn default() -> Self {
        Self::new(0, Timestamp::EPOCH)
    }
}
