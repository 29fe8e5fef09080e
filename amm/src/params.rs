//! Tunable pool parameters.

use crate::error::AmmError;
use serde::{Deserialize, Serialize};
use tally_types::{BasisPoints, BPS_DENOMINATOR};

/// Parameters shared by every pool of one engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmParams {
    /// Fee assigned to newly bootstrapped pools.
    #[serde(default = "default_fee_bps")]
    pub default_fee_bps: BasisPoints,

    /// Upper bound for any fee set through governance.
    #[serde(default = "default_max_fee_bps")]
    pub max_fee_bps: BasisPoints,

    /// Allowed deviation of a deposit from the pool's reserve ratio.
    #[serde(default = "default_ratio_tolerance_bps")]
    pub ratio_tolerance_bps: BasisPoints,

    /// Minimum seconds between two fee changes on the same pool.
    #[serde(default = "default_fee_change_cooldown_secs")]
    pub fee_change_cooldown_secs: u64,
}

fn default_fee_bps() -> BasisPoints {
    30
}

fn default_max_fee_bps() -> BasisPoints {
    1_000
}

fn default_ratio_tolerance_bps() -> BasisPoints {
    100
}

fn default_fee_change_cooldown_secs() -> u64 {
    86_400
}

impl AmmParams {
    pub fn validate(&self) -> Result<(), AmmError> {
        let ceiling = BPS_DENOMINATOR as BasisPoints;
        if self.max_fee_bps > ceiling {
            return Err(AmmError::FeeTooHigh {
                fee_bps: self.max_fee_bps,
                max_bps: ceiling,
            });
        }
        if self.default_fee_bps > self.max_fee_bps {
            return Err(AmmError::FeeTooHigh {
                fee_bps: self.default_fee_bps,
                max_bps: self.max_fee_bps,
            });
        }
        if self.ratio_tolerance_bps > ceiling {
            return Err(AmmError::InvalidAmount("ratio tolerance above 100%"));
        }
        Ok(())
    }
}

impl Default for AmmParams {
    fn default() -> Self {
        Self {
            default_fee_bps: default_fee_bps(),
            max_fee_bps: default_max_fee_bps(),
            ratio_tolerance_bps: default_ratio_tolerance_bps(),
            fee_change_cooldown_secs: default_fee_change_cooldown_secs(),
        }
    }
}
