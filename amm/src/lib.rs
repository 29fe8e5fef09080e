//! Constant-product liquidity pools.
//!
//! Each pool holds two reserves in a ledger custody account and prices swaps
//! so that `reserve_a * reserve_b` never decreases:
//!
//! `amount_out = floor(reserve_out × effective_in / (reserve_in + effective_in))`
//! where `effective_in = floor(amount_in × (10000 − fee_bps) / 10000)`.
//!
//! The full `amount_in` (fee included) enters the input reserve, so the fee
//! stays in the pool and accrues to liquidity providers.
//!
//! Deposit policy: the first deposit sets the price and mints
//! `isqrt(amount_a × amount_b)` shares. Later deposits must match the current
//! reserve ratio within `ratio_tolerance_bps`, otherwise they are rejected
//! with [`AmmError::RatioMismatch`]; nothing is ever partially accepted.

pub mod engine;
pub mod error;
pub mod params;
pub mod pool;

pub use engine::{LiquidityPoolEngine, SwapReceipt};
pub use error::AmmError;
pub use params::AmmParams;
pub use pool::{DepositPlan, Pool, Redemption, SwapQuote};
