//! Fundamental types for the Tally economics core.
//!
//! This crate defines the identifiers and scalar types shared by every other
//! crate in the workspace: accounts, tokens, pools, proposals, amounts,
//! timestamps and the clock abstraction.

pub mod address;
pub mod amount;
pub mod time;

pub use address::{AccountId, PoolId, ProposalId, TokenId};
pub use amount::{isqrt, mul_div_floor, Amount, BasisPoints, BPS_DENOMINATOR};
pub use time::{Clock, SystemClock, Timestamp};
