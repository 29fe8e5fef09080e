//! Nullable infrastructure for deterministic testing.
//!
//! Test-friendly implementations of the core's external seams:
//! - [`NullClock`] only moves when told to.
//! - [`FaultyLedger`] wraps the in-memory ledger and fails batches on demand,
//!   for checking that engines leave their state untouched when the ledger
//!   rejects a movement.

pub mod clock;
pub mod ledger;

pub use clock::NullClock;
pub use ledger::FaultyLedger;
