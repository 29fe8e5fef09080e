//! The economy runtime.
//!
//! [`Economy`] owns the token ledger and the three engines and exposes every
//! operation as a method taking the caller and the current time.
//! [`Sequencer`] wraps an economy as the single logical writer: commands are
//! stamped with a sequence number and a timestamp and applied one at a time.

pub mod config;
pub mod economy;
pub mod error;
pub mod sequencer;
pub mod snapshot;

pub use config::EconomyConfig;
pub use economy::Economy;
pub use error::EconomyError;
pub use sequencer::{Applied, Command, Outcome, Sequencer};
pub use snapshot::EconomySnapshot;
