//! Token ledger capability consumed by the economics engines.
//!
//! The engines never touch balances directly. They describe the balance
//! movements of one operation as a list of [`LedgerOp`]s and hand the whole
//! list to [`TokenLedger::apply_batch`], which commits all of it or none of
//! it. That is the single seam where "ledger transfer + engine state update"
//! becomes one atomic unit: engines validate first, apply the batch, and only
//! then write their own (already computed) state.

pub mod error;
pub mod ledger;
pub mod memory;

pub use error::LedgerError;
pub use ledger::{LedgerOp, TokenLedger};
pub use memory::InMemoryLedger;
