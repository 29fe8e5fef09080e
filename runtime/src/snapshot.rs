//! Deterministic economy snapshots.
//!
//! Every table is ordered, so two economies in the same state encode to the
//! same bytes.

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use tally_amm::Pool;
use tally_governance::Proposal;
use tally_ledger::{InMemoryLedger, TokenLedger};
use tally_staking::{RateHistory, StakePosition};
use tally_types::{AccountId, PoolId, ProposalId};

use crate::EconomyError;

/// Magic prefix identifying a snapshot file.
const SNAPSHOT_MAGIC: &[u8; 4] = b"TLY1";

/// Largest encoded snapshot body accepted.
pub const MAX_SNAPSHOT_BYTES: u64 = 256 * 1024 * 1024;

fn snapshot_bincode_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_SNAPSHOT_BYTES)
}

fn invalid(msg: String) -> EconomyError {
    EconomyError::Snapshot(msg)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub ledger: InMemoryLedger,
    pub pools: BTreeMap<PoolId, Pool>,
    pub positions: BTreeMap<AccountId, StakePosition>,
    pub rate_history: RateHistory,
    pub proposals: BTreeMap<ProposalId, Proposal>,
    /// delegator → delegate.
    pub delegations: BTreeMap<AccountId, AccountId>,
    pub next_proposal_id: ProposalId,
}

impl EconomySnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, EconomyError> {
        self.validate()?;
        let body = snapshot_bincode_options()
            .serialize(self)
            .map_err(|e| EconomyError::Snapshot(e.to_string()))?;
        let mut bytes = Vec::with_capacity(SNAPSHOT_MAGIC.len() + body.len());
        bytes.extend_from_slice(SNAPSHOT_MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EconomyError> {
        let body = bytes
            .strip_prefix(SNAPSHOT_MAGIC.as_slice())
            .ok_or_else(|| EconomyError::Snapshot("missing snapshot header".to_string()))?;
        let snapshot: Self = snapshot_bincode_options()
            .deserialize(body)
            .map_err(|e| EconomyError::Snapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the cross-table invariants a consistent economy keeps.
    pub fn validate(&self) -> Result<(), EconomyError> {
        for (id, pool) in &self.pools {
            if *id != pool.id || id.is_degenerate() {
                return Err(invalid(format!("pool {id} is keyed or paired inconsistently")));
            }
            if !pool.shares_consistent() {
                return Err(invalid(format!("pool {id} shares do not sum to its total")));
            }
            if pool.total_shares == 0 && (pool.reserve_a != 0 || pool.reserve_b != 0) {
                return Err(invalid(format!("pool {id} holds reserves without shares")));
            }
            let custody = id.custody_account();
            if self.ledger.balance_of(&custody, &id.token_a) < pool.reserve_a
                || self.ledger.balance_of(&custody, &id.token_b) < pool.reserve_b
            {
                return Err(invalid(format!("pool {id} custody holds less than its reserves")));
            }
        }
        for (owner, position) in &self.positions {
            if *owner != position.owner || !position.is_active() {
                return Err(invalid(format!("stake position of {owner} is inconsistent")));
            }
        }
        for (id, proposal) in &self.proposals {
            if *id != proposal.id || *id >= self.next_proposal_id {
                return Err(invalid(format!("proposal {id} is out of sequence")));
            }
        }
        if let Some((from, _)) = self.delegations.iter().find(|(from, to)| from == to) {
            return Err(invalid(format!("{from} delegates to itself")));
        }
        Ok(())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), EconomyError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, EconomyError> {
        Self::from_bytes(&std::fs::read(path)?)
    }
}
