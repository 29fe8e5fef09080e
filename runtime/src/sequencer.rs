//! Single-writer command sequencer.
//!
//! The sequencer owns the economy behind a mutex. Each submitted command is
//! stamped with the next sequence number and a timestamp and applied under
//! the lock, so commands from any number of threads are strictly
//! serialised. Nothing inside the critical section blocks on I/O.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tally_amm::{Redemption, SwapReceipt};
use tally_governance::{ProposalAction, ProposalState};
use tally_ledger::{InMemoryLedger, TokenLedger};
use tally_staking::{Payout, StakePosition};
use tally_types::{AccountId, Amount, Clock, PoolId, ProposalId, Timestamp, TokenId};

use crate::economy::Economy;
use crate::EconomyError;

/// A state-changing request, as submitted by a client or read from a log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Approve {
        owner: AccountId,
        spender: AccountId,
        token: TokenId,
        amount: Amount,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        token: TokenId,
        amount: Amount,
    },
    Mint {
        minter: AccountId,
        to: AccountId,
        token: TokenId,
        amount: Amount,
    },
    AddLiquidity {
        provider: AccountId,
        pool: PoolId,
        amount_a: Amount,
        amount_b: Amount,
    },
    RemoveLiquidity {
        provider: AccountId,
        pool: PoolId,
        shares: Amount,
    },
    Swap {
        trader: AccountId,
        pool: PoolId,
        amount_in: Amount,
        input_is_a: bool,
        #[serde(default)]
        min_amount_out: Option<Amount>,
    },
    Stake {
        owner: AccountId,
        amount: Amount,
    },
    Unstake {
        owner: AccountId,
    },
    EmergencyWithdraw {
        owner: AccountId,
    },
    ClaimRewards {
        owner: AccountId,
    },
    SetRewardRate {
        caller: AccountId,
        rate: Amount,
    },
    CreateProposal {
        proposer: AccountId,
        description: String,
        action: ProposalAction,
    },
    Vote {
        voter: AccountId,
        proposal: ProposalId,
        support: bool,
    },
    DelegateVote {
        delegator: AccountId,
        delegate: AccountId,
    },
    Undelegate {
        delegator: AccountId,
    },
    FinalizeProposal {
        proposal: ProposalId,
    },
    ExecuteProposal {
        proposal: ProposalId,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Transfer { .. } => "transfer",
            Self::Mint { .. } => "mint",
            Self::AddLiquidity { .. } => "add_liquidity",
            Self::RemoveLiquidity { .. } => "remove_liquidity",
            Self::Swap { .. } => "swap",
            Self::Stake { .. } => "stake",
            Self::Unstake { .. } => "unstake",
            Self::EmergencyWithdraw { .. } => "emergency_withdraw",
            Self::ClaimRewards { .. } => "claim_rewards",
            Self::SetRewardRate { .. } => "set_reward_rate",
            Self::CreateProposal { .. } => "create_proposal",
            Self::Vote { .. } => "vote",
            Self::DelegateVote { .. } => "delegate_vote",
            Self::Undelegate { .. } => "undelegate",
            Self::FinalizeProposal { .. } => "finalize_proposal",
            Self::ExecuteProposal { .. } => "execute_proposal",
        }
    }
}

/// What a successful command produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    SharesMinted(Amount),
    Redeemed(Redemption),
    Swapped(SwapReceipt),
    Staked(StakePosition),
    PaidOut(Payout),
    RewardsClaimed(Amount),
    RateChanged { previous: Amount },
    ProposalCreated(ProposalId),
    Voted { weight: Amount },
    Undelegated { previous: Option<AccountId> },
    Finalized(ProposalState),
    Executed(ProposalAction),
}

/// A command after sequencing.
#[derive(Debug)]
pub struct Applied {
    pub sequence: u64,
    pub at: Timestamp,
    pub result: Result<Outcome, EconomyError>,
}

struct State<L: TokenLedger> {
    economy: Economy<L>,
    next_sequence: u64,
    last_at: Timestamp,
}

/// The single logical writer over one economy.
pub struct Sequencer<C: Clock, L: TokenLedger = InMemoryLedger> {
    state: Mutex<State<L>>,
    clock: C,
}

impl<C: Clock, L: TokenLedger> Sequencer<C, L> {
    pub fn new(economy: Economy<L>, clock: C) -> Self {
        Self {
            state: Mutex::new(State {
                economy,
                next_sequence: 0,
                last_at: Timestamp::EPOCH,
            }),
            clock,
        }
    }

    /// Apply `command` at the clock's current time.
    pub fn submit(&self, command: Command) -> Applied {
        let mut state = self.lock();
        let now = self.clock.now();
        Self::apply_locked(&mut state, command, now)
    }

    /// Apply `command` at a recorded time, e.g. when replaying a log.
    pub fn submit_at(&self, command: Command, at: Timestamp) -> Applied {
        let mut state = self.lock();
        Self::apply_locked(&mut state, command, at)
    }

    /// Run a read-only query against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&Economy<L>) -> R) -> R {
        f(&self.lock().economy)
    }

    /// Number of commands sequenced so far.
    pub fn sequenced(&self) -> u64 {
        self.lock().next_sequence
    }

    pub fn into_economy(self) -> Economy<L> {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .economy
    }

    fn lock(&self) -> MutexGuard<'_, State<L>> {
        // Every command validates before it mutates, so state behind a
        // poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_locked(state: &mut State<L>, command: Command, at: Timestamp) -> Applied {
        // Time never runs backwards between sequenced commands.
        let at = at.max(state.last_at);
        state.last_at = at;
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let span = tracing::info_span!("command", seq = sequence, op = command.name(), at = %at);
        let _enter = span.enter();
        let result = apply(&mut state.economy, command, at);
        match &result {
            Ok(_) => tracing::debug!("command applied"),
            Err(e) => tracing::warn!(kind = e.kind(), error = %e, "command rejected"),
        }
        Applied { sequence, at, result }
    }
}

fn apply<L: TokenLedger>(
    economy: &mut Economy<L>,
    command: Command,
    now: Timestamp,
) -> Result<Outcome, EconomyError> {
    let outcome = match command {
        Command::Approve {
            owner,
            spender,
            token,
            amount,
        } => {
            economy.approve(&owner, &spender, &token, amount)?;
            Outcome::Done
        }
        Command::Transfer { from, to, token, amount } => {
            economy.transfer(&from, &to, &token, amount)?;
            Outcome::Done
        }
        Command::Mint { minter, to, token, amount } => {
            economy.mint(&minter, &to, &token, amount)?;
            Outcome::Done
        }
        Command::AddLiquidity {
            provider,
            pool,
            amount_a,
            amount_b,
        } => {
            let shares = economy.add_liquidity(&provider, &pool, amount_a, amount_b, now)?;
            Outcome::SharesMinted(shares)
        }
        Command::RemoveLiquidity { provider, pool, shares } => {
            Outcome::Redeemed(economy.remove_liquidity(&provider, &pool, shares)?)
        }
        Command::Swap {
            trader,
            pool,
            amount_in,
            input_is_a,
            min_amount_out,
        } => Outcome::Swapped(economy.swap(&trader, &pool, amount_in, input_is_a, min_amount_out)?),
        Command::Stake { owner, amount } => Outcome::Staked(economy.stake(&owner, amount, now)?),
        Command::Unstake { owner } => Outcome::PaidOut(economy.unstake(&owner, now)?),
        Command::EmergencyWithdraw { owner } => {
            Outcome::PaidOut(economy.emergency_withdraw(&owner, now)?)
        }
        Command::ClaimRewards { owner } => {
            Outcome::RewardsClaimed(economy.claim_rewards(&owner, now)?)
        }
        Command::SetRewardRate { caller, rate } => Outcome::RateChanged {
            previous: economy.set_reward_rate(&caller, rate, now)?,
        },
        Command::CreateProposal {
            proposer,
            description,
            action,
        } => {
            let id = economy.create_proposal(&proposer, &description, action, now)?;
            Outcome::ProposalCreated(id)
        }
        Command::Vote {
            voter,
            proposal,
            support,
        } => Outcome::Voted {
            weight: economy.vote(&voter, proposal, support, now)?,
        },
        Command::DelegateVote { delegator, delegate } => {
            economy.delegate_vote(&delegator, &delegate)?;
            Outcome::Done
        }
        Command::Undelegate { delegator } => Outcome::Undelegated {
            previous: economy.undelegate(&delegator),
        },
        Command::FinalizeProposal { proposal } => {
            Outcome::Finalized(economy.finalize_proposal(proposal, now)?)
        }
        Command::ExecuteProposal { proposal } => {
            Outcome::Executed(economy.execute_proposal(proposal, now)?)
        }
    };
    Ok(outcome)
}
