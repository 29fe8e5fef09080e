//! The economy context object.

use tally_amm::{AmmError, LiquidityPoolEngine, Redemption, SwapQuote, SwapReceipt};
use tally_governance::{GovernanceEngine, Proposal, ProposalAction, ProposalState};
use tally_ledger::{InMemoryLedger, TokenLedger};
use tally_staking::{Payout, RateHistory, StakePosition, StakingEngine, StakingError};
use tally_types::{AccountId, Amount, PoolId, ProposalId, Timestamp, TokenId};

use crate::config::EconomyConfig;
use crate::snapshot::EconomySnapshot;
use crate::EconomyError;

/// Owns the token ledger and the three engines.
///
/// The engines share no mutable data; each moves balances only through the
/// ledger it is handed per call. Every mutating method either completes or
/// leaves the whole economy unchanged.
pub struct Economy<L: TokenLedger = InMemoryLedger> {
    ledger: L,
    amm: LiquidityPoolEngine,
    staking: StakingEngine,
    governance: GovernanceEngine,
    governance_principal: AccountId,
}

impl Economy<InMemoryLedger> {
    /// Build an economy over a fresh in-memory ledger.
    ///
    /// The owner becomes an authorised minter of every configured token and
    /// the staking custody account an authorised minter of the reward token.
    pub fn new(config: &EconomyConfig, genesis: Timestamp) -> Result<Self, EconomyError> {
        let mut ledger = InMemoryLedger::new();
        let owner = &config.principals.owner;
        for token in [&config.tokens.stake, &config.tokens.reward, &config.tokens.governance] {
            ledger.authorize_minter(token, owner);
        }
        let custody = StakingEngine::custody_account_for(&config.tokens.stake);
        ledger.authorize_minter(&config.tokens.reward, &custody);
        Self::with_ledger(config, ledger, genesis)
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            ledger: self.ledger.clone(),
            pools: self.amm.pools().map(|p| (p.id.clone(), p.clone())).collect(),
            positions: self
                .staking
                .positions()
                .map(|p| (p.owner.clone(), p.clone()))
                .collect(),
            rate_history: self.staking.rate_history().clone(),
            proposals: self.governance.proposals().map(|p| (p.id, p.clone())).collect(),
            delegations: self.governance.delegation().delegations().clone(),
            next_proposal_id: self.governance.next_id(),
        }
    }

    /// Replace all state with a snapshot. Parameters stay as configured.
    ///
    /// Nothing changes if the snapshot is inconsistent.
    pub fn restore(&mut self, snapshot: EconomySnapshot) -> Result<(), EconomyError> {
        snapshot.validate()?;
        let staked = snapshot
            .positions
            .values()
            .try_fold(0u128, |acc, p| acc.checked_add(p.principal))
            .ok_or_else(|| EconomyError::Snapshot("staked principal overflows".to_string()))?;
        let custody = self.staking.custody_account();
        let held = snapshot.ledger.balance_of(custody, self.staking.stake_token());
        if held < staked {
            return Err(EconomyError::Snapshot(format!(
                "staking custody holds {held} but positions total {staked}"
            )));
        }

        self.staking
            .restore(snapshot.positions.into_values(), snapshot.rate_history)?;
        self.ledger = snapshot.ledger;
        self.amm.restore_pools(snapshot.pools.into_values());
        self.governance.restore(
            snapshot.proposals.into_values(),
            snapshot.next_proposal_id,
            snapshot.delegations,
        );
        tracing::info!(
            next_proposal_id = self.governance.next_id(),
            "economy restored from snapshot"
        );
        Ok(())
    }
}

impl<L: TokenLedger> Economy<L> {
    /// Build an economy over an existing ledger. Minter authorisations are
    /// the caller's responsibility.
    pub fn with_ledger(
        config: &EconomyConfig,
        ledger: L,
        genesis: Timestamp,
    ) -> Result<Self, EconomyError> {
        config.validate()?;
        let amm =
            LiquidityPoolEngine::new(config.amm.clone(), config.principals.governance.clone());
        let staking = StakingEngine::new(
            config.principals.owner.clone(),
            config.tokens.stake.clone(),
            config.tokens.reward.clone(),
            RateHistory::new(config.staking.initial_reward_rate as u128, genesis),
        );
        let governance =
            GovernanceEngine::new(config.governance.params(), config.tokens.governance.clone());
        tracing::info!(
            owner = %config.principals.owner,
            governance = %config.principals.governance,
            stake_token = %config.tokens.stake,
            reward_token = %config.tokens.reward,
            governance_token = %config.tokens.governance,
            voting_period = %tally_utils::format_duration(config.governance.voting_period_secs),
            "economy initialised"
        );
        Ok(Self {
            ledger,
            amm,
            staking,
            governance,
            governance_principal: config.principals.governance.clone(),
        })
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn amm(&self) -> &LiquidityPoolEngine {
        &self.amm
    }

    pub fn staking(&self) -> &StakingEngine {
        &self.staking
    }

    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    // ── Ledger pass-throughs ──────────────────────────────────────────

    pub fn balance_of(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.ledger.balance_of(account, token)
    }

    pub fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), EconomyError> {
        Ok(self.ledger.approve(owner, spender, token, amount)?)
    }

    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), EconomyError> {
        Ok(self.ledger.transfer(from, to, token, amount)?)
    }

    pub fn mint(
        &mut self,
        minter: &AccountId,
        to: &AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), EconomyError> {
        Ok(self.ledger.mint(minter, to, token, amount)?)
    }

    // ── Liquidity pools ───────────────────────────────────────────────

    pub fn add_liquidity(
        &mut self,
        provider: &AccountId,
        pool: &PoolId,
        amount_a: Amount,
        amount_b: Amount,
        now: Timestamp,
    ) -> Result<Amount, EconomyError> {
        Ok(self
            .amm
            .add_liquidity(&mut self.ledger, provider, pool, amount_a, amount_b, now)?)
    }

    pub fn remove_liquidity(
        &mut self,
        provider: &AccountId,
        pool: &PoolId,
        shares: Amount,
    ) -> Result<Redemption, EconomyError> {
        Ok(self.amm.remove_liquidity(&mut self.ledger, provider, pool, shares)?)
    }

    pub fn swap(
        &mut self,
        trader: &AccountId,
        pool: &PoolId,
        amount_in: Amount,
        input_is_a: bool,
        min_amount_out: Option<Amount>,
    ) -> Result<SwapReceipt, EconomyError> {
        Ok(self
            .amm
            .swap(&mut self.ledger, trader, pool, amount_in, input_is_a, min_amount_out)?)
    }

    pub fn quote(
        &self,
        pool: &PoolId,
        amount_in: Amount,
        input_is_a: bool,
    ) -> Result<SwapQuote, EconomyError> {
        Ok(self.amm.quote(pool, amount_in, input_is_a)?)
    }

    pub fn get_reserves(&self, pool: &PoolId) -> Result<(Amount, Amount), EconomyError> {
        Ok(self.amm.get_reserves(pool)?)
    }

    // ── Staking ───────────────────────────────────────────────────────

    pub fn stake(
        &mut self,
        owner: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<StakePosition, EconomyError> {
        Ok(self.staking.stake(&mut self.ledger, owner, amount, now)?)
    }

    pub fn unstake(&mut self, owner: &AccountId, now: Timestamp) -> Result<Payout, EconomyError> {
        Ok(self.staking.unstake(&mut self.ledger, owner, now)?)
    }

    pub fn emergency_withdraw(
        &mut self,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Payout, EconomyError> {
        Ok(self.staking.emergency_withdraw(&mut self.ledger, owner, now)?)
    }

    pub fn claim_rewards(
        &mut self,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Amount, EconomyError> {
        Ok(self.staking.claim_rewards(&mut self.ledger, owner, now)?)
    }

    pub fn set_reward_rate(
        &mut self,
        caller: &AccountId,
        rate: Amount,
        now: Timestamp,
    ) -> Result<Amount, EconomyError> {
        Ok(self.staking.set_reward_rate(caller, rate, now)?)
    }

    pub fn pending_rewards(
        &self,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Amount, EconomyError> {
        Ok(self.staking.pending_rewards(owner, now)?)
    }

    // ── Governance ────────────────────────────────────────────────────

    pub fn create_proposal(
        &mut self,
        proposer: &AccountId,
        description: &str,
        action: ProposalAction,
        now: Timestamp,
    ) -> Result<ProposalId, EconomyError> {
        self.check_action(&action)?;
        Ok(self
            .governance
            .create_proposal(&self.ledger, proposer, description, action, now)?)
    }

    pub fn vote(
        &mut self,
        voter: &AccountId,
        proposal: ProposalId,
        support: bool,
        now: Timestamp,
    ) -> Result<Amount, EconomyError> {
        Ok(self.governance.vote(&self.ledger, voter, proposal, support, now)?)
    }

    pub fn delegate_vote(
        &mut self,
        delegator: &AccountId,
        delegate: &AccountId,
    ) -> Result<(), EconomyError> {
        Ok(self.governance.delegate_vote(delegator, delegate)?)
    }

    pub fn undelegate(&mut self, delegator: &AccountId) -> Option<AccountId> {
        self.governance.undelegate(delegator)
    }

    pub fn finalize_proposal(
        &mut self,
        proposal: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalState, EconomyError> {
        Ok(self.governance.finalize(proposal, now)?)
    }

    /// Execute a proposal and apply its action exactly once.
    ///
    /// The proposal is checked first, the action applied second, and the
    /// proposal marked executed last. If the action fails the proposal
    /// stays as it was and may be executed again later.
    pub fn execute_proposal(
        &mut self,
        proposal: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalAction, EconomyError> {
        let action = self.governance.check_execution(proposal)?.clone();
        match &action {
            ProposalAction::Text => {}
            ProposalAction::SetPoolFee { pool, fee_bps } => {
                self.amm.set_fee(&self.governance_principal, pool, *fee_bps, now)?;
            }
            ProposalAction::SetRewardRate { rate } => {
                self.staking
                    .set_reward_rate(&self.governance_principal, *rate, now)?;
            }
        }
        self.governance.mark_executed(proposal, now)?;
        Ok(action)
    }

    pub fn get_proposal(&self, proposal: ProposalId) -> Option<&Proposal> {
        self.governance.get_proposal(proposal)
    }

    /// Reject actions that could never be applied by the governance
    /// principal.
    fn check_action(&self, action: &ProposalAction) -> Result<(), EconomyError> {
        match action {
            ProposalAction::Text => Ok(()),
            ProposalAction::SetPoolFee { pool, fee_bps } => {
                let max_bps = self.amm.params().max_fee_bps;
                if *fee_bps > max_bps {
                    return Err(AmmError::FeeTooHigh {
                        fee_bps: *fee_bps,
                        max_bps,
                    }
                    .into());
                }
                if self.amm.pool(pool).is_none() {
                    return Err(AmmError::PoolNotFound(pool.clone()).into());
                }
                Ok(())
            }
            ProposalAction::SetRewardRate { .. } => {
                if *self.staking.owner() != self.governance_principal {
                    let principal = self.governance_principal.clone();
                    return Err(StakingError::Unauthorized(principal).into());
                }
                Ok(())
            }
        }
    }
}
