//! Staking engine: positions, payouts and the owner-gated reward rate.

use crate::error::StakingError;
use crate::position::StakePosition;
use crate::rate::RateHistory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_ledger::{LedgerOp, TokenLedger};
use tally_types::{AccountId, Amount, Timestamp, TokenId};

/// What an exit paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub principal: Amount,
    pub rewards: Amount,
}

/// Holds stake principal in a custody account and mints rewards from it.
///
/// The custody account must be an authorised minter of the reward token,
/// and stakers must approve it as spender of the stake token before
/// staking.
pub struct StakingEngine {
    owner: AccountId,
    stake_token: TokenId,
    reward_token: TokenId,
    custody: AccountId,
    rate_history: RateHistory,
    positions: BTreeMap<AccountId, StakePosition>,
    total_staked: Amount,
    /// Latest time any operation ran at. Rate changes may not precede it.
    latest_activity: Timestamp,
}

impl StakingEngine {
    pub fn new(
        owner: AccountId,
        stake_token: TokenId,
        reward_token: TokenId,
        rate_history: RateHistory,
    ) -> Self {
        let custody = Self::custody_account_for(&stake_token);
        let latest_activity = rate_history.active_since();
        Self {
            owner,
            stake_token,
            reward_token,
            custody,
            rate_history,
            positions: BTreeMap::new(),
            total_staked: 0,
            latest_activity,
        }
    }

    /// The ledger account holding principal staked in `stake_token`.
    pub fn custody_account_for(stake_token: &TokenId) -> AccountId {
        AccountId::new(format!("staking:{stake_token}"))
    }

    pub fn custody_account(&self) -> &AccountId {
        &self.custody
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn stake_token(&self) -> &TokenId {
        &self.stake_token
    }

    pub fn reward_token(&self) -> &TokenId {
        &self.reward_token
    }

    pub fn rate_history(&self) -> &RateHistory {
        &self.rate_history
    }

    pub fn reward_rate(&self) -> Amount {
        self.rate_history.current_rate()
    }

    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    pub fn latest_activity(&self) -> Timestamp {
        self.latest_activity
    }

    pub fn position(&self, owner: &AccountId) -> Option<&StakePosition> {
        self.positions.get(owner)
    }

    pub fn positions(&self) -> impl Iterator<Item = &StakePosition> {
        self.positions.values()
    }

    /// Replace positions and rate history, e.g. when restoring a snapshot.
    /// The staked total is recomputed from the positions.
    pub fn restore(
        &mut self,
        positions: impl IntoIterator<Item = StakePosition>,
        rate_history: RateHistory,
    ) -> Result<(), StakingError> {
        let positions: BTreeMap<AccountId, StakePosition> =
            positions.into_iter().map(|p| (p.owner.clone(), p)).collect();
        let total_staked = positions
            .values()
            .try_fold(0u128, |acc, p| acc.checked_add(p.principal))
            .ok_or(StakingError::ArithmeticOverflow)?;
        let latest_activity = positions
            .values()
            .map(|p| p.last_accrual_time)
            .fold(rate_history.active_since(), Timestamp::max);
        self.positions = positions;
        self.rate_history = rate_history;
        self.total_staked = total_staked;
        self.latest_activity = latest_activity;
        Ok(())
    }

    /// Settled plus unsettled rewards at `now`. Zero for unknown accounts.
    pub fn pending_rewards(
        &self,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Amount, StakingError> {
        match self.positions.get(owner) {
            Some(position) => Ok(self.settled(position, now)?.accrued_rewards),
            None => Ok(0),
        }
    }

    /// Lock `amount` of the stake token. Pending rewards are settled first.
    pub fn stake<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        owner: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<StakePosition, StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let available = ledger.balance_of(owner, &self.stake_token);
        if available < amount {
            return Err(StakingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        let mut position = match self.positions.get(owner) {
            Some(existing) => self.settled(existing, now)?,
            None => StakePosition::new(owner.clone(), now),
        };
        position.principal = position
            .principal
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        let total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;

        ledger.apply_batch(&[LedgerOp::TransferFrom {
            spender: self.custody.clone(),
            from: owner.clone(),
            to: self.custody.clone(),
            token: self.stake_token.clone(),
            amount,
        }])?;

        self.total_staked = total_staked;
        self.positions.insert(owner.clone(), position.clone());
        self.touch(now);
        tracing::debug!(owner = %owner, amount, principal = position.principal, "staked");
        Ok(position)
    }

    /// Exit fully: return principal and pay every accrued reward.
    pub fn unstake<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Payout, StakingError> {
        let position = self.settled(self.active(owner)?, now)?;
        let payout = Payout {
            principal: position.principal,
            rewards: position.accrued_rewards,
        };

        let mut ops = vec![self.principal_return(owner, payout.principal)];
        if payout.rewards > 0 {
            ops.push(self.reward_mint(owner, payout.rewards));
        }
        ledger.apply_batch(&ops)?;

        self.close(owner, payout.principal);
        self.touch(now);
        tracing::debug!(
            owner = %owner,
            principal = payout.principal,
            rewards = payout.rewards,
            "unstaked"
        );
        Ok(payout)
    }

    /// Exit without rewards. Accrued rewards are forfeited.
    pub fn emergency_withdraw<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Payout, StakingError> {
        let position = self.active(owner)?;
        let principal = position.principal;
        let forfeited = match self.settled(position, now) {
            Ok(settled) => Some(settled.accrued_rewards),
            Err(e) => {
                tracing::warn!(
                    owner = %owner,
                    error = %e,
                    "forfeited rewards could not be settled"
                );
                None
            }
        };

        ledger.apply_batch(&[self.principal_return(owner, principal)])?;

        self.close(owner, principal);
        self.touch(now);
        tracing::warn!(owner = %owner, principal, forfeited = ?forfeited, "emergency withdrawal");
        Ok(Payout { principal, rewards: 0 })
    }

    /// Pay accrued rewards and keep the principal staked.
    pub fn claim_rewards<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        owner: &AccountId,
        now: Timestamp,
    ) -> Result<Amount, StakingError> {
        let mut position = self.settled(self.active(owner)?, now)?;
        let rewards = position.accrued_rewards;
        if rewards > 0 {
            ledger.apply_batch(&[self.reward_mint(owner, rewards)])?;
        }

        position.accrued_rewards = 0;
        self.positions.insert(owner.clone(), position);
        self.touch(now);
        tracing::debug!(owner = %owner, rewards, "rewards claimed");
        Ok(rewards)
    }

    /// Change the reward rate from `now` on. Returns the previous rate.
    ///
    /// `now` may not precede the latest time any operation ran at.
    pub fn set_reward_rate(
        &mut self,
        caller: &AccountId,
        rate: Amount,
        now: Timestamp,
    ) -> Result<Amount, StakingError> {
        if *caller != self.owner {
            return Err(StakingError::Unauthorized(caller.clone()));
        }
        if now < self.latest_activity {
            return Err(StakingError::InvalidTimestamp {
                at: now,
                earliest: self.latest_activity,
            });
        }
        let old = self.rate_history.current_rate();
        self.rate_history.apply_rate_change(rate, now)?;
        self.touch(now);
        tracing::info!(old_rate = old, new_rate = rate, at = %now, "reward rate changed");
        Ok(old)
    }

    fn touch(&mut self, now: Timestamp) {
        self.latest_activity = self.latest_activity.max(now);
    }

    fn active(&self, owner: &AccountId) -> Result<&StakePosition, StakingError> {
        self.positions
            .get(owner)
            .filter(|p| p.is_active())
            .ok_or_else(|| StakingError::NoActiveStake(owner.clone()))
    }

    /// A copy of `position` with rewards settled up to `now`.
    ///
    /// A `now` before the last settlement accrues nothing and leaves
    /// `last_accrual_time` where it was.
    fn settled(
        &self,
        position: &StakePosition,
        now: Timestamp,
    ) -> Result<StakePosition, StakingError> {
        let mut settled = position.clone();
        if now <= position.last_accrual_time {
            return Ok(settled);
        }
        let earned = self
            .rate_history
            .accrual_factor(position.last_accrual_time, now)
            .and_then(|factor| factor.checked_mul(position.principal))
            .ok_or(StakingError::ArithmeticOverflow)?;
        settled.accrued_rewards = settled
            .accrued_rewards
            .checked_add(earned)
            .ok_or(StakingError::ArithmeticOverflow)?;
        settled.last_accrual_time = now;
        Ok(settled)
    }

    fn principal_return(&self, owner: &AccountId, principal: Amount) -> LedgerOp {
        LedgerOp::Transfer {
            from: self.custody.clone(),
            to: owner.clone(),
            token: self.stake_token.clone(),
            amount: principal,
        }
    }

    fn reward_mint(&self, owner: &AccountId, rewards: Amount) -> LedgerOp {
        LedgerOp::Mint {
            minter: self.custody.clone(),
            to: owner.clone(),
            token: self.reward_token.clone(),
            amount: rewards,
        }
    }

    fn close(&mut self, owner: &AccountId, principal: Amount) {
        self.positions.remove(owner);
        self.total_staked = self.total_staked.saturating_sub(principal);
    }
}
