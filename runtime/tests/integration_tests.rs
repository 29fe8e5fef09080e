use std::sync::Arc;

use tally_governance::{ProposalAction, ProposalState};
use tally_ledger::{InMemoryLedger, TokenLedger};
use tally_nullables::{FaultyLedger, NullClock};
use tally_runtime::{Command, Economy, EconomyConfig, EconomySnapshot, Outcome, Sequencer};
use tally_staking::StakingEngine;
use tally_types::{AccountId, PoolId, Timestamp, TokenId};

fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

fn config() -> EconomyConfig {
    let mut config = EconomyConfig::default();
    config.amm.default_fee_bps = 0;
    config.staking.initial_reward_rate = 2;
    config.governance.quorum = 100;
    config.governance.voting_period_secs = 1_000;
    config
}

fn fund(economy: &mut Economy, who: &[&str], amount: u128) {
    let config = config();
    for token in [&config.tokens.stake, &config.tokens.reward, &config.tokens.governance] {
        for name in who {
            economy
                .mint(&config.principals.owner, &acct(name), token, amount)
                .unwrap();
        }
    }
}

fn pool() -> PoolId {
    PoolId::new("STK", "GOV")
}

fn staking_custody() -> AccountId {
    StakingEngine::custody_account_for(&TokenId::new("STK"))
}

#[test]
fn bootstrap_and_swap_scenario() {
    let mut economy = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    fund(&mut economy, &["lp", "trader"], 1_000);

    assert_eq!(economy.add_liquidity(&acct("lp"), &pool(), 10, 10, Timestamp::new(1)).unwrap(), 10);
    let receipt = economy.swap(&acct("trader"), &pool(), 10, true, None).unwrap();
    assert_eq!(receipt.amount_out, 5);
    assert_eq!(economy.get_reserves(&pool()).unwrap(), (20, 5));
}

#[test]
fn stake_for_an_hour_scenario() {
    let mut economy = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    fund(&mut economy, &["alice"], 1_000);
    economy
        .approve(&acct("alice"), &staking_custody(), &TokenId::new("STK"), 50)
        .unwrap();

    economy.stake(&acct("alice"), 50, Timestamp::new(1_000)).unwrap();
    let payout = economy.unstake(&acct("alice"), Timestamp::new(1_000 + 3_600)).unwrap();
    assert_eq!(payout.principal, 50);
    assert_eq!(payout.rewards, 50 * 2 * 3_600);
    assert_eq!(economy.balance_of(&acct("alice"), &TokenId::new("RWD")), 1_000 + 50 * 2 * 3_600);
}

#[test]
fn duplicate_vote_and_self_delegation_scenarios() {
    let mut economy = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    fund(&mut economy, &["alice", "bob"], 500);
    let id = economy
        .create_proposal(&acct("alice"), "signal", ProposalAction::Text, Timestamp::new(1))
        .unwrap();

    economy.vote(&acct("alice"), id, true, Timestamp::new(2)).unwrap();
    let err = economy.vote(&acct("alice"), id, true, Timestamp::new(3)).unwrap_err();
    assert_eq!(err.kind(), "DuplicateVote");
    let proposal = economy.get_proposal(id).unwrap();
    assert_eq!((proposal.votes_for, proposal.votes_against), (500, 0));

    let err = economy.delegate_vote(&acct("bob"), &acct("bob")).unwrap_err();
    assert_eq!(err.kind(), "SelfDelegation");
    assert!(economy.governance().delegate_of(&acct("bob")).is_none());
}

#[test]
fn governance_lifecycle_through_finalize() {
    let mut economy = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    fund(&mut economy, &["alice", "bob", "carol"], 100);
    fund(&mut economy, &["lp"], 1_000);
    economy.add_liquidity(&acct("lp"), &pool(), 500, 500, Timestamp::new(1)).unwrap();

    let id = economy
        .create_proposal(
            &acct("alice"),
            "set fee to 25 bps",
            ProposalAction::SetPoolFee { pool: pool(), fee_bps: 25 },
            Timestamp::new(10),
        )
        .unwrap();
    economy.delegate_vote(&acct("carol"), &acct("alice")).unwrap();
    assert_eq!(economy.vote(&acct("alice"), id, true, Timestamp::new(11)).unwrap(), 200);
    assert_eq!(economy.vote(&acct("bob"), id, false, Timestamp::new(12)).unwrap(), 100);

    let err = economy.finalize_proposal(id, Timestamp::new(500)).unwrap_err();
    assert_eq!(err.kind(), "VotingNotEnded");
    assert_eq!(
        economy.finalize_proposal(id, Timestamp::new(1_010)).unwrap(),
        ProposalState::Passed
    );

    economy.execute_proposal(id, Timestamp::new(1_020)).unwrap();
    assert_eq!(economy.amm().pool(&pool()).unwrap().fee_bps, 25);
    assert!(economy.get_proposal(id).unwrap().is_executed());
    assert_eq!(
        economy.execute_proposal(id, Timestamp::new(1_030)).unwrap_err().kind(),
        "ProposalNotOpen"
    );
}

#[test]
fn reward_rate_proposal_when_governance_owns_staking() {
    let mut config = config();
    config.principals.owner = acct("governance");
    let mut economy = Economy::new(&config, Timestamp::EPOCH).unwrap();
    economy
        .mint(&acct("governance"), &acct("alice"), &TokenId::new("GOV"), 100)
        .unwrap();

    let id = economy
        .create_proposal(
            &acct("alice"),
            "double rewards",
            ProposalAction::SetRewardRate { rate: 4 },
            Timestamp::new(5),
        )
        .unwrap();
    economy.vote(&acct("alice"), id, true, Timestamp::new(6)).unwrap();
    economy.execute_proposal(id, Timestamp::new(7)).unwrap();
    assert_eq!(economy.staking().reward_rate(), 4);
}

fn faulty_economy() -> Economy<FaultyLedger> {
    let config = config();
    let mut inner = InMemoryLedger::new();
    let owner = &config.principals.owner;
    for token in [&config.tokens.stake, &config.tokens.governance] {
        inner.authorize_minter(token, owner);
        for who in ["lp", "trader", "alice"] {
            inner.mint(owner, &acct(who), token, 1_000).unwrap();
        }
    }
    inner.authorize_minter(&config.tokens.reward, &staking_custody());
    Economy::with_ledger(&config, FaultyLedger::new(inner), Timestamp::EPOCH).unwrap()
}

#[test]
fn failing_ledger_leaves_pools_untouched() {
    let mut economy = faulty_economy();

    economy.ledger_mut().fail_next_batch();
    let err = economy
        .add_liquidity(&acct("lp"), &pool(), 100, 100, Timestamp::new(1))
        .unwrap_err();
    assert_eq!(err.kind(), "LedgerUnavailable");
    assert!(economy.amm().pool(&pool()).is_none());

    economy.add_liquidity(&acct("lp"), &pool(), 100, 100, Timestamp::new(1)).unwrap();
    economy.ledger_mut().fail_next_batch();
    assert!(economy.swap(&acct("trader"), &pool(), 10, true, None).is_err());
    assert_eq!(economy.get_reserves(&pool()).unwrap(), (100, 100));
    assert_eq!(economy.balance_of(&acct("trader"), &TokenId::new("STK")), 1_000);

    economy.ledger_mut().fail_next_batch();
    assert!(economy.remove_liquidity(&acct("lp"), &pool(), 50).is_err());
    assert_eq!(economy.amm().shares_of(&pool(), &acct("lp")), 100);
}

#[test]
fn failing_ledger_leaves_positions_untouched() {
    let mut economy = faulty_economy();
    economy
        .approve(&acct("alice"), &staking_custody(), &TokenId::new("STK"), 100)
        .unwrap();

    economy.ledger_mut().fail_next_batch();
    assert!(economy.stake(&acct("alice"), 100, Timestamp::new(0)).is_err());
    assert!(economy.staking().position(&acct("alice")).is_none());

    economy.stake(&acct("alice"), 100, Timestamp::new(0)).unwrap();
    economy.ledger_mut().fail_next_batch();
    assert!(economy.unstake(&acct("alice"), Timestamp::new(10)).is_err());
    assert_eq!(economy.staking().total_staked(), 100);
    assert_eq!(economy.pending_rewards(&acct("alice"), Timestamp::new(10)).unwrap(), 2_000);

    economy.ledger_mut().fail_next_batch();
    assert!(economy.claim_rewards(&acct("alice"), Timestamp::new(10)).is_err());
    let position = economy.staking().position(&acct("alice")).unwrap();
    assert_eq!(position.last_accrual_time, Timestamp::new(0));

    let payout = economy.unstake(&acct("alice"), Timestamp::new(10)).unwrap();
    assert_eq!(payout.rewards, 2_000);
    assert_eq!(economy.ledger().batches_seen(), 5);
}

#[test]
fn snapshot_restores_identical_state() {
    let mut economy = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    fund(&mut economy, &["lp", "alice", "bob"], 1_000);
    economy.add_liquidity(&acct("lp"), &pool(), 300, 600, Timestamp::new(1)).unwrap();
    economy.swap(&acct("bob"), &pool(), 40, false, None).unwrap();
    economy
        .approve(&acct("alice"), &staking_custody(), &TokenId::new("STK"), 200)
        .unwrap();
    economy.stake(&acct("alice"), 200, Timestamp::new(2)).unwrap();
    economy.set_reward_rate(&acct("owner"), 5, Timestamp::new(3)).unwrap();
    economy.delegate_vote(&acct("bob"), &acct("alice")).unwrap();
    let id = economy
        .create_proposal(&acct("alice"), "signal", ProposalAction::Text, Timestamp::new(4))
        .unwrap();
    economy.vote(&acct("alice"), id, true, Timestamp::new(5)).unwrap();

    let snapshot = economy.snapshot();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("economy.snap");
    snapshot.write_to_file(&path).unwrap();

    let mut restored = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    restored.restore(EconomySnapshot::read_from_file(&path).unwrap()).unwrap();
    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.snapshot().to_bytes().unwrap(), snapshot.to_bytes().unwrap());

    // Restored state keeps evolving the same way as the original.
    let now = Timestamp::new(100);
    assert_eq!(
        restored.pending_rewards(&acct("alice"), now).unwrap(),
        economy.pending_rewards(&acct("alice"), now).unwrap()
    );
    assert_eq!(restored.staking().total_staked(), 200);
    assert_eq!(restored.governance().next_id(), 1);
    assert_eq!(
        restored.governance().delegate_of(&acct("bob")),
        Some(&acct("alice"))
    );
}

#[test]
fn json_command_log_replays_through_sequencer() {
    let log = r#"[
        {"mint": {"minter": "owner", "to": "lp", "token": "STK", "amount": 1000}},
        {"mint": {"minter": "owner", "to": "lp", "token": "GOV", "amount": 1000}},
        {"add_liquidity": {"provider": "lp", "pool": {"token_a": "STK", "token_b": "GOV"}, "amount_a": 10, "amount_b": 10}},
        {"swap": {"trader": "lp", "pool": {"token_a": "STK", "token_b": "GOV"}, "amount_in": 10, "input_is_a": true}},
        {"create_proposal": {"proposer": "lp", "description": "hello", "action": "text"}},
        {"vote": {"voter": "lp", "proposal": 0, "support": true}},
        {"vote": {"voter": "lp", "proposal": 0, "support": true}}
    ]"#;
    let commands: Vec<Command> = serde_json::from_str(log).unwrap();
    let clock = NullClock::new(10);
    let seq = Sequencer::new(Economy::new(&config(), Timestamp::EPOCH).unwrap(), clock);

    let results: Vec<_> = commands.into_iter().map(|c| seq.submit(c)).collect();
    assert!(matches!(results[2].result, Ok(Outcome::SharesMinted(10))));
    match &results[3].result {
        Ok(Outcome::Swapped(receipt)) => assert_eq!(receipt.amount_out, 5),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(results[4].result, Ok(Outcome::ProposalCreated(0))));
    assert_eq!(results[6].result.as_ref().unwrap_err().kind(), "DuplicateVote");
    assert!(results.iter().all(|a| a.at == Timestamp::new(10)));

    let outcome_json = serde_json::to_string(results[5].result.as_ref().unwrap()).unwrap();
    assert_eq!(outcome_json, r#"{"voted":{"weight":995}}"#);
}

#[test]
fn sequencer_follows_null_clock() {
    let clock = Arc::new(NullClock::new(0));
    let economy = Economy::new(&config(), Timestamp::EPOCH).unwrap();
    let seq = Sequencer::new(economy, SharedClock(Arc::clone(&clock)));
    seq.submit(Command::Mint {
        minter: acct("owner"),
        to: acct("alice"),
        token: TokenId::new("STK"),
        amount: 100,
    });
    seq.submit(Command::Approve {
        owner: acct("alice"),
        spender: staking_custody(),
        token: TokenId::new("STK"),
        amount: 100,
    });
    seq.submit(Command::Stake {
        owner: acct("alice"),
        amount: 100,
    });
    clock.advance(30);
    let applied = seq.submit(Command::ClaimRewards { owner: acct("alice") });
    assert_eq!(applied.at, Timestamp::new(30));
    assert!(matches!(applied.result, Ok(Outcome::RewardsClaimed(6_000))));
}

struct SharedClock(Arc<NullClock>);

impl tally_types::Clock for SharedClock {
    fn now(&self) -> Timestamp {
        self.0.now()
    }
}
