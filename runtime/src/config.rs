//! Economy configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tally_amm::AmmParams;
use tally_governance::GovernanceParams;
use tally_types::{AccountId, TokenId};
use tally_utils::LogFormat;

use crate::EconomyError;

/// Configuration for one economy instance.
///
/// Can be loaded from a TOML file via [`EconomyConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every section and field is
/// optional in TOML.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default)]
    pub principals: PrincipalsConfig,

    #[serde(default)]
    pub tokens: TokensConfig,

    #[serde(default)]
    pub amm: AmmParams,

    #[serde(default)]
    pub staking: StakingConfig,

    #[serde(default)]
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Accounts with special authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalsConfig {
    /// Staking owner and token treasury (authorised minter of every token).
    #[serde(default = "default_owner")]
    pub owner: AccountId,

    /// The account governance acts as when executing proposals; the only
    /// account allowed to change pool fees.
    #[serde(default = "default_governance_principal")]
    pub governance: AccountId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensConfig {
    #[serde(default = "default_stake_token")]
    pub stake: TokenId,

    #[serde(default = "default_reward_token")]
    pub reward: TokenId,

    /// Balances of this token weigh governance votes.
    #[serde(default = "default_governance_token")]
    pub governance: TokenId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Reward units per staked unit per second.
    #[serde(default = "default_reward_rate")]
    pub initial_reward_rate: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default = "default_quorum")]
    pub quorum: u64,

    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,

    #[serde(default)]
    pub proposal_threshold: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Filter directive: "trace", "debug", "info", "warn", "error", or a
    /// full `EnvFilter` string.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_owner() -> AccountId {
    AccountId::new("owner")
}

fn default_governance_principal() -> AccountId {
    AccountId::new("governance")
}

fn default_stake_token() -> TokenId {
    TokenId::new("STK")
}

fn default_reward_token() -> TokenId {
    TokenId::new("RWD")
}

fn default_governance_token() -> TokenId {
    TokenId::new("GOV")
}

fn default_reward_rate() -> u64 {
    1
}

fn default_quorum() -> u64 {
    GovernanceParams::default().quorum as u64
}

fn default_voting_period_secs() -> u64 {
    GovernanceParams::default().voting_period_secs
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PrincipalsConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            governance: default_governance_principal(),
        }
    }
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            stake: default_stake_token(),
            reward: default_reward_token(),
            governance: default_governance_token(),
        }
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            initial_reward_rate: default_reward_rate(),
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            quorum: default_quorum(),
            voting_period_secs: default_voting_period_secs(),
            proposal_threshold: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl GovernanceConfig {
    pub fn params(&self) -> GovernanceParams {
        GovernanceParams {
            quorum: self.quorum as u128,
            voting_period_secs: self.voting_period_secs,
            proposal_threshold: self.proposal_threshold as u128,
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EconomyConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EconomyError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EconomyError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EconomyError> {
        let config: Self = toml::from_str(s).map_err(|e| EconomyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EconomyError> {
        toml::to_string_pretty(self).map_err(|e| EconomyError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), EconomyError> {
        self.amm
            .validate()
            .map_err(|e| EconomyError::Config(format!("[amm] {e}")))?;
        for (name, account) in [
            ("owner", &self.principals.owner),
            ("governance", &self.principals.governance),
        ] {
            if !account.is_valid() {
                return Err(EconomyError::Config(format!(
                    "[principals] {name} {:?} is not a valid account",
                    account.as_str()
                )));
            }
        }
        if self.governance.voting_period_secs == 0 {
            return Err(EconomyError::Config(
                "[governance] voting_period_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EconomyConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = EconomyConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EconomyConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.principals.governance, AccountId::new("governance"));
        assert_eq!(config.amm.default_fee_bps, 30);
        assert_eq!(config.governance.voting_period_secs, 259_200);
        assert_eq!(config.logging.format, LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            [amm]
            default_fee_bps = 5

            [governance]
            quorum = 1000

            [logging]
            format = "json"
        "#;
        let config = EconomyConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.amm.default_fee_bps, 5);
        assert_eq!(config.amm.max_fee_bps, 1_000); // default
        assert_eq!(config.governance.params().quorum, 1_000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.tokens.stake, TokenId::new("STK"));
    }

    #[test]
    fn invalid_amm_section_rejected() {
        let toml = r#"
            [amm]
            default_fee_bps = 2000
            max_fee_bps = 1000
        "#;
        let err = EconomyConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, EconomyError::Config(msg) if msg.starts_with("[amm]")));
    }

    #[test]
    fn blank_principal_rejected() {
        let toml = r#"
            [principals]
            owner = ""
        "#;
        assert!(EconomyConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("economy.toml");
        std::fs::write(&path, "[staking]\ninitial_reward_rate = 9\n").unwrap();
        let config = EconomyConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.staking.initial_reward_rate, 9);

        let missing = EconomyConfig::from_toml_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(EconomyError::Config(_))));
    }
}
