//! Identifiers for accounts, tokens, pools and proposals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account identifier as known to the token ledger.
///
/// Accounts are opaque: the core never authenticates them, it only compares
/// them. Engine custody accounts use reserved prefixes (`pool:`, `staking:`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An identifier is well-formed when it is non-empty and has no
    /// surrounding whitespace.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.trim() == self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A fungible token identifier (ticker or contract address).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifies a liquidity pool by its ordered token pair.
///
/// `token_a` is the side addressed by `input_is_a = true` in swaps and by
/// `amount_a` in deposits. `(A, B)` and `(B, A)` are distinct pools.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId {
    pub token_a: TokenId,
    pub token_b: TokenId,
}

impl PoolId {
    pub fn new(token_a: impl Into<TokenId>, token_b: impl Into<TokenId>) -> Self {
        Self {
            token_a: token_a.into(),
            token_b: token_b.into(),
        }
    }

    /// Whether both sides name the same token (never a valid pool).
    pub fn is_degenerate(&self) -> bool {
        self.token_a == self.token_b
    }

    /// The ledger account that holds this pool's reserves.
    pub fn custody_account(&self) -> AccountId {
        AccountId::new(format!("pool:{}/{}", self.token_a, self.token_b))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_a, self.token_b)
    }
}

/// Sequential proposal identifier, starting at 0.
pub type ProposalId = u64;
