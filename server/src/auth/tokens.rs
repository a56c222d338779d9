//! Bearer token verification.
//!
//! Sessions are issued elsewhere; this service only needs to map a token to
//! the account it belongs to.

use anyhow::{bail, Context};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// The account a token belongs to, or `None` if it is not valid.
    async fn verify(&self, token: &str) -> Option<Uuid>;
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fixed set of tokens. Only hashes are kept in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    accounts: HashMap<String, Uuid>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, account: Uuid) -> Self {
        self.accounts.insert(hash_token(token), account);
        self
    }

    /// Parse comma-separated `token:account-uuid` pairs.
    pub fn parse(pairs: &str) -> anyhow::Result<Self> {
        let mut verifier = Self::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((token, account)) = pair.rsplit_once(':') else {
                bail!("expected token:account-uuid, got {:?}", pair);
            };
            if token.trim().is_empty() {
                bail!("empty token in {:?}", pair);
            }
            let account: Uuid = account
                .trim()
                .parse()
                .with_context(|| format!("invalid account id in {:?}", pair))?;
            verifier = verifier.with_token(token.trim(), account);
        }
        Ok(verifier)
    }

    /// Read `ESSENSPLAN_API_TOKENS`. Unset means no token is accepted.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("ESSENSPLAN_API_TOKENS") {
            Ok(pairs) => Self::parse(&pairs).context("ESSENSPLAN_API_TOKENS"),
            Err(_) => Ok(Self::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl SessionVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<Uuid> {
        self.accounts.get(&hash_token(token)).copied()
    }
}
