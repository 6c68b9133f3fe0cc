//! # Solana Configuration
//!
//! RPC endpoint, commitment and mint settings for the USDC rail.
//! Everything has a devnet default, so an empty environment works.

use crate::address::USDC_MINT_DEVNET;
use checkout_core::CheckoutError;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_CLUSTER: &str = "devnet";

/// How far a transaction must progress before it counts as settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl std::str::FromStr for Commitment {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(CheckoutError::Configuration(format!(
                "SOLANA_COMMITMENT must be processed, confirmed or finalized, got {}",
                other
            ))),
        }
    }
}

impl From<Commitment> for CommitmentLevel {
    fn from(commitment: Commitment) -> Self {
        match commitment {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        }
    }
}

impl From<Commitment> for CommitmentConfig {
    fn from(commitment: Commitment) -> Self {
        CommitmentConfig {
            commitment: commitment.into(),
        }
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solana connection settings
#[derive(Debug, Clone)]
pub struct SolanaConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Commitment for reads and confirmation
    pub commitment: Commitment,

    /// USDC mint the rail transfers
    pub usdc_mint: Pubkey,

    /// Cluster name (mainnet, testnet, devnet)
    pub cluster: String,

    /// Delay between signature status polls
    pub poll_interval: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl SolanaConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `SOLANA_RPC_URL`
    /// - `SOLANA_COMMITMENT`
    /// - `USDC_MINT`
    /// - `SOLANA_CLUSTER`
    /// - `SOLANA_POLL_INTERVAL_MS`
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mut config = Self::default();

        if let Ok(url) = env::var("SOLANA_RPC_URL") {
            config.rpc_url = url;
        }

        if let Ok(commitment) = env::var("SOLANA_COMMITMENT") {
            config.commitment = commitment.parse()?;
        }

        if let Ok(mint) = env::var("USDC_MINT") {
            config.usdc_mint = mint.trim().parse().map_err(|_| {
                CheckoutError::Configuration(format!("USDC_MINT is not a valid address: {}", mint))
            })?;
        }

        if let Ok(cluster) = env::var("SOLANA_CLUSTER") {
            config.cluster = cluster;
        }

        if let Ok(ms) = env::var("SOLANA_POLL_INTERVAL_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                CheckoutError::Configuration(
                    "SOLANA_POLL_INTERVAL_MS must be a number of milliseconds".to_string(),
                )
            })?;
            config.poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Create config for an explicit endpoint (for testing)
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Self::default()
        }
    }

    /// Builder: set the USDC mint
    pub fn with_mint(mut self, mint: Pubkey) -> Self {
        self.usdc_mint = mint;
        self
    }

    /// Builder: set the status poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self.cluster.as_str(), "mainnet" | "mainnet-beta")
    }
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: Commitment::Confirmed,
            usdc_mint: USDC_MINT_DEVNET,
            cluster: DEFAULT_CLUSTER.to_string(),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}
