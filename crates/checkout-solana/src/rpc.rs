//! # Solana RPC
//!
//! Thin wrapper over the nonblocking `solana-rpc-client` that binds one
//! endpoint and commitment and maps client failures onto `CheckoutError`.

use crate::config::SolanaConfig;
use checkout_core::{CheckoutError, CheckoutResult};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::client_error::{Error as ClientError, ErrorKind as ClientErrorKind};
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use solana_rpc_client_api::request::RpcError;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status_client_types::UiTransactionEncoding;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Account as TokenAccount;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

pub const RPC_SERVICE: &str = "solana-rpc";

/// Where a submitted signature stands relative to the configured commitment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Unknown to the node or below the commitment
    Pending,
    Failed(String),
    Settled { slot: u64 },
}

/// RPC client bound to one endpoint and commitment
#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("url", &self.client.url())
            .field("commitment", &self.commitment.commitment)
            .finish()
    }
}

impl SolanaRpc {
    pub fn new(config: &SolanaConfig) -> Self {
        let commitment = config.commitment.into();
        let client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.request_timeout,
            commitment,
        );
        Self {
            client: Arc::new(client),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Whether any account lives at `address`
    pub async fn account_exists(&self, address: &Pubkey) -> CheckoutResult<bool> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(rpc_error)?;
        Ok(response.value.is_some())
    }

    /// Balance of an SPL token account, `None` when it does not exist
    pub async fn token_balance(&self, address: &Pubkey) -> CheckoutResult<Option<u64>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(rpc_error)?;

        let Some(account) = response.value else {
            debug!("No account at {}", address);
            return Ok(None);
        };

        if account.owner != spl_token::id() {
            return Err(CheckoutError::upstream(
                RPC_SERVICE,
                format!("{} is not owned by the token program", address),
            ));
        }

        let token = TokenAccount::unpack(&account.data).map_err(|e| {
            CheckoutError::upstream(RPC_SERVICE, format!("Bad token account {}: {}", address, e))
        })?;
        Ok(Some(token.amount))
    }

    /// Newest blockhash and the last block height it stays valid for
    pub async fn latest_blockhash(&self) -> CheckoutResult<(Hash, u64)> {
        self.client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(rpc_error)
    }

    pub async fn block_height(&self) -> CheckoutResult<u64> {
        self.client
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(rpc_error)
    }

    /// Submit with preflight simulation at the configured commitment
    pub async fn send(&self, transaction: &Transaction) -> CheckoutResult<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.commitment.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(rpc_error)
    }

    pub async fn signature_state(&self, signature: &Signature) -> CheckoutResult<SignatureState> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(rpc_error)?;

        let Some(status) = response.value.into_iter().next().flatten() else {
            return Ok(SignatureState::Pending);
        };

        if let Some(err) = status.err {
            return Ok(SignatureState::Failed(err.to_string()));
        }
        if status.satisfies_commitment(self.commitment) {
            return Ok(SignatureState::Settled { slot: status.slot });
        }

        debug!(
            "Signature {} at {:?}, waiting for {:?}",
            signature, status.confirmation_status, self.commitment.commitment
        );
        Ok(SignatureState::Pending)
    }
}

fn rpc_error(err: ClientError) -> CheckoutError {
    match err.kind() {
        ClientErrorKind::Reqwest(e) => {
            error!("Solana RPC transport error: {}", e);
            CheckoutError::Network(e.to_string())
        }
        ClientErrorKind::RpcError(RpcError::RpcResponseError { message, .. }) => {
            error!("Solana RPC error: {}", message);
            CheckoutError::upstream(RPC_SERVICE, message.clone())
        }
        other => {
            error!("Solana RPC failure: {}", other);
            CheckoutError::upstream(RPC_SERVICE, other.to_string())
        }
    }
}
