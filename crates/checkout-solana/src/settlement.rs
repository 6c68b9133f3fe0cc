//! # Settlement
//!
//! Submits a buyer-signed purchase transaction and waits until the cluster
//! confirms it, it fails, or its blockhash expires.

use crate::config::{Commitment, SolanaConfig};
use crate::rpc::{SignatureState, SolanaRpc, RPC_SERVICE};
use crate::transaction::decode_transaction;
use checkout_core::{CheckoutError, CheckoutResult};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A transaction that reached the configured commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub signature: String,
    pub slot: u64,
    pub commitment: Commitment,
}

pub struct SettlementClient {
    rpc: SolanaRpc,
    commitment: Commitment,
    poll_interval: Duration,
}

impl SettlementClient {
    pub fn new(config: &SolanaConfig) -> Self {
        Self {
            rpc: SolanaRpc::new(config),
            commitment: config.commitment,
            poll_interval: config.poll_interval,
        }
    }

    /// Send a signed base64 transaction and poll until it settles.
    ///
    /// The send itself is never retried. Expiry is measured against the
    /// last valid block height of the newest blockhash at submission time,
    /// which bounds the transaction's own blockhash from above.
    #[instrument(skip(self, signed_transaction))]
    pub async fn submit_and_confirm(&self, signed_transaction: &str) -> CheckoutResult<Settlement> {
        let transaction = decode_transaction(signed_transaction)?;
        if !transaction.is_signed() {
            return Err(CheckoutError::InvalidRequest(
                "Transaction is missing required signatures".to_string(),
            ));
        }

        let (_, deadline) = self.rpc.latest_blockhash().await?;
        let signature = self.rpc.send(&transaction).await?;
        info!("Submitted transaction {}", signature);

        loop {
            match self.rpc.signature_state(&signature).await? {
                SignatureState::Failed(err) => {
                    return Err(CheckoutError::upstream(
                        RPC_SERVICE,
                        format!("Transaction {} failed: {}", signature, err),
                    ));
                }
                SignatureState::Settled { slot } => {
                    info!("Transaction {} {} at slot {}", signature, self.commitment, slot);
                    return Ok(Settlement {
                        signature: signature.to_string(),
                        slot,
                        commitment: self.commitment,
                    });
                }
                SignatureState::Pending => {}
            }

            let height = self.rpc.block_height().await?;
            if height > deadline {
                warn!("Transaction {} expired at block height {}", signature, height);
                return Err(CheckoutError::upstream(
                    RPC_SERVICE,
                    format!(
                        "Transaction {} expired: block height {} exceeded {}",
                        signature, height, deadline
                    ),
                ));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
