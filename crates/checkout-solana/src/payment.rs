//! # Solana USDC Rail
//!
//! Builds the unsigned USDC transfer a buyer's wallet signs when paying a
//! checkout page. Token accounts that do not exist yet are created in the
//! same transaction, paid for by the buyer.

use crate::address::{associated_token_address, parse_address};
use crate::config::SolanaConfig;
use crate::rpc::SolanaRpc;
use crate::transaction::encode_transaction;
use async_trait::async_trait;
use checkout_core::{
    purchase_message, CheckoutError, CheckoutPage, CheckoutResult, PaymentRail,
    PurchaseTransaction,
};
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account_client::instruction::create_associated_token_account;
use tracing::{debug, info, instrument, warn};

/// USDC purchase builder backed by a Solana RPC node
pub struct SolanaUsdcRail {
    config: SolanaConfig,
    rpc: SolanaRpc,
}

impl SolanaUsdcRail {
    pub fn new(config: SolanaConfig) -> Self {
        let rpc = SolanaRpc::new(&config);
        Self { config, rpc }
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Ok(Self::new(SolanaConfig::from_env()?))
    }

    pub fn config(&self) -> &SolanaConfig {
        &self.config
    }
}

#[async_trait]
impl PaymentRail for SolanaUsdcRail {
    #[instrument(skip(self, page), fields(page_id = page.id, buyer = %buyer))]
    async fn build_purchase(
        &self,
        page: &CheckoutPage,
        buyer: &str,
    ) -> CheckoutResult<PurchaseTransaction> {
        let buyer = parse_address(buyer)?;
        let seller = parse_address(&page.wallet_address)?;
        let amount = page.price()?.base_units();
        let mint = self.config.usdc_mint;
        let token_program = spl_token::id();

        let buyer_ata = associated_token_address(&buyer, &mint);
        let seller_ata = associated_token_address(&seller, &mint);

        let mut instructions: Vec<Instruction> = Vec::with_capacity(3);
        let mut created_accounts = Vec::new();

        match self.rpc.token_balance(&buyer_ata).await? {
            Some(available) if available < amount => {
                warn!(
                    "Buyer {} holds {} base units, needs {}",
                    buyer, available, amount
                );
                return Err(CheckoutError::InsufficientFunds {
                    required: amount,
                    available,
                });
            }
            Some(_) => {}
            None => {
                debug!("Buyer token account {} missing, adding create", buyer_ata);
                instructions.push(create_associated_token_account(
                    &buyer,
                    &buyer,
                    &mint,
                    &token_program,
                ));
                created_accounts.push(buyer_ata.to_string());
            }
        }

        // A seller buying from their own page shares the buyer's account
        if seller_ata != buyer_ata && !self.rpc.account_exists(&seller_ata).await? {
            debug!("Seller token account {} missing, adding create", seller_ata);
            instructions.push(create_associated_token_account(
                &buyer,
                &seller,
                &mint,
                &token_program,
            ));
            created_accounts.push(seller_ata.to_string());
        }

        instructions.push(
            spl_token::instruction::transfer(
                &token_program,
                &buyer_ata,
                &seller_ata,
                &buyer,
                &[],
                amount,
            )
            .map_err(|e| CheckoutError::Internal(format!("Failed to build transfer: {}", e)))?,
        );

        let (blockhash, _) = self.rpc.latest_blockhash().await?;
        let message = Message::new_with_blockhash(&instructions, Some(&buyer), &blockhash);
        let transaction = encode_transaction(&Transaction::new_unsigned(message))?;

        info!(
            "Built purchase for page {}: {} base units to {} ({} instructions)",
            page.id,
            amount,
            seller_ata,
            instructions.len()
        );

        Ok(PurchaseTransaction {
            transaction,
            message: purchase_message(page),
            amount,
            recipient: seller_ata.to_string(),
            created_accounts,
        })
    }

    fn network(&self) -> &'static str {
        "solana"
    }
}
