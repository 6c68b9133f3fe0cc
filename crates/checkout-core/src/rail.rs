//! # Payment Rail Trait
//!
//! Strategy seam between the HTTP layer and the settlement network.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PaymentRail (trait)                     │
//! │  ├── build_purchase()                                       │
//! │  └── network()                                              │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                    ┌───────┴───────┐
//!                    │ SolanaUsdcRail│
//!                    └───────────────┘
//! ```

use crate::error::CheckoutResult;
use crate::page::CheckoutPage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An unsigned purchase transaction ready for the buyer's wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTransaction {
    /// Base64 wire encoding of the unsigned transaction
    pub transaction: String,
    /// Human readable summary shown by the wallet
    pub message: String,
    /// Transfer amount in token base units
    pub amount: u64,
    /// Token account credited by the transfer
    pub recipient: String,
    /// Token accounts the transaction creates before transferring
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created_accounts: Vec<String>,
}

/// Builds purchase transactions for a settlement network.
#[async_trait]
pub trait PaymentRail: Send + Sync {
    /// Build an unsigned transaction paying `page`'s price from `buyer` to
    /// the page's wallet.
    ///
    /// # Arguments
    /// * `page` - The checkout page being purchased
    /// * `buyer` - Buyer's address as submitted by the wallet
    async fn build_purchase(
        &self,
        page: &CheckoutPage,
        buyer: &str,
    ) -> CheckoutResult<PurchaseTransaction>;

    /// Network name (for logging and blink headers)
    fn network(&self) -> &'static str;
}

/// Type alias for a boxed rail (dynamic dispatch)
pub type SharedPaymentRail = Arc<dyn PaymentRail>;

/// Summary line attached to a purchase transaction
pub fn purchase_message(page: &CheckoutPage) -> String {
    format!(
        "Purchase of {} for ${} USDC",
        page.product_name, page.product_price
    )
}
