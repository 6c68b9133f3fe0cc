//! # Blink Descriptors
//!
//! Solana Actions ("blinks") payloads that let third-party clients render
//! a purchase button for a checkout page without visiting it.

use crate::page::CheckoutPage;
use crate::rail::PurchaseTransaction;
use serde::{Deserialize, Serialize};

/// Solana Actions protocol version advertised in the `X-Action-Version` header
pub const ACTION_VERSION: &str = "2.1.3";

/// Header names carried by every actions response
pub const ACTION_VERSION_HEADER: &str = "x-action-version";
pub const BLOCKCHAIN_IDS_HEADER: &str = "x-blockchain-ids";

/// CORS header values for actions endpoints
pub const ACTION_ALLOWED_METHODS: &str = "GET, POST, PUT, OPTIONS";
pub const ACTION_ALLOWED_HEADERS: &str = "content-type, authorization, content-encoding, \
     accept-encoding, x-action-version, x-blockchain-ids";
pub const ACTION_EXPOSED_HEADERS: &str = "x-action-version, x-blockchain-ids";

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// CAIP-2 chain id for a Solana cluster name
pub fn blockchain_id(cluster: &str) -> &'static str {
    match cluster {
        "mainnet" | "mainnet-beta" => "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
        "testnet" => "solana:4uhcVJyU9pJkvQyS88uRDiswHXSCkY3z",
        _ => "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
    }
}

/// Kind tag of an action payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Action,
    Transaction,
}

/// `GET` response describing the purchase action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGetResponse {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub label: String,
}

impl ActionGetResponse {
    pub fn for_page(page: &CheckoutPage) -> Self {
        let preview: String = page
            .product_details
            .chars()
            .take(DESCRIPTION_PREVIEW_CHARS)
            .collect();

        Self {
            action_type: ActionType::Action,
            icon: page.icon().unwrap_or_default().to_string(),
            title: page.product_name.clone(),
            description: format!("{}...", preview),
            label: format!("Buy for ${} USDC", page.product_price),
        }
    }
}

/// `POST` body sent by a blink client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPostRequest {
    /// Buyer's base58 address
    pub account: String,
}

/// `POST` response carrying the transaction to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPostResponse {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionPostResponse {
    pub fn from_purchase(purchase: PurchaseTransaction) -> Self {
        Self {
            action_type: ActionType::Transaction,
            transaction: purchase.transaction,
            message: Some(purchase.message),
        }
    }
}

/// A URL-mapping rule in `actions.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRule {
    pub path_pattern: String,
    pub api_path: String,
}

/// Site-level `actions.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsJson {
    pub rules: Vec<ActionRule>,
}

impl Default for ActionsJson {
    fn default() -> Self {
        Self {
            rules: vec![ActionRule {
                path_pattern: "/checkout/:id".to_string(),
                api_path: "/api/actions/checkout/:id".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::NewCheckoutPage;
    use crate::rail::purchase_message;

    fn page_with_details(details: &str) -> CheckoutPage {
        CheckoutPage::from_new(
            3,
            NewCheckoutPage {
                store_name: "Shop".into(),
                store_logo: Some("https://cdn.example.com/logo.png".into()),
                product_name: "Mug".into(),
                product_details: details.into(),
                product_image: Some("https://cdn.example.com/mug.png".into()),
                product_price: "9.99".into(),
                wallet_address: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".into(),
                email: "shop@example.com".into(),
                address: None,
            },
        )
    }

    #[test]
    fn test_get_response_fields() {
        let response = ActionGetResponse::for_page(&page_with_details("Holds coffee"));

        assert_eq!(response.icon, "https://cdn.example.com/mug.png");
        assert_eq!(response.title, "Mug");
        assert_eq!(response.description, "Holds coffee...");
        assert_eq!(response.label, "Buy for $9.99 USDC");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "action");
    }

    #[test]
    fn test_description_truncates_on_char_boundary() {
        let details = "é".repeat(150);
        let response = ActionGetResponse::for_page(&page_with_details(&details));
        assert_eq!(response.description.chars().count(), 103);
    }

    #[test]
    fn test_actions_json_rules() {
        let json = serde_json::to_value(ActionsJson::default()).unwrap();
        assert_eq!(json["rules"][0]["pathPattern"], "/checkout/:id");
        assert_eq!(json["rules"][0]["apiPath"], "/api/actions/checkout/:id");
    }

    #[test]
    fn test_post_message() {
        assert_eq!(
            purchase_message(&page_with_details("x")),
            "Purchase of Mug for $9.99 USDC"
        );
    }
}
