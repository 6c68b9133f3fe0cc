//! # checkout-solana
//!
//! Solana USDC payment rail for usdc-checkout.
//!
//! This crate provides:
//!
//! 1. **SolanaUsdcRail** - builds the unsigned purchase transaction a
//!    buyer's wallet signs (token account creation + SPL transfer)
//!
//! 2. **SettlementClient** - submits a signed transaction and polls until it
//!    is confirmed, fails, or its blockhash expires
//!
//! Transactions are assembled with `solana-sdk` and the SPL token and
//! associated-token-account instruction builders, and the RPC node is
//! reached through the nonblocking `solana-rpc-client`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_solana::SolanaUsdcRail;
//! use checkout_core::PaymentRail;
//!
//! let rail = SolanaUsdcRail::from_env()?;
//! let purchase = rail.build_purchase(&page, buyer_address).await?;
//!
//! // Hand purchase.transaction (base64) to the wallet for signing
//! ```

pub mod address;
pub mod config;
pub mod payment;
pub mod rpc;
pub mod settlement;
pub mod transaction;

// Re-exports
pub use address::{associated_token_address, parse_address, USDC_MINT_DEVNET, USDC_MINT_MAINNET};
pub use config::{Commitment, SolanaConfig};
pub use payment::SolanaUsdcRail;
pub use rpc::{SignatureState, SolanaRpc};
pub use settlement::{Settlement, SettlementClient};
pub use transaction::{decode_transaction, encode_transaction};

#[cfg(test)]
pub(crate) mod test_support {
    //! wiremock helpers for JSON-RPC endpoints

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde_json::{json, Value};
    use solana_sdk::pubkey::Pubkey;
    use spl_token::solana_program::program_option::COption;
    use spl_token::solana_program::program_pack::Pack;
    use spl_token::state::{Account as TokenAccount, AccountState};
    use wiremock::matchers::method;
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    use crate::address::USDC_MINT_DEVNET;

    /// Matches a JSON-RPC call by method and, optionally, its first param
    pub struct RpcMethod {
        method: &'static str,
        first_param: Option<Value>,
    }

    impl RpcMethod {
        pub fn new(method: &'static str) -> Self {
            Self {
                method,
                first_param: None,
            }
        }

        pub fn with_param(mut self, param: impl Into<String>) -> Self {
            self.first_param = Some(Value::String(param.into()));
            self
        }

        /// First param is a one-element array, as in `getSignatureStatuses`
        pub fn with_array_param(mut self, param: impl Into<String>) -> Self {
            self.first_param = Some(json!([param.into()]));
            self
        }
    }

    impl Match for RpcMethod {
        fn matches(&self, request: &Request) -> bool {
            let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
                return false;
            };
            if body["method"] != self.method {
                return false;
            }
            match &self.first_param {
                Some(param) => &body["params"][0] == param,
                None => true,
            }
        }
    }

    pub fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "test",
            "result": result,
        }))
    }

    pub fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "test",
            "error": { "code": code, "message": message },
        }))
    }

    /// `getAccountInfo` response for a token-program account, or null
    pub fn account_response(data: Option<&[u8]>) -> ResponseTemplate {
        let value = match data {
            Some(data) => json!({
                "lamports": 2039280,
                "owner": spl_token::id().to_string(),
                "data": [BASE64.encode(data), "base64"],
                "executable": false,
                "rentEpoch": 0
            }),
            None => Value::Null,
        };
        rpc_result(json!({ "context": { "slot": 1 }, "value": value }))
    }

    /// Packed, initialized USDC token account
    pub fn token_account_data(owner: &Pubkey, amount: u64) -> Vec<u8> {
        let account = TokenAccount {
            mint: USDC_MINT_DEVNET,
            owner: *owner,
            amount,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0; TokenAccount::LEN];
        TokenAccount::pack(account, &mut data).unwrap();
        data
    }

    /// Answers the client's `getVersion` node version lookup
    pub async fn mount_node_version(server: &MockServer) {
        Mock::given(method("POST"))
            .and(RpcMethod::new("getVersion"))
            .respond_with(rpc_result(json!({ "solana-core": "2.2.0", "feature-set": 1 })))
            .mount(server)
            .await;
    }
}
