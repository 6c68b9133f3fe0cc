//! # Wire Transactions
//!
//! Base64 framing of legacy Solana transactions as wallets exchange them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use checkout_core::{CheckoutError, CheckoutResult};
use solana_sdk::sanitize::Sanitize;
use solana_sdk::transaction::Transaction;

/// Serialize a transaction and base64-encode it
pub fn encode_transaction(transaction: &Transaction) -> CheckoutResult<String> {
    let bytes = bincode::serialize(transaction).map_err(|e| {
        CheckoutError::Serialization(format!("Failed to serialize transaction: {}", e))
    })?;
    Ok(BASE64.encode(bytes))
}

/// Decode a base64 transaction and check its account and signature layout
pub fn decode_transaction(encoded: &str) -> CheckoutResult<Transaction> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| malformed(e.to_string()))?;
    let transaction: Transaction =
        bincode::deserialize(&bytes).map_err(|e| malformed(e.to_string()))?;
    transaction.sanitize().map_err(|e| malformed(e.to_string()))?;
    Ok(transaction)
}

fn malformed(reason: String) -> CheckoutError {
    CheckoutError::InvalidRequest(format!("Malformed transaction: {}", reason))
}
