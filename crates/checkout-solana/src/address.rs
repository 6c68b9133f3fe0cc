//! # Addresses
//!
//! Wallet parsing, USDC mints and associated token account derivation.

use checkout_core::{CheckoutError, CheckoutResult};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Circle's devnet USDC mint
pub const USDC_MINT_DEVNET: Pubkey =
    Pubkey::from_str_const("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// Circle's mainnet USDC mint
pub const USDC_MINT_MAINNET: Pubkey =
    Pubkey::from_str_const("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

/// Parse a base58 wallet address, rejecting anything that is not 32 bytes
pub fn parse_address(address: &str) -> CheckoutResult<Pubkey> {
    Pubkey::from_str(address.trim()).map_err(|_| CheckoutError::InvalidAddress {
        address: address.to_string(),
    })
}

/// Associated token account of `owner` for `mint` under the SPL Token program
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account_client::address::get_associated_token_address_with_program_id(
        owner,
        mint,
        &spl_token::id(),
    )
}
