//! # Checkout Page Types
//!
//! The single persisted entity of the service: a merchant-defined, publicly
//! viewable offer of one product at one USDC price, paid to one wallet.

use crate::error::{CheckoutError, CheckoutResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// USDC mints use 6 decimal places
pub const USDC_DECIMALS: u32 = 6;

const USDC_SCALE: u64 = 1_000_000;

/// A USDC amount parsed from a decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsdcAmount {
    decimal: Decimal,
    base_units: u64,
}

impl UsdcAmount {
    /// Parse a decimal price such as `"12.50"`.
    ///
    /// The amount is scaled by 10^6 and rounded half away from zero. Zero,
    /// negative and non-numeric prices are rejected, as are prices that
    /// round to zero base units.
    pub fn parse(price: &str) -> CheckoutResult<Self> {
        let trimmed = price.trim();
        if trimmed.is_empty() {
            return Err(CheckoutError::InvalidPrice {
                message: "price is empty".to_string(),
            });
        }

        let decimal = Decimal::from_str(trimmed).map_err(|e| CheckoutError::InvalidPrice {
            message: format!("'{}' is not a decimal number: {}", trimmed, e),
        })?;

        if decimal <= Decimal::ZERO {
            return Err(CheckoutError::InvalidPrice {
                message: format!("'{}' must be greater than zero", trimmed),
            });
        }

        let base_units = decimal
            .checked_mul(Decimal::from(USDC_SCALE))
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|rounded| rounded.to_u64())
            .ok_or_else(|| CheckoutError::InvalidPrice {
                message: format!("'{}' is too large", trimmed),
            })?;

        if base_units == 0 {
            return Err(CheckoutError::InvalidPrice {
                message: format!("'{}' is smaller than one USDC base unit", trimmed),
            });
        }

        Ok(Self {
            decimal,
            base_units,
        })
    }

    /// Build an amount from base units (millionths of a USDC)
    pub fn from_base_units(base_units: u64) -> Self {
        let decimal = Decimal::from_i128_with_scale(i128::from(base_units), USDC_DECIMALS);
        Self {
            decimal: decimal.normalize(),
            base_units,
        }
    }

    /// Amount in the token's smallest unit
    pub fn base_units(&self) -> u64 {
        self.base_units
    }

    /// Decimal amount as entered
    pub fn as_decimal(&self) -> Decimal {
        self.decimal
    }
}

impl std::fmt::Display for UsdcAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.decimal)
    }
}

impl FromStr for UsdcAmount {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A persisted checkout page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPage {
    /// Generated identifier
    pub id: i32,

    pub store_name: String,

    /// Hosted logo URL
    #[serde(default)]
    pub store_logo: Option<String>,

    pub product_name: String,

    pub product_details: String,

    /// Hosted product image URL
    #[serde(default)]
    pub product_image: Option<String>,

    /// Decimal-as-string USDC price (e.g. "12.50")
    pub product_price: String,

    /// Merchant's Solana address (base58)
    pub wallet_address: String,

    pub email: String,

    #[serde(default)]
    pub address: Option<String>,
}

impl CheckoutPage {
    /// Attach a generated id to an insert payload
    pub fn from_new(id: i32, page: NewCheckoutPage) -> Self {
        Self {
            id,
            store_name: page.store_name,
            store_logo: page.store_logo,
            product_name: page.product_name,
            product_details: page.product_details,
            product_image: page.product_image,
            product_price: page.product_price,
            wallet_address: page.wallet_address,
            email: page.email,
            address: page.address,
        }
    }

    /// Public path of the hosted checkout page
    pub fn checkout_path(&self) -> String {
        checkout_path(self.id)
    }

    /// Parsed price
    pub fn price(&self) -> CheckoutResult<UsdcAmount> {
        UsdcAmount::parse(&self.product_price)
    }

    /// Best image to represent the page: product image, then store logo
    pub fn icon(&self) -> Option<&str> {
        self.product_image
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.store_logo.as_deref().filter(|url| !url.is_empty()))
    }
}

/// Public path for a checkout page id
pub fn checkout_path(id: i32) -> String {
    format!("/checkout/{}", id)
}

/// Solana Actions endpoint for a checkout page id
pub fn action_path(id: i32) -> String {
    format!("/api/actions/checkout/{}", id)
}

/// Insert payload for a checkout page (no id yet)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckoutPage {
    pub store_name: String,
    #[serde(default)]
    pub store_logo: Option<String>,
    pub product_name: String,
    pub product_details: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub product_price: String,
    pub wallet_address: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
}
