//! # checkout-wasm
//!
//! WebAssembly bindings for the usdc-checkout page builder.
//!
//! This crate provides WASM-compatible functions for:
//! - Driving the five-step builder wizard in the browser
//! - Validating prices and wallet addresses client-side
//! - Converting between USDC prices and base units
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCheckoutWizard, usdc_base_units } from 'usdc-checkout-wasm';
//!
//! await init();
//!
//! const wizard = new WasmCheckoutWizard();
//! wizard.update('storeName', 'Rust Goods');
//! const errors = wizard.next(); // null when the step is valid
//!
//! console.log(usdc_base_units('12.50')); // 12500000n
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use checkout_core::{
    is_valid_wallet_address, CheckoutForm, CheckoutWizard, FieldErrors, FormPatch, UsdcAmount,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Text fields of the builder form. Attached images stay on the JS side
/// until submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormJson<'a> {
    step: &'a str,
    store_name: &'a str,
    product_name: &'a str,
    product_details: &'a str,
    product_price: &'a str,
    email: &'a str,
    address: &'a str,
    wallet_address: &'a str,
}

impl<'a> FormJson<'a> {
    fn new(step: &'a str, form: &'a CheckoutForm) -> Self {
        Self {
            step,
            store_name: &form.store_name,
            product_name: &form.product_name,
            product_details: &form.product_details,
            product_price: &form.product_price,
            email: &form.email,
            address: &form.address,
            wallet_address: &form.wallet_address,
        }
    }
}

/// Builder wizard for the WASM interface
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct WasmCheckoutWizard {
    inner: CheckoutWizard,
}

#[wasm_bindgen]
impl WasmCheckoutWizard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based index of the current step
    #[wasm_bindgen(getter)]
    pub fn step(&self) -> usize {
        self.inner.step().index()
    }

    #[wasm_bindgen(getter)]
    pub fn step_name(&self) -> String {
        self.inner.step().name().to_string()
    }

    /// Set one text field by its camelCase name
    #[wasm_bindgen]
    pub fn update(&mut self, field: &str, value: String) -> Result<(), JsValue> {
        let patch = FormPatch::field(field, value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.update(patch);
        Ok(())
    }

    /// Advance one step. Returns `null` on success or an object of
    /// field errors when the current step does not validate.
    #[wasm_bindgen]
    pub fn next(&mut self) -> Result<JsValue, JsValue> {
        match self.advance() {
            None => Ok(JsValue::NULL),
            Some(errors) => errors
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .map_err(|e| JsValue::from_str(&format!("Failed to encode errors: {}", e))),
        }
    }

    /// Go back one step and return the new step index
    #[wasm_bindgen]
    pub fn back(&mut self) -> usize {
        self.inner.back().index()
    }

    #[wasm_bindgen]
    pub fn is_summary(&self) -> bool {
        self.inner.is_summary()
    }

    /// Current step and form text as a JSON string
    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        let step = self.inner.step().name();
        serde_json::to_string(&FormJson::new(step, self.inner.form()))
            .map_err(|e| JsValue::from_str(&format!("Failed to encode form: {}", e)))
    }
}

impl WasmCheckoutWizard {
    fn advance(&mut self) -> Option<FieldErrors> {
        self.inner.next().err()
    }
}

/// Convert a decimal USDC price to base units (millionths)
#[wasm_bindgen]
pub fn usdc_base_units(price: &str) -> Result<u64, JsValue> {
    UsdcAmount::parse(price)
        .map(|amount| amount.base_units())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Format base units for display, keeping at least two decimals
#[wasm_bindgen]
pub fn format_usdc(base_units: u64) -> String {
    let amount = UsdcAmount::from_base_units(base_units).as_decimal();
    if amount.scale() < 2 {
        format!("{:.2} USDC", amount)
    } else {
        format!("{} USDC", amount)
    }
}

/// Check that an address decodes to a 32-byte Solana key
#[wasm_bindgen]
pub fn validate_wallet_address(address: &str) -> bool {
    is_valid_wallet_address(address)
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_next_returns_null_or_errors() {
        let mut wizard = WasmCheckoutWizard::new();
        let errors = wizard.next().unwrap();
        assert!(errors.is_object());

        wizard.update("storeName", "Rust Goods".to_string()).unwrap();
        assert!(wizard.next().unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_unknown_field_is_rejected() {
        let mut wizard = WasmCheckoutWizard::new();
        assert!(wizard.update("price", "1".to_string()).is_err());
        assert!(usdc_base_units("-1").is_err());
    }
}
