//! # checkout-core
//!
//! Core types and traits for the usdc-checkout hosted checkout service.
//!
//! This crate provides:
//! - `CheckoutPage` and `UsdcAmount` for the single persisted entity
//! - `CheckoutWizard` for the five-step page builder
//! - `CheckoutPageStore`, `AssetUploader` and `PaymentRail` traits at the
//!   seams to the database, the image host and the blockchain
//! - Blink (Solana Actions) descriptor types
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutWizard, FormPatch, SubmitOutcome};
//!
//! let mut wizard = CheckoutWizard::new();
//! wizard.update(FormPatch::field("storeName", "Rust Goods")?);
//! wizard.next()?;
//! // ... fill the remaining steps ...
//! if let SubmitOutcome::Created(submission) = wizard.submit(&uploader, &store).await? {
//!     // Redirect the merchant to submission.checkout_path
//! }
//! ```

pub mod asset;
pub mod blink;
pub mod builder;
pub mod error;
pub mod page;
pub mod rail;
pub mod store;

// Re-exports for convenience
pub use asset::{Asset, AssetUploader, SharedAssetUploader, UploadedAsset};
pub use blink::{
    blockchain_id, ActionGetResponse, ActionPostRequest, ActionPostResponse, ActionRule,
    ActionType, ActionsJson, ACTION_VERSION,
};
pub use builder::{
    is_valid_wallet_address, validate_new_page, validate_step, CheckoutForm, CheckoutWizard,
    FormPatch, SubmitOutcome, Submission, WizardStep,
};
pub use error::{CheckoutError, CheckoutResult, FieldErrors};
pub use page::{action_path, checkout_path, CheckoutPage, NewCheckoutPage, UsdcAmount, USDC_DECIMALS};
pub use rail::{purchase_message, PaymentRail, PurchaseTransaction, SharedPaymentRail};
pub use store::{CheckoutPageStore, InMemoryCheckoutPageStore, SharedCheckoutPageStore};
