//! # Checkout Page Builder
//!
//! Five-step linear wizard that collects a merchant's input:
//!
//! ```text
//! StoreInfo ─▶ ProductInfo ─▶ Pricing ─▶ ContactInfo ─▶ Summary
//! ```
//!
//! Each step validates its own fields before the wizard advances. State is
//! held in memory only; abandoning the wizard loses the input. Submitting
//! from the summary uploads attached images, then persists exactly one
//! checkout page.

use crate::asset::{Asset, AssetUploader};
use crate::error::{CheckoutError, CheckoutResult, FieldErrors};
use crate::page::{checkout_path, NewCheckoutPage, UsdcAmount};
use crate::store::CheckoutPageStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Width of the stored price column
pub const MAX_PRICE_LEN: usize = 20;

/// Wizard steps in order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    StoreInfo,
    ProductInfo,
    Pricing,
    ContactInfo,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::StoreInfo,
        WizardStep::ProductInfo,
        WizardStep::Pricing,
        WizardStep::ContactInfo,
        WizardStep::Summary,
    ];

    pub fn index(&self) -> usize {
        match self {
            WizardStep::StoreInfo => 0,
            WizardStep::ProductInfo => 1,
            WizardStep::Pricing => 2,
            WizardStep::ContactInfo => 3,
            WizardStep::Summary => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name shown in the progress indicator
    pub fn name(&self) -> &'static str {
        match self {
            WizardStep::StoreInfo => "Store Info",
            WizardStep::ProductInfo => "Product Info",
            WizardStep::Pricing => "Pricing",
            WizardStep::ContactInfo => "Contact Info",
            WizardStep::Summary => "Summary",
        }
    }

    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(WizardStep::Summary)
    }

    pub fn previous(&self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(WizardStep::StoreInfo)
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulated form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub store_logo: Option<Asset>,
    pub store_name: String,
    pub product_name: String,
    pub product_details: String,
    pub product_image: Option<Asset>,
    pub product_price: String,
    pub email: String,
    pub address: String,
    pub wallet_address: String,
}

impl CheckoutForm {
    /// Assemble the insert payload once images have been hosted
    pub fn to_new_page(
        &self,
        store_logo: Option<String>,
        product_image: Option<String>,
    ) -> NewCheckoutPage {
        let address = self.address.trim();
        NewCheckoutPage {
            store_name: self.store_name.trim().to_string(),
            store_logo,
            product_name: self.product_name.trim().to_string(),
            product_details: self.product_details.trim().to_string(),
            product_image,
            product_price: self.product_price.trim().to_string(),
            wallet_address: self.wallet_address.trim().to_string(),
            email: self.email.trim().to_string(),
            address: (!address.is_empty()).then(|| address.to_string()),
        }
    }
}

/// Partial form update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct FormPatch {
    pub store_logo: Option<Asset>,
    pub store_name: Option<String>,
    pub product_name: Option<String>,
    pub product_details: Option<String>,
    pub product_image: Option<Asset>,
    pub product_price: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub wallet_address: Option<String>,
}

impl FormPatch {
    /// Patch a single text field by its camelCase name
    pub fn field(name: &str, value: impl Into<String>) -> CheckoutResult<Self> {
        let value = Some(value.into());
        let mut patch = Self::default();
        match name {
            "storeName" => patch.store_name = value,
            "productName" => patch.product_name = value,
            "productDetails" => patch.product_details = value,
            "productPrice" => patch.product_price = value,
            "email" => patch.email = value,
            "address" => patch.address = value,
            "walletAddress" => patch.wallet_address = value,
            other => {
                return Err(CheckoutError::InvalidRequest(format!(
                    "Unknown form field: {}",
                    other
                )))
            }
        }
        Ok(patch)
    }

    /// camelCase names of the fields this patch touches
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.store_logo.is_some() {
            fields.push("storeLogo");
        }
        if self.store_name.is_some() {
            fields.push("storeName");
        }
        if self.product_name.is_some() {
            fields.push("productName");
        }
        if self.product_details.is_some() {
            fields.push("productDetails");
        }
        if self.product_image.is_some() {
            fields.push("productImage");
        }
        if self.product_price.is_some() {
            fields.push("productPrice");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.address.is_some() {
            fields.push("address");
        }
        if self.wallet_address.is_some() {
            fields.push("walletAddress");
        }
        fields
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i32,
    /// Where the merchant is redirected
    pub checkout_path: String,
}

/// Result of [`CheckoutWizard::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Submitted before the summary: the current step validated and the
    /// wizard moved on
    Advanced(WizardStep),
    Created(Submission),
}

/// Returns true when `address` decodes to a 32-byte base58 key
pub fn is_valid_wallet_address(address: &str) -> bool {
    let mut buf = [0u8; 32];
    matches!(
        bs58::decode(address.trim()).onto(&mut buf),
        Ok(len) if len == 32
    )
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, message);
        false
    } else {
        true
    }
}

fn validate_fields(
    step: WizardStep,
    store_name: &str,
    product_name: &str,
    product_details: &str,
    product_price: &str,
    wallet_address: &str,
    email: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match step {
        WizardStep::StoreInfo => {
            require(&mut errors, "storeName", store_name, "Store name is required");
        }
        WizardStep::ProductInfo => {
            require(&mut errors, "productName", product_name, "Product name is required");
            require(
                &mut errors,
                "productDetails",
                product_details,
                "Product details are required",
            );
        }
        WizardStep::Pricing => {
            if require(
                &mut errors,
                "productPrice",
                product_price,
                "Product price is required",
            ) {
                if product_price.chars().count() > MAX_PRICE_LEN {
                    errors.insert(
                        "productPrice",
                        format!("Product price must be at most {} characters", MAX_PRICE_LEN),
                    );
                } else if let Err(e) = UsdcAmount::parse(product_price) {
                    errors.insert("productPrice", e.to_string());
                }
            }
            if require(
                &mut errors,
                "walletAddress",
                wallet_address,
                "Wallet address is required",
            ) && !is_valid_wallet_address(wallet_address)
            {
                errors.insert("walletAddress", "Wallet address is not a valid Solana address");
            }
        }
        WizardStep::ContactInfo => {
            if require(&mut errors, "email", email, "Email is required") && !email.contains('@') {
                errors.insert("email", "Email must be a valid address");
            }
        }
        WizardStep::Summary => {}
    }

    errors
}

/// Validate one wizard step of a form
pub fn validate_step(step: WizardStep, form: &CheckoutForm) -> FieldErrors {
    validate_fields(
        step,
        &form.store_name,
        &form.product_name,
        &form.product_details,
        &form.product_price,
        &form.wallet_address,
        &form.email,
    )
}

/// Run every step's validation against an assembled record
pub fn validate_new_page(page: &NewCheckoutPage) -> CheckoutResult<()> {
    let mut errors = FieldErrors::new();
    for step in WizardStep::ALL {
        errors.extend(validate_fields(
            step,
            &page.store_name,
            &page.product_name,
            &page.product_details,
            &page.product_price,
            &page.wallet_address,
            &page.email,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CheckoutError::Validation(errors))
    }
}

/// The builder wizard
#[derive(Debug, Clone, Default)]
pub struct CheckoutWizard {
    step: WizardStep,
    form: CheckoutForm,
    errors: FieldErrors,
}

impl CheckoutWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    /// Errors from the most recent validation
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_summary(&self) -> bool {
        self.step == WizardStep::Summary
    }

    /// Merge a patch into the form and clear errors for the touched fields
    pub fn update(&mut self, patch: FormPatch) {
        for field in patch.touched_fields() {
            self.errors.remove(field);
        }

        let form = &mut self.form;
        if let Some(asset) = patch.store_logo {
            form.store_logo = Some(asset);
        }
        if let Some(value) = patch.store_name {
            form.store_name = value;
        }
        if let Some(value) = patch.product_name {
            form.product_name = value;
        }
        if let Some(value) = patch.product_details {
            form.product_details = value;
        }
        if let Some(asset) = patch.product_image {
            form.product_image = Some(asset);
        }
        if let Some(value) = patch.product_price {
            form.product_price = value;
        }
        if let Some(value) = patch.email {
            form.email = value;
        }
        if let Some(value) = patch.address {
            form.address = value;
        }
        if let Some(value) = patch.wallet_address {
            form.wallet_address = value;
        }
    }

    /// Validate the current step and advance on success.
    ///
    /// On failure the wizard stays put and the field errors are both stored
    /// and returned.
    pub fn next(&mut self) -> Result<WizardStep, FieldErrors> {
        let errors = validate_step(self.step, &self.form);
        if !errors.is_empty() {
            debug!("Step {} blocked: {}", self.step, errors);
            self.errors = errors.clone();
            return Err(errors);
        }

        self.errors = FieldErrors::new();
        self.step = self.step.next();
        Ok(self.step)
    }

    /// Go back one step (never before the first)
    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.step
    }

    fn validate_all(&mut self) -> Result<(), FieldErrors> {
        for step in WizardStep::ALL {
            let errors = validate_step(step, &self.form);
            if !errors.is_empty() {
                self.step = step;
                self.errors = errors.clone();
                return Err(errors);
            }
        }
        Ok(())
    }

    /// Upload attached images and persist the checkout page.
    ///
    /// Only the summary step persists. On any earlier step this is
    /// [`CheckoutWizard::next`]: the step is validated, the wizard advances
    /// and nothing is uploaded or stored.
    #[instrument(skip_all, fields(step = %self.step))]
    pub async fn submit(
        &mut self,
        uploader: &dyn AssetUploader,
        store: &dyn CheckoutPageStore,
    ) -> CheckoutResult<SubmitOutcome> {
        if !self.is_summary() {
            let step = self.next().map_err(CheckoutError::Validation)?;
            return Ok(SubmitOutcome::Advanced(step));
        }

        self.validate_all().map_err(CheckoutError::Validation)?;

        let store_logo = match &self.form.store_logo {
            Some(asset) => Some(uploader.upload(asset).await?.secure_url),
            None => None,
        };
        let product_image = match &self.form.product_image {
            Some(asset) => Some(uploader.upload(asset).await?.secure_url),
            None => None,
        };

        let page = self.form.to_new_page(store_logo, product_image);
        let id = store.create(page).await?;

        info!("Created checkout page {}", id);

        Ok(SubmitOutcome::Created(Submission {
            id,
            checkout_path: checkout_path(id),
        }))
    }
}
