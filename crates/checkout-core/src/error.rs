//! # Checkout Error Types
//!
//! Typed error handling for the usdc-checkout service.
//! All checkout operations return `Result<T, CheckoutError>`.
//!
//! Errors fall into three buckets that map onto HTTP statuses:
//! not found (404), bad input (400) and upstream failure (500).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field-level validation errors, keyed by the camelCase field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge another set of errors into this one
    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout page does not exist
    #[error("Checkout page not found")]
    PageNotFound { id: i32 },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Address could not be decoded as a 32-byte public key
    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    /// Stored or submitted price is not a positive USDC amount
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// One or more form fields failed validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Buyer token account holds less than the purchase amount
    #[error("Insufficient USDC balance: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream service answered with an error status that is passed through
    #[error("{message}")]
    Rejected {
        service: String,
        status: u16,
        message: String,
    },

    /// Upstream service failed (RPC error, upload failure, ...)
    #[error("Upstream error [{service}]: {message}")]
    Upstream { service: String, message: String },

    /// Network/HTTP error communicating with an upstream
    #[error("Network error: {0}")]
    Network(String),

    /// Persistence failure
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Shorthand for an upstream failure
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Network(_) | CheckoutError::Upstream { .. }
        )
    }

    /// Returns true for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::PageNotFound { .. } => 404,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::InvalidAddress { .. } => 400,
            CheckoutError::InvalidPrice { .. } => 400,
            CheckoutError::Validation(_) => 400,
            CheckoutError::InsufficientFunds { .. } => 400,
            CheckoutError::Unauthorized(_) => 401,
            CheckoutError::Rejected { status, .. } => *status,
            CheckoutError::Upstream { .. } => 500,
            CheckoutError::Network(_) => 500,
            CheckoutError::Database(_) => 500,
            CheckoutError::Configuration(_) => 500,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
