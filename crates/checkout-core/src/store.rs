//! # Checkout Page Store
//!
//! Persistence seam for checkout pages. The HTTP layer ships a Postgres
//! implementation; `InMemoryCheckoutPageStore` backs tests and local runs
//! without a database.

use crate::error::{CheckoutError, CheckoutResult};
use crate::page::{CheckoutPage, NewCheckoutPage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage for checkout pages.
///
/// Pages are created once and never updated or deleted.
#[async_trait]
pub trait CheckoutPageStore: Send + Sync {
    /// Insert a page and return its generated id
    async fn create(&self, page: NewCheckoutPage) -> CheckoutResult<i32>;

    /// Fetch a page by id
    async fn get(&self, id: i32) -> CheckoutResult<Option<CheckoutPage>>;

    /// Fetch a page by id, mapping absence to `PageNotFound`
    async fn require(&self, id: i32) -> CheckoutResult<CheckoutPage> {
        self.get(id)
            .await?
            .ok_or(CheckoutError::PageNotFound { id })
    }
}

/// Type alias for a shared store (dynamic dispatch)
pub type SharedCheckoutPageStore = Arc<dyn CheckoutPageStore>;

/// Process-local store with sequential ids starting at 1
#[derive(Debug, Default)]
pub struct InMemoryCheckoutPageStore {
    pages: RwLock<BTreeMap<i32, CheckoutPage>>,
}

impl InMemoryCheckoutPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pages
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }
}

#[async_trait]
impl CheckoutPageStore for InMemoryCheckoutPageStore {
    async fn create(&self, page: NewCheckoutPage) -> CheckoutResult<i32> {
        let mut pages = self.pages.write().await;
        let id = pages
            .keys()
            .next_back()
            .map_or(Ok(1), |last| {
                last.checked_add(1)
                    .ok_or_else(|| CheckoutError::Database("id sequence exhausted".to_string()))
            })?;
        pages.insert(id, CheckoutPage::from_new(id, page));
        tracing::debug!("Stored checkout page {} in memory", id);
        Ok(id)
    }

    async fn get(&self, id: i32) -> CheckoutResult<Option<CheckoutPage>> {
        Ok(self.pages.read().await.get(&id).cloned())
    }
}
