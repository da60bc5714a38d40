//! Read-side order queries with pagination.

use common::{OrderId, UserId};
use store::{Order, Page, PageMetadata, Store};

use crate::error::{OrderError, Result};

/// Paginated retrieval of committed orders.
///
/// Queries are read-only joins; a user with no orders gets an empty page
/// with all-zero metadata, never an error.
pub struct OrderQueries<S: Store> {
    store: S,
}

impl<S: Store> OrderQueries<S> {
    /// Creates a query service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order with line items and product details attached.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Lists all orders in creation order (administrative view).
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self, page: Page) -> Result<(Vec<Order>, PageMetadata)> {
        Ok(self.store.list_orders(page).await?)
    }

    /// Lists one user's orders in creation order.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_user(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<(Vec<Order>, PageMetadata)> {
        Ok(self.store.list_orders_by_user(user_id, page).await?)
    }
}
