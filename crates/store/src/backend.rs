//! Storage seam consumed by the order coordinator and query service.

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};

use crate::error::Result;
use crate::order::{LineItem, Order};
use crate::paginate::{Page, PageMetadata};
use crate::product::Product;

/// Storage backend for products and orders.
///
/// Read-side queries run directly on the store; the transactional
/// order-creation path opens a [`StoreTx`] via [`Store::begin`] so that
/// stock decrements and order writes land atomically.
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit-of-work type produced by [`Store::begin`].
    type Tx: StoreTx;

    /// Opens a transaction scoped to a single order creation.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Inserts a new catalog product.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Fetches a product by ID outside any transaction.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists products in insertion order.
    async fn list_products(&self, page: Page) -> Result<(Vec<Product>, PageMetadata)>;

    /// Fetches an order with its line items and product names attached.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders in creation order.
    async fn list_orders(&self, page: Page) -> Result<(Vec<Order>, PageMetadata)>;

    /// Lists one user's orders in creation order.
    async fn list_orders_by_user(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<(Vec<Order>, PageMetadata)>;

    /// Applies paid/delivered flag edits to an existing order.
    ///
    /// Returns the updated order, or `None` when the order does not exist.
    async fn update_order_flags(
        &self,
        id: OrderId,
        paid: Option<bool>,
        delivered: Option<bool>,
    ) -> Result<Option<Order>>;
}

/// Unit of work backing one atomic order creation.
///
/// Nothing written through the transaction is visible to other operations
/// until [`StoreTx::commit`]; [`StoreTx::rollback`] (or dropping the
/// transaction) discards every staged mutation, including stock decrements.
#[async_trait]
pub trait StoreTx: Send {
    /// Fetches a product and holds it against concurrent stock writes for
    /// the remainder of the transaction.
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Conditionally decrements a product's stock.
    ///
    /// Returns the new stock count, or `None` (with no mutation) when fewer
    /// than `quantity` units are available. Stock never goes negative.
    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<Option<i64>>;

    /// Inserts the order shell row (zero total, no line items yet).
    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Inserts one line item belonging to the order.
    async fn insert_line_item(&mut self, order_id: OrderId, item: &LineItem) -> Result<()>;

    /// Sets the final total on the order row.
    async fn set_order_total(&mut self, order_id: OrderId, total: Money) -> Result<()>;

    /// Makes every staged mutation visible atomically.
    async fn commit(self) -> Result<()>;

    /// Discards every staged mutation.
    async fn rollback(self) -> Result<()>;
}
