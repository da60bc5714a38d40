//! Order core error taxonomy.
//!
//! Policy errors (`ProductNotFound`, `OutOfStock`) represent valid but
//! rejected business requests and carry enough detail to identify the
//! offending product. `Store` wraps internal storage failures, which are
//! surfaced opaquely to clients.

use common::{OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Policy error: a requested product does not exist.
    #[error("product {0} does not exist")]
    ProductNotFound(ProductId),

    /// Policy error: insufficient stock for a requested product.
    #[error("insufficient stock for product {0}")]
    OutOfStock(ProductId),

    /// The order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// An order must contain at least one line item.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// Line item quantities must be positive.
    #[error("quantity for product {0} must be positive")]
    InvalidQuantity(ProductId),

    /// Internal storage failure; always accompanied by a full rollback.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
