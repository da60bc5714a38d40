//! Catalog product entity.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A sellable product with its current price and stock count.
///
/// Stock is only mutated by the order coordinator through the conditional
/// decrement in [`crate::StoreTx::decrement_stock`]; catalog management
/// writes go through [`crate::Store::insert_product`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a fresh identifier.
    pub fn new(name: impl Into<String>, price: Money, stock: i64) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            stock,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_gets_unique_id() {
        let a = Product::new("Widget", Money::from_cents(1000), 5);
        let b = Product::new("Widget", Money::from_cents(1000), 5);
        assert_ne!(a.id, b.id);
    }
}
