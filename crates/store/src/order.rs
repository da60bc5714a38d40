//! Order aggregate and its line items.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentMethod, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// One (product, quantity) pairing within an order.
///
/// The unit price is captured at creation time so historical orders stay
/// reconstructable when catalog prices change later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A placed order with its line items.
///
/// Created exactly once, atomically, by the order coordinator. The
/// paid/delivered flags are edited later, outside the creation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub total: Money,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates an order shell: zero total, no line items yet.
    ///
    /// The coordinator persists this row first, then fills in line items
    /// and the final total within the same transaction.
    pub fn shell(user_id: UserId, payment_method: PaymentMethod) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            payment_method,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            total: Money::zero(),
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Recomputes the total from the line items.
    pub fn computed_total(&self) -> Money {
        self.items
            .iter()
            .map(LineItem::subtotal)
            .fold(Money::zero(), |acc, m| acc + m)
    }

    /// Applies paid/delivered flag edits, stamping timestamps on
    /// transitions to `true` and clearing them on transitions to `false`.
    pub fn apply_flags(&mut self, paid: Option<bool>, delivered: Option<bool>) {
        if let Some(paid) = paid {
            self.is_paid = paid;
            self.paid_at = paid.then(|| self.paid_at.unwrap_or_else(Utc::now));
        }
        if let Some(delivered) = delivered {
            self.is_delivered = delivered;
            self.delivered_at = delivered.then(|| self.delivered_at.unwrap_or_else(Utc::now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_starts_empty() {
        let order = Order::shell(UserId::new(), PaymentMethod::Cash);
        assert!(order.items.is_empty());
        assert!(order.total.is_zero());
        assert!(!order.is_paid);
        assert!(order.paid_at.is_none());
    }

    #[test]
    fn computed_total_sums_line_items() {
        let mut order = Order::shell(UserId::new(), PaymentMethod::Credit);
        order.items.push(LineItem::new(
            ProductId::new(),
            "Widget",
            2,
            Money::from_cents(1000),
        ));
        order.items.push(LineItem::new(
            ProductId::new(),
            "Gadget",
            3,
            Money::from_cents(500),
        ));
        assert_eq!(order.computed_total().cents(), 3500);
    }

    #[test]
    fn apply_flags_stamps_and_clears_timestamps() {
        let mut order = Order::shell(UserId::new(), PaymentMethod::Cash);

        order.apply_flags(Some(true), None);
        assert!(order.is_paid);
        assert!(order.paid_at.is_some());
        assert!(!order.is_delivered);

        let first_paid_at = order.paid_at;
        order.apply_flags(Some(true), Some(true));
        // Re-marking paid keeps the original timestamp.
        assert_eq!(order.paid_at, first_paid_at);
        assert!(order.delivered_at.is_some());

        order.apply_flags(Some(false), None);
        assert!(!order.is_paid);
        assert!(order.paid_at.is_none());
    }
}
