//! Transaction coordinator for atomic order creation.

use common::{Money, OrderId, PaymentMethod, ProductId, UserId};
use serde::Deserialize;
use store::{LineItem, Order, Store, StoreTx};

use crate::error::{OrderError, Result};

/// One requested (product, quantity) pairing from the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LineItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Orchestrates the atomic order-creation workflow.
///
/// Every invocation ends in exactly one of two terminal states: committed
/// (all stock decrements and the order with its line items are visible) or
/// aborted (the inventory is completely unchanged and no order row exists).
/// No partially-applied state is ever observable.
pub struct OrderCoordinator<S: Store> {
    store: S,
}

impl<S: Store> OrderCoordinator<S> {
    /// Creates a coordinator over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Atomically creates an order for `user_id`.
    ///
    /// Items are processed in request order; the first missing or
    /// out-of-stock product aborts the whole operation with a policy error
    /// identifying it. Storage failures abort with an internal error. In
    /// either case the transaction is rolled back in full.
    #[tracing::instrument(skip(self, items), fields(user_id = %user_id, item_count = items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
        items: &[LineItemRequest],
    ) -> Result<Order> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(bad) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity(bad.product_id));
        }

        let started = std::time::Instant::now();
        metrics::counter!("orders_attempted_total").increment(1);

        let mut tx = self.store.begin().await?;
        match Self::create_in_tx(&mut tx, user_id, payment_method, items).await {
            Ok(order) => {
                tx.commit().await?;
                metrics::counter!("orders_created_total").increment(1);
                metrics::histogram!("order_create_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(order_id = %order.id, total = %order.total, "order created");
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed after aborted order");
                }
                metrics::counter!("orders_rejected_total").increment(1);
                Err(err)
            }
        }
    }

    /// Runs the order build inside the open transaction. Any error returned
    /// here means the caller must roll back.
    async fn create_in_tx(
        tx: &mut S::Tx,
        user_id: UserId,
        payment_method: PaymentMethod,
        items: &[LineItemRequest],
    ) -> Result<Order> {
        // Order shell goes in first so line items have a row to reference;
        // the total is filled in last, inside the same transaction.
        let mut order = Order::shell(user_id, payment_method);
        tx.insert_order(&order).await?;

        let mut total = Money::zero();
        for request in items {
            let product = tx
                .product_for_update(request.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(request.product_id))?;

            if tx
                .decrement_stock(request.product_id, request.quantity)
                .await?
                .is_none()
            {
                return Err(OrderError::OutOfStock(request.product_id));
            }

            total += product.price.multiply(request.quantity);
            order.items.push(LineItem::new(
                product.id,
                product.name,
                request.quantity,
                product.price,
            ));
        }

        for item in &order.items {
            tx.insert_line_item(order.id, item).await?;
        }
        tx.set_order_total(order.id, total).await?;
        order.total = total;

        Ok(order)
    }

    /// Edits the paid/delivered flags on an existing order.
    ///
    /// This runs outside the creation transaction; timestamps are stamped
    /// on transitions to `true` and cleared on transitions to `false`.
    #[tracing::instrument(skip(self))]
    pub async fn update_flags(
        &self,
        id: OrderId,
        paid: Option<bool>,
        delivered: Option<bool>,
    ) -> Result<Order> {
        self.store
            .update_order_flags(id, paid, delivered)
            .await?
            .ok_or(OrderError::OrderNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, Product};

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_transaction() {
        let store = MemoryStore::new();
        let coordinator = OrderCoordinator::new(store);

        let result = coordinator
            .create_order(UserId::new(), PaymentMethod::Cash, &[])
            .await;
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let product = Product::new("Widget", Money::from_cents(1000), 5);
        let product_id = product.id;
        let store = MemoryStore::with_products(vec![product]).await;
        let coordinator = OrderCoordinator::new(store.clone());

        let result = coordinator
            .create_order(
                UserId::new(),
                PaymentMethod::Cash,
                &[LineItemRequest {
                    product_id,
                    quantity: 0,
                }],
            )
            .await;
        assert!(matches!(result, Err(OrderError::InvalidQuantity(id)) if id == product_id));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_product_aborts_with_policy_error() {
        let store = MemoryStore::new();
        let coordinator = OrderCoordinator::new(store.clone());
        let missing = ProductId::new();

        let result = coordinator
            .create_order(
                UserId::new(),
                PaymentMethod::Credit,
                &[LineItemRequest {
                    product_id: missing,
                    quantity: 1,
                }],
            )
            .await;
        assert!(matches!(result, Err(OrderError::ProductNotFound(id)) if id == missing));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn line_items_capture_price_at_purchase_time() {
        let product = Product::new("Widget", Money::from_cents(1500), 10);
        let product_id = product.id;
        let store = MemoryStore::with_products(vec![product]).await;
        let coordinator = OrderCoordinator::new(store.clone());

        let order = coordinator
            .create_order(
                UserId::new(),
                PaymentMethod::Cash,
                &[LineItemRequest {
                    product_id,
                    quantity: 2,
                }],
            )
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].unit_price.cents(), 1500);
        assert_eq!(order.items[0].product_name, "Widget");
        assert_eq!(order.total.cents(), 3000);
    }

    #[tokio::test]
    async fn update_flags_on_missing_order_fails() {
        let store = MemoryStore::new();
        let coordinator = OrderCoordinator::new(store);

        let result = coordinator
            .update_flags(OrderId::new(), Some(true), None)
            .await;
        assert!(matches!(result, Err(OrderError::OrderNotFound(_))));
    }
}
