//! In-memory store for tests and development.
//!
//! Transactions hold the store mutex from `begin` to `commit`/`rollback`,
//! so concurrent order creations are fully serialized. Mutations are staged
//! on a working copy and written back on commit; dropping a transaction
//! without committing discards them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::backend::{Store, StoreTx};
use crate::error::Result;
use crate::order::{LineItem, Order};
use crate::paginate::{Page, PageMetadata};
use crate::product::Product;

#[derive(Debug, Clone, Default)]
struct MemState {
    products: HashMap<ProductId, Product>,
    // Vec keeps insertion order, which is the pagination order.
    orders: Vec<Order>,
}

/// In-memory store implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with the given products.
    pub async fn with_products(products: Vec<Product>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().await;
            for product in products {
                state.products.insert(product.id, product);
            }
        }
        store
    }

    /// Returns the current stock of a product, if it exists.
    pub async fn stock_of(&self, id: ProductId) -> Option<i64> {
        self.state.lock().await.products.get(&id).map(|p| p.stock)
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

fn paginate<T: Clone>(items: &[T], page: Page) -> (Vec<T>, PageMetadata) {
    let total = items.len() as u64;
    let slice = items
        .iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .cloned()
        .collect();
    (slice, PageMetadata::compute(page, total))
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.state
            .lock()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, page: Page) -> Result<(Vec<Product>, PageMetadata)> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by_key(|p| (p.created_at, p.id.as_uuid()));
        Ok(paginate(&products, page))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, page: Page) -> Result<(Vec<Order>, PageMetadata)> {
        let state = self.state.lock().await;
        Ok(paginate(&state.orders, page))
    }

    async fn list_orders_by_user(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<(Vec<Order>, PageMetadata)> {
        let state = self.state.lock().await;
        let orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(paginate(&orders, page))
    }

    async fn update_order_flags(
        &self,
        id: OrderId,
        paid: Option<bool>,
        delivered: Option<bool>,
    ) -> Result<Option<Order>> {
        let mut state = self.state.lock().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.apply_flags(paid, delivered);
        Ok(Some(order.clone()))
    }
}

/// In-memory unit of work. Holds the store lock until resolved.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemState>,
    work: MemState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<Option<i64>> {
        let Some(product) = self.work.products.get_mut(&id) else {
            return Ok(None);
        };
        let quantity = i64::from(quantity);
        if product.stock < quantity {
            return Ok(None);
        }
        product.stock -= quantity;
        Ok(Some(product.stock))
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.work.orders.push(order.clone());
        Ok(())
    }

    async fn insert_line_item(&mut self, order_id: OrderId, item: &LineItem) -> Result<()> {
        if let Some(order) = self.work.orders.iter_mut().find(|o| o.id == order_id) {
            order.items.push(item.clone());
        }
        Ok(())
    }

    async fn set_order_total(&mut self, order_id: OrderId, total: Money) -> Result<()> {
        if let Some(order) = self.work.orders.iter_mut().find(|o| o.id == order_id) {
            order.total = total;
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let MemoryTx { mut guard, work } = self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        // Dropping the lock discards the working copy.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PaymentMethod;

    fn widget(stock: i64) -> Product {
        Product::new("Widget", Money::from_cents(1000), stock)
    }

    #[tokio::test]
    async fn decrement_is_conditional() {
        let product = widget(3);
        let id = product.id;
        let store = MemoryStore::with_products(vec![product]).await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.decrement_stock(id, 2).await.unwrap(), Some(1));
        assert_eq!(tx.decrement_stock(id, 2).await.unwrap(), None);
        assert_eq!(tx.decrement_stock(id, 1).await.unwrap(), Some(0));
        tx.commit().await.unwrap();

        assert_eq!(store.stock_of(id).await, Some(0));
    }

    #[tokio::test]
    async fn rollback_discards_staged_mutations() {
        let product = widget(5);
        let id = product.id;
        let store = MemoryStore::with_products(vec![product]).await;

        let mut tx = store.begin().await.unwrap();
        tx.decrement_stock(id, 3).await.unwrap();
        tx.insert_order(&Order::shell(UserId::new(), PaymentMethod::Cash))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.stock_of(id).await, Some(5));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn commit_makes_order_visible() {
        let store = MemoryStore::new();
        let order = Order::shell(UserId::new(), PaymentMethod::Credit);
        let order_id = order.id;

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.set_order_total(order_id, Money::from_cents(4200))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let stored = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.total.cents(), 4200);
    }

    #[tokio::test]
    async fn orders_paginate_in_insertion_order() {
        let store = MemoryStore::new();
        let user_id = UserId::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let order = Order::shell(user_id, PaymentMethod::Cash);
            ids.push(order.id);
            let mut tx = store.begin().await.unwrap();
            tx.insert_order(&order).await.unwrap();
            tx.commit().await.unwrap();
        }

        let (page1, meta) = store
            .list_orders(Page::new(1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].id, ids[0]);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.total_records, 5);

        let (page3, _) = store
            .list_orders(Page::new(3, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page3.len(), 1);
        assert_eq!(page3[0].id, ids[4]);
    }

    #[tokio::test]
    async fn update_flags_returns_none_for_missing_order() {
        let store = MemoryStore::new();
        let result = store
            .update_order_flags(OrderId::new(), Some(true), None)
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
