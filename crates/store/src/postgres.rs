//! PostgreSQL-backed store.
//!
//! Order creation uses a real database transaction: the product row is
//! locked with `FOR UPDATE` and the stock decrement is conditional at the
//! SQL level, so two concurrent orders can never overdraw stock.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{Money, OrderId, PaymentMethod, ProductId, UserId};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::backend::{Store, StoreTx};
use crate::error::{Result, StoreError};
use crate::order::{LineItem, Order};
use crate::paginate::{Page, PageMetadata};
use crate::product::Product;

/// PostgreSQL store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and returns a store.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        tracing::debug!("connected to postgres");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    /// Loads line items (with product names) for the given orders and
    /// attaches them in a single round trip.
    async fn attach_line_items(&self, orders: &mut [Order]) -> Result<()> {
        if orders.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.unit_price_cents
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<LineItem>> = HashMap::new();
        for row in rows {
            let (order_id, item) = row_to_line_item(&row)?;
            by_order.entry(order_id).or_default().push(item);
        }

        for order in orders {
            if let Some(items) = by_order.remove(&order.id) {
                order.items = items;
            }
        }
        Ok(())
    }

    async fn list_orders_where(
        &self,
        user_id: Option<UserId>,
        page: Page,
    ) -> Result<(Vec<Order>, PageMetadata)> {
        let (rows, total) = match user_id {
            Some(user_id) => {
                let rows = sqlx::query(&format!("{ORDER_COLUMNS} WHERE user_id = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3"))
                    .bind(user_id.as_uuid())
                    .bind(page.limit())
                    .bind(page.offset())
                    .fetch_all(&self.pool)
                    .await?;
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
                    .bind(user_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
            None => {
                let rows = sqlx::query(&format!(
                    "{ORDER_COLUMNS} ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
                ))
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
        };

        let mut orders = rows
            .into_iter()
            .map(|row| row_to_order(&row))
            .collect::<Result<Vec<_>>>()?;
        self.attach_line_items(&mut orders).await?;

        Ok((orders, PageMetadata::compute(page, total as u64)))
    }
}

const ORDER_COLUMNS: &str = "SELECT id, user_id, payment_method, is_paid, paid_at, \
     is_delivered, delivered_at, total_cents, created_at FROM orders";

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let method: String = row.try_get("payment_method")?;
    let payment_method = PaymentMethod::parse(&method)
        .ok_or_else(|| StoreError::Decode(format!("unknown payment method: {method}")))?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        payment_method,
        is_paid: row.try_get("is_paid")?,
        paid_at: row.try_get("paid_at")?,
        is_delivered: row.try_get("is_delivered")?,
        delivered_at: row.try_get("delivered_at")?,
        total: Money::from_cents(row.try_get("total_cents")?),
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_line_item(row: &PgRow) -> Result<(OrderId, LineItem)> {
    let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?);
    let quantity: i32 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| StoreError::Decode(format!("negative quantity: {quantity}")))?;

    let item = LineItem {
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity,
        unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
    };
    Ok((order_id, item))
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTx { tx })
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, stock, created_at FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn list_products(&self, page: Page) -> Result<(Vec<Product>, PageMetadata)> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, price_cents, stock, created_at
            FROM products
            ORDER BY created_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let products = rows
            .iter()
            .map(row_to_product)
            .collect::<Result<Vec<_>>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok((products, PageMetadata::compute(page, total as u64)))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("{ORDER_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut orders = vec![row_to_order(&row)?];
        self.attach_line_items(&mut orders).await?;
        Ok(orders.pop())
    }

    async fn list_orders(&self, page: Page) -> Result<(Vec<Order>, PageMetadata)> {
        self.list_orders_where(None, page).await
    }

    async fn list_orders_by_user(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<(Vec<Order>, PageMetadata)> {
        self.list_orders_where(Some(user_id), page).await
    }

    async fn update_order_flags(
        &self,
        id: OrderId,
        paid: Option<bool>,
        delivered: Option<bool>,
    ) -> Result<Option<Order>> {
        let Some(mut order) = self.get_order(id).await? else {
            return Ok(None);
        };

        order.apply_flags(paid, delivered);

        sqlx::query(
            r#"
            UPDATE orders
            SET is_paid = $2, paid_at = $3, is_delivered = $4, delivered_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .execute(&self.pool)
        .await?;

        Ok(Some(order))
    }
}

/// PostgreSQL unit of work for order creation.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, stock, created_at FROM products \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<Option<i64>> {
        // Conditional at the SQL level: no row is touched when stock would
        // go negative, which upholds the non-negativity invariant even if
        // the caller skipped the lock.
        let new_stock: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(new_stock)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, payment_method, is_paid, paid_at,
                                is_delivered, delivered_at, total_cents, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.payment_method.as_str())
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .bind(order.total.cents())
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_line_item(&mut self, order_id: OrderId, item: &LineItem) -> Result<()> {
        let quantity = i32::try_from(item.quantity)
            .map_err(|_| StoreError::Decode(format!("quantity out of range: {}", item.quantity)))?;

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(quantity)
        .bind(item.unit_price.cents())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_order_total(&mut self, order_id: OrderId, total: Money) -> Result<()> {
        sqlx::query("UPDATE orders SET total_cents = $2 WHERE id = $1")
            .bind(order_id.as_uuid())
            .bind(total.cents())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
