//! Order placement, retrieval and flag-edit endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::{OrderId, PaymentMethod, ProductId, UserId};
use orders::{LineItemRequest, OrderCoordinator, OrderQueries};
use serde::{Deserialize, Serialize};
use store::{Order, PageMetadata, Store};
use uuid::Uuid;

use crate::error::ApiError;

use super::{PageParams, ok_envelope, parse_id};

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub coordinator: OrderCoordinator<S>,
    pub queries: OrderQueries<S>,
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub payment_method: String,
    pub order_items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct EditOrderRequest {
    pub is_paid: Option<bool>,
    pub is_delivered: Option<bool>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub payment_method: String,
    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub is_delivered: bool,
    pub delivered_at: Option<String>,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                subtotal_cents: item.subtotal().cents(),
            })
            .collect();

        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            payment_method: order.payment_method.to_string(),
            is_paid: order.is_paid,
            paid_at: order.paid_at.map(|t| t.to_rfc3339()),
            is_delivered: order.is_delivered,
            delivered_at: order.delivered_at.map(|t| t.to_rfc3339()),
            total_cents: order.total.cents(),
            items,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

fn orders_envelope(orders: &[Order], metadata: PageMetadata) -> Json<serde_json::Value> {
    let responses: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
    ok_envelope(serde_json::json!({
        "orders": responses,
        "metadata": metadata,
    }))
}

/// Extracts the authenticated user identity supplied by the fronting
/// auth layer.
fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Validation("missing x-user-id header".to_string()))?;
    let uuid = Uuid::parse_str(raw)
        .map_err(|e| ApiError::Validation(format!("invalid x-user-id: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}

// -- Handlers --

/// POST /orders — atomically place an order for the authenticated user.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ApiError> {
    let user_id = require_user(&headers)?;

    let payment_method = PaymentMethod::parse(&req.payment_method).ok_or_else(|| {
        ApiError::Validation("payment_method must be cash or credit".to_string())
    })?;

    if req.order_items.is_empty() {
        return Err(ApiError::Validation(
            "order_items must be provided".to_string(),
        ));
    }

    let items: Vec<LineItemRequest> = req
        .order_items
        .iter()
        .map(|item| LineItemRequest {
            product_id: ProductId::from_uuid(item.product_id),
            quantity: item.quantity,
        })
        .collect();

    let order = state
        .coordinator
        .create_order(user_id, payment_method, &items)
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        ok_envelope(serde_json::json!({ "order": OrderResponse::from(&order) })),
    ))
}

/// GET /orders/:id — load one order with line-item detail.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id)?);
    let order = state.queries.get_by_id(order_id).await?;
    Ok(ok_envelope(
        serde_json::json!({ "order": OrderResponse::from(&order) }),
    ))
}

/// GET /orders — administrative paginated listing of all orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params.into_page()?;
    let (orders, metadata) = state.queries.list_all(page).await?;
    Ok(orders_envelope(&orders, metadata))
}

/// GET /users/:user_id/orders — paginated listing of one user's orders.
#[tracing::instrument(skip(state))]
pub async fn list_by_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = UserId::from_uuid(parse_id(&user_id)?);
    let page = params.into_page()?;
    let (orders, metadata) = state.queries.list_by_user(user_id, page).await?;
    Ok(orders_envelope(&orders, metadata))
}

/// PATCH /orders/:id — edit the paid/delivered flags.
#[tracing::instrument(skip(state, req))]
pub async fn edit<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<EditOrderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order_id = OrderId::from_uuid(parse_id(&id)?);
    let order = state
        .coordinator
        .update_flags(order_id, req.is_paid, req.is_delivered)
        .await?;
    Ok(ok_envelope(
        serde_json::json!({ "order": OrderResponse::from(&order) }),
    ))
}
