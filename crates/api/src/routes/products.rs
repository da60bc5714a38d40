//! Catalog endpoints: just enough surface to seed and browse products.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{Product, Store};

use crate::error::ApiError;

use super::orders::AppState;
use super::{PageParams, ok_envelope, parse_id};

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub created_at: String,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price_cents: product.price.cents(),
            stock: product.stock,
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

/// POST /products — add a catalog product.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name must be provided".to_string()));
    }
    if req.price_cents < 0 {
        return Err(ApiError::Validation(
            "price_cents must not be negative".to_string(),
        ));
    }
    if req.stock < 0 {
        return Err(ApiError::Validation(
            "stock must not be negative".to_string(),
        ));
    }

    let product = Product::new(req.name, Money::from_cents(req.price_cents), req.stock);
    state.store.insert_product(&product).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        ok_envelope(serde_json::json!({ "product": ProductResponse::from(&product) })),
    ))
}

/// GET /products/:id — load one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product_id = ProductId::from_uuid(parse_id(&id)?);
    let product = state
        .store
        .get_product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;

    Ok(ok_envelope(
        serde_json::json!({ "product": ProductResponse::from(&product) }),
    ))
}

/// GET /products — paginated catalog listing.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params.into_page()?;
    let (products, metadata) = state.store.list_products(page).await?;
    let responses: Vec<ProductResponse> = products.iter().map(ProductResponse::from).collect();

    Ok(ok_envelope(serde_json::json!({
        "products": responses,
        "metadata": metadata,
    })))
}
