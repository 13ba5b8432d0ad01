use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::product::{Category, Product};
use crate::state::AppState;
use crate::store::ProductFilter;

const DEFAULT_PAGE_SIZE: usize = 100;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/featured", patch(toggle_featured))
}

#[derive(Deserialize)]
struct ListProductsQuery {
    name: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub category: Category,
    pub cost: f64,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub is_featured: bool,
}

fn validate(payload: &ProductRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.cost < 0.0 {
        return Err(AppError::BadRequest("cost cannot be negative".to_string()));
    }

    Ok(())
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    validate(&payload)?;

    let product = Product {
        id: String::new(),
        name: payload.name,
        category: payload.category,
        cost: payload.cost,
        details: payload.details,
        images: payload.images,
        quantity: payload.quantity,
        is_featured: payload.is_featured,
        created_at: Utc::now(),
    };

    let stored = state.store.insert_product(product).await?;
    Ok(Json(stored))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let filter = ProductFilter {
        name_prefix: query.name,
        category: query.category.as_deref().map(Category::from_code),
        limit: Some(query.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
    };

    let products = state.store.products(&filter).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .store
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("products/{id}")))?;

    Ok(Json(product))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    validate(&payload)?;

    let existing = state
        .store
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("products/{id}")))?;

    let product = Product {
        id: existing.id,
        name: payload.name,
        category: payload.category,
        cost: payload.cost,
        details: payload.details,
        images: payload.images,
        quantity: payload.quantity,
        is_featured: payload.is_featured,
        created_at: existing.created_at,
    };

    let stored = state.store.replace_product(product).await?;
    Ok(Json(stored))
}

async fn toggle_featured(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let mut product = state
        .store
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("products/{id}")))?;

    product.is_featured = !product.is_featured;
    let stored = state.store.replace_product(product).await?;
    Ok(Json(stored))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_product(&id).await? {
        return Err(AppError::NotFound(format!("products/{id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
