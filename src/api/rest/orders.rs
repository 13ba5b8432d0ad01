use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use serde::Deserialize;

use crate::engine::lifecycle::NewOrder;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order).delete(delete_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/driver", patch(assign_driver))
}

#[derive(Deserialize)]
struct ListOrdersQuery {
    status: Option<OrderStatus>,
}

#[derive(Deserialize)]
struct UpdateStatusRequest {
    status: OrderStatus,
}

#[derive(Deserialize)]
struct AssignDriverRequest {
    driver_id: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    let order = state.lifecycle.create_order(payload).await?;
    Ok(Json(order))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.store.orders(query.status).await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .store
        .order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("orders/{id}")))?;

    Ok(Json(order))
}

async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.lifecycle.delete_order(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.lifecycle.set_status(&id, payload.status).await?;
    Ok(Json(order))
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AssignDriverRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.lifecycle.assign_driver(&id, payload.driver_id).await?;
    Ok(Json(order))
}
