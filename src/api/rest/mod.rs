pub mod drivers;
pub mod offers;
pub mod orders;
pub mod products;
pub mod stats;
pub mod users;
pub mod ws;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::store::ProductFilter;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(orders::router())
        .merge(products::router())
        .merge(offers::router())
        .merge(drivers::router())
        .merge(users::router())
        .merge(stats::router());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    products: usize,
    offers: usize,
    drivers: usize,
    users: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        orders: state
            .store
            .orders(None)
            .await
            .map(|orders| orders.len())
            .unwrap_or(0),
        products: state
            .store
            .products(&ProductFilter::default())
            .await
            .map(|products| products.len())
            .unwrap_or(0),
        offers: state
            .store
            .offers()
            .await
            .map(|offers| offers.len())
            .unwrap_or(0),
        drivers: state
            .store
            .drivers()
            .await
            .map(|drivers| drivers.len())
            .unwrap_or(0),
        users: state
            .store
            .users()
            .await
            .map(|users| users.len())
            .unwrap_or(0),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
