use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route(
            "/drivers/:id",
            get(get_driver).put(update_driver).delete(delete_driver),
        )
}

#[derive(Deserialize)]
pub struct DriverRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vehicle: String,
    pub status: Option<DriverStatus>,
}

#[derive(Serialize)]
pub struct DriverResponse {
    #[serde(flatten)]
    pub driver: Driver,
    pub current_orders: Vec<String>,
}

fn validate(payload: &DriverRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone cannot be empty".to_string()));
    }

    Ok(())
}

async fn with_load(state: &AppState, driver: Driver) -> Result<DriverResponse, AppError> {
    let current_orders = state.lifecycle.current_orders(&driver.id).await?;
    Ok(DriverResponse {
        driver,
        current_orders,
    })
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DriverRequest>,
) -> Result<Json<DriverResponse>, AppError> {
    validate(&payload)?;

    let driver = Driver {
        id: String::new(),
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        vehicle: payload.vehicle,
        status: payload.status.unwrap_or(DriverStatus::Active),
        created_at: Utc::now(),
    };

    let stored = state.store.insert_driver(driver).await?;
    Ok(Json(with_load(&state, stored).await?))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DriverResponse>>, AppError> {
    let drivers = state.store.drivers().await?;

    let mut responses = Vec::with_capacity(drivers.len());
    for driver in drivers {
        responses.push(with_load(&state, driver).await?);
    }

    Ok(Json(responses))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DriverResponse>, AppError> {
    let driver = state
        .store
        .driver(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("drivers/{id}")))?;

    Ok(Json(with_load(&state, driver).await?))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<DriverRequest>,
) -> Result<Json<DriverResponse>, AppError> {
    validate(&payload)?;

    let existing = state
        .store
        .driver(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("drivers/{id}")))?;

    let driver = Driver {
        id: existing.id,
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        vehicle: payload.vehicle,
        status: payload.status.unwrap_or(existing.status),
        created_at: existing.created_at,
    };

    let stored = state.store.replace_driver(driver).await?;
    Ok(Json(with_load(&state, stored).await?))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_driver(&id).await? {
        return Err(AppError::NotFound(format!("drivers/{id}")));
    }

    state.lifecycle.release_driver(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
