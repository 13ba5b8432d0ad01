use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::order::ShippingInfo;
use crate::models::user::User;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:email", get(get_user).put(upsert_user))
}

#[derive(Deserialize)]
pub struct UpsertUserRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub shipping_info: Option<ShippingInfo>,
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.store.users().await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .user(&email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("users/{email}")))?;

    Ok(Json(user))
}

// Merge semantics: fields omitted from the payload keep their stored value.
async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(payload): Json<UpsertUserRequest>,
) -> Result<Json<User>, AppError> {
    if email.trim().is_empty() {
        return Err(AppError::BadRequest("email cannot be empty".to_string()));
    }

    let existing = state.store.user(&email).await?;

    let user = match existing {
        Some(existing) => User {
            email: existing.email,
            name: payload.name.unwrap_or(existing.name),
            image: payload.image.or(existing.image),
            shipping_info: payload.shipping_info.or(existing.shipping_info),
            updated_at: Utc::now(),
        },
        None => User {
            email,
            name: payload.name.unwrap_or_default(),
            image: payload.image,
            shipping_info: payload.shipping_info,
            updated_at: Utc::now(),
        },
    };

    let stored = state.store.upsert_user(user).await?;
    Ok(Json(stored))
}
