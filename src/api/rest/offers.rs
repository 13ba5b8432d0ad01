use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::offers::OfferComposer;
use crate::error::AppError;
use crate::models::offer::Offer;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/offers", post(create_offer).get(list_offers))
        .route(
            "/offers/:id",
            get(get_offer).put(update_offer).delete(delete_offer),
        )
}

#[derive(Deserialize)]
pub struct OfferRequest {
    pub title: String,
    pub description: String,
    pub badge: Option<String>,
    pub image: String,
    pub price: Option<f64>,
    pub products: Vec<OfferConstituent>,
}

#[derive(Deserialize)]
pub struct OfferConstituent {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Serialize)]
pub struct OfferResponse {
    #[serde(flatten)]
    pub offer: Offer,
    pub original_price: f64,
    pub savings: f64,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        let original_price = offer.original_price();
        let savings = offer.savings();
        Self {
            offer,
            original_price,
            savings,
        }
    }
}

async fn compose(
    state: &AppState,
    payload: OfferRequest,
    id: String,
    created_at: DateTime<Utc>,
) -> Result<Offer, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("title cannot be empty".to_string()));
    }

    if payload.image.trim().is_empty() {
        return Err(AppError::BadRequest("offer image is required".to_string()));
    }

    if payload.products.is_empty() {
        return Err(AppError::BadRequest(
            "offer needs at least one product".to_string(),
        ));
    }

    let mut composer = OfferComposer::new();
    for constituent in &payload.products {
        let product = state
            .store
            .product(&constituent.product_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("products/{}", constituent.product_id))
            })?;

        composer.add(&product);
        composer.set_quantity(&product.id, constituent.quantity)?;
    }

    if let Some(price) = payload.price {
        composer.set_price(price);
    }

    let (products, price) = composer.into_parts();

    Ok(Offer {
        id,
        title: payload.title,
        description: payload.description,
        badge: payload.badge,
        image: payload.image,
        price,
        products,
        created_at,
    })
}

async fn create_offer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OfferRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = compose(&state, payload, String::new(), Utc::now()).await?;
    let stored = state.store.insert_offer(offer).await?;
    Ok(Json(stored.into()))
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let offers = state.store.offers().await?;
    Ok(Json(offers.into_iter().map(OfferResponse::from).collect()))
}

async fn get_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = state
        .store
        .offer(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("offers/{id}")))?;

    Ok(Json(offer.into()))
}

async fn update_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<OfferRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let existing = state
        .store
        .offer(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("offers/{id}")))?;

    let offer = compose(&state, payload, existing.id, existing.created_at).await?;
    let stored = state.store.replace_offer(offer).await?;
    Ok(Json(stored.into()))
}

async fn delete_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_offer(&id).await? {
        return Err(AppError::NotFound(format!("offers/{id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
