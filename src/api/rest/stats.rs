use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::Deserialize;

use crate::engine::stats::{
    CategoryCount, DailySales, OfferPerformance, SectionCounts, parse_year_month,
};
use crate::error::AppError;
use crate::state::AppState;

// Dashboards may serve content up to one cache window old; mirrored by the
// in-process TTL cache behind these handlers.
const CACHE_CONTROL: (&str, &str) = (
    "cache-control",
    "public, s-maxage=60, stale-while-revalidate=120",
);

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(section))
        .route("/stats/sales", get(sales))
        .route("/stats/offers", get(offers))
        .route("/stats/categories", get(categories))
}

#[derive(Deserialize)]
struct SalesQuery {
    date: Option<String>,
}

async fn section(
    State(state): State<Arc<AppState>>,
) -> ([(&'static str, &'static str); 1], Json<SectionCounts>) {
    ([CACHE_CONTROL], Json(state.stats.section_counts().await))
}

async fn sales(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SalesQuery>,
) -> Result<([(&'static str, &'static str); 1], Json<Vec<DailySales>>), AppError> {
    let date = query
        .date
        .ok_or_else(|| AppError::BadRequest("date parameter is required".to_string()))?;
    let (year, month) = parse_year_month(&date)
        .ok_or_else(|| AppError::BadRequest("date must be formatted YYYY-MM".to_string()))?;

    Ok(([CACHE_CONTROL], Json(state.stats.daily_sales(year, month).await)))
}

async fn offers(
    State(state): State<Arc<AppState>>,
) -> ([(&'static str, &'static str); 1], Json<Vec<OfferPerformance>>) {
    ([CACHE_CONTROL], Json(state.stats.offer_performance().await))
}

async fn categories(
    State(state): State<Arc<AppState>>,
) -> ([(&'static str, &'static str); 1], Json<Vec<CategoryCount>>) {
    (
        [CACHE_CONTROL],
        Json(state.stats.category_distribution().await),
    )
}
