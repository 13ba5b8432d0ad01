pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::driver::Driver;
use crate::models::offer::Offer;
use crate::models::order::{Order, OrderStatus};
use crate::models::product::{Category, Product};
use crate::models::user::User;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: &'static str, id: String },

    #[error("revision mismatch for order {id}: expected {expected}, found {actual}")]
    RevisionMismatch {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum OrderEvent {
    Created(Order),
    Updated(Order),
    Deleted { id: String },
}

#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub name_prefix: Option<String>,
    pub category: Option<Category>,
    pub limit: Option<usize>,
}

/// Document-store seam. Collections are keyed by opaque string ids assigned
/// on insert; the orders collection additionally exposes a change feed.
/// `replace_order` is a conditional write: it succeeds only while the stored
/// revision still matches `expected_revision`, and bumps it by one.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError>;
    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError>;
    async fn orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError>;
    async fn replace_order(
        &self,
        expected_revision: u64,
        order: Order,
    ) -> Result<Order, StoreError>;
    async fn delete_order(&self, id: &str) -> Result<Option<Order>, StoreError>;
    async fn delivered_orders_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError>;
    async fn delivered_offer_orders(&self) -> Result<Vec<Order>, StoreError>;
    async fn count_delivered_orders(&self) -> Result<u64, StoreError>;
    async fn delivered_revenue(&self) -> Result<f64, StoreError>;
    fn subscribe_orders(&self) -> broadcast::Receiver<OrderEvent>;

    async fn insert_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError>;
    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn replace_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn delete_product(&self, id: &str) -> Result<bool, StoreError>;
    async fn count_products(&self) -> Result<u64, StoreError>;

    async fn insert_offer(&self, offer: Offer) -> Result<Offer, StoreError>;
    async fn offer(&self, id: &str) -> Result<Option<Offer>, StoreError>;
    async fn offers(&self) -> Result<Vec<Offer>, StoreError>;
    async fn replace_offer(&self, offer: Offer) -> Result<Offer, StoreError>;
    async fn delete_offer(&self, id: &str) -> Result<bool, StoreError>;

    async fn insert_driver(&self, driver: Driver) -> Result<Driver, StoreError>;
    async fn driver(&self, id: &str) -> Result<Option<Driver>, StoreError>;
    async fn drivers(&self) -> Result<Vec<Driver>, StoreError>;
    async fn replace_driver(&self, driver: Driver) -> Result<Driver, StoreError>;
    async fn delete_driver(&self, id: &str) -> Result<bool, StoreError>;

    async fn upsert_user(&self, user: User) -> Result<User, StoreError>;
    async fn user(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn users(&self) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self) -> Result<u64, StoreError>;
}
