use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::product::Category;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferItem {
    pub product_id: String,
    pub name: String,
    pub cost: f64,
    pub category: Category,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub title: String,
    pub description: String,
    pub badge: Option<String>,
    pub image: String,
    pub price: f64,
    pub products: Vec<OfferItem>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn original_price(&self) -> f64 {
        self.products
            .iter()
            .map(|item| item.cost * f64::from(item.quantity))
            .sum()
    }

    pub fn savings(&self) -> f64 {
        self.original_price() - self.price
    }
}
