use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::product::Category;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub cost: f64,
    pub quantity: u32,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub revision: u64,
    pub status: OrderStatus,
    pub products_list: Vec<LineItem>,
    pub total_amount: f64,
    pub customer_name: String,
    pub shipping_info: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub transaction_reference: Option<String>,
    pub is_offer: bool,
    pub offer_id: Option<String>,
    pub offer_title: Option<String>,
    pub offer_image: Option<String>,
    pub driver_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}
