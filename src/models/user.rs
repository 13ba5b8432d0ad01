use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::order::ShippingInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub shipping_info: Option<ShippingInfo>,
    pub updated_at: DateTime<Utc>,
}
