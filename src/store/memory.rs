use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::models::offer::Offer;
use crate::models::order::{Order, OrderStatus};
use crate::models::product::Product;
use crate::models::user::User;
use crate::store::{OrderEvent, ProductFilter, Store, StoreError};

pub struct MemoryStore {
    orders: DashMap<String, Order>,
    products: DashMap<String, Product>,
    offers: DashMap<String, Offer>,
    drivers: DashMap<String, Driver>,
    users: DashMap<String, User>,
    order_events_tx: broadcast::Sender<OrderEvent>,
}

impl MemoryStore {
    pub fn new(event_buffer_size: usize) -> Self {
        let (order_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: DashMap::new(),
            products: DashMap::new(),
            offers: DashMap::new(),
            drivers: DashMap::new(),
            users: DashMap::new(),
            order_events_tx,
        }
    }

    fn next_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_order(&self, mut order: Order) -> Result<Order, StoreError> {
        order.id = Self::next_id();
        self.orders.insert(order.id.clone(), order.clone());
        let _ = self.order_events_tx.send(OrderEvent::Created(order.clone()));
        Ok(order)
    }

    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(id).map(|entry| entry.value().clone()))
    }

    async fn orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| status.is_none_or(|wanted| entry.value().status == wanted))
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn replace_order(
        &self,
        expected_revision: u64,
        mut order: Order,
    ) -> Result<Order, StoreError> {
        let mut entry = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "orders",
                id: order.id.clone(),
            })?;

        if entry.revision != expected_revision {
            return Err(StoreError::RevisionMismatch {
                id: order.id.clone(),
                expected: expected_revision,
                actual: entry.revision,
            });
        }

        order.revision = expected_revision + 1;
        *entry.value_mut() = order.clone();
        drop(entry);

        let _ = self.order_events_tx.send(OrderEvent::Updated(order.clone()));
        Ok(order)
    }

    async fn delete_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let removed = self.orders.remove(id).map(|(_, order)| order);
        if removed.is_some() {
            let _ = self
                .order_events_tx
                .send(OrderEvent::Deleted { id: id.to_string() });
        }
        Ok(removed)
    }

    async fn delivered_orders_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                order.status == OrderStatus::Delivered
                    && order
                        .delivered_at
                        .is_some_and(|at| at >= from && at <= to)
            })
            .map(|entry| entry.value().clone())
            .collect();

        Ok(orders)
    }

    async fn delivered_offer_orders(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .orders
            .iter()
            .filter(|entry| {
                entry.value().is_offer && entry.value().status == OrderStatus::Delivered
            })
            .map(|entry| entry.value().clone())
            .collect();

        Ok(orders)
    }

    async fn count_delivered_orders(&self) -> Result<u64, StoreError> {
        let count = self
            .orders
            .iter()
            .filter(|entry| entry.value().status == OrderStatus::Delivered)
            .count();

        Ok(count as u64)
    }

    async fn delivered_revenue(&self) -> Result<f64, StoreError> {
        let revenue = self
            .orders
            .iter()
            .filter(|entry| entry.value().status == OrderStatus::Delivered)
            .map(|entry| entry.value().total_amount)
            .sum();

        Ok(revenue)
    }

    fn subscribe_orders(&self) -> broadcast::Receiver<OrderEvent> {
        self.order_events_tx.subscribe()
    }

    async fn insert_product(&self, mut product: Product) -> Result<Product, StoreError> {
        product.id = Self::next_id();
        self.products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).map(|entry| entry.value().clone()))
    }

    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|entry| {
                let product = entry.value();
                filter
                    .name_prefix
                    .as_ref()
                    .is_none_or(|prefix| product.name.starts_with(prefix.as_str()))
                    && filter
                        .category
                        .is_none_or(|category| product.category == category)
            })
            .map(|entry| entry.value().clone())
            .collect();

        products.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(limit) = filter.limit {
            products.truncate(limit);
        }
        Ok(products)
    }

    async fn replace_product(&self, product: Product) -> Result<Product, StoreError> {
        let mut entry = self
            .products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "products",
                id: product.id.clone(),
            })?;

        *entry.value_mut() = product.clone();
        Ok(product)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.products.remove(id).is_some())
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        Ok(self.products.len() as u64)
    }

    async fn insert_offer(&self, mut offer: Offer) -> Result<Offer, StoreError> {
        offer.id = Self::next_id();
        self.offers.insert(offer.id.clone(), offer.clone());
        Ok(offer)
    }

    async fn offer(&self, id: &str) -> Result<Option<Offer>, StoreError> {
        Ok(self.offers.get(id).map(|entry| entry.value().clone()))
    }

    async fn offers(&self) -> Result<Vec<Offer>, StoreError> {
        let mut offers: Vec<Offer> = self
            .offers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }

    async fn replace_offer(&self, offer: Offer) -> Result<Offer, StoreError> {
        let mut entry = self
            .offers
            .get_mut(&offer.id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "offers",
                id: offer.id.clone(),
            })?;

        *entry.value_mut() = offer.clone();
        Ok(offer)
    }

    async fn delete_offer(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.offers.remove(id).is_some())
    }

    async fn insert_driver(&self, mut driver: Driver) -> Result<Driver, StoreError> {
        driver.id = Self::next_id();
        self.drivers.insert(driver.id.clone(), driver.clone());
        Ok(driver)
    }

    async fn driver(&self, id: &str) -> Result<Option<Driver>, StoreError> {
        Ok(self.drivers.get(id).map(|entry| entry.value().clone()))
    }

    async fn drivers(&self) -> Result<Vec<Driver>, StoreError> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }

    async fn replace_driver(&self, driver: Driver) -> Result<Driver, StoreError> {
        let mut entry = self
            .drivers
            .get_mut(&driver.id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "drivers",
                id: driver.id.clone(),
            })?;

        *entry.value_mut() = driver.clone();
        Ok(driver)
    }

    async fn delete_driver(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.drivers.remove(id).is_some())
    }

    async fn upsert_user(&self, user: User) -> Result<User, StoreError> {
        self.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn user(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(email).map(|entry| entry.value().clone()))
    }

    async fn users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.users.len() as u64)
    }
}
