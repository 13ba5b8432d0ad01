use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::driver::DriverStatus;
use crate::models::order::{LineItem, Order, OrderStatus, PaymentMethod, ShippingInfo};
use crate::observability::metrics::Metrics;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub shipping_info: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub products_list: Vec<LineItem>,
    pub offer_id: Option<String>,
}

/// Governs order state: creation, the status graph, driver binding and
/// deletion. Every mutation is a revision-checked replace, so a concurrent
/// writer surfaces as `Conflict` instead of a silent overwrite.
pub struct LifecycleEngine {
    store: Arc<dyn Store>,
    metrics: Metrics,
}

fn transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Processing, OrderStatus::Shipped)
            | (OrderStatus::Shipped, OrderStatus::Delivered)
            | (OrderStatus::Processing, OrderStatus::Cancelled)
            | (OrderStatus::Shipped, OrderStatus::Cancelled)
    )
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn Store>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    pub async fn create_order(&self, request: NewOrder) -> Result<Order, AppError> {
        if request.customer_name.trim().is_empty() {
            return Err(AppError::BadRequest("customer name cannot be empty".to_string()));
        }

        let (products_list, total_amount, offer_snapshot) = match &request.offer_id {
            Some(offer_id) => {
                let offer = self
                    .store
                    .offer(offer_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("offers/{offer_id}")))?;

                let items: Vec<LineItem> = offer
                    .products
                    .iter()
                    .map(|item| LineItem {
                        name: item.name.clone(),
                        cost: item.cost,
                        quantity: item.quantity,
                        category: item.category,
                    })
                    .collect();

                let snapshot = Some((offer.id, offer.title, offer.image));
                (items, offer.price, snapshot)
            }
            None => {
                if request.products_list.is_empty() {
                    return Err(AppError::BadRequest(
                        "order needs at least one line item".to_string(),
                    ));
                }
                for item in &request.products_list {
                    if item.quantity < 1 {
                        return Err(AppError::InvalidQuantity(item.quantity));
                    }
                }

                let total = request
                    .products_list
                    .iter()
                    .map(|item| item.cost * f64::from(item.quantity))
                    .sum();
                (request.products_list, total, None)
            }
        };

        let (offer_id, offer_title, offer_image) = match offer_snapshot {
            Some((id, title, image)) => (Some(id), Some(title), Some(image)),
            None => (None, None, None),
        };

        let order = Order {
            id: String::new(),
            revision: 0,
            status: OrderStatus::Processing,
            products_list,
            total_amount,
            customer_name: request.customer_name,
            shipping_info: request.shipping_info,
            payment_method: request.payment_method,
            transaction_reference: request.transaction_reference,
            is_offer: offer_id.is_some(),
            offer_id,
            offer_title,
            offer_image,
            driver_id: None,
            created_at: Utc::now(),
            delivered_at: None,
        };

        let stored = self.store.insert_order(order).await?;
        info!(order_id = %stored.id, total = stored.total_amount, "order created");
        Ok(stored)
    }

    /// Same-status writes are silent no-ops; anything off the graph is
    /// rejected. Entering Delivered stamps `delivered_at`; no other
    /// transition touches it.
    pub async fn set_status(&self, id: &str, new_status: OrderStatus) -> Result<Order, AppError> {
        let order = self
            .store
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("orders/{id}")))?;

        if order.status == new_status {
            return Ok(order);
        }

        if !transition_allowed(order.status, new_status) {
            return Err(AppError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        let from = order.status;
        let revision = order.revision;
        let mut updated = order;
        updated.status = new_status;
        if new_status == OrderStatus::Delivered {
            updated.delivered_at = Some(Utc::now());
        }

        let stored = self.store.replace_order(revision, updated).await?;

        let label = format!("{new_status:?}");
        self.metrics
            .status_transitions_total
            .with_label_values(&[label.as_str()])
            .inc();
        info!(order_id = %stored.id, from = ?from, to = ?new_status, "order status updated");

        Ok(stored)
    }

    pub async fn assign_driver(
        &self,
        id: &str,
        driver_id: Option<String>,
    ) -> Result<Order, AppError> {
        let result = self.try_assign_driver(id, driver_id).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::Conflict(_)) => "conflict",
            Err(_) => "rejected",
        };
        self.metrics
            .driver_assignments_total
            .with_label_values(&[outcome])
            .inc();

        result
    }

    async fn try_assign_driver(
        &self,
        id: &str,
        driver_id: Option<String>,
    ) -> Result<Order, AppError> {
        let order = self
            .store
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("orders/{id}")))?;

        if order.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "order {id} is {:?} and can no longer be assigned",
                order.status
            )));
        }

        if let Some(driver_id) = &driver_id {
            let driver = self
                .store
                .driver(driver_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("drivers/{driver_id}")))?;

            if driver.status != DriverStatus::Active {
                return Err(AppError::InactiveDriver(driver.id));
            }
        }

        let revision = order.revision;
        let mut updated = order;
        updated.driver_id = driver_id;

        let stored = self.store.replace_order(revision, updated).await?;
        info!(order_id = %stored.id, driver_id = ?stored.driver_id, "driver assignment updated");

        Ok(stored)
    }

    pub async fn delete_order(&self, id: &str) -> Result<(), AppError> {
        let removed = self.store.delete_order(id).await?;
        match removed {
            Some(order) => {
                info!(order_id = %order.id, status = ?order.status, "order deleted");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("orders/{id}"))),
        }
    }

    /// Derived view of a driver's open load: orders still referencing the
    /// driver in a non-terminal status.
    pub async fn current_orders(&self, driver_id: &str) -> Result<Vec<String>, AppError> {
        let orders = self.store.orders(None).await?;
        Ok(orders
            .into_iter()
            .filter(|order| {
                !order.status.is_terminal()
                    && order.driver_id.as_deref() == Some(driver_id)
            })
            .map(|order| order.id)
            .collect())
    }

    /// Clears `driver_id` on every order still referencing a deleted driver.
    /// Best effort per order: a concurrent edit wins and is logged, not retried.
    pub async fn release_driver(&self, driver_id: &str) -> Result<(), AppError> {
        let orders = self.store.orders(None).await?;

        for order in orders {
            if order.driver_id.as_deref() != Some(driver_id) {
                continue;
            }

            let revision = order.revision;
            let mut updated = order;
            updated.driver_id = None;

            if let Err(err) = self.store.replace_order(revision, updated).await {
                warn!(error = %err, driver_id, "failed to release order from deleted driver");
            }
        }

        Ok(())
    }
}
