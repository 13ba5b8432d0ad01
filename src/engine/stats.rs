use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tokio::time::sleep;
use tracing::warn;

use crate::models::product::Category;
use crate::observability::metrics::Metrics;
use crate::store::{ProductFilter, Store, StoreError};

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SectionCounts {
    pub orders: u64,
    pub products: u64,
    pub customers: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySales {
    pub month: String,
    pub day: u32,
    pub sales: f64,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OfferPerformance {
    pub offer_id: String,
    pub offer_title: String,
    pub count: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: Category,
    pub quantity: u64,
}

struct TtlSlot<T> {
    inner: Mutex<Option<(Instant, T)>>,
}

impl<T: Clone> TtlSlot<T> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn get(&self, ttl: Duration) -> Option<T> {
        let guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .as_ref()
            .filter(|(at, _)| at.elapsed() < ttl)
            .map(|(_, value)| value.clone())
    }

    fn put(&self, value: T) {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some((Instant::now(), value));
    }
}

pub fn parse_year_month(date: &str) -> Option<(i32, u32)> {
    let (year, month) = date.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    month_bounds(year, month).map(|_| (year, month))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
}

fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>, u32)> {
    let days = days_in_month(year, month)?;
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year, month, days, 23, 59, 59).single()?;
    Some((start, end, days))
}

/// Read-time statistics over the order and product collections. Nothing is
/// materialized: every miss re-scans through the store's filter/count/sum
/// surface. Results are cached per endpoint with a short TTL and no write
/// invalidation; reads retry a fixed number of times with a fixed backoff
/// and then degrade to zeros/empties so the dashboard always renders.
pub struct StatsEngine {
    store: Arc<dyn Store>,
    metrics: Metrics,
    cache_ttl: Duration,
    retry_attempts: u32,
    retry_backoff: Duration,
    section_cache: TtlSlot<SectionCounts>,
    sales_cache: Mutex<HashMap<String, (Instant, Vec<DailySales>)>>,
    offers_cache: TtlSlot<Vec<OfferPerformance>>,
    categories_cache: TtlSlot<Vec<CategoryCount>>,
}

impl StatsEngine {
    pub fn new(
        store: Arc<dyn Store>,
        metrics: Metrics,
        cache_ttl: Duration,
        retry_attempts: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            store,
            metrics,
            cache_ttl,
            retry_attempts,
            retry_backoff,
            section_cache: TtlSlot::new(),
            sales_cache: Mutex::new(HashMap::new()),
            offers_cache: TtlSlot::new(),
            categories_cache: TtlSlot::new(),
        }
    }

    pub async fn section_counts(&self) -> SectionCounts {
        if let Some(cached) = self.cached("section", &self.section_cache) {
            return cached;
        }

        let timer = Instant::now();
        let orders = self.order_count_or_zero().await;
        let products = self.product_count_or_zero().await;
        let customers = self.user_count_or_zero().await;
        let revenue = self.revenue_or_zero().await;

        let counts = SectionCounts {
            orders,
            products,
            customers,
            revenue,
        };

        self.observe("section", timer);
        self.section_cache.put(counts);
        counts
    }

    pub async fn daily_sales(&self, year: i32, month: u32) -> Vec<DailySales> {
        let key = format!("{year:04}-{month:02}");

        {
            let guard = self
                .sales_cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some((at, cached)) = guard.get(&key) {
                if at.elapsed() < self.cache_ttl {
                    self.cache_lookup("sales", true);
                    return cached.clone();
                }
            }
        }
        self.cache_lookup("sales", false);

        let Some((start, end, days)) = month_bounds(year, month) else {
            return Vec::new();
        };

        let timer = Instant::now();
        let store = Arc::clone(&self.store);
        let fetched = self
            .with_retry("delivered orders for month", move || {
                let store = Arc::clone(&store);
                async move { store.delivered_orders_between(start, end).await }
            })
            .await;

        let mut by_day: HashMap<u32, (f64, u64)> = HashMap::new();
        match fetched {
            Ok(orders) => {
                for order in orders {
                    let Some(delivered_at) = order.delivered_at else {
                        continue;
                    };
                    let bucket = by_day.entry(delivered_at.day()).or_insert((0.0, 0));
                    bucket.0 += order.total_amount;
                    bucket.1 += 1;
                }
            }
            Err(err) => {
                warn!(error = %err, month = %key, "daily sales degraded to zeros");
            }
        }

        let series: Vec<DailySales> = (1..=days)
            .map(|day| {
                let (sales, orders) = by_day.get(&day).copied().unwrap_or((0.0, 0));
                DailySales {
                    month: key.clone(),
                    day,
                    sales,
                    orders,
                }
            })
            .collect();

        self.observe("sales", timer);

        let mut guard = self
            .sales_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(key, (Instant::now(), series.clone()));

        series
    }

    pub async fn offer_performance(&self) -> Vec<OfferPerformance> {
        if let Some(cached) = self.cached("offers", &self.offers_cache) {
            return cached;
        }

        let timer = Instant::now();
        let store = Arc::clone(&self.store);
        let fetched = self
            .with_retry("delivered offer orders", move || {
                let store = Arc::clone(&store);
                async move { store.delivered_offer_orders().await }
            })
            .await;

        let mut grouped: HashMap<String, OfferPerformance> = HashMap::new();
        match fetched {
            Ok(orders) => {
                for order in orders {
                    let offer_id = order.offer_id.as_deref().unwrap_or("unknown").to_string();
                    let offer_title = order
                        .offer_title
                        .as_deref()
                        .unwrap_or("unknown offer")
                        .to_string();

                    let entry = grouped.entry(offer_id.clone()).or_insert(OfferPerformance {
                        offer_id,
                        offer_title,
                        count: 0,
                        revenue: 0.0,
                    });
                    entry.count += 1;
                    entry.revenue += order.total_amount;
                }
            }
            Err(err) => {
                warn!(error = %err, "offer performance degraded to empty");
            }
        }

        let mut performance: Vec<OfferPerformance> = grouped.into_values().collect();
        performance.sort_by(|a, b| b.count.cmp(&a.count));

        self.observe("offers", timer);
        self.offers_cache.put(performance.clone());
        performance
    }

    pub async fn category_distribution(&self) -> Vec<CategoryCount> {
        if let Some(cached) = self.cached("categories", &self.categories_cache) {
            return cached;
        }

        let timer = Instant::now();
        let store = Arc::clone(&self.store);
        let fetched = self
            .with_retry("product catalog", move || {
                let store = Arc::clone(&store);
                async move { store.products(&ProductFilter::default()).await }
            })
            .await;

        let mut totals: HashMap<Category, u64> = HashMap::new();
        match fetched {
            Ok(products) => {
                for product in products {
                    *totals.entry(product.category).or_insert(0) += u64::from(product.quantity);
                }
            }
            Err(err) => {
                warn!(error = %err, "category distribution degraded to empty");
            }
        }

        let mut distribution: Vec<CategoryCount> = totals
            .into_iter()
            .map(|(category, quantity)| CategoryCount { category, quantity })
            .collect();
        distribution.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.category.code().cmp(b.category.code()))
        });

        self.observe("categories", timer);
        self.categories_cache.put(distribution.clone());
        distribution
    }

    async fn order_count_or_zero(&self) -> u64 {
        let store = Arc::clone(&self.store);
        self.with_retry("delivered order count", move || {
            let store = Arc::clone(&store);
            async move { store.count_delivered_orders().await }
        })
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "delivered order count degraded to zero");
            0
        })
    }

    async fn product_count_or_zero(&self) -> u64 {
        let store = Arc::clone(&self.store);
        self.with_retry("product count", move || {
            let store = Arc::clone(&store);
            async move { store.count_products().await }
        })
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "product count degraded to zero");
            0
        })
    }

    async fn user_count_or_zero(&self) -> u64 {
        let store = Arc::clone(&self.store);
        self.with_retry("customer count", move || {
            let store = Arc::clone(&store);
            async move { store.count_users().await }
        })
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "customer count degraded to zero");
            0
        })
    }

    async fn revenue_or_zero(&self) -> f64 {
        let store = Arc::clone(&self.store);
        self.with_retry("delivered revenue", move || {
            let store = Arc::clone(&store);
            async move { store.delivered_revenue().await }
        })
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "revenue degraded to zero");
            0.0
        })
    }

    async fn with_retry<T, F, Fut>(&self, what: &'static str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempts = self.retry_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= attempts {
                        return Err(err);
                    }
                    warn!(error = %err, what, attempt, "aggregation read failed; retrying");
                    sleep(self.retry_backoff).await;
                }
            }
        }
    }

    fn cached<T: Clone>(&self, endpoint: &str, slot: &TtlSlot<T>) -> Option<T> {
        let cached = slot.get(self.cache_ttl);
        self.cache_lookup(endpoint, cached.is_some());
        cached
    }

    fn cache_lookup(&self, endpoint: &str, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.metrics
            .stats_cache_lookups_total
            .with_label_values(&[endpoint, result])
            .inc();
    }

    fn observe(&self, endpoint: &str, timer: Instant) {
        self.metrics
            .stats_queries_seconds
            .with_label_values(&[endpoint])
            .observe(timer.elapsed().as_secs_f64());
    }
}
