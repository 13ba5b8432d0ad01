use crate::error::AppError;
use crate::models::offer::OfferItem;
use crate::models::product::Product;

/// Pure bundle arithmetic over (product, quantity) constituents. The bundle
/// price auto-tracks the constituent total until the admin overrides it;
/// after that only an explicit `recalculate` re-syncs.
#[derive(Debug, Clone, Default)]
pub struct OfferComposer {
    items: Vec<OfferItem>,
    price: f64,
    price_overridden: bool,
}

impl OfferComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(items: Vec<OfferItem>, price: f64) -> Result<Self, AppError> {
        for item in &items {
            if item.quantity < 1 {
                return Err(AppError::InvalidQuantity(item.quantity));
            }
        }

        let mut composer = Self {
            items,
            price,
            price_overridden: false,
        };
        composer.price_overridden = (composer.original_price() - price).abs() > f64::EPSILON;
        Ok(composer)
    }

    pub fn add(&mut self, product: &Product) {
        if self.items.iter().any(|item| item.product_id == product.id) {
            return;
        }

        self.items.push(OfferItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            cost: product.cost,
            category: product.category,
            quantity: 1,
        });
        self.sync_price();
    }

    pub fn remove(&mut self, product_id: &str) {
        self.items.retain(|item| item.product_id != product_id);
        self.sync_price();
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), AppError> {
        if quantity < 1 {
            return Err(AppError::InvalidQuantity(quantity));
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| AppError::NotFound(format!("offer constituent {product_id}")))?;

        item.quantity = quantity;
        self.sync_price();
        Ok(())
    }

    pub fn set_price(&mut self, price: f64) {
        self.price = price;
        self.price_overridden = true;
    }

    pub fn recalculate(&mut self) {
        self.price = self.original_price();
        self.price_overridden = false;
    }

    fn sync_price(&mut self) {
        if !self.price_overridden {
            self.price = self.original_price();
        }
    }

    pub fn original_price(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.cost * f64::from(item.quantity))
            .sum()
    }

    /// May be negative when the bundle is priced above its contents; callers
    /// display the sign verbatim.
    pub fn savings(&self) -> f64 {
        self.original_price() - self.price
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn items(&self) -> &[OfferItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_parts(self) -> (Vec<OfferItem>, f64) {
        (self.items, self.price)
    }
}
