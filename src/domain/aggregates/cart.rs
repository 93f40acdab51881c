//! Cart Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::value_objects::{Money, CURRENCY};

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    items: Vec<CartItem>,
    total: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// One line of the cart. Two lines of the same product with different
/// colour or feature selections stay separate; identical selections merge.
#[derive(Clone, Debug, PartialEq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub image_url: Option<String>,
    pub selected_color: Option<String>,
    pub selected_features: Option<Vec<String>>,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }

    fn same_selection(&self, other: &CartItem) -> bool {
        self.product_id == other.product_id
            && self.selected_color == other.selected_color
            && self.selected_features == other.selected_features
    }
}

impl Cart {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            items: vec![],
            total: Money::zero(CURRENCY),
            currency: CURRENCY.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total(&self) -> &Money { &self.total }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.same_selection(&item)) {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
        self.recalculate();
    }

    /// Setting a quantity of zero removes the line.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return self.remove_item(product_id); }
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        item.quantity = quantity;
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.recalculate(); }

    fn recalculate(&mut self) {
        self.total = self.items.iter().fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = Utc::now();
    }
}

impl Default for Cart {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Item not found") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(product_id: Uuid, price: i64, qty: u32) -> CartItem {
        CartItem {
            product_id,
            name: "Keychron K2".into(),
            unit_price: Money::npr(Decimal::new(price, 0)),
            quantity: qty,
            image_url: Some("https://cdn.example.com/k2.jpg".into()),
            selected_color: None,
            selected_features: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let mut cart = Cart::new();
        cart.add_item(item(Uuid::new_v4(), 5999, 2));
        cart.add_item(item(Uuid::new_v4(), 1250, 3));
        assert_eq!(cart.total().amount(), Decimal::new(5999 * 2 + 1250 * 3, 0));
    }

    #[test]
    fn test_same_selection_merges() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(id, 5999, 2));
        cart.add_item(item(id, 5999, 1));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_different_color_stays_separate() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(id, 5999, 1));
        let mut red = item(id, 5999, 1);
        red.selected_color = Some("red".into());
        cart.add_item(red);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_and_zero_removes() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_item(item(id, 100, 1));
        cart.update_quantity(id, 5).unwrap();
        assert_eq!(cart.total().amount(), Decimal::new(500, 0));
        cart.update_quantity(id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_remove_missing_item_fails() {
        let mut cart = Cart::new();
        assert_eq!(cart.remove_item(Uuid::new_v4()), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_clear_resets_total() {
        let mut cart = Cart::new();
        cart.add_item(item(Uuid::new_v4(), 100, 2));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total().amount(), Decimal::ZERO);
    }
}
