use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// One product-and-quantity entry. Title, price and image are copied from
/// the catalog when the line is created and not re-synced afterwards
/// (price-at-add-time semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: i32,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub image: String,
}

impl CartLine {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// Ordered cart; insertion order is display order. Invariants held by every
/// mutation: at most one line per product id, and no line with quantity <= 0.
///
/// This is also the wire/blob format of a persisted `saved_carts.items`
/// column, so it derives serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from untrusted lines (a stored blob or a client
    /// payload), re-establishing the invariants: duplicate product ids are
    /// merged into the first occurrence (saturating, so adversarial
    /// quantities cannot overflow) and non-positive quantities are dropped.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines {
            if line.quantity <= 0 || line.unit_price_cents < 0 {
                continue;
            }
            match cart
                .lines
                .iter_mut()
                .find(|l| l.product_id == line.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart.lines.retain(|l| l.quantity > 0);
        cart
    }

    /// Add one unit of a catalog product. An existing line for the same
    /// product is bumped; otherwise a new line is appended.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id)
        {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }
        self.lines.push(CartLine {
            product_id: product.id,
            title: product.title.clone(),
            unit_price_cents: product.price_cents,
            quantity: 1,
            image: product.image.clone(),
        });
    }

    /// Delete the line for `product_id`; absent ids are a no-op.
    pub fn remove(&mut self, product_id: i32) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Apply a signed quantity delta, saturating at the i32 bounds. A
    /// resulting quantity <= 0 deletes the line entirely; unknown ids are a
    /// no-op.
    pub fn update_quantity(&mut self, product_id: i32, delta: i32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(delta);
        }
        self.lines.retain(|l| l.quantity > 0);
    }

    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total_cents).sum()
    }

    /// Sum of quantities across lines (the badge number), not the line count.
    pub fn count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i32, price_cents: i64) -> Product {
        Product {
            id,
            title: format!("Plant {id}"),
            tag: "Ready for Dispatch".into(),
            tag_color: "bg-emerald-500".into(),
            price_cents,
            price_unit: "/plant".into(),
            image: format!("plant-{id}.jpg"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn add_same_product_twice_merges_into_one_line() {
        let mut cart = Cart::new();
        let banana = product(1, 250);
        cart.add(&banana);
        cart.add(&banana);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut cart = Cart::new();
        cart.add(&product(2, 175));
        cart.add(&product(1, 250));
        cart.add(&product(2, 175));

        let ids: Vec<i32> = cart.lines().iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn add_snapshots_price_at_add_time() {
        let mut cart = Cart::new();
        cart.add(&product(1, 250));
        // Catalog price change after add must not propagate.
        cart.add(&product(1, 999));

        assert_eq!(cart.lines()[0].unit_price_cents, 250);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn remove_is_noop_for_unknown_id() {
        let mut cart = Cart::new();
        cart.add(&product(1, 250));
        cart.remove(42);
        assert_eq!(cart.lines().len(), 1);

        cart.remove(1);
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_reaching_zero_deletes_the_line() {
        let mut cart = Cart::new();
        cart.add(&product(1, 250));
        cart.add(&product(1, 250));
        cart.update_quantity(1, -2);
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_going_negative_deletes_the_line() {
        let mut cart = Cart::new();
        cart.add(&product(1, 250));
        cart.update_quantity(1, -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_unknown_id_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product(1, 250));
        cart.update_quantity(42, 3);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn total_and_count() {
        let mut cart = Cart::new();
        assert_eq!(cart.total_cents(), 0);
        assert_eq!(cart.count(), 0);

        cart.add(&product(1, 250));
        cart.add(&product(1, 250));
        cart.add(&product(3, 95));
        cart.update_quantity(3, 2);

        // 2 x 250 + 3 x 95
        assert_eq!(cart.total_cents(), 785);
        // count is the sum of quantities, not the number of lines
        assert_eq!(cart.count(), 5);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn quantity_arithmetic_saturates_instead_of_overflowing() {
        let line = |id: i32, qty: i32| CartLine {
            product_id: id,
            title: format!("Plant {id}"),
            unit_price_cents: 250,
            quantity: qty,
            image: String::new(),
        };

        // Merging duplicate lines whose quantities sum past i32::MAX must
        // clamp, not wrap to a negative quantity in the persisted blob.
        let cart = Cart::from_lines(vec![line(1, i32::MAX), line(1, 2)]);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, i32::MAX);

        // A maximal delta on an existing line clamps the same way.
        let mut cart = Cart::from_lines(vec![line(1, 5)]);
        cart.update_quantity(1, i32::MAX);
        assert_eq!(cart.lines()[0].quantity, i32::MAX);

        // One more unit on a maxed-out line stays put.
        let mut cart = Cart::from_lines(vec![line(1, i32::MAX)]);
        cart.add(&product(1, 250));
        assert_eq!(cart.lines()[0].quantity, i32::MAX);

        // A maximal negative delta removes the line rather than wrapping.
        let mut cart = Cart::from_lines(vec![line(1, 5)]);
        cart.update_quantity(1, i32::MIN);
        assert!(cart.is_empty());
    }

    #[test]
    fn from_lines_merges_duplicates_and_drops_invalid() {
        let line = |id: i32, qty: i32, price: i64| CartLine {
            product_id: id,
            title: format!("Plant {id}"),
            unit_price_cents: price,
            quantity: qty,
            image: String::new(),
        };

        let cart = Cart::from_lines(vec![
            line(1, 2, 250),
            line(2, 0, 175),
            line(1, 3, 250),
            line(3, -1, 95),
        ]);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }
}
