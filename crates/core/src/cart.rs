//! Shopping cart bookkeeping.
//!
//! The cart lives in the remote `cart_items` table; this module holds the
//! in-memory copy the storefront renders, and decides which remote write a
//! cart action needs. Callers perform the write first and apply it locally
//! only once the remote side accepted it.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// `price * quantity` for this line.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// The remote write implied by a cart action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartWrite {
    /// Create a new `cart_items` row.
    Insert { product_id: ProductId, quantity: u32 },
    /// Change the quantity of an existing row.
    Update { product_id: ProductId, quantity: u32 },
    /// Remove the row.
    Delete { product_id: ProductId },
}

impl CartWrite {
    /// Product the write targets.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        match *self {
            Self::Insert { product_id, .. }
            | Self::Update { product_id, .. }
            | Self::Delete { product_id } => product_id,
        }
    }
}

/// A user's cart: at most one line per product, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Build a cart from fetched lines. Later duplicates of a product are
    /// folded into the first line.
    #[must_use]
    pub fn new(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            match cart.line_mut(line.product.id) {
                Some(existing) => existing.quantity += line.quantity,
                None => cart.lines.push(line),
            }
        }
        cart
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines (the header badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Quantity of a product, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product.id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product.id == product_id)
    }

    /// "Add to cart": bump an existing line by one, otherwise insert one unit.
    #[must_use]
    pub fn plan_add(&self, product_id: ProductId) -> CartWrite {
        match self.line(product_id) {
            Some(line) => CartWrite::Update {
                product_id,
                quantity: line.quantity.saturating_add(1),
            },
            None => CartWrite::Insert {
                product_id,
                quantity: 1,
            },
        }
    }

    /// Set an exact quantity. Zero removes the line.
    #[must_use]
    pub const fn plan_set_quantity(product_id: ProductId, quantity: u32) -> CartWrite {
        if quantity == 0 {
            CartWrite::Delete { product_id }
        } else {
            CartWrite::Update {
                product_id,
                quantity,
            }
        }
    }

    #[must_use]
    pub const fn plan_remove(product_id: ProductId) -> CartWrite {
        CartWrite::Delete { product_id }
    }

    /// Apply a write the remote side accepted.
    ///
    /// `product` is needed for [`CartWrite::Insert`]; an insert without it
    /// is ignored. Updates for products not in the cart are ignored too,
    /// matching a remote update that touched no rows.
    pub fn apply(&mut self, write: CartWrite, product: Option<Product>) {
        match write {
            CartWrite::Insert {
                product_id,
                quantity,
            } => {
                if let Some(line) = self.line_mut(product_id) {
                    line.quantity = quantity;
                } else if let Some(product) = product.filter(|p| p.id == product_id) {
                    self.lines.push(CartLine { product, quantity });
                }
            }
            CartWrite::Update {
                product_id,
                quantity,
            } => {
                if let Some(line) = self.line_mut(product_id) {
                    line.quantity = quantity;
                }
            }
            CartWrite::Delete { product_id } => {
                self.lines.retain(|l| l.product.id != product_id);
            }
        }
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn pid(id: i64) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = Cart::default();

        let first = cart.plan_add(pid(1));
        assert_eq!(
            first,
            CartWrite::Insert {
                product_id: pid(1),
                quantity: 1
            }
        );
        cart.apply(first, Some(product(1, 12990)));

        let second = cart.plan_add(pid(1));
        assert_eq!(
            second,
            CartWrite::Update {
                product_id: pid(1),
                quantity: 2
            }
        );
        cart.apply(second, None);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.quantity_of(pid(1)), 2);
    }

    #[test]
    fn test_set_quantity_zero_deletes() {
        assert_eq!(
            Cart::plan_set_quantity(pid(3), 0),
            CartWrite::Delete { product_id: pid(3) }
        );

        let mut cart = Cart::new(vec![CartLine {
            product: product(3, 100),
            quantity: 4,
        }]);
        cart.apply(Cart::plan_set_quantity(pid(3), 0), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let cart = Cart::new(vec![
            CartLine {
                product: product(1, 12990),
                quantity: 2,
            },
            CartLine {
                product: product(2, 3500),
                quantity: 1,
            },
        ]);

        assert_eq!(cart.total(), Price::from_rubles(29480));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.lines()[0].subtotal(), Price::from_rubles(25980));
    }

    #[test]
    fn test_new_folds_duplicate_products() {
        let cart = Cart::new(vec![
            CartLine {
                product: product(1, 10),
                quantity: 1,
            },
            CartLine {
                product: product(1, 10),
                quantity: 2,
            },
        ]);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.quantity_of(pid(1)), 3);
    }

    #[test]
    fn test_update_for_missing_line_is_ignored() {
        let mut cart = Cart::default();
        cart.apply(Cart::plan_set_quantity(pid(9), 5), None);
        assert!(cart.is_empty());

        cart.apply(
            CartWrite::Insert {
                product_id: pid(9),
                quantity: 1,
            },
            Some(product(8, 10)),
        );
        assert!(cart.is_empty(), "insert with a mismatched product is ignored");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new(vec![
            CartLine {
                product: product(1, 10),
                quantity: 1,
            },
            CartLine {
                product: product(2, 10),
                quantity: 1,
            },
        ]);
        cart.apply(Cart::plan_remove(pid(1)), None);
        assert!(!cart.contains(pid(1)));
        assert!(cart.contains(pid(2)));
        cart.clear();
        assert_eq!(cart.total(), Price::ZERO);
    }
}
