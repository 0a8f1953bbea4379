use std::collections::BTreeMap;
use std::sync::mpsc::Sender;

use tracing::warn;

use crate::models::{AddCartItem, CartItem, PriceRange, Product};

/// One mutation to mirror to the server, queued on the store's outbox.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    Add(AddCartItem),
    SetQuantity { product_slug: String, quantity: i64 },
    Remove { product_slug: String },
    Clear,
}

/// The client's authoritative cart view. Rendering reads this state
/// directly; the server mirror trails behind and never blocks a mutation.
pub struct CartStore {
    items: BTreeMap<String, CartItem>,
    max_quantity: i64,
    outbox: Sender<SyncOp>,
}

impl CartStore {
    pub fn new(max_quantity: i64, outbox: Sender<SyncOp>) -> Self {
        Self {
            items: BTreeMap::new(),
            max_quantity,
            outbox,
        }
    }

    /// Adds one unit of a catalog product, incrementing an existing line.
    /// Saturated lines are left untouched and nothing is mirrored.
    pub fn add_item(&mut self, product: &Product) {
        match self.items.get_mut(&product.slug) {
            Some(item) => {
                if item.quantity >= self.max_quantity {
                    return;
                }
                item.quantity += 1;
            }
            None => {
                self.items.insert(
                    product.slug.clone(),
                    CartItem {
                        product_slug: product.slug.clone(),
                        name: product.name.clone(),
                        icon: product.icon.clone(),
                        price_min: product.price_min,
                        price_max: product.price_max,
                        quantity: 1,
                    },
                );
            }
        }

        self.push(SyncOp::Add(AddCartItem {
            product_slug: product.slug.clone(),
            name: product.name.clone(),
            icon: product.icon.clone(),
            price_min: product.price_min,
            price_max: product.price_max,
        }));
    }

    pub fn remove_item(&mut self, product_slug: &str) {
        if self.items.remove(product_slug).is_none() {
            return;
        }

        self.push(SyncOp::Remove {
            product_slug: product_slug.to_string(),
        });
    }

    /// A quantity of zero or less removes the line; anything else
    /// overwrites it, clamped to the cap. Unknown slugs are left alone.
    pub fn update_quantity(&mut self, product_slug: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_slug);
            return;
        }

        let quantity = quantity.min(self.max_quantity);

        if let Some(item) = self.items.get_mut(product_slug) {
            item.quantity = quantity;
            self.push(SyncOp::SetQuantity {
                product_slug: product_slug.to_string(),
                quantity,
            });
        }
    }

    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }

        self.items.clear();
        self.push(SyncOp::Clear);
    }

    /// Sum of quantities, not line count.
    pub fn item_count(&self) -> i64 {
        self.items.values().map(|item| item.quantity).sum()
    }

    /// Subtotal as a range: both bounds are Σ price × quantity over the
    /// lines, since no single pre-sale price exists.
    pub fn subtotal(&self) -> PriceRange {
        let mut subtotal = PriceRange { min: 0.0, max: 0.0 };

        for item in self.items.values() {
            subtotal.min += item.price_min * item.quantity as f64;
            subtotal.max += item.price_max * item.quantity as f64;
        }

        subtotal
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    /// Replaces local state with the server snapshot. Server wins; any
    /// unsynced local edits are discarded, and nothing is mirrored back.
    pub fn load_from_server(&mut self, items: Vec<CartItem>) {
        self.items = items
            .into_iter()
            .map(|item| (item.product_slug.clone(), item))
            .collect();
    }

    fn push(&self, op: SyncOp) {
        // The mirror is best-effort; a closed outbox must not fail the
        // local mutation.
        if self.outbox.send(op).is_err() {
            warn!("cart sync outbox closed, mutation not mirrored");
        }
    }
}
