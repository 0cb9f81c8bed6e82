//! Cart ledger
//!
//! The authoritative in-memory cart. Totals, counts and the rendered line
//! list are always derived from the current entries, never tracked
//! incrementally.

use crate::types::{Money, ProductId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Display name captured when the line was created
    pub name: String,
    /// Quantity, at least 1 while the entry exists
    pub quantity: u32,
    /// Unit price captured when the line was created
    #[serde(rename = "price")]
    pub unit_price: Money,
}

impl CartEntry {
    /// Line total
    #[inline]
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(u64::from(self.quantity))
    }
}

/// Derived cart totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of quantity x unit price
    pub total: Money,
    /// Sum of quantities
    pub item_count: u64,
}

/// Rendered cart line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Complete visible cart state taken from a single ledger snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartFrame {
    /// Lines in insertion order
    pub lines: Vec<CartLine>,
    /// Totals of exactly these lines
    pub totals: CartTotals,
}

impl CartFrame {
    /// Check for an empty cart
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// In-memory cart keyed by product, insertion ordered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartLedger {
    entries: IndexMap<ProductId, CartEntry>,
}

impl CartLedger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new line or grow an existing one.
    ///
    /// An existing line keeps its captured name and price. A zero quantity is
    /// ignored so that no entry ever holds quantity 0.
    pub fn add_or_increment(
        &mut self,
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) {
        if quantity == 0 {
            tracing::debug!(%product_id, "ignoring zero-quantity add");
            return;
        }

        self.entries
            .entry(product_id)
            .and_modify(|entry| entry.quantity = entry.quantity.saturating_add(quantity))
            .or_insert_with(|| CartEntry {
                name: name.into(),
                quantity,
                unit_price,
            });
    }

    /// Remove the whole line. Absent ids are a no-op.
    ///
    /// Returns the removed entry, if any.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartEntry> {
        self.entries.shift_remove(product_id)
    }

    /// Drop every line
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Recompute totals from the current entries
    #[must_use]
    pub fn recompute_totals(&self) -> CartTotals {
        CartTotals {
            total: self.entries.values().map(CartEntry::line_total).sum(),
            item_count: self
                .entries
                .values()
                .map(|entry| u64::from(entry.quantity))
                .sum(),
        }
    }

    /// Produce the full visible state. Lines and totals come from the same
    /// snapshot, so a view that applies the frame in one step never shows a
    /// mix of two mutations.
    #[must_use]
    pub fn render(&self) -> CartFrame {
        let lines = self
            .entries
            .iter()
            .map(|(product_id, entry)| CartLine {
                product_id: product_id.clone(),
                name: entry.name.clone(),
                quantity: entry.quantity,
                unit_price: entry.unit_price,
                line_total: entry.line_total(),
            })
            .collect();

        CartFrame {
            lines,
            totals: self.recompute_totals(),
        }
    }

    /// Look up a line
    #[inline]
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.get(product_id)
    }

    /// Iterate lines in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, &CartEntry)> {
        self.entries.iter()
    }

    /// Number of distinct lines
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty cart
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the entries for a checkout request
    #[must_use]
    pub fn to_items(&self) -> IndexMap<ProductId, CartEntry> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn scenario_add_increment_remove() {
        let mut ledger = CartLedger::new();

        ledger.add_or_increment(p("P1"), "Sparkler", Money::from_major(100), 2);
        assert_eq!(ledger.get(&p("P1")).unwrap().quantity, 2);
        assert_eq!(ledger.recompute_totals().total, Money::from_major(200));

        ledger.add_or_increment(p("P1"), "Sparkler", Money::from_major(100), 3);
        let totals = ledger.recompute_totals();
        assert_eq!(ledger.get(&p("P1")).unwrap().quantity, 5);
        assert_eq!(totals.total, Money::from_major(500));
        assert_eq!(totals.item_count, 5);

        ledger.remove(&p("P1"));
        assert!(ledger.is_empty());
        assert_eq!(ledger.recompute_totals(), CartTotals::default());
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut ledger = CartLedger::new();
        ledger.add_or_increment(p("a"), "A", Money::from_major(10), 1);
        let before = ledger.recompute_totals();

        assert!(ledger.remove(&p("missing")).is_none());
        assert_eq!(ledger.recompute_totals(), before);
    }

    #[test]
    fn zero_quantity_never_creates_entry() {
        let mut ledger = CartLedger::new();
        ledger.add_or_increment(p("a"), "A", Money::from_major(10), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn existing_line_keeps_captured_price() {
        let mut ledger = CartLedger::new();
        ledger.add_or_increment(p("a"), "A", Money::from_major(10), 1);
        ledger.add_or_increment(p("a"), "Renamed", Money::from_major(99), 1);

        let entry = ledger.get(&p("a")).unwrap();
        assert_eq!(entry.name, "A");
        assert_eq!(entry.unit_price, Money::from_major(10));
        assert_eq!(entry.quantity, 2);
    }

    #[test]
    fn render_keeps_insertion_order_after_removal() {
        let mut ledger = CartLedger::new();
        for id in ["c", "a", "b"] {
            ledger.add_or_increment(p(id), id.to_uppercase(), Money::from_major(1), 1);
        }
        ledger.remove(&p("a"));

        let frame = ledger.render();
        let ids: Vec<_> = frame.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, ["c", "b"]);
        assert_eq!(frame.totals.item_count, 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u64, u32),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6, 0u64..100_000, 0u32..50).prop_map(|(id, price, qty)| Op::Add(id, price, qty)),
            (0u8..6).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_totals_match_fresh_sum(ops in proptest::collection::vec(op(), 0..64)) {
            let mut ledger = CartLedger::new();
            for op in ops {
                match op {
                    Op::Add(id, price, qty) => ledger.add_or_increment(
                        p(&id.to_string()),
                        "item",
                        Money::from_minor(price),
                        qty,
                    ),
                    Op::Remove(id) => {
                        ledger.remove(&p(&id.to_string()));
                    }
                }

                let totals = ledger.recompute_totals();
                let expected: u64 = ledger
                    .iter()
                    .map(|(_, e)| u64::from(e.quantity) * e.unit_price.minor())
                    .sum();
                let count: u64 = ledger.iter().map(|(_, e)| u64::from(e.quantity)).sum();
                prop_assert_eq!(totals.total.minor(), expected);
                prop_assert_eq!(totals.item_count, count);
                prop_assert!(ledger.iter().all(|(_, e)| e.quantity >= 1));
                prop_assert_eq!(ledger.render().totals, totals);
            }
        }
    }
}
