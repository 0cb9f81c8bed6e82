//! Rendering seam
//!
//! The controller never touches a visual surface directly. It pushes whole
//! snapshots through [`CartView`]; adapters (DOM, terminal, test recorder)
//! apply them.

use crate::ledger::CartFrame;
use crate::types::{Money, ProductId};
use std::fmt::Write as _;

/// What a product card shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSnapshot {
    pub product_id: ProductId,
    pub available_stock: u32,
    pub is_low_stock: bool,
    pub selected_quantity: u32,
    pub selector_enabled: bool,
    pub increment_enabled: bool,
    pub decrement_enabled: bool,
    pub add_enabled: bool,
    /// A reservation for this card is in flight
    pub busy: bool,
}

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// User-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Visual surface driven by the controller
pub trait CartView {
    /// Replace the whole cart display (lines, total and count) with `frame`
    fn render_cart(&mut self, frame: &CartFrame);

    /// Replace the display of one product card
    fn render_card(&mut self, card: &CardSnapshot);

    /// Show a message to the user
    fn notify(&mut self, notice: &Notice);
}

impl<V: CartView + ?Sized> CartView for &mut V {
    fn render_cart(&mut self, frame: &CartFrame) {
        (**self).render_cart(frame);
    }

    fn render_card(&mut self, card: &CardSnapshot) {
        (**self).render_card(card);
    }

    fn notify(&mut self, notice: &Notice) {
        (**self).notify(notice);
    }
}

impl<V: CartView + ?Sized> CartView for Box<V> {
    fn render_cart(&mut self, frame: &CartFrame) {
        (**self).render_cart(frame);
    }

    fn render_card(&mut self, card: &CardSnapshot) {
        (**self).render_card(card);
    }

    fn notify(&mut self, notice: &Notice) {
        (**self).notify(notice);
    }
}

/// View that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullView;

impl CartView for NullView {
    fn render_cart(&mut self, _frame: &CartFrame) {}

    fn render_card(&mut self, _card: &CardSnapshot) {}

    fn notify(&mut self, _notice: &Notice) {}
}

/// Plain-text rendering of a frame
#[must_use]
pub fn format_frame(frame: &CartFrame, currency_symbol: &str) -> String {
    if frame.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in &frame.lines {
        let _ = writeln!(
            out,
            "{:<32} {:>4} x {:>10} = {:>12}",
            line.name,
            line.quantity,
            line.unit_price.with_symbol(currency_symbol),
            line.line_total.with_symbol(currency_symbol),
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), total {}",
        frame.totals.item_count,
        frame.totals.total.with_symbol(currency_symbol)
    );
    out
}

/// Success message after an add
#[must_use]
pub(crate) fn added_message(name: &str, quantity: u32, total: Money, currency_symbol: &str) -> String {
    format!(
        "Added {quantity} x {name} to cart (total {})",
        total.with_symbol(currency_symbol)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::CartLedger;

    #[test]
    fn format_empty_frame() {
        assert_eq!(format_frame(&CartFrame::default(), "₹"), "Cart is empty\n");
    }

    #[test]
    fn format_frame_lists_lines_and_totals() {
        let mut ledger = CartLedger::new();
        ledger.add_or_increment(ProductId::new("1"), "Sparkler", Money::from_major(55), 2);
        ledger.add_or_increment(ProductId::new("2"), "Chakkar", Money::from_minor(15_050), 1);

        let text = format_frame(&ledger.render(), "₹");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Sparkler"));
        assert!(lines[0].ends_with("₹110.00"));
        assert_eq!(lines[2], "3 item(s), total ₹260.50");
    }

    #[test]
    fn boxed_view_forwards() {
        let mut view: Box<dyn CartView> = Box::new(NullView);
        view.notify(&Notice::info("hello"));
        view.render_cart(&CartFrame::default());
    }
}
