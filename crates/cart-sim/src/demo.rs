//! Scripted shopping session printed as text

use crate::storefront::InMemoryStorefront;
use cart_core::render::format_frame;
use cart_core::{
    CardSnapshot, CartConfig, CartController, CartError, CartFrame, CartView, CustomerData, Money,
    Notice, NoticeLevel, OrderSummary, ProductCard, ProductId,
};
use std::io::Write;
use std::sync::Arc;

/// View that writes frames and notices to a text sink
#[derive(Debug)]
pub struct ConsoleView<W> {
    out: W,
    currency_symbol: String,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W, currency_symbol: impl Into<String>) -> Self {
        Self {
            out,
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

// write errors on a console sink are not actionable
impl<W: Write> CartView for ConsoleView<W> {
    fn render_cart(&mut self, frame: &CartFrame) {
        let _ = write!(self.out, "{}", format_frame(frame, &self.currency_symbol));
    }

    fn render_card(&mut self, card: &CardSnapshot) {
        tracing::debug!(
            product_id = %card.product_id,
            stock = card.available_stock,
            selected = card.selected_quantity,
            busy = card.busy,
            "card"
        );
    }

    fn notify(&mut self, notice: &Notice) {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(self.out, "[{tag}] {}", notice.message);
    }
}

/// Cards used by the demo session
#[must_use]
pub fn demo_catalog() -> Vec<ProductCard> {
    vec![
        ProductCard::new("101", "10 CM ELECTRIC SPARKLER", Money::from_major(100), 40),
        ProductCard::new("102", "FLOWER POT BIG (10 PCS)", Money::from_major(300), 12),
        ProductCard::new("103", "DISCO WHEEL (10 PCS)", Money::from_major(840), 6).low_stock(),
    ]
}

/// Walk through add, clamp, rejection, removal and checkout.
///
/// # Errors
/// Returns the first step that failed unexpectedly
pub async fn run_demo<W: Write>(out: W) -> Result<(OrderSummary, W), CartError> {
    let config = CartConfig::new();
    let store = Arc::new(
        InMemoryStorefront::new(demo_catalog()).with_minimum_order(config.minimum_order),
    );
    let view = ConsoleView::new(out, config.currency_symbol.clone());
    let mut cart = CartController::new(config, Arc::clone(&store), view);
    cart.load_catalog(demo_catalog());

    let sparkler = ProductId::new("101");
    let flower_pot = ProductId::new("102");
    let wheel = ProductId::new("103");

    cart.set_quantity(&sparkler, "5")?;
    cart.add_to_cart(&sparkler).await?;

    // more than the card shows: clamped to 6
    cart.set_quantity(&wheel, "25")?;
    cart.add_to_cart(&wheel).await?;

    // another shopper empties the flower pots before we click
    store.drain(&flower_pot, 12);
    cart.set_quantity(&flower_pot, "2")?;
    if let Err(e) = cart.add_to_cart(&flower_pot).await {
        tracing::info!(error = %e, "rejected as expected");
    }

    cart.remove(&sparkler)?;

    let customer = CustomerData {
        full_name: "Meena Raj".to_string(),
        email: "meena@example.com".to_string(),
        phone: "9840012345".to_string(),
        delivery_address: "21 Car Street, Sivakasi".to_string(),
        update_profile: false,
    };
    let summary = cart.checkout(customer).await?;

    let view = cart.into_view();
    Ok((summary, view.into_inner()))
}
