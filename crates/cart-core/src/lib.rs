//! Storefront Cart Core
//!
//! The browser-side cart of a small storefront, kept independent of any
//! rendering surface or HTTP stack:
//! - **CartLedger**: in-memory cart, the only source of totals and lines
//! - **QuantitySelector**: per-card quantity control clamped to stock
//! - **StockReservationClient**: server-authoritative stock decrements
//! - **CartController**: turns UI events into reservations and ledger updates
//! - **StorefrontApi** / **CartView**: transport and rendering seams
//!
//! # Example
//!
//! ```rust,ignore
//! use cart_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(api: Arc<impl StorefrontApi>) -> Result<(), CartError> {
//! let mut cart = CartController::new(CartConfig::new(), api, NullView);
//! cart.load_catalog([ProductCard::new("42", "Flower Pot", Money::from_major(300), 12)]);
//!
//! cart.set_quantity(&ProductId::new("42"), "2")?;
//! let totals = cart.add_to_cart(&ProductId::new("42")).await?;
//! println!("{} items, total {}", totals.item_count, totals.total);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod checkout;
pub mod controller;
pub mod error;
pub mod ledger;
pub mod quantity;
pub mod render;
pub mod reservation;
pub mod types;

// Re-exports for convenience
pub use api::{
    CheckoutRequest, CheckoutResponse, CustomerData, OrderSummary, ReservationRequest,
    ReservationResponse, StockLevel, StorefrontApi,
};
pub use checkout::CheckoutClient;
pub use controller::{CartController, CartEvent, EventOutcome, PendingCheckout, PendingReservation};
pub use error::{CartError, CheckoutError, ConfigError, MoneyError, ReservationError, TransportError};
pub use ledger::{CartEntry, CartFrame, CartLedger, CartLine, CartTotals};
pub use quantity::QuantitySelector;
pub use render::{CardSnapshot, CartView, Notice, NoticeLevel, NullView};
pub use reservation::StockReservationClient;
pub use types::{CartConfig, Money, ProductCard, ProductId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the cart
    pub use crate::{
        CardSnapshot, CartConfig, CartController, CartError, CartEvent, CartLedger, CartTotals,
        CartView, CustomerData, Money, NullView, ProductCard, ProductId, StorefrontApi,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
