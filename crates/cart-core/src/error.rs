//! Error types for the cart
//!
//! Provides error handling for:
//! - Transport failures (network, status, decode, timeout)
//! - Stock reservation rejections
//! - Checkout validation and rejection
//! - Controller-level misuse (unknown product, request already in flight)
//! - Configuration loading
//!
//! Quantity bound violations are not errors: the selector corrects them.

use crate::types::{Money, ProductId};

/// Wire-level failure raised by a transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed or was reset
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success HTTP status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),

    /// Request exceeded its deadline
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Stock reservation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    /// Server declined the decrement (e.g. insufficient stock)
    #[error("reservation rejected: {reason}")]
    Rejected {
        /// Reason supplied by the server, shown verbatim
        reason: String,
    },

    /// Request never produced a usable answer
    #[error("reservation transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl ReservationError {
    /// Message to show the user.
    ///
    /// Rejections carry the server's reason; transport failures and
    /// rejections without a reason fall back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { reason } if !reason.trim().is_empty() => reason.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Reservation failures are terminal for the user action that caused them
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Checkout failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// Customer data failed client-side validation
    #[error("invalid customer data: {0}")]
    Validation(String),

    /// Nothing to check out
    #[error("cart is empty")]
    EmptyCart,

    /// Cart total below the configured minimum
    #[error("minimum order amount is {minimum}, current total is {total}")]
    BelowMinimum { minimum: Money, total: Money },

    /// Server declined the order
    #[error("checkout rejected: {reason}")]
    Rejected {
        /// Reason supplied by the server
        reason: String,
        /// Server error classification (`validation`, `stock`, ...)
        error_type: Option<String>,
    },

    /// A checkout request is already running
    #[error("checkout already in progress")]
    InFlight,

    /// Request never produced a usable answer
    #[error("checkout transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl CheckoutError {
    /// Message to show the user
    #[must_use]
    pub fn user_message(&self, currency_symbol: &str, fallback: &str) -> String {
        match self {
            Self::Validation(reason) => reason.clone(),
            Self::EmptyCart => {
                "Your cart is empty. Please add items before checking out.".to_string()
            }
            Self::BelowMinimum { minimum, total } => format!(
                "Minimum order amount is {}. Current total: {}",
                minimum.with_symbol(currency_symbol),
                total.with_symbol(currency_symbol)
            ),
            Self::Rejected { reason, .. } if !reason.trim().is_empty() => reason.clone(),
            Self::InFlight => "Your order is already being placed.".to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Controller error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// No card registered for the product
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// Card shows zero stock; the add action is disabled
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    /// A reservation for this card has not resolved yet
    #[error("reservation already in flight for {0}")]
    ReservationInFlight(ProductId),

    /// Completion did not match the pending reservation of the card
    #[error("no pending reservation for {0}")]
    NoPendingReservation(ProductId),

    /// Stock reservation failed
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    /// Checkout failed
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

impl CartError {
    /// Check if the error came back from the server or the network
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Reservation(_)
                | Self::Checkout(CheckoutError::Rejected { .. } | CheckoutError::Transport(_))
        )
    }
}

/// Money parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// Empty input
    #[error("empty amount")]
    Empty,

    /// Negative amount
    #[error("negative amount: {0}")]
    Negative(String),

    /// More than two fractional digits
    #[error("more than two decimal places: {0}")]
    TooPrecise(String),

    /// Not a decimal number
    #[error("malformed amount: {0}")]
    Malformed(String),

    /// NaN or infinity
    #[error("amount is not finite")]
    NotFinite,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}
