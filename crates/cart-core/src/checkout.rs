//! Checkout
//!
//! Client-side validation of the customer form and the cart, then a single
//! request to the checkout endpoint.

use crate::api::{CheckoutRequest, CustomerData, OrderSummary, StorefrontApi};
use crate::error::CheckoutError;
use crate::ledger::CartLedger;
use crate::types::Money;
use std::sync::Arc;

/// Length of a valid phone number
pub const PHONE_DIGITS: usize = 10;

impl CustomerData {
    /// Check the required fields
    ///
    /// # Errors
    /// Returns `CheckoutError::Validation` describing the first problem found
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let missing: Vec<&str> = [
            ("full name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("delivery address", &self.delivery_address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(CheckoutError::Validation(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            )));
        }
        if !self.email.contains('@') {
            return Err(CheckoutError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        let phone = self.phone.trim();
        if phone.len() != PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CheckoutError::Validation(format!(
                "Phone number must be {PHONE_DIGITS} digits"
            )));
        }
        Ok(())
    }
}

/// Build a checkout request from the ledger after validating it
///
/// # Errors
/// - `CheckoutError::Validation` for bad customer data
/// - `CheckoutError::EmptyCart` for an empty ledger
/// - `CheckoutError::BelowMinimum` when the total is under `minimum_order`
pub fn prepare(
    ledger: &CartLedger,
    customer: CustomerData,
    minimum_order: Option<Money>,
) -> Result<CheckoutRequest, CheckoutError> {
    customer.validate()?;
    if ledger.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let total = ledger.recompute_totals().total;
    if let Some(minimum) = minimum_order {
        if total < minimum {
            return Err(CheckoutError::BelowMinimum { minimum, total });
        }
    }

    Ok(CheckoutRequest {
        customer_data: customer,
        cart_items: ledger.to_items(),
    })
}

/// Client for the checkout endpoint
#[derive(Debug)]
pub struct CheckoutClient<A> {
    api: Arc<A>,
}

impl<A> Clone for CheckoutClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: StorefrontApi> CheckoutClient<A> {
    /// Create client over a shared transport
    #[inline]
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Submit a prepared order
    ///
    /// # Errors
    /// - `CheckoutError::Rejected` with the server's reason
    /// - `CheckoutError::Transport` on network, status or decode failure
    pub async fn submit(&self, request: CheckoutRequest) -> Result<OrderSummary, CheckoutError> {
        let lines = request.cart_items.len();
        let total = request.total();
        tracing::info!(lines, %total, "submitting checkout");

        let outcome = match self.api.submit_checkout(request).await {
            Ok(response) => response.into_result(),
            Err(e) => Err(CheckoutError::Transport(e)),
        };

        match &outcome {
            Ok(summary) => tracing::info!(order_id = summary.order_id, total = %summary.total, "order placed"),
            Err(e) => tracing::warn!("checkout failed: {}", e),
        }
        outcome
    }
}
