//! Storefront endpoint contracts
//!
//! Request/response shapes of the two endpoints the cart consumes and the
//! [`StorefrontApi`] seam transports implement. Transports only move bytes;
//! deciding what `success: false` means happens in this crate.

use crate::error::{CheckoutError, ReservationError, TransportError};
use crate::ledger::CartEntry;
use crate::types::{Money, ProductId};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stock decrement request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Stock decrement response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_low_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReservationResponse {
    /// Successful decrement
    #[must_use]
    pub fn accepted(new_stock: u32, is_low_stock: bool) -> Self {
        Self {
            success: true,
            new_stock: Some(new_stock),
            is_low_stock: Some(is_low_stock),
            error: None,
        }
    }

    /// Declined decrement
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Interpret the body
    ///
    /// # Errors
    /// - `ReservationError::Rejected` when `success` is false
    /// - `ReservationError::Transport` when a success body lacks `new_stock`
    pub fn into_result(self) -> Result<StockLevel, ReservationError> {
        if !self.success {
            return Err(ReservationError::Rejected {
                reason: self.error.unwrap_or_default(),
            });
        }
        let new_stock = self.new_stock.ok_or_else(|| {
            TransportError::Decode("success response without new_stock".to_string())
        })?;
        Ok(StockLevel {
            new_stock,
            is_low_stock: self.is_low_stock.unwrap_or(false),
        })
    }
}

/// Authoritative stock after a successful reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub new_stock: u32,
    pub is_low_stock: bool,
}

/// Customer details sent with a checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_address: String,
    #[serde(default)]
    pub update_profile: bool,
}

/// Checkout request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_data: CustomerData,
    pub cart_items: IndexMap<ProductId, CartEntry>,
}

impl CheckoutRequest {
    /// Sum of the submitted lines
    #[must_use]
    pub fn total(&self) -> Money {
        self.cart_items.values().map(CartEntry::line_total).sum()
    }
}

/// Order summary returned by a successful checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: u64,
    pub total: Money,
    pub customer: CustomerData,
    pub items: IndexMap<ProductId, CartEntry>,
}

/// Checkout response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_summary: Option<OrderSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, rename = "error_type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CheckoutResponse {
    /// Order placed
    #[must_use]
    pub fn placed(summary: OrderSummary) -> Self {
        Self {
            success: true,
            message: Some("Order placed successfully!".to_string()),
            order_summary: Some(summary),
            ..Self::default()
        }
    }

    /// Order declined
    #[must_use]
    pub fn failed(error_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            error_type: Some(error_type.into()),
            ..Self::default()
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Interpret the body
    ///
    /// # Errors
    /// - `CheckoutError::Rejected` when `success` is false
    /// - `CheckoutError::Transport` when a success body lacks the summary
    pub fn into_result(self) -> Result<OrderSummary, CheckoutError> {
        if !self.success {
            return Err(CheckoutError::Rejected {
                reason: self.error.unwrap_or_default(),
                error_type: self.error_type,
            });
        }
        self.order_summary.ok_or_else(|| {
            CheckoutError::Transport(TransportError::Decode(
                "success response without orderSummary".to_string(),
            ))
        })
    }
}

/// Transport seam for the storefront endpoints.
///
/// Each call issues exactly one request and never retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// POST the stock decrement request
    async fn reserve_stock(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationResponse, TransportError>;

    /// POST the checkout request
    async fn submit_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, TransportError>;
}

#[async_trait]
impl<T: StorefrontApi + ?Sized> StorefrontApi for Arc<T> {
    async fn reserve_stock(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationResponse, TransportError> {
        (**self).reserve_stock(request).await
    }

    async fn submit_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, TransportError> {
        (**self).submit_checkout(request).await
    }
}
