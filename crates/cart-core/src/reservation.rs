//! Stock reservation client
//!
//! Requests a stock decrement for a product and hands back the server's
//! authoritative stock level. One request per call, no retry: failures go
//! straight to the caller, which must leave its state untouched.

use crate::api::{ReservationRequest, StorefrontApi, StockLevel};
use crate::error::ReservationError;
use crate::types::ProductId;
use std::sync::Arc;

/// Client for the stock reservation endpoint
#[derive(Debug)]
pub struct StockReservationClient<A> {
    api: Arc<A>,
}

impl<A> Clone for StockReservationClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: StorefrontApi> StockReservationClient<A> {
    /// Create client over a shared transport
    #[inline]
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Reserve `quantity` units of `product_id`
    ///
    /// # Errors
    /// - `ReservationError::Rejected` with the server's reason
    /// - `ReservationError::Transport` on network, status or decode failure
    pub async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockLevel, ReservationError> {
        debug_assert!(quantity >= 1, "reservations are for at least one unit");
        tracing::info!(%product_id, quantity, "reserving stock");

        let request = ReservationRequest {
            product_id: product_id.clone(),
            quantity,
        };

        let outcome = match self.api.reserve_stock(request).await {
            Ok(response) => response.into_result(),
            Err(e) => Err(ReservationError::Transport(e)),
        };

        match &outcome {
            Ok(level) => tracing::info!(
                %product_id,
                new_stock = level.new_stock,
                low_stock = level.is_low_stock,
                "stock reserved"
            ),
            Err(e) => tracing::warn!(%product_id, quantity, "reservation failed: {}", e),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockStorefrontApi, ReservationResponse};
    use crate::error::TransportError;
    use mockall::predicate::eq;

    fn client(mock: MockStorefrontApi) -> StockReservationClient<MockStorefrontApi> {
        StockReservationClient::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn success_returns_server_stock() {
        let mut mock = MockStorefrontApi::new();
        mock.expect_reserve_stock()
            .with(eq(ReservationRequest { product_id: ProductId::new("P1"), quantity: 2 }))
            .times(1)
            .returning(|_| Ok(ReservationResponse::accepted(8, false)));

        let level = client(mock).reserve(&ProductId::new("P1"), 2).await.unwrap();
        assert_eq!(level, StockLevel { new_stock: 8, is_low_stock: false });
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let mut mock = MockStorefrontApi::new();
        mock.expect_reserve_stock()
            .times(1)
            .returning(|_| Ok(ReservationResponse::rejected("Not enough stock available")));

        let err = client(mock).reserve(&ProductId::new("P1"), 20).await.unwrap_err();
        assert_eq!(err.user_message("generic"), "Not enough stock available");
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let mut mock = MockStorefrontApi::new();
        mock.expect_reserve_stock()
            .times(1)
            .returning(|_| Err(TransportError::Network("connection reset".into())));

        let err = client(mock).reserve(&ProductId::new("P1"), 1).await.unwrap_err();
        assert!(matches!(err, ReservationError::Transport(TransportError::Network(_))));
        assert_eq!(err.user_message("generic"), "generic");
    }
}
