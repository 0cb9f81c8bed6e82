//! In-memory storefront
//!
//! Authoritative stock and order book behind the [`StorefrontApi`] seam:
//! - reservations decrement stock only when enough is left
//! - checkout repeats the server-side validation and books an order
//! - failure injection drops requests before they reach the stock table
//! - [`InMemoryStorefront::drain`] plays a competing shopper

use async_trait::async_trait;
use cart_core::{
    CheckoutRequest, CheckoutResponse, Money, OrderSummary, ProductCard, ProductId,
    ReservationRequest, ReservationResponse, StorefrontApi, TransportError,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;

/// Stock below this is flagged low
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Server-side product row
#[derive(Debug, Clone, PartialEq, Eq)]
struct StockRecord {
    name: String,
    unit_price: Money,
    stock: u32,
}

#[derive(Debug, Default)]
struct StoreState {
    products: IndexMap<ProductId, StockRecord>,
    orders: Vec<OrderSummary>,
    next_order_id: u64,
}

/// Storefront server held in memory
#[derive(Debug)]
pub struct InMemoryStorefront {
    state: Mutex<StoreState>,
    low_stock_threshold: u32,
    minimum_order: Option<Money>,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl InMemoryStorefront {
    /// Stock the shelves from server-rendered cards
    #[must_use]
    pub fn new(catalog: impl IntoIterator<Item = ProductCard>) -> Self {
        let products = catalog
            .into_iter()
            .map(|card| {
                (
                    card.product_id,
                    StockRecord {
                        name: card.name,
                        unit_price: card.unit_price,
                        stock: card.available_stock,
                    },
                )
            })
            .collect();

        Self {
            state: Mutex::new(StoreState {
                products,
                orders: Vec::new(),
                next_order_id: 1,
            }),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            minimum_order: None,
            failure_rate: 0.0,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Set low stock threshold
    #[inline]
    #[must_use]
    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Set minimum order total
    #[inline]
    #[must_use]
    pub fn with_minimum_order(mut self, minimum: Option<Money>) -> Self {
        self.minimum_order = minimum;
        self
    }

    /// Drop this fraction of requests with a network error
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64, seed: u64) -> Self {
        self.failure_rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Current server stock
    #[must_use]
    pub fn stock(&self, product_id: &ProductId) -> Option<u32> {
        self.state.lock().products.get(product_id).map(|p| p.stock)
    }

    /// Stock of every product, in catalog order
    #[must_use]
    pub fn stock_levels(&self) -> IndexMap<ProductId, u32> {
        self.state
            .lock()
            .products
            .iter()
            .map(|(id, p)| (id.clone(), p.stock))
            .collect()
    }

    /// Cards as the server would render them now
    #[must_use]
    pub fn catalog(&self) -> Vec<ProductCard> {
        self.state
            .lock()
            .products
            .iter()
            .map(|(id, p)| {
                let card = ProductCard::new(id.clone(), p.name.clone(), p.unit_price, p.stock);
                if self.is_low(p.stock) {
                    card.low_stock()
                } else {
                    card
                }
            })
            .collect()
    }

    /// Booked orders
    #[must_use]
    pub fn orders(&self) -> Vec<OrderSummary> {
        self.state.lock().orders.clone()
    }

    /// Take up to `quantity` units out of stock behind the cart's back.
    ///
    /// Returns how many units were actually taken.
    pub fn drain(&self, product_id: &ProductId, quantity: u32) -> u32 {
        let mut state = self.state.lock();
        let Some(product) = state.products.get_mut(product_id) else {
            return 0;
        };
        let taken = quantity.min(product.stock);
        product.stock -= taken;
        tracing::debug!(%product_id, taken, left = product.stock, "stock drained");
        taken
    }

    fn is_low(&self, stock: u32) -> bool {
        stock < self.low_stock_threshold
    }

    fn injected_failure(&self) -> Option<TransportError> {
        if self.failure_rate <= 0.0 {
            return None;
        }
        if self.rng.lock().gen_bool(self.failure_rate) {
            Some(TransportError::Network("connection reset".to_string()))
        } else {
            None
        }
    }

    fn apply_reservation(&self, request: &ReservationRequest) -> ReservationResponse {
        let mut state = self.state.lock();
        let product = match state.products.get_mut(&request.product_id) {
            Some(product) if request.quantity > 0 => product,
            _ => return ReservationResponse::rejected("Invalid request"),
        };
        if product.stock < request.quantity {
            return ReservationResponse::rejected("Not enough stock available");
        }
        product.stock -= request.quantity;
        let new_stock = product.stock;
        ReservationResponse::accepted(new_stock, self.is_low(new_stock))
    }

    fn apply_checkout(&self, request: CheckoutRequest) -> CheckoutResponse {
        let customer = &request.customer_data;
        let required = [
            &customer.full_name,
            &customer.email,
            &customer.phone,
            &customer.delivery_address,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return CheckoutResponse::failed("validation", "Please fill in all required fields");
        }
        if request.cart_items.is_empty() {
            return CheckoutResponse::failed(
                "validation",
                "Your cart is empty. Please add items before checking out.",
            );
        }

        let total = request.total();
        if let Some(minimum) = self.minimum_order {
            if total < minimum {
                return CheckoutResponse::failed(
                    "minimum_order",
                    format!(
                        "Minimum order amount is {}. Current total: {}",
                        minimum.with_symbol("₹"),
                        total.with_symbol("₹")
                    ),
                )
                .with_details(json!({
                    "minimum_required": minimum,
                    "current_total": total,
                    "shortfall": minimum.saturating_sub(total),
                }));
            }
        }

        let mut state = self.state.lock();
        if let Some(unknown) = request
            .cart_items
            .keys()
            .find(|id| !state.products.contains_key(*id))
        {
            return CheckoutResponse::failed(
                "not_found",
                format!("Product with ID {unknown} not found"),
            );
        }

        // stock was taken by the reservations
        let order_id = state.next_order_id;
        state.next_order_id += 1;
        let summary = OrderSummary {
            order_id,
            total,
            customer: request.customer_data,
            items: request.cart_items,
        };
        state.orders.push(summary.clone());
        CheckoutResponse::placed(summary)
    }
}

#[async_trait]
impl StorefrontApi for InMemoryStorefront {
    async fn reserve_stock(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationResponse, TransportError> {
        if let Some(failure) = self.injected_failure() {
            return Err(failure);
        }
        Ok(self.apply_reservation(&request))
    }

    async fn submit_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, TransportError> {
        if let Some(failure) = self.injected_failure() {
            return Err(failure);
        }
        Ok(self.apply_checkout(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{CartEntry, CustomerData};

    fn store() -> InMemoryStorefront {
        InMemoryStorefront::new([
            ProductCard::new("1", "Sparkler", Money::from_major(100), 12),
            ProductCard::new("2", "Ground Chakkar", Money::from_major(450), 2),
        ])
    }

    fn reserve(store: &InMemoryStorefront, id: &str, quantity: u32) -> ReservationResponse {
        store.apply_reservation(&ReservationRequest {
            product_id: ProductId::new(id),
            quantity,
        })
    }

    fn customer() -> CustomerData {
        CustomerData {
            full_name: "Ravi".into(),
            email: "ravi@example.com".into(),
            phone: "9000000001".into(),
            delivery_address: "4 Bazaar Road".into(),
            update_profile: false,
        }
    }

    fn checkout_of(items: &[(&str, u32, u64)]) -> CheckoutRequest {
        CheckoutRequest {
            customer_data: customer(),
            cart_items: items
                .iter()
                .map(|(id, quantity, price)| {
                    (
                        ProductId::new(*id),
                        CartEntry {
                            name: format!("item {id}"),
                            quantity: *quantity,
                            unit_price: Money::from_major(*price),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn reservation_decrements_and_flags_low_stock() {
        let store = store();
        assert_eq!(reserve(&store, "1", 2), ReservationResponse::accepted(10, false));
        assert_eq!(reserve(&store, "1", 1), ReservationResponse::accepted(9, true));
        assert_eq!(store.stock(&ProductId::new("1")), Some(9));
    }

    #[test]
    fn reservation_needs_enough_stock() {
        let store = store();
        assert_eq!(
            reserve(&store, "2", 3),
            ReservationResponse::rejected("Not enough stock available")
        );
        assert_eq!(reserve(&store, "2", 2), ReservationResponse::accepted(0, true));
    }

    #[test]
    fn reservation_rejects_bad_requests() {
        let store = store();
        assert_eq!(reserve(&store, "9", 1), ReservationResponse::rejected("Invalid request"));
        assert_eq!(reserve(&store, "1", 0), ReservationResponse::rejected("Invalid request"));
        assert_eq!(store.stock(&ProductId::new("1")), Some(12));
    }

    #[test]
    fn drain_never_goes_below_zero() {
        let store = store();
        assert_eq!(store.drain(&ProductId::new("2"), 5), 2);
        assert_eq!(store.stock(&ProductId::new("2")), Some(0));
        assert_eq!(store.drain(&ProductId::new("x"), 5), 0);
    }

    #[test]
    fn catalog_reflects_current_stock() {
        let store = store().with_low_stock_threshold(5);
        let cards = store.catalog();
        assert!(!cards[0].is_low_stock);
        assert!(cards[1].is_low_stock);
    }

    #[test]
    fn checkout_books_sequential_orders() {
        let store = store();
        let first = store.apply_checkout(checkout_of(&[("1", 2, 100)]));
        let second = store.apply_checkout(checkout_of(&[("2", 1, 450)]));

        assert_eq!(first.order_summary.unwrap().order_id, 1);
        let second = second.order_summary.unwrap();
        assert_eq!(second.order_id, 2);
        assert_eq!(second.total, Money::from_major(450));
        assert_eq!(store.orders().len(), 2);
        // reservations already hold the stock
        assert_eq!(store.stock(&ProductId::new("1")), Some(12));
    }

    #[test]
    fn checkout_enforces_minimum_order() {
        let store = store().with_minimum_order(Some(Money::from_major(3000)));
        let response = store.apply_checkout(checkout_of(&[("1", 5, 100)]));

        assert!(!response.success);
        assert_eq!(response.error_type.as_deref(), Some("minimum_order"));
        assert_eq!(
            response.error.as_deref(),
            Some("Minimum order amount is ₹3000.00. Current total: ₹500.00")
        );
        assert_eq!(response.details.unwrap()["shortfall"], json!(2500));
        assert!(store.orders().is_empty());
    }

    #[test]
    fn checkout_validates_form_and_items() {
        let store = store();

        let mut request = checkout_of(&[("1", 1, 100)]);
        request.customer_data.phone.clear();
        assert_eq!(store.apply_checkout(request).error_type.as_deref(), Some("validation"));

        let response = store.apply_checkout(checkout_of(&[]));
        assert_eq!(
            response.error.as_deref(),
            Some("Your cart is empty. Please add items before checking out.")
        );

        let response = store.apply_checkout(checkout_of(&[("77", 1, 100)]));
        assert_eq!(response.error_type.as_deref(), Some("not_found"));
    }

    #[tokio::test]
    async fn full_failure_rate_drops_every_request() {
        let store = store().with_failure_rate(1.0, 7);
        let err = store
            .reserve_stock(ReservationRequest {
                product_id: ProductId::new("1"),
                quantity: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(store.stock(&ProductId::new("1")), Some(12));
    }

    #[test]
    fn failure_rate_is_clamped() {
        let store = store().with_failure_rate(f64::NAN, 1);
        assert!(store.injected_failure().is_none());
        let store = store.with_failure_rate(4.0, 1);
        assert!(store.injected_failure().is_some());
    }
}
