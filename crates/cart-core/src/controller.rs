//! Cart controller
//!
//! Owns the ledger, the product cards and the view, and is the only place
//! where UI events turn into cart mutations.
//!
//! # Add flow
//! 1. [`CartController::begin_add`] checks the card, marks it busy and
//!    disables its controls
//! 2. the reservation request runs through a [`StockReservationClient`]
//! 3. [`CartController::complete_add`] applies the server's answer, or
//!    restores the card and leaves the ledger alone on failure
//!
//! [`CartController::add_to_cart`] chains the three steps. The split exists
//! so an event loop can keep handling other cards while one request is out.

use crate::api::{CheckoutRequest, CustomerData, OrderSummary, StockLevel, StorefrontApi};
use crate::checkout::{self, CheckoutClient};
use crate::error::{CartError, CheckoutError, ReservationError};
use crate::ledger::{CartFrame, CartLedger, CartTotals};
use crate::quantity::{self, QuantitySelector};
use crate::render::{self, CardSnapshot, CartView, Notice};
use crate::reservation::StockReservationClient;
use crate::types::{CartConfig, Money, ProductCard, ProductId};
use indexmap::IndexMap;
use std::sync::Arc;

/// UI events routed into the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// "+" on a card
    Increment(ProductId),
    /// "-" on a card
    Decrement(ProductId),
    /// Direct entry in a card's quantity field
    QuantityInput(ProductId, String),
    /// "Add to cart" on a card
    AddToCart(ProductId),
    /// "Remove" on a cart line
    RemoveLine(ProductId),
    /// Checkout form submitted
    Checkout(CustomerData),
}

/// Result of a dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A card's selector now shows this value
    Quantity(u32),
    /// The cart changed
    Totals(CartTotals),
    /// An order was placed
    Order(OrderSummary),
}

/// Reservation started by [`CartController::begin_add`]
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending reservation keeps its card busy until completed"]
pub struct PendingReservation {
    product_id: ProductId,
    name: String,
    unit_price: Money,
    quantity: u32,
}

impl PendingReservation {
    #[inline]
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[inline]
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Checkout started by [`CartController::begin_checkout`]
#[derive(Debug)]
#[must_use = "a pending checkout blocks cart changes until completed"]
pub struct PendingCheckout {
    request: CheckoutRequest,
}

impl PendingCheckout {
    /// Request body to submit
    #[inline]
    #[must_use]
    pub fn request(&self) -> &CheckoutRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CardState {
    card: ProductCard,
    selector: QuantitySelector,
    busy: bool,
}

impl CardState {
    fn new(card: ProductCard) -> Self {
        Self {
            selector: QuantitySelector::new(card.available_stock),
            card,
            busy: false,
        }
    }

    fn snapshot(&self) -> CardSnapshot {
        let idle = !self.busy;
        CardSnapshot {
            product_id: self.card.product_id.clone(),
            available_stock: self.card.available_stock,
            is_low_stock: self.card.is_low_stock,
            selected_quantity: self.selector.value(),
            selector_enabled: idle && self.selector.is_enabled(),
            increment_enabled: idle && self.selector.can_increment(),
            decrement_enabled: idle && self.selector.can_decrement(),
            add_enabled: idle && self.card.available_stock > 0,
            busy: self.busy,
        }
    }
}

/// Single owner of cart state for a page session
#[derive(Debug)]
pub struct CartController<A, V> {
    config: CartConfig,
    ledger: CartLedger,
    cards: IndexMap<ProductId, CardState>,
    reservations: StockReservationClient<A>,
    orders: CheckoutClient<A>,
    checkout_in_flight: bool,
    view: V,
}

impl<A: StorefrontApi, V: CartView> CartController<A, V> {
    /// Create controller with an empty cart
    #[must_use]
    pub fn new(config: CartConfig, api: Arc<A>, view: V) -> Self {
        Self {
            config,
            ledger: CartLedger::new(),
            cards: IndexMap::new(),
            reservations: StockReservationClient::new(Arc::clone(&api)),
            orders: CheckoutClient::new(api),
            checkout_in_flight: false,
            view,
        }
    }

    /// Register the server-rendered cards and draw the initial page state
    pub fn load_catalog(&mut self, cards: impl IntoIterator<Item = ProductCard>) {
        for card in cards {
            let state = CardState::new(card);
            self.view.render_card(&state.snapshot());
            self.cards.insert(state.card.product_id.clone(), state);
        }
        tracing::debug!(cards = self.cards.len(), "catalog loaded");
        self.view.render_cart(&self.ledger.render());
    }

    /// Route an event to its handler
    ///
    /// # Errors
    /// Whatever the handler returns
    pub async fn dispatch(&mut self, event: CartEvent) -> Result<EventOutcome, CartError> {
        match event {
            CartEvent::Increment(id) => self.increment(&id).map(EventOutcome::Quantity),
            CartEvent::Decrement(id) => self.decrement(&id).map(EventOutcome::Quantity),
            CartEvent::QuantityInput(id, raw) => {
                self.set_quantity(&id, &raw).map(EventOutcome::Quantity)
            }
            CartEvent::AddToCart(id) => self.add_to_cart(&id).await.map(EventOutcome::Totals),
            CartEvent::RemoveLine(id) => self.remove(&id).map(EventOutcome::Totals),
            CartEvent::Checkout(customer) => self.checkout(customer).await.map(EventOutcome::Order),
        }
    }

    /// Step a card's selector up
    ///
    /// # Errors
    /// `UnknownProduct`, or `ReservationInFlight` while the card is busy
    pub fn increment(&mut self, product_id: &ProductId) -> Result<u32, CartError> {
        self.adjust(product_id, QuantitySelector::increment)
    }

    /// Step a card's selector down
    ///
    /// # Errors
    /// `UnknownProduct`, or `ReservationInFlight` while the card is busy
    pub fn decrement(&mut self, product_id: &ProductId) -> Result<u32, CartError> {
        self.adjust(product_id, QuantitySelector::decrement)
    }

    /// Apply direct entry to a card's selector
    ///
    /// # Errors
    /// `UnknownProduct`, or `ReservationInFlight` while the card is busy
    pub fn set_quantity(&mut self, product_id: &ProductId, raw: &str) -> Result<u32, CartError> {
        self.adjust(product_id, |selector| selector.set_raw(raw))
    }

    fn adjust(
        &mut self,
        product_id: &ProductId,
        change: impl FnOnce(&mut QuantitySelector) -> quantity::Adjustment,
    ) -> Result<u32, CartError> {
        let state = self.card_state_mut(product_id)?;
        if state.busy {
            return Err(CartError::ReservationInFlight(product_id.clone()));
        }
        let adjustment = change(&mut state.selector);
        let snapshot = state.snapshot();
        self.view.render_card(&snapshot);
        Ok(adjustment.value)
    }

    /// Start a reservation for the card's selected quantity
    ///
    /// # Errors
    /// - `UnknownProduct` for an unregistered card
    /// - `ReservationInFlight` if the card already has a request out
    /// - `OutOfStock` if the card shows zero stock
    /// - `Checkout(InFlight)` while an order is being placed
    pub fn begin_add(&mut self, product_id: &ProductId) -> Result<PendingReservation, CartError> {
        if self.checkout_in_flight {
            return Err(CheckoutError::InFlight.into());
        }
        let state = self.card_state_mut(product_id)?;
        if state.busy {
            return Err(CartError::ReservationInFlight(product_id.clone()));
        }
        let stock = state.card.available_stock;
        if stock == 0 {
            return Err(CartError::OutOfStock(product_id.clone()));
        }

        // optimistic; the server has the final word
        let quantity = quantity::clamp(i64::from(state.selector.value()), stock);
        state.busy = true;
        let pending = PendingReservation {
            product_id: product_id.clone(),
            name: state.card.name.clone(),
            unit_price: state.card.unit_price,
            quantity,
        };
        let snapshot = state.snapshot();
        self.view.render_card(&snapshot);
        Ok(pending)
    }

    /// Apply the outcome of a reservation started with [`Self::begin_add`].
    ///
    /// On success the card takes the server's stock, the ledger grows and
    /// the cart is redrawn from one snapshot. On failure nothing but the
    /// busy flag changes.
    ///
    /// # Errors
    /// - `UnknownProduct` / `NoPendingReservation` on a mismatched completion
    /// - `Reservation` carrying the failure
    pub fn complete_add(
        &mut self,
        pending: PendingReservation,
        outcome: Result<StockLevel, ReservationError>,
    ) -> Result<CartTotals, CartError> {
        let state = self.card_state_mut(&pending.product_id)?;
        if !state.busy {
            return Err(CartError::NoPendingReservation(pending.product_id));
        }
        state.busy = false;

        let level = match outcome {
            Ok(level) => level,
            Err(e) => {
                let snapshot = state.snapshot();
                self.view.render_card(&snapshot);
                let message = e.user_message(&self.config.generic_failure_message);
                self.view.notify(&Notice::error(message));
                return Err(e.into());
            }
        };

        state.card.available_stock = level.new_stock;
        state.card.is_low_stock = level.is_low_stock;
        state.selector.reset(level.new_stock);
        let snapshot = state.snapshot();

        let PendingReservation {
            product_id,
            name,
            unit_price,
            quantity,
        } = pending;
        self.ledger
            .add_or_increment(product_id.clone(), name.clone(), unit_price, quantity);

        let frame = self.ledger.render();
        self.view.render_cart(&frame);
        self.view.render_card(&snapshot);
        self.view.notify(&Notice::success(render::added_message(
            &name,
            quantity,
            frame.totals.total,
            &self.config.currency_symbol,
        )));
        tracing::debug!(
            %product_id,
            quantity,
            items = frame.totals.item_count,
            total = %frame.totals.total,
            "cart updated"
        );
        Ok(frame.totals)
    }

    /// Reserve and add the card's selected quantity
    ///
    /// # Errors
    /// Any error from [`Self::begin_add`] or [`Self::complete_add`]
    pub async fn add_to_cart(&mut self, product_id: &ProductId) -> Result<CartTotals, CartError> {
        let pending = self.begin_add(product_id)?;
        let outcome = self
            .reservations
            .reserve(&pending.product_id, pending.quantity)
            .await;
        self.complete_add(pending, outcome)
    }

    /// Drop a whole cart line. Absent lines are a no-op.
    ///
    /// # Errors
    /// `Checkout(InFlight)` while an order is being placed
    pub fn remove(&mut self, product_id: &ProductId) -> Result<CartTotals, CartError> {
        if self.checkout_in_flight {
            return Err(CheckoutError::InFlight.into());
        }
        let removed = self.ledger.remove(product_id);
        let frame = self.ledger.render();
        self.view.render_cart(&frame);
        if let Some(entry) = removed {
            tracing::debug!(%product_id, quantity = entry.quantity, "line removed");
            self.view
                .notify(&Notice::info(format!("Removed {} from cart", entry.name)));
        }
        Ok(frame.totals)
    }

    /// Validate and freeze the cart for checkout
    ///
    /// # Errors
    /// `Checkout` with `InFlight`, `Validation`, `EmptyCart` or `BelowMinimum`,
    /// or `ReservationInFlight` while an add has not been completed
    pub fn begin_checkout(&mut self, customer: CustomerData) -> Result<PendingCheckout, CartError> {
        if self.checkout_in_flight {
            return Err(CheckoutError::InFlight.into());
        }
        if let Some(id) = self.cards.iter().find(|(_, s)| s.busy).map(|(id, _)| id.clone()) {
            return Err(CartError::ReservationInFlight(id));
        }
        match checkout::prepare(&self.ledger, customer, self.config.minimum_order) {
            Ok(request) => {
                self.checkout_in_flight = true;
                Ok(PendingCheckout { request })
            }
            Err(e) => {
                self.notify_checkout_error(&e);
                Err(e.into())
            }
        }
    }

    /// Apply the checkout outcome. Success removes the ordered lines.
    ///
    /// # Errors
    /// `Checkout` carrying the failure
    pub fn complete_checkout(
        &mut self,
        pending: PendingCheckout,
        outcome: Result<OrderSummary, CheckoutError>,
    ) -> Result<OrderSummary, CartError> {
        self.checkout_in_flight = false;
        match outcome {
            Ok(summary) => {
                for id in pending.request.cart_items.keys() {
                    self.ledger.remove(id);
                }
                self.view.render_cart(&self.ledger.render());
                self.view.notify(&Notice::success(format!(
                    "Order #{} placed, total {}",
                    summary.order_id,
                    summary.total.with_symbol(&self.config.currency_symbol)
                )));
                Ok(summary)
            }
            Err(e) => {
                self.notify_checkout_error(&e);
                Err(e.into())
            }
        }
    }

    /// Validate, submit and apply a checkout
    ///
    /// # Errors
    /// Any error from [`Self::begin_checkout`] or [`Self::complete_checkout`]
    pub async fn checkout(&mut self, customer: CustomerData) -> Result<OrderSummary, CartError> {
        let pending = self.begin_checkout(customer)?;
        let outcome = self.orders.submit(pending.request.clone()).await;
        self.complete_checkout(pending, outcome)
    }

    fn notify_checkout_error(&mut self, error: &CheckoutError) {
        let message = error.user_message(
            &self.config.currency_symbol,
            &self.config.generic_failure_message,
        );
        self.view.notify(&Notice::error(message));
    }

    fn card_state_mut(&mut self, product_id: &ProductId) -> Result<&mut CardState, CartError> {
        self.cards
            .get_mut(product_id)
            .ok_or_else(|| CartError::UnknownProduct(product_id.clone()))
    }

    /// Handle for issuing reservations outside the controller borrow
    #[must_use]
    pub fn reservation_client(&self) -> StockReservationClient<A> {
        self.reservations.clone()
    }

    /// Handle for submitting checkouts outside the controller borrow
    #[must_use]
    pub fn checkout_client(&self) -> CheckoutClient<A> {
        self.orders.clone()
    }
}

impl<A, V> CartController<A, V> {
    /// Current ledger
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &CartLedger {
        &self.ledger
    }

    /// Current totals
    #[inline]
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.ledger.recompute_totals()
    }

    /// Current cart frame
    #[inline]
    #[must_use]
    pub fn frame(&self) -> CartFrame {
        self.ledger.render()
    }

    /// Current display state of a card
    #[must_use]
    pub fn card(&self, product_id: &ProductId) -> Option<CardSnapshot> {
        self.cards.get(product_id).map(CardState::snapshot)
    }

    /// Display state of every card, in catalog order
    pub fn cards(&self) -> impl Iterator<Item = CardSnapshot> + '_ {
        self.cards.values().map(CardState::snapshot)
    }

    /// Card as last confirmed by the server
    #[must_use]
    pub fn product(&self, product_id: &ProductId) -> Option<&ProductCard> {
        self.cards.get(product_id).map(|state| &state.card)
    }

    /// Check if an order is being placed
    #[inline]
    #[must_use]
    pub fn checkout_in_flight(&self) -> bool {
        self.checkout_in_flight
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.config
    }

    /// Attached view
    #[inline]
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Attached view, mutably
    #[inline]
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Tear down the session and hand back the view
    #[must_use]
    pub fn into_view(self) -> V {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockStorefrontApi, ReservationResponse};
    use crate::error::TransportError;
    use crate::render::NullView;

    fn p1() -> ProductId {
        ProductId::new("P1")
    }

    fn controller(mock: MockStorefrontApi) -> CartController<MockStorefrontApi, NullView> {
        let mut controller = CartController::new(CartConfig::default(), Arc::new(mock), NullView);
        controller.load_catalog([ProductCard::new("P1", "Sparkler", Money::from_major(100), 10)]);
        controller
    }

    #[tokio::test]
    async fn add_sends_exactly_one_request() {
        let mut mock = MockStorefrontApi::new();
        mock.expect_reserve_stock()
            .times(1)
            .returning(|req| Ok(ReservationResponse::accepted(10 - req.quantity, false)));

        let mut cart = controller(mock);
        cart.set_quantity(&p1(), "2").unwrap();
        let totals = cart.add_to_cart(&p1()).await.unwrap();

        assert_eq!(totals.total, Money::from_major(200));
        assert_eq!(cart.card(&p1()).unwrap().available_stock, 8);
        assert_eq!(cart.card(&p1()).unwrap().selected_quantity, 1);
    }

    #[tokio::test]
    async fn failed_add_restores_card() {
        let mut mock = MockStorefrontApi::new();
        mock.expect_reserve_stock()
            .times(1)
            .returning(|_| Err(TransportError::Timeout { timeout_ms: 10 }));

        let mut cart = controller(mock);
        cart.set_quantity(&p1(), "3").unwrap();
        let before = cart.card(&p1()).unwrap();

        let err = cart.add_to_cart(&p1()).await.unwrap_err();
        assert!(matches!(err, CartError::Reservation(ReservationError::Transport(_))));
        assert_eq!(cart.card(&p1()).unwrap(), before);
        assert!(cart.ledger().is_empty());
    }

    #[test]
    fn second_begin_is_rejected_while_busy() {
        let mut cart = controller(MockStorefrontApi::new());
        let pending = cart.begin_add(&p1()).unwrap();

        assert_eq!(cart.begin_add(&p1()), Err(CartError::ReservationInFlight(p1())));
        assert_eq!(cart.increment(&p1()), Err(CartError::ReservationInFlight(p1())));
        let snapshot = cart.card(&p1()).unwrap();
        assert!(snapshot.busy && !snapshot.add_enabled && !snapshot.selector_enabled);

        cart.complete_add(pending, Ok(StockLevel { new_stock: 9, is_low_stock: true }))
            .unwrap();
        let snapshot = cart.card(&p1()).unwrap();
        assert!(!snapshot.busy && snapshot.add_enabled && snapshot.is_low_stock);
    }

    #[test]
    fn zero_stock_disables_add() {
        let mut cart = controller(MockStorefrontApi::new());
        let pending = cart.begin_add(&p1()).unwrap();
        cart.complete_add(pending, Ok(StockLevel { new_stock: 0, is_low_stock: true }))
            .unwrap();

        let snapshot = cart.card(&p1()).unwrap();
        assert!(!snapshot.add_enabled && !snapshot.increment_enabled && !snapshot.selector_enabled);
        assert_eq!(cart.begin_add(&p1()), Err(CartError::OutOfStock(p1())));
    }

    #[test]
    fn successful_checkout_keeps_lines_added_after_submit() {
        let mut cart = CartController::new(
            CartConfig::new().with_minimum_order(None),
            Arc::new(MockStorefrontApi::new()),
            NullView,
        );
        cart.load_catalog([
            ProductCard::new("P1", "Sparkler", Money::from_major(100), 10),
            ProductCard::new("P2", "Flower pot", Money::from_major(300), 5),
        ]);
        cart.ledger.add_or_increment(ProductId::new("P2"), "Flower pot", Money::from_major(300), 1);

        let customer = CustomerData {
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            delivery_address: "12 Temple Street".into(),
            update_profile: false,
        };
        let pending = cart.begin_checkout(customer.clone()).unwrap();

        // a line the submitted order never saw
        cart.ledger.add_or_increment(p1(), "Sparkler", Money::from_major(100), 2);

        let summary = OrderSummary {
            order_id: 3,
            total: Money::from_major(300),
            customer,
            items: pending.request().cart_items.clone(),
        };
        cart.complete_checkout(pending, Ok(summary)).unwrap();

        assert!(cart.ledger().get(&ProductId::new("P2")).is_none());
        assert_eq!(cart.ledger().get(&p1()).unwrap().quantity, 2);
        assert_eq!(cart.frame().totals.total, Money::from_major(200));
    }

    #[test]
    fn unknown_product_is_reported() {
        let mut cart = controller(MockStorefrontApi::new());
        let ghost = ProductId::new("ghost");
        assert_eq!(cart.begin_add(&ghost), Err(CartError::UnknownProduct(ghost.clone())));
        assert_eq!(cart.increment(&ghost), Err(CartError::UnknownProduct(ghost)));
    }
}
