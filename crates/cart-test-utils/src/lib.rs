//! Testing utilities for the cart workspace
//!
//! Shared fixtures: a scripted storefront, a recording view and sample data.

#![allow(missing_docs)]

use async_trait::async_trait;
use cart_core::{
    CardSnapshot, CartConfig, CartController, CartFrame, CartView, CheckoutRequest,
    CheckoutResponse, CustomerData, Money, Notice, ProductCard, ReservationRequest,
    ReservationResponse, StorefrontApi, TransportError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Storefront that answers from pre-loaded responses and records every request.
///
/// Running out of scripted responses yields a network error.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    reservations: Mutex<VecDeque<Result<ReservationResponse, TransportError>>>,
    checkouts: Mutex<VecDeque<Result<CheckoutResponse, TransportError>>>,
    reservation_log: Mutex<Vec<ReservationRequest>>,
    checkout_log: Mutex<Vec<CheckoutRequest>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reservation(&self, response: Result<ReservationResponse, TransportError>) -> &Self {
        self.reservations.lock().push_back(response);
        self
    }

    pub fn push_checkout(&self, response: Result<CheckoutResponse, TransportError>) -> &Self {
        self.checkouts.lock().push_back(response);
        self
    }

    pub fn reservation_requests(&self) -> Vec<ReservationRequest> {
        self.reservation_log.lock().clone()
    }

    pub fn checkout_requests(&self) -> Vec<CheckoutRequest> {
        self.checkout_log.lock().clone()
    }
}

#[async_trait]
impl StorefrontApi for ScriptedApi {
    async fn reserve_stock(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationResponse, TransportError> {
        self.reservation_log.lock().push(request);
        self.reservations
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }

    async fn submit_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, TransportError> {
        self.checkout_log.lock().push(request);
        self.checkouts
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
    }
}

/// Everything a view was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    Cart(CartFrame),
    Card(CardSnapshot),
    Notice(Notice),
}

/// View that records calls
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    pub calls: Vec<ViewCall>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&CartFrame> {
        self.calls.iter().rev().find_map(|call| match call {
            ViewCall::Cart(frame) => Some(frame),
            _ => None,
        })
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.calls.iter().rev().find_map(|call| match call {
            ViewCall::Notice(notice) => Some(notice),
            _ => None,
        })
    }

    pub fn frames(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, ViewCall::Cart(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl CartView for RecordingView {
    fn render_cart(&mut self, frame: &CartFrame) {
        self.calls.push(ViewCall::Cart(frame.clone()));
    }

    fn render_card(&mut self, card: &CardSnapshot) {
        self.calls.push(ViewCall::Card(card.clone()));
    }

    fn notify(&mut self, notice: &Notice) {
        self.calls.push(ViewCall::Notice(notice.clone()));
    }
}

pub fn sample_catalog() -> Vec<ProductCard> {
    vec![
        ProductCard::new("P1", "10 CM ELECTRIC SPARKLER", Money::from_major(100), 10),
        ProductCard::new("P2", "FLOWER POT BIG (10 PCS)", Money::from_major(300), 5),
        ProductCard::new("P3", "DISCO WHEEL (10 PCS)", Money::from_major(840), 3).low_stock(),
        ProductCard::new("P4", "RED BIJILI (100 PCS)", Money::from_major(130), 0),
    ]
}

pub fn sample_customer() -> CustomerData {
    CustomerData {
        full_name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "9876543210".into(),
        delivery_address: "12 Temple Street, Sivakasi".into(),
        update_profile: false,
    }
}

/// Controller over a scripted api with a recording view and the sample catalog
pub fn setup_cart(
    config: CartConfig,
) -> (Arc<ScriptedApi>, CartController<ScriptedApi, RecordingView>) {
    let api = Arc::new(ScriptedApi::new());
    let mut cart = CartController::new(config, Arc::clone(&api), RecordingView::new());
    cart.load_catalog(sample_catalog());
    cart.view_mut().clear();
    (api, cart)
}
