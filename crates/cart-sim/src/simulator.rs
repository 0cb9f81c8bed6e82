//! Cart session simulator
//!
//! Drives a real [`CartController`] against an [`InMemoryStorefront`] with a
//! seeded random event stream and checks the cart invariants after every
//! step. Same seed, same session.

use crate::storefront::InMemoryStorefront;
use cart_core::{
    CardSnapshot, CartConfig, CartController, CartError, CartFrame, CartLedger, CartTotals,
    CartView, CheckoutError, ConfigError, CustomerData, Money, Notice, ProductCard, ProductId,
};
use indexmap::IndexMap;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: u64,
    /// Stop at the first step that reports a violation
    pub stop_on_first_violation: bool,
    /// Number of product cards on the page
    pub catalog_size: usize,
    /// Upper bound for generated starting stock
    pub max_initial_stock: u32,
    /// Server low-stock threshold
    pub low_stock_threshold: u32,
    /// Fraction of requests lost before reaching the server
    pub transport_failure_rate: f64,
    /// Minimum order total, enforced by both cart and server
    pub minimum_order: Option<Money>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 10_000,
            stop_on_first_violation: false,
            catalog_size: 8,
            max_initial_stock: 40,
            low_stock_threshold: crate::storefront::DEFAULT_LOW_STOCK_THRESHOLD,
            transport_failure_rate: 0.05,
            minimum_order: Some(Money::from_major(3000)),
        }
    }
}

impl SimulatorConfig {
    /// Parse configuration from TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - Any error from [`SimulatorConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog_size == 0 {
            return Err(ConfigError::Invalid("catalog_size must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.transport_failure_rate) {
            return Err(ConfigError::Invalid(format!(
                "transport_failure_rate must be within 0..=1: {}",
                self.transport_failure_rate
            )));
        }
        Ok(())
    }
}

/// Operations the simulator can generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedOperation {
    Increment(ProductId),
    Decrement(ProductId),
    QuantityInput(ProductId, String),
    AddToCart(ProductId),
    RemoveLine(ProductId),
    Checkout { valid_form: bool },
    /// Another shopper takes stock
    Drain(ProductId, u32),
    /// Two adds in flight at once, completed in reverse order
    InterleavedAdd(ProductId, ProductId),
    /// Checkout attempted while an add is still out
    CheckoutDuringAdd(ProductId),
    /// Add for a card that is not on the page
    UnknownProduct(ProductId),
}

impl SimulatedOperation {
    /// Short name for statistics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Increment(_) => "increment",
            Self::Decrement(_) => "decrement",
            Self::QuantityInput(..) => "quantity_input",
            Self::AddToCart(_) => "add_to_cart",
            Self::RemoveLine(_) => "remove_line",
            Self::Checkout { .. } => "checkout",
            Self::Drain(..) => "drain",
            Self::InterleavedAdd(..) => "interleaved_add",
            Self::CheckoutDuringAdd(_) => "checkout_during_add",
            Self::UnknownProduct(_) => "unknown_product",
        }
    }
}

/// Invariants checked after every step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvariantCheck {
    TotalsMatchLines,
    NoEmptyLines,
    ViewShowsCurrentFrame,
    FailedAddLeftStateUnchanged,
    StockConserved,
    CardNeverUndercountsStock,
    NoCardLeftBusy,
    SelectorWithinStock,
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Violation {
    /// Operation outcome didn't match expectation
    UnexpectedOutcome {
        operation_index: u64,
        operation: String,
        details: String,
    },
    /// Invariant was violated
    Invariant {
        operation_index: u64,
        check: InvariantCheck,
        details: String,
    },
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationStats {
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub orders_placed: u64,
    pub operations_by_type: IndexMap<String, u64>,
}

impl OperationStats {
    pub fn record(&mut self, kind: &str, succeeded: bool) {
        self.total_operations += 1;
        *self.operations_by_type.entry(kind.to_string()).or_insert(0) += 1;
        if succeeded {
            self.successful_operations += 1;
        } else {
            self.failed_operations += 1;
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimulatorConfig,
    pub stats: OperationStats,
    pub violations: Vec<Violation>,
    pub final_totals: CartTotals,
    pub final_stock: IndexMap<ProductId, u32>,
}

impl SimulationReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate a text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Cart Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Total Operations: {}", self.stats.total_operations);
        let _ = writeln!(report, "Successful: {}", self.stats.successful_operations);
        let _ = writeln!(report, "Failed: {}", self.stats.failed_operations);
        let _ = writeln!(report, "Orders Placed: {}", self.stats.orders_placed);
        let _ = writeln!(report, "Violations: {}", self.violations.len());
        let _ = writeln!(
            report,
            "Final Cart: {} item(s), total {}",
            self.final_totals.item_count, self.final_totals.total
        );

        report.push_str("\n=== Operations ===\n");
        for (kind, count) in &self.stats.operations_by_type {
            let _ = writeln!(report, "{kind}: {count}");
        }

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// View that keeps the last frame it was shown
#[derive(Debug, Clone, Default)]
pub struct FrameTracker {
    last_frame: Option<CartFrame>,
    last_notice: Option<Notice>,
    frames: u64,
}

impl FrameTracker {
    #[must_use]
    pub fn last_frame(&self) -> Option<&CartFrame> {
        self.last_frame.as_ref()
    }

    #[must_use]
    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl CartView for FrameTracker {
    fn render_cart(&mut self, frame: &CartFrame) {
        self.frames += 1;
        self.last_frame = Some(frame.clone());
    }

    fn render_card(&mut self, _card: &CardSnapshot) {}

    fn notify(&mut self, notice: &Notice) {
        self.last_notice = Some(notice.clone());
    }
}

type SimCart = CartController<InMemoryStorefront, FrameTracker>;

/// Ledger and cards before a step
#[derive(Debug, Clone)]
struct Snapshot {
    ledger: CartLedger,
    cards: IndexMap<ProductId, CardSnapshot>,
}

impl Snapshot {
    fn capture(cart: &SimCart) -> Self {
        Self {
            ledger: cart.ledger().clone(),
            cards: cart
                .cards()
                .map(|card| (card.product_id.clone(), card))
                .collect(),
        }
    }
}

/// Client-side accounting of where stock went
#[derive(Debug, Default)]
struct StockModel {
    initial: IndexMap<ProductId, u32>,
    reserved: IndexMap<ProductId, u64>,
    drained: IndexMap<ProductId, u64>,
}

/// What a step did besides its result
#[derive(Debug)]
struct StepReport {
    result: Result<(), CartError>,
    failed_adds: Vec<ProductId>,
    anomalies: Vec<String>,
}

impl StepReport {
    fn of(result: Result<(), CartError>) -> Self {
        Self {
            result,
            failed_adds: Vec::new(),
            anomalies: Vec::new(),
        }
    }
}

/// Run the cart simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulationReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let catalog = generate_catalog(&mut rng, &config);
    let ids: Vec<ProductId> = catalog.iter().map(|c| c.product_id.clone()).collect();

    let store = Arc::new(
        InMemoryStorefront::new(catalog.clone())
            .with_low_stock_threshold(config.low_stock_threshold)
            .with_minimum_order(config.minimum_order)
            .with_failure_rate(config.transport_failure_rate, config.seed.wrapping_add(1)),
    );
    let cart_config = CartConfig::new().with_minimum_order(config.minimum_order);
    let mut cart = CartController::new(cart_config, Arc::clone(&store), FrameTracker::default());
    cart.load_catalog(catalog);

    let mut model = StockModel {
        initial: store.stock_levels(),
        ..StockModel::default()
    };
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();

    tracing::info!(
        seed = config.seed,
        operations = config.total_operations,
        products = ids.len(),
        "simulation started"
    );

    for index in 0..config.total_operations {
        let operation = generate_operation(&mut rng, &ids);
        let before = Snapshot::capture(&cart);

        let step = execute(&mut cart, &store, &operation, &mut model).await;
        stats.record(operation.kind(), step.result.is_ok());
        if matches!(operation, SimulatedOperation::Checkout { .. }) && step.result.is_ok() {
            stats.orders_placed += 1;
        }

        account_reservations(&operation, &before, &cart, &mut model);

        let mut found: Vec<Violation> = check_outcome(&operation, &before, &cart, &step)
            .into_iter()
            .chain(step.anomalies.iter().cloned())
            .map(|details| Violation::UnexpectedOutcome {
                operation_index: index,
                operation: format!("{operation:?}"),
                details,
            })
            .collect();
        found.extend(
            check_invariants(&before, &cart, &store, &model, &step.failed_adds)
                .into_iter()
                .map(|(check, details)| Violation::Invariant {
                    operation_index: index,
                    check,
                    details,
                }),
        );

        if !found.is_empty() {
            tracing::warn!(index, ?operation, count = found.len(), "violation detected");
            violations.extend(found);
            if config.stop_on_first_violation {
                break;
            }
        }
    }

    tracing::info!(
        passed = violations.is_empty(),
        violations = violations.len(),
        "simulation finished"
    );

    SimulationReport {
        config,
        stats,
        violations,
        final_totals: cart.totals(),
        final_stock: store.stock_levels(),
    }
}

fn generate_catalog(rng: &mut StdRng, config: &SimulatorConfig) -> Vec<ProductCard> {
    (1..=config.catalog_size.max(1))
        .map(|n| {
            let stock = rng.gen_range(0..=config.max_initial_stock);
            // 10.00 to 750.00 in steps of 0.50
            let price = Money::from_minor(rng.gen_range(20..=1500) * 50);
            let card = ProductCard::new(format!("P{n}"), format!("Product {n}"), price, stock);
            if stock < config.low_stock_threshold {
                card.low_stock()
            } else {
                card
            }
        })
        .collect()
}

fn generate_operation(rng: &mut StdRng, ids: &[ProductId]) -> SimulatedOperation {
    let pick = |rng: &mut StdRng| ids[rng.gen_range(0..ids.len())].clone();

    match rng.gen_range(0..100) {
        0..=14 => SimulatedOperation::Increment(pick(rng)),
        15..=24 => SimulatedOperation::Decrement(pick(rng)),
        25..=39 => {
            let raw = match rng.gen_range(0..6) {
                0 => "abc".to_string(),
                1 => String::new(),
                2 => format!("{}.7", rng.gen_range(0..10)),
                3 => "1e9".to_string(),
                _ => rng.gen_range(-5..=60).to_string(),
            };
            SimulatedOperation::QuantityInput(pick(rng), raw)
        }
        40..=69 => SimulatedOperation::AddToCart(pick(rng)),
        70..=77 => SimulatedOperation::RemoveLine(pick(rng)),
        78..=83 => SimulatedOperation::Checkout {
            valid_form: rng.gen_bool(0.8),
        },
        84..=89 => SimulatedOperation::Drain(pick(rng), rng.gen_range(1..=5)),
        90..=93 => SimulatedOperation::InterleavedAdd(pick(rng), pick(rng)),
        94..=97 => SimulatedOperation::CheckoutDuringAdd(pick(rng)),
        _ => SimulatedOperation::UnknownProduct(ProductId::new(format!(
            "missing-{}",
            rng.gen_range(0..1000)
        ))),
    }
}

fn customer(valid_form: bool) -> CustomerData {
    CustomerData {
        full_name: "Simulated Shopper".to_string(),
        email: "shopper@example.com".to_string(),
        phone: if valid_form { "9000000000" } else { "12345" }.to_string(),
        delivery_address: "1 Market Street".to_string(),
        update_profile: false,
    }
}

async fn execute(
    cart: &mut SimCart,
    store: &InMemoryStorefront,
    operation: &SimulatedOperation,
    model: &mut StockModel,
) -> StepReport {
    match operation {
        SimulatedOperation::Increment(id) => StepReport::of(cart.increment(id).map(drop)),
        SimulatedOperation::Decrement(id) => StepReport::of(cart.decrement(id).map(drop)),
        SimulatedOperation::QuantityInput(id, raw) => {
            StepReport::of(cart.set_quantity(id, raw).map(drop))
        }
        SimulatedOperation::AddToCart(id) | SimulatedOperation::UnknownProduct(id) => {
            let result = cart.add_to_cart(id).await.map(drop);
            let failed_adds = if result.is_err() { vec![id.clone()] } else { Vec::new() };
            StepReport {
                result,
                failed_adds,
                anomalies: Vec::new(),
            }
        }
        SimulatedOperation::RemoveLine(id) => StepReport::of(cart.remove(id).map(drop)),
        SimulatedOperation::Checkout { valid_form } => {
            StepReport::of(cart.checkout(customer(*valid_form)).await.map(drop))
        }
        SimulatedOperation::Drain(id, quantity) => {
            let taken = store.drain(id, *quantity);
            *model.drained.entry(id.clone()).or_insert(0) += u64::from(taken);
            StepReport::of(Ok(()))
        }
        SimulatedOperation::InterleavedAdd(first, second) => interleaved_add(cart, first, second).await,
        SimulatedOperation::CheckoutDuringAdd(id) => checkout_during_add(cart, id).await,
    }
}

async fn checkout_during_add(cart: &mut SimCart, id: &ProductId) -> StepReport {
    let mut report = StepReport::of(Ok(()));

    let pending_add = match cart.begin_add(id) {
        Ok(pending) => pending,
        Err(e) => {
            report.failed_adds.push(id.clone());
            report.result = Err(e);
            return report;
        }
    };
    match cart.begin_checkout(customer(true)) {
        Err(CartError::ReservationInFlight(busy)) if &busy == id => {}
        Ok(pending) => {
            report
                .anomalies
                .push(format!("checkout started while {id} was reserving"));
            let _ = cart.complete_checkout(pending, Err(CheckoutError::InFlight));
        }
        Err(e) => report
            .anomalies
            .push(format!("checkout during add on {id} returned {e:?}")),
    }

    let outcome = cart
        .reservation_client()
        .reserve(pending_add.product_id(), pending_add.quantity())
        .await;
    if let Err(e) = cart.complete_add(pending_add, outcome) {
        report.failed_adds.push(id.clone());
        report.result = Err(e);
    }
    report
}

async fn interleaved_add(cart: &mut SimCart, first: &ProductId, second: &ProductId) -> StepReport {
    let mut report = StepReport::of(Ok(()));

    let pending_first = match cart.begin_add(first) {
        Ok(pending) => pending,
        Err(e) => {
            report.failed_adds.push(first.clone());
            report.result = Err(e);
            return report;
        }
    };
    match cart.begin_add(first) {
        Err(CartError::ReservationInFlight(_)) => {}
        other => report
            .anomalies
            .push(format!("second add on busy card {first} returned {other:?}")),
    }
    let pending_second = if second == first {
        None
    } else {
        match cart.begin_add(second) {
            Ok(pending) => Some(pending),
            Err(_) => {
                report.failed_adds.push(second.clone());
                None
            }
        }
    };

    let client = cart.reservation_client();
    let outcome_first = client
        .reserve(pending_first.product_id(), pending_first.quantity())
        .await;
    if let Some(pending) = pending_second {
        let outcome = client.reserve(pending.product_id(), pending.quantity()).await;
        if cart.complete_add(pending, outcome).is_err() {
            report.failed_adds.push(second.clone());
        }
    }
    if let Err(e) = cart.complete_add(pending_first, outcome_first) {
        report.failed_adds.push(first.clone());
        report.result = Err(e);
    }
    report
}

fn quantity_in(ledger: &CartLedger, id: &ProductId) -> u32 {
    ledger.get(id).map_or(0, |entry| entry.quantity)
}

fn account_reservations(
    operation: &SimulatedOperation,
    before: &Snapshot,
    cart: &SimCart,
    model: &mut StockModel,
) {
    let touched: Vec<&ProductId> = match operation {
        SimulatedOperation::AddToCart(id) | SimulatedOperation::CheckoutDuringAdd(id) => vec![id],
        SimulatedOperation::InterleavedAdd(a, b) if a == b => vec![a],
        SimulatedOperation::InterleavedAdd(a, b) => vec![a, b],
        _ => return,
    };
    for id in touched {
        let added = quantity_in(cart.ledger(), id).saturating_sub(quantity_in(&before.ledger, id));
        *model.reserved.entry(id.clone()).or_insert(0) += u64::from(added);
    }
}

fn check_outcome(
    operation: &SimulatedOperation,
    before: &Snapshot,
    cart: &SimCart,
    step: &StepReport,
) -> Vec<String> {
    let mut problems = Vec::new();
    let result = &step.result;

    match operation {
        SimulatedOperation::Increment(_)
        | SimulatedOperation::Decrement(_)
        | SimulatedOperation::QuantityInput(..)
        | SimulatedOperation::RemoveLine(_) => {
            if let Err(e) = result {
                problems.push(format!("expected success, got {e:?}"));
            }
        }
        SimulatedOperation::AddToCart(id) | SimulatedOperation::CheckoutDuringAdd(id) => {
            let shown = before.cards.get(id).map_or(0, |card| card.available_stock);
            match result {
                Err(CartError::OutOfStock(_)) if shown == 0 => {}
                Err(e) if shown == 0 => problems.push(format!("expected OutOfStock, got {e:?}")),
                Ok(()) if shown == 0 => problems.push("add succeeded on an empty card".to_string()),
                Err(e) if !e.is_remote() => {
                    problems.push(format!("local failure on an available card: {e:?}"));
                }
                _ => {}
            }
        }
        SimulatedOperation::UnknownProduct(_) => {
            if !matches!(result, Err(CartError::UnknownProduct(_))) {
                problems.push(format!("expected UnknownProduct, got {result:?}"));
            }
        }
        SimulatedOperation::Checkout { valid_form } => {
            if !valid_form
                && !matches!(result, Err(CartError::Checkout(CheckoutError::Validation(_))))
            {
                problems.push(format!("invalid form was not rejected: {result:?}"));
            }
            match result {
                Ok(()) if !cart.ledger().is_empty() => {
                    problems.push("cart not emptied after order".to_string());
                }
                Err(_) if cart.ledger() != &before.ledger => {
                    problems.push("failed checkout changed the cart".to_string());
                }
                _ => {}
            }
        }
        SimulatedOperation::Drain(..) | SimulatedOperation::InterleavedAdd(..) => {}
    }
    problems
}

fn check_invariants(
    before: &Snapshot,
    cart: &SimCart,
    store: &InMemoryStorefront,
    model: &StockModel,
    failed_adds: &[ProductId],
) -> Vec<(InvariantCheck, String)> {
    let mut found = Vec::new();
    let ledger = cart.ledger();

    let fresh = ledger.iter().fold(CartTotals::default(), |acc, (_, entry)| CartTotals {
        total: acc
            .total
            .saturating_add(entry.unit_price.times(u64::from(entry.quantity))),
        item_count: acc.item_count + u64::from(entry.quantity),
    });
    if cart.totals() != fresh {
        found.push((
            InvariantCheck::TotalsMatchLines,
            format!("reported {:?}, lines sum to {fresh:?}", cart.totals()),
        ));
    }

    if let Some((id, _)) = ledger.iter().find(|(_, entry)| entry.quantity == 0) {
        found.push((InvariantCheck::NoEmptyLines, format!("line {id} has quantity 0")));
    }

    if cart.view().last_frame() != Some(&cart.frame()) {
        found.push((
            InvariantCheck::ViewShowsCurrentFrame,
            format!("view shows {:?}", cart.view().last_frame().map(|f| f.totals)),
        ));
    }

    for id in failed_adds {
        if ledger.get(id) != before.ledger.get(id) || cart.card(id).as_ref() != before.cards.get(id) {
            found.push((
                InvariantCheck::FailedAddLeftStateUnchanged,
                format!("failed add for {id} changed the cart or card"),
            ));
        }
    }

    let server = store.stock_levels();
    for (id, &initial) in &model.initial {
        let now = server.get(id).copied().unwrap_or(0);
        let reserved = model.reserved.get(id).copied().unwrap_or(0);
        let drained = model.drained.get(id).copied().unwrap_or(0);
        if u64::from(initial - now.min(initial)) != reserved + drained {
            found.push((
                InvariantCheck::StockConserved,
                format!(
                    "{id}: initial {initial}, server {now}, reserved {reserved}, drained {drained}"
                ),
            ));
        }
    }

    for card in cart.cards() {
        let server_stock = server.get(&card.product_id).copied().unwrap_or(0);
        if card.available_stock < server_stock {
            found.push((
                InvariantCheck::CardNeverUndercountsStock,
                format!(
                    "{} shows {} but server has {server_stock}",
                    card.product_id, card.available_stock
                ),
            ));
        }
        if card.busy {
            found.push((
                InvariantCheck::NoCardLeftBusy,
                format!("{} still busy", card.product_id),
            ));
        }
        let ceiling = card.available_stock.max(1);
        if !(1..=ceiling).contains(&card.selected_quantity) {
            found.push((
                InvariantCheck::SelectorWithinStock,
                format!(
                    "{} selects {} with {} in stock",
                    card.product_id, card.selected_quantity, card.available_stock
                ),
            ));
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64, operations: u64) -> SimulatorConfig {
        SimulatorConfig {
            seed,
            total_operations: operations,
            ..SimulatorConfig::default()
        }
    }

    #[tokio::test]
    async fn default_session_passes() {
        let report = run_simulator(small(42, 2_000)).await;
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.total_operations, 2_000);
    }

    #[tokio::test]
    async fn same_seed_same_session() {
        let a = run_simulator(small(7, 500)).await;
        let b = run_simulator(small(7, 500)).await;
        assert_eq!(a.final_totals, b.final_totals);
        assert_eq!(a.final_stock, b.final_stock);
        assert_eq!(a.stats.operations_by_type, b.stats.operations_by_type);
    }

    #[tokio::test]
    async fn every_operation_kind_is_exercised() {
        let report = run_simulator(small(3, 3_000)).await;
        for kind in [
            "increment",
            "decrement",
            "quantity_input",
            "add_to_cart",
            "remove_line",
            "checkout",
            "drain",
            "interleaved_add",
            "checkout_during_add",
            "unknown_product",
        ] {
            assert!(
                report.stats.operations_by_type.contains_key(kind),
                "{kind} never generated"
            );
        }
    }

    #[test]
    fn config_rejects_bad_rates() {
        let config = SimulatorConfig {
            transport_failure_rate: 1.5,
            ..SimulatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SimulatorConfig {
            catalog_size: 0,
            ..SimulatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_from_toml_keeps_defaults() {
        let config = SimulatorConfig::from_toml_str("seed = 9\ntotal_operations = 50\n").unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.total_operations, 50);
        assert_eq!(config.catalog_size, SimulatorConfig::default().catalog_size);
    }

    #[test]
    fn report_text_names_result() {
        let report = SimulationReport {
            config: SimulatorConfig::default(),
            stats: OperationStats::default(),
            violations: vec![Violation::Invariant {
                operation_index: 3,
                check: InvariantCheck::StockConserved,
                details: "P1".to_string(),
            }],
            final_totals: CartTotals::default(),
            final_stock: IndexMap::new(),
        };
        let text = report.generate_text();
        assert!(!report.passed());
        assert!(text.contains("StockConserved"));
        assert!(text.contains("=== Result: FAIL ==="));
    }
}
