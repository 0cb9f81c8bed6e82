//! Storefront Cart Simulator
//!
//! Server side of the cart, held in memory, and a seeded session driver:
//! - **InMemoryStorefront**: authoritative stock, checkout validation, order book
//! - **run_simulator**: random event streams through a real controller with
//!   invariant checks after every step
//! - **run_demo**: a short scripted session rendered as text

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod demo;
pub mod simulator;
pub mod storefront;

pub use demo::{demo_catalog, run_demo, ConsoleView};
pub use simulator::{
    run_simulator, FrameTracker, InvariantCheck, OperationStats, SimulatedOperation,
    SimulationReport, SimulatorConfig, Violation,
};
pub use storefront::{InMemoryStorefront, DEFAULT_LOW_STOCK_THRESHOLD};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
