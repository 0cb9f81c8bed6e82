//! Quantity selector policy
//!
//! Every interactive change is clamped to `[1, available_stock]`. Values
//! below 1 and non-numeric input become 1; values above the stock become the
//! stock. With zero stock the selector is disabled.

use serde::{Deserialize, Serialize};

/// Parse raw text from the quantity field and clamp it
#[must_use]
pub fn clamp_input(raw: &str, available_stock: u32) -> u32 {
    clamp(parse_quantity(raw), available_stock)
}

/// Clamp a signed value into `[1, available_stock]`.
///
/// Returns 1 when the stock is zero; the caller disables the control.
#[must_use]
pub fn clamp(value: i64, available_stock: u32) -> u32 {
    let upper = i64::from(available_stock.max(1));
    // bounded by upper, which fits u32
    u32::try_from(value.clamp(1, upper)).unwrap_or(1)
}

/// Leading-integer parse in the manner of a numeric form field.
/// Fractions truncate, anything unparsable is treated as 0.
fn parse_quantity(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        #[allow(clippy::cast_possible_truncation)]
        Ok(value) if value.is_finite() => value.trunc() as i64,
        Ok(value) if value == f64::INFINITY => i64::MAX,
        _ => 0,
    }
}

/// Outcome of an interactive selector change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    /// Value now shown
    pub value: u32,
    /// The requested value was out of bounds and got corrected
    pub corrected: bool,
}

/// Per-card quantity control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantitySelector {
    value: u32,
    max: u32,
}

impl QuantitySelector {
    /// Create selector at 1 for the given stock
    #[inline]
    #[must_use]
    pub fn new(available_stock: u32) -> Self {
        Self {
            value: 1,
            max: available_stock,
        }
    }

    /// Current value
    #[inline]
    #[must_use]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Upper bound (displayed stock)
    #[inline]
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Selector accepts input only while stock remains
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max > 0
    }

    /// Increment is possible
    #[inline]
    #[must_use]
    pub fn can_increment(&self) -> bool {
        self.is_enabled() && self.value < self.max
    }

    /// Decrement is possible
    #[inline]
    #[must_use]
    pub fn can_decrement(&self) -> bool {
        self.is_enabled() && self.value > 1
    }

    /// Step up by one
    pub fn increment(&mut self) -> Adjustment {
        self.apply(i64::from(self.value) + 1)
    }

    /// Step down by one
    pub fn decrement(&mut self) -> Adjustment {
        self.apply(i64::from(self.value) - 1)
    }

    /// Direct numeric entry
    pub fn set_raw(&mut self, raw: &str) -> Adjustment {
        self.apply(parse_quantity(raw))
    }

    /// Replace the bound with a new stock level and reset to 1
    pub fn reset(&mut self, available_stock: u32) {
        self.max = available_stock;
        self.value = 1;
    }

    fn apply(&mut self, requested: i64) -> Adjustment {
        let value = clamp(requested, self.max);
        let corrected = i64::from(value) != requested;
        if corrected {
            tracing::debug!(requested, value, max = self.max, "quantity clamped");
        }
        self.value = value;
        Adjustment { value, corrected }
    }
}
