//! Core types for the cart
//!
//! Defines the fundamental value types shared by every layer:
//! - Product identifiers and money amounts
//! - Server-rendered product cards
//! - Cart configuration

use crate::error::{ConfigError, MoneyError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Opaque product identifier as rendered by the server
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create new product ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Non-negative decimal amount with two fractional digits.
///
/// Held as integer minor units so totals never accumulate rounding drift.
/// Arithmetic saturates at `u64::MAX` minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Money = Money(0);

    /// Minor units per major unit
    pub const SCALE: u64 = 100;

    /// Create from minor units (paise, cents)
    #[inline]
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Create from whole major units
    #[inline]
    #[must_use]
    pub const fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(Self::SCALE))
    }

    /// Amount in minor units
    #[inline]
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Multiply by a quantity
    #[inline]
    #[must_use]
    pub const fn times(self, quantity: u64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }

    /// Add another amount
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, other: Money) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtract another amount, floored at zero
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, other: Money) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Check for zero
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Format with a currency symbol, e.g. `₹100.00`
    #[must_use]
    pub fn with_symbol(self, symbol: &str) -> String {
        format!("{symbol}{self}")
    }

    fn from_f64(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        if value < 0.0 {
            return Err(MoneyError::Negative(value.to_string()));
        }
        #[allow(clippy::cast_precision_loss)]
        let scaled = value * Self::SCALE as f64;
        // binary noise such as 0.07 * 100 = 7.000000000000001 is tolerated
        let tolerance = 1e-6_f64.max(scaled * f64::EPSILON * 4.0);
        if (scaled - scaled.round()).abs() > tolerance {
            return Err(MoneyError::TooPrecise(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minor = scaled.round() as u64;
        Ok(Self(minor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(MoneyError::Negative(trimmed.to_string()));
        }

        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };
        if frac.len() > 2 {
            return Err(MoneyError::TooPrecise(trimmed.to_string()));
        }
        let digits_ok = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_ok(whole) || !digits_ok(frac) {
            return Err(MoneyError::Malformed(trimmed.to_string()));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| MoneyError::Malformed(trimmed.to_string()))?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse().unwrap_or(0),
        };

        whole
            .checked_mul(Self::SCALE)
            .and_then(|minor| minor.checked_add(frac))
            .map(Self)
            .ok_or_else(|| MoneyError::Malformed(trimmed.to_string()))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % Self::SCALE == 0 {
            serializer.serialize_u64(self.0 / Self::SCALE)
        } else {
            #[allow(clippy::cast_precision_loss)]
            let major = self.0 as f64 / Self::SCALE as f64;
            serializer.serialize_f64(major)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal amount as a number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                Ok(Money::from_major(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                u64::try_from(v)
                    .map(Money::from_major)
                    .map_err(|_| E::custom(MoneyError::Negative(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Money::from_f64(v).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Product card as rendered by the server (read-only to the cart)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCard {
    /// Product identifier
    pub product_id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price
    pub unit_price: Money,
    /// Stock currently displayed on the card
    pub available_stock: u32,
    /// Low-stock marker
    #[serde(default)]
    pub is_low_stock: bool,
}

impl ProductCard {
    /// Create new product card
    #[inline]
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        available_stock: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            available_stock,
            is_low_stock: false,
        }
    }

    /// Mark as low stock
    #[inline]
    #[must_use]
    pub fn low_stock(mut self) -> Self {
        self.is_low_stock = true;
        self
    }
}

/// Cart configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Base URL of the storefront server
    pub api_base_url: String,
    /// Path of the stock reservation endpoint
    pub reservation_path: String,
    /// Path of the checkout endpoint
    pub checkout_path: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// CSRF token forwarded with every request
    pub csrf_token: Option<String>,
    /// Currency symbol used for display
    pub currency_symbol: String,
    /// Minimum cart total accepted at checkout
    pub minimum_order: Option<Money>,
    /// Message shown when a request fails without a server reason
    pub generic_failure_message: String,
}

impl CartConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With minimum order amount (`None` disables the check)
    #[inline]
    #[must_use]
    pub fn with_minimum_order(mut self, minimum: Option<Money>) -> Self {
        self.minimum_order = minimum;
        self
    }

    /// With CSRF token
    #[inline]
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

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
    /// - Any error from [`CartConfig::from_toml_str`]
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
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        for (field, path) in [
            ("reservation_path", &self.reservation_path),
            ("checkout_path", &self.checkout_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{field} must start with '/': {path}"
                )));
            }
        }
        if self.generic_failure_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "generic_failure_message must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL of the stock reservation endpoint
    #[must_use]
    pub fn reservation_url(&self) -> String {
        join_url(&self.api_base_url, &self.reservation_path)
    }

    /// Full URL of the checkout endpoint
    #[must_use]
    pub fn checkout_url(&self) -> String {
        join_url(&self.api_base_url, &self.checkout_path)
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            reservation_path: "/update-stock/".to_string(),
            checkout_path: "/checkout/".to_string(),
            request_timeout_ms: 10_000,
            csrf_token: None,
            currency_symbol: "₹".to_string(),
            minimum_order: Some(Money::from_major(3000)),
            generic_failure_message: "Could not update the cart. Please try again.".to_string(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_parses_decimal_strings() {
        assert_eq!("100".parse::<Money>().unwrap(), Money::from_minor(10_000));
        assert_eq!("100.5".parse::<Money>().unwrap(), Money::from_minor(10_050));
        assert_eq!("0.07".parse::<Money>().unwrap(), Money::from_minor(7));
        assert_eq!(".25".parse::<Money>().unwrap(), Money::from_minor(25));
    }

    #[test]
    fn money_rejects_bad_input() {
        assert!(matches!("-1".parse::<Money>(), Err(MoneyError::Negative(_))));
        assert!(matches!("1.234".parse::<Money>(), Err(MoneyError::TooPrecise(_))));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Malformed(_))));
        assert!(matches!("".parse::<Money>(), Err(MoneyError::Empty)));
        assert!(matches!(".".parse::<Money>(), Err(MoneyError::Malformed(_))));
    }

    #[test]
    fn money_display_and_symbol() {
        let amount = Money::from_minor(123_405);
        assert_eq!(amount.to_string(), "1234.05");
        assert_eq!(amount.with_symbol("₹"), "₹1234.05");
    }

    #[test]
    fn money_json_accepts_numbers_and_strings() {
        let from_int: Money = serde_json::from_str("55").unwrap();
        let from_float: Money = serde_json::from_str("55.5").unwrap();
        let from_str: Money = serde_json::from_str("\"55.50\"").unwrap();
        assert_eq!(from_int, Money::from_major(55));
        assert_eq!(from_float, Money::from_minor(5_550));
        assert_eq!(from_str, from_float);
        assert!(serde_json::from_str::<Money>("-3").is_err());
    }

    #[test]
    fn money_json_rejects_sub_paise_numbers() {
        let err = serde_json::from_str::<Money>("10.005").unwrap_err();
        assert!(err.to_string().contains("10.005"));
        assert!(serde_json::from_str::<Money>("\"10.005\"").is_err());

        let tiny: Money = serde_json::from_str("0.07").unwrap();
        assert_eq!(tiny, Money::from_minor(7));
        let cents: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(cents, Money::from_minor(1_999));
    }

    #[test]
    fn money_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Money::from_major(200)).unwrap(), "200");
        assert_eq!(serde_json::to_string(&Money::from_minor(1_050)).unwrap(), "10.5");
    }

    #[test]
    fn money_sum_and_times() {
        let total: Money = [Money::from_major(100).times(2), Money::from_minor(50)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_minor(20_050));
        assert_eq!(Money::from_minor(u64::MAX).times(2), Money::from_minor(u64::MAX));
    }

    #[test]
    fn config_defaults_validate() {
        let config = CartConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reservation_url(), "http://127.0.0.1:8000/update-stock/");
        assert_eq!(config.minimum_order, Some(Money::from_major(3000)));
    }

    #[test]
    fn config_from_toml_overrides_fields() {
        let config = CartConfig::from_toml_str(
            r#"
            api_base_url = "https://shop.example/"
            minimum_order = "1500.50"
            request_timeout_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(config.checkout_url(), "https://shop.example/checkout/");
        assert_eq!(config.minimum_order, Some(Money::from_minor(150_050)));
        assert_eq!(config.request_timeout_ms, 2500);
        assert_eq!(config.currency_symbol, "₹");
    }

    #[test]
    fn config_rejects_invalid_values() {
        let err = CartConfig::from_toml_str("request_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CartConfig::from_toml_str("checkout_path = \"checkout\"").unwrap_err();
        assert!(err.to_string().contains("checkout_path"));

        let err = CartConfig::from_toml_str("request_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
