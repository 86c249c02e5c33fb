//! # Product Types
//!
//! Money and product types for nfc-cart.
//! Prices are exact integer amounts in the smallest currency unit; decimal
//! strings from the catalog are converted once, at the boundary.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    IDR,
    USD,
    EUR,
    GBP,
    JPY,
    SGD,
    MYR,
    PHP,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::IDR => "idr",
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::SGD => "sgd",
            Currency::MYR => "myr",
            Currency::PHP => "php",
        }
    }

    /// Parse a currency code, case-insensitive
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "idr" => Some(Currency::IDR),
            "usd" => Some(Currency::USD),
            "eur" => Some(Currency::EUR),
            "gbp" => Some(Currency::GBP),
            "jpy" => Some(Currency::JPY),
            "sgd" => Some(Currency::SGD),
            "myr" => Some(Currency::MYR),
            "php" => Some(Currency::PHP),
            _ => None,
        }
    }

    /// Returns the number of decimal places for this currency.
    ///
    /// IDR and JPY invoices are issued in whole units.
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::IDR | Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit (cents, etc.)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::IDR => "Rp",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::SGD => "S$",
            Currency::MYR => "RM",
            Currency::PHP => "₱",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::IDR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents for USD, rupiah for IDR)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from smallest unit (cents)
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// A zero amount in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self::from_cents(0, currency)
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Price of `quantity` units, saturating at the `i64` range
    pub fn times(&self, quantity: u32) -> Price {
        Price {
            amount: self.amount.saturating_mul(i64::from(quantity)),
            currency: self.currency,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Format for display (e.g., "$10.00", "Rp12500")
    pub fn display(&self) -> String {
        let symbol = self.currency.symbol();
        if self.currency.decimal_places() == 0 {
            format!("{}{}", symbol, self.amount)
        } else {
            format!("{}{:.2}", symbol, self.as_decimal())
        }
    }
}

/// Parse a catalog price string such as `"12,500"` or `"10.50"`.
///
/// Commas are thousands separators. The conversion is exact: fractional
/// digits beyond the currency's precision must be zeros.
pub fn parse_price(raw: &str, currency: Currency) -> ShopResult<Price> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let invalid = |message: String| ShopError::InvalidPrice { message };

    if cleaned.is_empty() {
        return Err(invalid(format!("empty price string {:?}", raw)));
    }
    if cleaned.starts_with('-') {
        return Err(invalid(format!("negative price {:?}", raw)));
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() || !digits_only(whole) || !digits_only(fraction) {
        return Err(invalid(format!("not a number: {:?}", raw)));
    }

    let places = currency.decimal_places() as usize;
    let (kept, dropped) = if fraction.len() > places {
        fraction.split_at(places)
    } else {
        (fraction, "")
    };
    if dropped.chars().any(|c| c != '0') {
        return Err(invalid(format!(
            "{:?} has more than {} decimal places for {}",
            raw, places, currency
        )));
    }

    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| invalid(format!("amount out of range: {:?}", raw)))?
    };
    let mut minor = format!("{:0<width$}", kept, width = places);
    if minor.is_empty() {
        minor.push('0');
    }
    let minor_units: i64 = minor
        .parse()
        .map_err(|_| invalid(format!("bad fraction in {:?}", raw)))?;

    let amount = whole_units
        .checked_mul(10_i64.pow(places as u32))
        .and_then(|v| v.checked_add(minor_units))
        .ok_or_else(|| invalid(format!("amount out of range: {:?}", raw)))?;

    Ok(Price::from_cents(amount, currency))
}

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier, as written on the NFC tag
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price
    pub price: Price,

    /// Optional image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image_url: None,
        }
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}
