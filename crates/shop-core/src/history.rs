//! # Transaction History
//!
//! Past purchases stored under a user's record, and the receipt shown for one
//! of them.
//!
//! The `transactionHistory` field has been written both as an array and as a
//! map keyed by push id, with numbers sometimes stored as strings. Parsing is
//! lenient: unreadable entries are skipped, unreadable numbers become 0.

use crate::product::{Currency, Price};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One purchased product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub product_name: String,
    pub purchase_date: String,
    /// Unit price in the store's smallest currency unit
    pub price: i64,
    pub quantity: u32,
}

impl Transaction {
    fn from_entry(entry: &Map<String, Value>) -> Self {
        Self {
            product_name: string_field(entry, "productName"),
            purchase_date: string_field(entry, "purchaseDate"),
            price: int_field(entry, "price"),
            quantity: u32::try_from(int_field(entry, "quantity")).unwrap_or(0),
        }
    }
}

fn string_field(entry: &Map<String, Value>, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(entry: &Map<String, Value>, key: &str) -> i64 {
    match entry.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Parse a user's `transactionHistory` value
pub fn parse_transaction_history(value: &Value) -> Vec<Transaction> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item.as_object() {
                Some(entry) => Some(Transaction::from_entry(entry)),
                None => {
                    debug!("Skipping non-object transaction entry: {}", item);
                    None
                }
            })
            .collect(),
        Value::Object(map) => map
            .values()
            .filter_map(Value::as_object)
            .map(Transaction::from_entry)
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!("transactionHistory is neither a list nor a map: {}", other);
            Vec::new()
        }
    }
}

/// Parse the history out of a full user record (`{ username, email, transactionHistory, .. }`)
pub fn history_from_user_record(record: &Value) -> Vec<Transaction> {
    record
        .get("transactionHistory")
        .map(parse_transaction_history)
        .unwrap_or_default()
}

/// Receipt for a single transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub product_name: String,
    pub purchase_date: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub subtotal: Price,
    pub sales_tax: Price,
    pub balance: Price,
}

impl Receipt {
    /// No sales tax is charged, so the balance equals the subtotal
    pub fn for_transaction(transaction: &Transaction, currency: Currency) -> Self {
        let unit_price = Price::from_cents(transaction.price, currency);
        let subtotal = unit_price.times(transaction.quantity);
        let sales_tax = Price::zero(currency);
        Self {
            product_name: transaction.product_name.clone(),
            purchase_date: transaction.purchase_date.clone(),
            quantity: transaction.quantity,
            unit_price,
            subtotal,
            sales_tax,
            balance: Price::from_cents(subtotal.amount.saturating_add(sales_tax.amount), currency),
        }
    }
}
