// Order-form parsing: names, prices and the seven form slots

use std::collections::HashMap;

/// Maximum number of people on one coffee trip (one per form row).
pub const MAX_PARTICIPANTS: usize = 7;

/// Ledger key for a name: spaces removed, lowercased.
///
/// "Miles Yang", "miles yang" and "MilesYang" all map to "milesyang".
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parses a coffee price. Only finite, non-negative numbers are accepted.
pub fn parse_price(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// One row of the order form, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSlot {
    pub name: Option<String>,
    pub price: Option<String>,
}

impl OrderSlot {
    pub fn new(name: &str, price: &str) -> Self {
        OrderSlot {
            name: Some(name.to_string()),
            price: Some(price.to_string()),
        }
    }

    /// Parses a CLI-style `name=price` pair. A missing `=` leaves the price empty.
    pub fn from_pair(pair: &str) -> Self {
        match pair.rsplit_once('=') {
            Some((name, price)) => OrderSlot::new(name, price),
            None => OrderSlot {
                name: Some(pair.to_string()),
                price: None,
            },
        }
    }
}

/// Form field names for slot `index` (1-based).
pub fn field_names(index: usize) -> (String, String) {
    (
        format!("person{}Name", index),
        format!("person{}Price", index),
    )
}

/// Extracts the seven `person{N}Name` / `person{N}Price` slots from decoded form fields.
pub fn slots_from_form(form: &HashMap<String, String>) -> Vec<OrderSlot> {
    (1..=MAX_PARTICIPANTS)
        .map(|index| {
            let (name_key, price_key) = field_names(index);
            OrderSlot {
                name: form.get(&name_key).cloned(),
                price: form.get(&price_key).cloned(),
            }
        })
        .collect()
}
