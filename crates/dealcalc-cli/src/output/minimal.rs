use serde_json::{Map, Value};

use super::{result_body, scalar_text};

/// Headline figures, most specific first.
const PRIORITY_KEYS: [&str; 9] = [
    "irr",
    "recommended_valuation",
    "max_loan_amount",
    "cash_on_cash",
    "monthly_payment",
    "cap_rate",
    "net_operating_income",
    "rate_pct",
    "annual_debt_service",
];

/// Print just the headline number of a computation.
///
/// Looks for a priority key at the top of the result, then one level down
/// (`ratios.cap_rate`, `roi.cash_on_cash`), then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result = result_body(value);

    if let Value::Object(map) = result {
        if let Some(val) = headline(map) {
            println!("{}", scalar_text(val, "null"));
            return;
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar_text(val, "null"));
            return;
        }
    }

    println!("{}", scalar_text(result, "null"));
}

fn headline(map: &Map<String, Value>) -> Option<&Value> {
    for key in PRIORITY_KEYS {
        if let Some(val) = found(map, key) {
            return Some(val);
        }
    }
    for key in PRIORITY_KEYS {
        for inner in map.values().filter_map(Value::as_object) {
            if let Some(val) = found(inner, key) {
                return Some(val);
            }
        }
    }
    None
}

fn found<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null() && !v.is_object())
}
