pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` body of a computation envelope, or the value itself.
pub(crate) fn result_body(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Flatten nested objects into dotted keys. Arrays are left whole.
pub(crate) fn flatten(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into("", map, &mut out);
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&name, inner, out),
            other => out.push((name, other.clone())),
        }
    }
}

/// Arrays of objects in the result, in field order: schedules, projections, scenarios.
pub(crate) fn row_tables(map: &Map<String, Value>) -> Vec<(&str, &[Value])> {
    map.iter()
        .filter_map(|(key, val)| match val {
            Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
                Some((key.as_str(), rows.as_slice()))
            }
            _ => None,
        })
        .collect()
}

/// Render a scalar the way every text formatter shows it.
pub(crate) fn scalar_text(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
            .iter()
            .map(|v| scalar_text(v, null))
            .collect::<Vec<_>>()
            .join(", "),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_uses_dotted_keys() {
        let v = json!({ "ratios": { "cap_rate": "7.2", "dscr": null }, "irr": "10" });
        let flat = flatten(v.as_object().unwrap());
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"ratios.cap_rate"));
        assert!(keys.contains(&"ratios.dscr"));
        assert!(keys.contains(&"irr"));
    }

    #[test]
    fn test_row_tables_skip_scalar_arrays() {
        let v = json!({ "cash_flow_vector": ["-100", "110"], "yearly": [{ "year": 1 }] });
        let tables = row_tables(v.as_object().unwrap());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, "yearly");
    }

    #[test]
    fn test_scalar_text_joins_plain_arrays() {
        assert_eq!(scalar_text(&json!(["-100", "110"]), ""), "-100, 110");
        assert_eq!(scalar_text(&Value::Null, "-"), "-");
    }
}
