use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, result_body, row_tables, scalar_text};

/// Summary table of the scalar results, then one table per schedule.
pub fn print_table(value: &Value) {
    match result_body(value) {
        Value::Object(result) => {
            print_summary(result);
            for (name, rows) in row_tables(result) {
                println!("\n{}:", name);
                print_rows(rows);
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", scalar_text(other, "null")),
    }

    if let Some(envelope) = value.as_object() {
        print_notes(envelope);
    }
}

fn print_summary(result: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(result) {
        if let Value::Array(rows) = &val {
            if rows.first().is_some_and(Value::is_object) {
                continue;
            }
        }
        builder.push_record([key, scalar_text(&val, "-")]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            println!("{}", scalar_text(item, "-"));
        }
        return;
    };

    let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in rows {
        if let Value::Object(map) = item {
            let cells = flatten(map);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    cells
                        .iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| scalar_text(v, "-"))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
