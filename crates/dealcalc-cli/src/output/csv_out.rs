use serde_json::Value;
use std::io;

use super::{flatten, result_body, row_tables, scalar_text};

/// Write output as CSV to stdout.
///
/// When the result carries a schedule (amortisation rows, projections,
/// scenarios) the first one is written row by row; otherwise the result is
/// flattened into `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_body(value) {
        Value::Object(result) => match row_tables(result).first() {
            Some((_, rows)) => write_rows(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten(result) {
                    let _ = wtr.write_record([key, scalar_text(&val, "")]);
                }
            }
        },
        Value::Array(rows) => write_rows(&mut wtr, rows),
        other => {
            let _ = wtr.write_record([scalar_text(other, "")]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([scalar_text(item, "")]);
        }
        return;
    };

    let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
    let _ = wtr.write_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let cells = flatten(map);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    cells
                        .iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| scalar_text(v, ""))
                        .unwrap_or_default()
                })
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
