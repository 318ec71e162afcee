use serde_json::Value;
use std::io::{self, Write};

use super::{flatten, format_cell, is_row_array, result_of};

/// Write the result as CSV to stdout. Nested row objects become dotted
/// columns; a full projection is written as consecutive titled sections.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    write_value(&mut wtr, result_of(value));
    let _ = wtr.flush();
}

fn write_value<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) {
    match value {
        Value::Array(rows) if is_row_array(value) => write_rows(wtr, rows),
        Value::Object(map) if map.values().any(is_row_array) => {
            for (index, (key, section)) in map.iter().enumerate() {
                if index > 0 {
                    let _ = wtr.write_record([""]);
                }
                let _ = wtr.write_record([format!("# {key}")]);
                write_value(wtr, section);
            }
        }
        Value::Object(_) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flatten(value) {
                let _ = wtr.write_record([key, format_cell(&val)]);
            }
        }
        Value::Array(items) => {
            for item in items {
                let _ = wtr.write_record([format_cell(item)]);
            }
        }
        _ => {
            let _ = wtr.write_record([format_cell(value)]);
        }
    }
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let flat_rows: Vec<Vec<(String, Value)>> = rows.iter().map(flatten).collect();
    let Some(first) = flat_rows.first() else {
        return;
    };
    let headers: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for row in &flat_rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| format_cell(v))
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&cells);
    }
}
