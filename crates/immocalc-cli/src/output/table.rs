use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, format_cell, is_row_array, result_of};

/// Format output as one or more tables using the tabled crate.
pub fn print_table(value: &Value) {
    print_section(None, result_of(value));

    if let Some(envelope) = value.as_object().filter(|m| m.contains_key("result")) {
        print_footer(envelope);
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    if let Some(title) = title {
        println!("\n{}:", title);
    }

    match value {
        Value::Array(rows) if is_row_array(value) => print_rows(rows),
        Value::Array(rows) if rows.is_empty() => println!("(empty)"),
        Value::Object(map) if map.values().any(is_row_array) => {
            // A full projection: one table per section
            for (key, section) in map {
                print_section(Some(key), section);
            }
        }
        Value::Object(_) => print_fields(value),
        _ => println!("{}", format_cell(value)),
    }
}

fn print_fields(value: &Value) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(value) {
        builder.push_record([key, format_cell(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let flat_rows: Vec<Vec<(String, Value)>> = rows.iter().map(flatten).collect();
    let headers: Vec<String> = flat_rows
        .first()
        .map(|first| first.iter().map(|(k, _)| k.clone()).collect())
        .unwrap_or_default();

    let mut builder = Builder::default();
    builder.push_record(headers.clone());
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
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
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
