pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` of an envelope, or the value itself.
pub fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// Flatten nested objects into `(dotted.key, leaf)` pairs. Arrays and scalars
/// are leaves.
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into("", value, &mut out);
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, val, out);
            }
        }
        _ => out.push((prefix.to_string(), value.clone())),
    }
}

/// True for a non-empty array whose first element is an object, i.e. a table.
pub fn is_row_array(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if matches!(rows.first(), Some(Value::Object(_))))
}

pub fn format_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_cell).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_uses_dotted_keys() {
        let row = json!({
            "month": "2028-01",
            "main": {"interest": "10", "balance": "100"},
            "depreciation": {"sonder": "1"}
        });
        let flat = flatten(&row);
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"main.interest"));
        assert!(keys.contains(&"main.balance"));
        assert!(keys.contains(&"depreciation.sonder"));
        assert!(keys.contains(&"month"));
    }

    #[test]
    fn test_result_of_envelope() {
        let envelope = json!({"result": {"irr": "0.1"}, "warnings": []});
        assert_eq!(result_of(&envelope)["irr"], "0.1");
        let bare = json!([1, 2]);
        assert_eq!(result_of(&bare), &bare);
    }

    #[test]
    fn test_row_array_detection() {
        assert!(is_row_array(&json!([{"a": 1}])));
        assert!(!is_row_array(&json!([1, 2])));
        assert!(!is_row_array(&json!([])));
    }
}
