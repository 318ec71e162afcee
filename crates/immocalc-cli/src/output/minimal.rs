use serde_json::Value;

use super::{format_cell, result_of};

/// Fields printed by `--output minimal`, in priority order.
const PRIORITY_KEYS: [&str; 7] = [
    "irr",
    "profit",
    "net_cash_movement",
    "net_cashflow",
    "total_balance",
    "total_investment",
    "purchase_price",
];

/// Print just the key answer value from the output.
///
/// Tables are represented by their last row (the final month or year); a
/// full projection by its last returns row.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(result_of(value)));
}

fn headline(result: &Value) -> String {
    let focus = match result {
        Value::Array(rows) => rows.last().unwrap_or(result),
        Value::Object(map) => map
            .get("returns")
            .and_then(Value::as_array)
            .and_then(|rows| rows.last())
            .unwrap_or(result),
        _ => result,
    };

    if let Value::Object(map) = focus {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
                return format_cell(val);
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_cell(val));
        }
    }

    format_cell(focus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_irr_result() {
        assert_eq!(headline(&json!({"irr": "0.1", "periods": 2})), "0.1");
    }

    #[test]
    fn test_table_uses_last_row() {
        let rows = json!([{"year": 2025, "profit": "-5"}, {"year": 2026, "profit": "7"}]);
        assert_eq!(headline(&rows), "7");
    }

    #[test]
    fn test_projection_uses_last_returns_row() {
        let projection = json!({
            "summary": {"total_investment": "452489.5"},
            "returns": [{"irr": "0.03"}, {"irr": "0.05"}]
        });
        assert_eq!(headline(&projection), "0.05");
    }

    #[test]
    fn test_summary_falls_back_to_total_investment() {
        assert_eq!(
            headline(&json!({"equity": "1", "total_investment": "452489.5"})),
            "452489.5"
        );
    }
}
