use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Euro amounts. Always `Decimal`, never `f64`.
pub type Money = Decimal;

/// Fractions (0.042 = 4.2%), never percentages.
pub type Rate = Decimal;

/// Envelope returned by every top-level computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    /// The inputs the result was computed from, echoed as JSON
    pub assumptions: serde_json::Value,
    /// Advisory findings; never fatal
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

impl ComputationMetadata {
    fn for_run(elapsed_us: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        }
    }
}

/// Wrap `result` in the standard envelope.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    let assumptions = serde_json::to_value(assumptions).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "assumptions could not be echoed");
        serde_json::Value::Null
    });

    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions,
        warnings,
        metadata: ComputationMetadata::for_run(elapsed_us),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_with_metadata_carries_warnings_and_version() {
        let out = with_metadata(
            "Test",
            &serde_json::json!({"rate": "0.05"}),
            vec!["check me".into()],
            42,
            dec!(1.5),
        );
        assert_eq!(out.result, dec!(1.5));
        assert_eq!(out.warnings, vec!["check me".to_string()]);
        assert_eq!(out.metadata.computation_time_us, 42);
        assert_eq!(out.metadata.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(out.assumptions["rate"], "0.05");
    }
}
