use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the numeric primitives and the configuration boundary.
///
/// The projection pipeline itself never returns these; it maps every
/// numeric degeneracy to a documented fallback value.
#[derive(Debug, Error)]
pub enum ImmocalcError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    /// The cash flow series cannot have the requested property (e.g. no sign change for an IRR).
    #[error("No solution: {0}")]
    FinancialImpossibility(String),

    #[error("{function} did not converge after {iterations} iterations (last step {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Invalid month: {0}")]
    DateError(String),

    #[error("Configuration could not be parsed: {0}")]
    SerializationError(String),
}

impl ImmocalcError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ImmocalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True when the input simply has no answer (too short, or one-signed),
    /// as opposed to a solver that ran and failed.
    pub fn is_degenerate_input(&self) -> bool {
        matches!(
            self,
            ImmocalcError::InsufficientData(_) | ImmocalcError::FinancialImpossibility(_)
        )
    }
}

impl From<serde_json::Error> for ImmocalcError {
    fn from(e: serde_json::Error) -> Self {
        ImmocalcError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_input_classification() {
        assert!(ImmocalcError::InsufficientData("one flow".into()).is_degenerate_input());
        assert!(ImmocalcError::FinancialImpossibility("no sign change".into()).is_degenerate_input());
        let stalled = ImmocalcError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: 100,
            last_delta: Decimal::ONE,
        };
        assert!(!stalled.is_degenerate_input());
    }

    #[test]
    fn test_invalid_input_message() {
        let e = ImmocalcError::invalid_input("nper", "must be > 0");
        assert_eq!(e.to_string(), "Invalid input: nper (must be > 0)");
    }
}
