use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use immocalc_core::time_value::{irr, npv};

/// Arguments for the IRR solver
#[derive(Args)]
pub struct IrrArgs {
    /// Periodic cash flows (comma-separated, e.g. "-100,110")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Starting rate for the search
    #[arg(long, allow_hyphen_values = true)]
    pub guess: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let guess = args.guess.unwrap_or(dec!(0.10));
    let rate = irr(&args.cash_flows, guess)?;
    let residual = npv(rate, &args.cash_flows)?;

    Ok(json!({
        "result": {
            "irr": rate,
            "npv_at_irr": residual,
            "periods": args.cash_flows.len(),
        },
        "methodology": "Newton-Raphson with bisection fallback",
        "warnings": [],
    }))
}
