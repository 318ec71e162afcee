use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use immocalc_core::projection::{self, ProjectionConfig};

use crate::input;

/// Arguments shared by every projection command
#[derive(Args)]
pub struct ProjectionArgs {
    /// Path to a JSON or YAML configuration (missing fields take defaults)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the output horizon in years
    #[arg(long)]
    pub output_years: Option<u32>,

    /// Override the marginal tax rate (e.g. 0.42)
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Override the annual property appreciation used for the sale (e.g. 0.02)
    #[arg(long, allow_hyphen_values = true)]
    pub sale_growth: Option<Decimal>,
}

/// Which part of the projection a command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionTable {
    All,
    Summary,
    Ledger,
    Cashflow,
    Yearly,
    Returns,
}

impl ProjectionTable {
    fn key(self) -> Option<&'static str> {
        match self {
            ProjectionTable::All => None,
            ProjectionTable::Summary => Some("summary"),
            ProjectionTable::Ledger => Some("ledger"),
            ProjectionTable::Cashflow => Some("cashflow"),
            ProjectionTable::Yearly => Some("yearly"),
            ProjectionTable::Returns => Some("returns"),
        }
    }
}

fn load_config(args: &ProjectionArgs) -> Result<ProjectionConfig, Box<dyn std::error::Error>> {
    let mut config: ProjectionConfig = if let Some(ref path) = args.input {
        input::file::read_config(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        ProjectionConfig::from_value(data)?
    } else {
        tracing::info!("no --input or stdin; using the default configuration");
        ProjectionConfig::default()
    };

    apply_overrides(&mut config, args);
    Ok(config)
}

fn apply_overrides(config: &mut ProjectionConfig, args: &ProjectionArgs) {
    if let Some(years) = args.output_years {
        config.output_years = years;
    }
    if let Some(rate) = args.tax_rate {
        config.marginal_tax_rate = rate;
    }
    if let Some(growth) = args.sale_growth {
        config.sale_growth_rate = growth;
    }
}

/// Run the projection and keep only `table` in the envelope's `result`.
pub fn run_projection(
    args: ProjectionArgs,
    table: ProjectionTable,
) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    let output = projection::run_projection(&config);
    let mut value = serde_json::to_value(output)?;

    if let (Some(key), Some(result)) = (table.key(), value.get_mut("result")) {
        let section = result.get_mut(key).map(Value::take).unwrap_or(Value::Null);
        *result = section;
    }
    Ok(value)
}

pub fn run_defaults() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(ProjectionConfig::default())?)
}
