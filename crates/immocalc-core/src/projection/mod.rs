pub mod aggregation;
pub mod amortization;
pub mod calendar;
pub mod cashflow;
pub mod config;
pub mod depreciation;
pub mod returns;

use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use aggregation::{aggregate_yearly, YearlySummary};
pub use amortization::{simulate_amortization, LoanMonth, MonthLedgerEntry, Phase};
pub use calendar::YearMonth;
pub use cashflow::{derive_cashflows, CashflowRecord};
pub use config::{
    default_installment_offsets, validate, Installment, LoanSpec, LoanTerms, ProjectionConfig,
    PurchaseSummary, Repayment,
};
pub use depreciation::{run_depreciation, DepreciationBreakdown, DepreciationMonth};
pub use returns::{analyze_returns, ReturnsRow};

use crate::types::{with_metadata, ComputationOutput};

/// Every table of one projection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub summary: PurchaseSummary,
    pub ledger: Vec<MonthLedgerEntry>,
    pub cashflow: Vec<CashflowRecord>,
    pub yearly: Vec<YearlySummary>,
    pub returns: Vec<ReturnsRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full projection: financing ledger, depreciation, tax and
/// cashflow, yearly roll-up and sale returns.
///
/// Never fails. Questionable inputs are reported in `warnings` and the run
/// proceeds with them as given.
pub fn run_projection(config: &ProjectionConfig) -> ComputationOutput<ProjectionOutput> {
    let start = Instant::now();

    let summary = PurchaseSummary::from_config(config);
    let warnings = validate(config, &summary);
    for warning in &warnings {
        tracing::debug!(%warning, "configuration warning");
    }

    // --- Financing ---
    let ledger = simulate_amortization(config, &summary);
    tracing::debug!(
        months = ledger.len(),
        main_limit = %summary.main_loan.principal_limit,
        "amortization simulated"
    );

    // --- Depreciation, tax and cashflow ---
    let depreciation = run_depreciation(config, &summary);
    let cashflow = derive_cashflows(config, &summary, &ledger, &depreciation);
    tracing::debug!(
        months = cashflow.len(),
        final_base = %depreciation.last().map(|m| m.remaining_base).unwrap_or_default(),
        "cashflow derived"
    );

    // --- Yearly roll-up and returns ---
    let yearly = aggregate_yearly(&summary, &ledger, &cashflow);
    let returns = analyze_returns(&summary, config.sale_growth_rate, &yearly);
    tracing::debug!(years = yearly.len(), "returns analysed");

    let output = ProjectionOutput {
        summary,
        ledger,
        cashflow,
        yearly,
        returns,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Monthly two-loan drawdown and annuity ledger with Sonder/degressive/linear AfA, \
         marginal-rate tax adjustment and sale-year ROI/CAGR/IRR",
        config,
        warnings,
        elapsed,
        output,
    )
}
