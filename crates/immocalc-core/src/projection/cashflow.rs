use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::amortization::MonthLedgerEntry;
use super::calendar::YearMonth;
use super::config::{ProjectionConfig, PurchaseSummary};
use super::depreciation::{DepreciationBreakdown, DepreciationMonth};
use crate::types::{Money, Rate};

/// Tax and cash position of one simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRecord {
    pub month: YearMonth,
    pub rent: Money,
    pub depreciation: DepreciationBreakdown,
    pub total_depreciation: Money,
    pub maintenance: Money,
    /// Loan interest including bereitstellung
    pub interest: Money,
    pub bereitstellung: Money,
    /// rent − interest − depreciation − maintenance
    pub taxable_income: Money,
    /// −taxable income × marginal rate; positive is a refund
    pub tax_adjustment: Money,
    /// rent − interest − bereitstellung − maintenance + tax adjustment
    pub net_cashflow: Money,
    /// Tilgung on both loans
    pub principal: Money,
    pub equity_used: Money,
    pub loan_balance: Money,
    pub remaining_depreciation_base: Money,
    /// rent − interest − principal − maintenance
    pub cashflow_before_tax: Money,
    /// Cashflow before tax + tax adjustment
    pub total_cashflow: Money,
    /// Total cashflow − equity used
    pub net_cash_movement: Money,
    pub cumulative_cash_movement: Money,
}

/// First calendar year with twelve rental months.
fn first_full_rental_year(rent_start: YearMonth) -> i32 {
    if rent_start.month() == 1 {
        rent_start.year()
    } else {
        rent_start.year() + 1
    }
}

/// Number of annual escalation steps applied in `month`: zero through the
/// first full rental year, then one more each January.
pub fn escalation_years(rent_start: YearMonth, month: YearMonth) -> u32 {
    (month.year() - first_full_rental_year(rent_start)).max(0) as u32
}

/// `base × (1 + rate)^years`. Falls back to `base` if the factor overflows.
pub fn escalate(base: Money, rate: Rate, years: u32) -> Money {
    if years == 0 {
        return base;
    }
    match (Decimal::ONE + rate)
        .checked_powi(i64::from(years))
        .and_then(|factor| base.checked_mul(factor))
    {
        Some(value) => value,
        None => {
            tracing::warn!(%rate, years, "escalation overflowed; using unescalated amount");
            base
        }
    }
}

/// Combine the financing ledger and the depreciation stream month by month.
///
/// Both inputs cover the same months in the same order.
pub fn derive_cashflows(
    config: &ProjectionConfig,
    summary: &PurchaseSummary,
    ledger: &[MonthLedgerEntry],
    depreciation: &[DepreciationMonth],
) -> Vec<CashflowRecord> {
    debug_assert_eq!(ledger.len(), depreciation.len());

    let mut cumulative_cash_movement = Decimal::ZERO;

    ledger
        .iter()
        .zip(depreciation)
        .map(|(entry, dep)| {
            debug_assert_eq!(entry.month, dep.month);
            let month = entry.month;

            let (rent, maintenance) = if month >= summary.rent_start {
                let steps = escalation_years(summary.rent_start, month);
                (
                    escalate(summary.monthly_rent_total, config.rent_growth_rate, steps),
                    escalate(
                        summary.monthly_maintenance,
                        config.maintenance_growth_rate,
                        steps,
                    ),
                )
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            };

            let interest = entry.total_interest;
            let total_depreciation = dep.breakdown.total();
            let taxable_income = rent - interest - total_depreciation - maintenance;
            let tax_adjustment = -taxable_income * config.marginal_tax_rate;
            let net_cashflow =
                rent - interest - entry.bereitstellung - maintenance + tax_adjustment;

            let principal = entry.total_principal;
            let cashflow_before_tax = rent - interest - principal - maintenance;
            let total_cashflow = cashflow_before_tax + tax_adjustment;
            let net_cash_movement = total_cashflow - entry.equity_used;
            cumulative_cash_movement += net_cash_movement;

            CashflowRecord {
                month,
                rent,
                depreciation: dep.breakdown.clone(),
                total_depreciation,
                maintenance,
                interest,
                bereitstellung: entry.bereitstellung,
                taxable_income,
                tax_adjustment,
                net_cashflow,
                principal,
                equity_used: entry.equity_used,
                loan_balance: entry.total_balance,
                remaining_depreciation_base: dep.remaining_base,
                cashflow_before_tax,
                total_cashflow,
                net_cash_movement,
                cumulative_cash_movement,
            }
        })
        .collect()
}
