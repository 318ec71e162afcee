use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::aggregation::YearlySummary;
use super::cashflow::escalate;
use super::config::PurchaseSummary;
use crate::time_value::irr;
use crate::types::{Money, Rate};

/// Starting point for the IRR search.
const IRR_GUESS: Rate = dec!(0.10);

/// The hypothetical "sell at the end of `year`" scenario.
///
/// Cumulative figures run from the contract year through `year`. Ratios are
/// fractions (0.05 = 5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsRow {
    pub year: i32,
    /// Years held, counting the contract year
    pub holding_years: u32,
    pub projected_price: Money,
    pub outstanding_loan: Money,
    /// Projected price − outstanding loan
    pub net_sale_proceeds: Money,
    pub cumulative_equity: Money,
    pub cumulative_interest: Money,
    pub cumulative_maintenance: Money,
    /// Equity + interest + maintenance
    pub total_outflow: Money,
    pub cumulative_rent: Money,
    pub cumulative_tax: Money,
    /// Rent + tax adjustments
    pub total_inflow: Money,
    pub profit: Money,
    pub roi: Rate,
    pub cagr: Rate,
    pub irr: Rate,
}

/// Operating cash of one year as seen by the investor: rent and tax in,
/// interest, maintenance and fresh equity out. Tilgung is not an outflow.
fn operating_cashflow(year: &YearlySummary) -> Money {
    year.rent + year.tax_adjustment - year.interest - year.maintenance - year.equity_used
}

fn return_on_investment(profit: Money, outflow: Money) -> Rate {
    if outflow.is_zero() {
        return Decimal::ZERO;
    }
    profit / outflow
}

/// ((profit + outflow) / outflow)^(1/n) − 1; zero when outflow or the
/// terminal value is not positive.
fn compound_annual_growth(profit: Money, outflow: Money, holding_years: u32) -> Rate {
    if outflow <= Decimal::ZERO || holding_years == 0 {
        return Decimal::ZERO;
    }
    let terminal = profit + outflow;
    if terminal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let exponent = Decimal::ONE / Decimal::from(holding_years);
    (terminal / outflow)
        .checked_powd(exponent)
        .map(|growth| growth - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

/// IRR of `series`, or zero if the solver rejects the series or fails to
/// converge.
fn irr_or_zero(year: i32, series: &[Money]) -> Rate {
    match irr(series, IRR_GUESS) {
        Ok(rate) => rate,
        Err(e) if e.is_degenerate_input() => {
            tracing::trace!(year, error = %e, "no IRR for this series; reporting 0");
            Decimal::ZERO
        }
        Err(e) => {
            tracing::debug!(year, error = %e, "IRR did not converge; reporting 0");
            Decimal::ZERO
        }
    }
}

/// Evaluate a sale at the end of every aggregated year.
pub fn analyze_returns(
    summary: &PurchaseSummary,
    sale_growth_rate: Rate,
    yearly: &[YearlySummary],
) -> Vec<ReturnsRow> {
    let purchase_year = summary.first_year();

    let mut cumulative_equity = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_maintenance = Decimal::ZERO;
    let mut cumulative_rent = Decimal::ZERO;
    let mut cumulative_tax = Decimal::ZERO;
    let mut operating: Vec<Money> = Vec::with_capacity(yearly.len());

    yearly
        .iter()
        .map(|row| {
            cumulative_equity += row.equity_used;
            cumulative_interest += row.interest;
            cumulative_maintenance += row.maintenance;
            cumulative_rent += row.rent;
            cumulative_tax += row.tax_adjustment;
            operating.push(operating_cashflow(row));

            let years_since_purchase = (row.year - purchase_year).max(0) as u32;
            let holding_years = years_since_purchase + 1;
            let projected_price =
                escalate(summary.total_purchase_price, sale_growth_rate, years_since_purchase);
            let net_sale_proceeds = projected_price - row.loan_balance;

            let total_outflow = cumulative_equity + cumulative_interest + cumulative_maintenance;
            let total_inflow = cumulative_rent + cumulative_tax;
            let profit = net_sale_proceeds + total_inflow - total_outflow;

            let mut series = operating.clone();
            if let Some(last) = series.last_mut() {
                *last += net_sale_proceeds;
            }

            ReturnsRow {
                year: row.year,
                holding_years,
                projected_price,
                outstanding_loan: row.loan_balance,
                net_sale_proceeds,
                cumulative_equity,
                cumulative_interest,
                cumulative_maintenance,
                total_outflow,
                cumulative_rent,
                cumulative_tax,
                total_inflow,
                profit,
                roi: return_on_investment(profit, total_outflow),
                cagr: compound_annual_growth(profit, total_outflow, holding_years),
                irr: irr_or_zero(row.year, &series),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::config::ProjectionConfig;
    use rust_decimal_macros::dec;

    fn summary() -> PurchaseSummary {
        PurchaseSummary::from_config(&ProjectionConfig::default())
    }

    /// A two-year holding: equity paid in 2025, rent received in 2026, the
    /// loan unchanged, the price flat.
    fn two_years() -> Vec<YearlySummary> {
        vec![
            YearlySummary {
                year: 2025,
                equity_used: dec!(100000),
                loan_balance: dec!(328900),
                ..YearlySummary::default()
            },
            YearlySummary {
                year: 2026,
                rent: dec!(10000),
                loan_balance: dec!(328900),
                ..YearlySummary::default()
            },
        ]
    }

    #[test]
    fn test_sale_in_purchase_year_breaks_even() {
        let rows = analyze_returns(&summary(), Decimal::ZERO, &two_years());
        let first = &rows[0];
        assert_eq!(first.holding_years, 1);
        assert_eq!(first.projected_price, dec!(428900));
        assert_eq!(first.net_sale_proceeds, dec!(100000));
        assert_eq!(first.profit, Decimal::ZERO);
        assert_eq!(first.roi, Decimal::ZERO);
        assert!(first.cagr.abs() < dec!(0.000001));
        // A single net-zero flow has no IRR
        assert_eq!(first.irr, Decimal::ZERO);
    }

    #[test]
    fn test_second_year_ratios() {
        let rows = analyze_returns(&summary(), Decimal::ZERO, &two_years());
        let second = &rows[1];
        assert_eq!(second.holding_years, 2);
        assert_eq!(second.total_outflow, dec!(100000));
        assert_eq!(second.total_inflow, dec!(10000));
        assert_eq!(second.profit, dec!(10000));
        assert_eq!(second.roi, dec!(0.1));
        // sqrt(1.1) - 1
        assert!((second.cagr - dec!(0.0488088)).abs() < dec!(0.000001), "cagr {}", second.cagr);
        // [-100000, 110000]
        assert!((second.irr - dec!(0.10)).abs() < dec!(0.0001), "irr {}", second.irr);
    }

    #[test]
    fn test_projected_price_compounds_from_purchase_year() {
        let rows = analyze_returns(&summary(), dec!(0.02), &two_years());
        assert_eq!(rows[0].projected_price, dec!(428900));
        assert_eq!(rows[1].projected_price, dec!(428900) * dec!(1.02));
    }

    #[test]
    fn test_tilgung_is_not_an_outflow() {
        let mut years = two_years();
        years[1].principal = dec!(5000);
        years[1].loan_balance = dec!(323900);
        let rows = analyze_returns(&summary(), Decimal::ZERO, &years);
        assert_eq!(rows[1].total_outflow, dec!(100000));
        // Repaid principal shows up as higher sale proceeds instead
        assert_eq!(rows[1].net_sale_proceeds, dec!(105000));
    }

    #[test]
    fn test_zero_outflow_ratios_are_zero() {
        let years = vec![YearlySummary {
            year: 2025,
            rent: dec!(1000),
            ..YearlySummary::default()
        }];
        let rows = analyze_returns(&summary(), Decimal::ZERO, &years);
        assert_eq!(rows[0].total_outflow, Decimal::ZERO);
        assert_eq!(rows[0].roi, Decimal::ZERO);
        assert_eq!(rows[0].cagr, Decimal::ZERO);
    }

    #[test]
    fn test_all_positive_series_yields_zero_irr() {
        let years = vec![
            YearlySummary {
                year: 2025,
                rent: dec!(1000),
                ..YearlySummary::default()
            },
            YearlySummary {
                year: 2026,
                rent: dec!(1000),
                ..YearlySummary::default()
            },
        ];
        let rows = analyze_returns(&summary(), Decimal::ZERO, &years);
        assert_eq!(rows[1].irr, Decimal::ZERO);
    }

    #[test]
    fn test_rootless_series_yields_zero_irr() {
        // Operating flows -100, 250, -200 and a sale that just clears the loan
        let years = vec![
            YearlySummary {
                year: 2025,
                equity_used: dec!(100),
                ..YearlySummary::default()
            },
            YearlySummary {
                year: 2026,
                rent: dec!(250),
                ..YearlySummary::default()
            },
            YearlySummary {
                year: 2027,
                maintenance: dec!(200),
                loan_balance: dec!(428900),
                ..YearlySummary::default()
            },
        ];
        let rows = analyze_returns(&summary(), Decimal::ZERO, &years);
        let last = &rows[2];
        assert_eq!(last.net_sale_proceeds, Decimal::ZERO);
        assert_eq!(last.irr, Decimal::ZERO);
        assert_eq!(last.profit, dec!(-50));
    }

    #[test]
    fn test_cagr_zero_for_total_loss() {
        assert_eq!(
            compound_annual_growth(dec!(-150000), dec!(100000), 3),
            Decimal::ZERO
        );
        assert_eq!(return_on_investment(dec!(-150000), dec!(100000)), dec!(-1.5));
    }
}
