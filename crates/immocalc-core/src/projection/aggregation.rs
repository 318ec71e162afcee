use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::amortization::MonthLedgerEntry;
use super::cashflow::CashflowRecord;
use super::config::PurchaseSummary;
use super::depreciation::DepreciationBreakdown;
use crate::types::Money;

/// One calendar year of the projection. Flow figures are sums over the
/// year's months; balances are taken from the year's last month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub year: i32,
    pub rent: Money,
    pub depreciation: DepreciationBreakdown,
    pub total_depreciation: Money,
    pub maintenance: Money,
    pub interest: Money,
    pub bereitstellung: Money,
    pub taxable_income: Money,
    pub tax_adjustment: Money,
    pub net_cashflow: Money,
    pub draws: Money,
    pub subsidized_draw: Money,
    pub main_draw: Money,
    pub equity_used: Money,
    pub subsidized_interest: Money,
    /// Interest on drawn main-loan balance, excluding bereitstellung
    pub main_interest: Money,
    pub subsidized_principal: Money,
    pub main_principal: Money,
    pub principal: Money,
    pub subsidized_payment: Money,
    pub main_payment: Money,
    pub total_payment: Money,
    pub cashflow_before_tax: Money,
    pub total_cashflow: Money,
    pub net_cash_movement: Money,
    // Year-end values
    pub cumulative_cash_movement: Money,
    pub main_undrawn: Money,
    pub subsidized_balance: Money,
    pub main_balance: Money,
    pub loan_balance: Money,
    pub remaining_depreciation_base: Money,
}

impl YearlySummary {
    fn empty(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    fn add_month(&mut self, entry: &MonthLedgerEntry, record: &CashflowRecord) {
        self.rent += record.rent;
        self.depreciation += &record.depreciation;
        self.total_depreciation += record.total_depreciation;
        self.maintenance += record.maintenance;
        self.interest += record.interest;
        self.bereitstellung += record.bereitstellung;
        self.taxable_income += record.taxable_income;
        self.tax_adjustment += record.tax_adjustment;
        self.net_cashflow += record.net_cashflow;
        self.draws += entry.draw;
        self.subsidized_draw += entry.subsidized.draw;
        self.main_draw += entry.main.draw;
        self.equity_used += entry.equity_used;
        self.subsidized_interest += entry.subsidized.interest;
        self.main_interest += entry.main.interest;
        self.subsidized_principal += entry.subsidized.principal;
        self.main_principal += entry.main.principal;
        self.principal += entry.total_principal;
        self.subsidized_payment += entry.subsidized.payment;
        self.main_payment += entry.main.payment;
        self.total_payment += entry.total_payment;
        self.cashflow_before_tax += record.cashflow_before_tax;
        self.total_cashflow += record.total_cashflow;
        self.net_cash_movement += record.net_cash_movement;

        // Months arrive in order, so the last write is the year-end value
        self.cumulative_cash_movement = record.cumulative_cash_movement;
        self.main_undrawn = entry.main_undrawn;
        self.subsidized_balance = entry.subsidized.balance;
        self.main_balance = entry.main.balance;
        self.loan_balance = entry.total_balance;
        self.remaining_depreciation_base = record.remaining_depreciation_base;
    }
}

/// Roll monthly rows up into one row per calendar year, first output year
/// through last, with zero-filled rows for any year without months.
pub fn aggregate_yearly(
    summary: &PurchaseSummary,
    ledger: &[MonthLedgerEntry],
    cashflows: &[CashflowRecord],
) -> Vec<YearlySummary> {
    let mut years: BTreeMap<i32, YearlySummary> = (summary.first_year()..=summary.last_year())
        .map(|year| (year, YearlySummary::empty(year)))
        .collect();

    for (entry, record) in ledger.iter().zip(cashflows) {
        years
            .entry(entry.month.year())
            .or_insert_with(|| YearlySummary::empty(entry.month.year()))
            .add_month(entry, record);
    }

    years.into_values().collect()
}
