use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::calendar::YearMonth;
use super::config::{ProjectionConfig, PurchaseSummary};
use crate::types::{Money, Rate};

/// The four depreciation components of one month (or one year, when summed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationBreakdown {
    pub sonder: Money,
    pub degressive: Money,
    pub linear: Money,
    pub furnishing: Money,
}

impl DepreciationBreakdown {
    /// Building depreciation only (Sonder + degressive + linear).
    pub fn building(&self) -> Money {
        self.sonder + self.degressive + self.linear
    }

    pub fn total(&self) -> Money {
        self.building() + self.furnishing
    }
}

impl std::ops::AddAssign<&DepreciationBreakdown> for DepreciationBreakdown {
    fn add_assign(&mut self, rhs: &DepreciationBreakdown) {
        self.sonder += rhs.sonder;
        self.degressive += rhs.degressive;
        self.linear += rhs.linear;
        self.furnishing += rhs.furnishing;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationMonth {
    pub month: YearMonth,
    pub breakdown: DepreciationBreakdown,
    /// Remaining building base at the start of the month
    pub opening_base: Money,
    /// Remaining building base after this month's write-off
    pub remaining_base: Money,
}

/// The running building base; the only state carried from month to month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepreciationState {
    pub remaining_base: Money,
}

/// Window boundaries and annual amounts, fixed for a whole run.
#[derive(Debug, Clone)]
pub struct DepreciationSchedule {
    rent_start: YearMonth,
    last_output_year: i32,
    annual_sonder: Money,
    sonder_years: u32,
    degressive_rate: Rate,
    /// Last month of the degressive window
    degressive_end: YearMonth,
    /// Last month of the linear window, capped to the simulated horizon
    linear_end: YearMonth,
    annual_furnishing: Money,
    /// Last month of the furnishing window; `None` for a zero-year window
    furnishing_end: Option<YearMonth>,
}

impl DepreciationSchedule {
    pub fn new(config: &ProjectionConfig, summary: &PurchaseSummary) -> Self {
        let rent_start = summary.rent_start;
        let years_to_months = |years: u32| i64::from(years) * 12;

        let degressive_end = rent_start.add_months(years_to_months(config.degressive_years) - 1);
        let building_years = config.degressive_years.saturating_add(config.linear_years);
        let linear_end = rent_start
            .add_months(years_to_months(building_years) - 1)
            .min(summary.last_month);
        let furnishing_end = (config.furnishing_depreciation_years > 0).then(|| {
            rent_start.add_months(years_to_months(config.furnishing_depreciation_years) - 1)
        });

        Self {
            rent_start,
            last_output_year: summary.last_year(),
            annual_sonder: config.sonder_afa_base_amount * config.sonder_afa_rate,
            sonder_years: config.sonder_afa_years,
            degressive_rate: config.degressive_afa_rate,
            degressive_end,
            linear_end,
            annual_furnishing: config.furnishing_cost * config.furnishing_depreciation_rate,
            furnishing_end,
        }
    }

    /// Sonder-AfA scheduled for `month`. The completion year receives the
    /// full annual amount spread over its remaining months, however late in
    /// the year rental starts.
    fn sonder(&self, month: YearMonth) -> Money {
        let year_index = month.year() - self.rent_start.year();
        let sonder_years = i32::try_from(self.sonder_years).unwrap_or(i32::MAX);
        if year_index < 0 || year_index >= sonder_years {
            return Decimal::ZERO;
        }
        if year_index == 0 {
            self.annual_sonder / Decimal::from(self.rent_start.months_left_in_year())
        } else {
            self.annual_sonder / dec!(12)
        }
    }

    /// Furnishing write-off: annual amount over the remaining months of the
    /// first year, over the months up to the window end in the last year
    /// (twelve if that is the final output year), otherwise over twelve.
    fn furnishing(&self, month: YearMonth) -> Money {
        let Some(end) = self.furnishing_end else {
            return Decimal::ZERO;
        };
        if month < self.rent_start || month > end {
            return Decimal::ZERO;
        }

        let months_in_year = if month.year() == self.rent_start.year() {
            self.rent_start.months_left_in_year()
        } else if month.year() == end.year() {
            if month.year() == self.last_output_year {
                12
            } else {
                end.month()
            }
        } else {
            12
        };

        self.annual_furnishing / Decimal::from(months_in_year)
    }
}

/// Depreciation for one month, given the state at its start.
///
/// Degressive (or, after its window, linear) write-off is taken from the
/// opening base first; Sonder-AfA is then taken from what remains. The base
/// is floored at zero, so the three building components together never
/// exceed the opening base.
pub fn depreciate_month(
    schedule: &DepreciationSchedule,
    state: DepreciationState,
    month: YearMonth,
) -> (DepreciationState, DepreciationMonth) {
    let opening_base = state.remaining_base;

    if month < schedule.rent_start {
        let entry = DepreciationMonth {
            month,
            breakdown: DepreciationBreakdown::default(),
            opening_base,
            remaining_base: opening_base,
        };
        return (state, entry);
    }

    let mut base = opening_base;
    let mut breakdown = DepreciationBreakdown::default();

    if month <= schedule.degressive_end {
        breakdown.degressive = (base * schedule.degressive_rate / dec!(12)).min(base);
        base -= breakdown.degressive;
    } else {
        let remaining_months = schedule.linear_end.months_since(month) + 1;
        if remaining_months > 0 && base > Decimal::ZERO {
            breakdown.linear = base / Decimal::from(remaining_months);
            base -= breakdown.linear;
        }
    }
    base = base.max(Decimal::ZERO);

    breakdown.sonder = schedule.sonder(month).min(base);
    base = (base - breakdown.sonder).max(Decimal::ZERO);

    breakdown.furnishing = schedule.furnishing(month);

    let entry = DepreciationMonth {
        month,
        breakdown,
        opening_base,
        remaining_base: base,
    };
    (DepreciationState { remaining_base: base }, entry)
}

/// Depreciation for every simulated month, contract month through the last
/// output month. Zero before rent start.
pub fn run_depreciation(config: &ProjectionConfig, summary: &PurchaseSummary) -> Vec<DepreciationMonth> {
    let schedule = DepreciationSchedule::new(config, summary);
    let mut state = DepreciationState {
        remaining_base: summary.total_depreciation_base.max(Decimal::ZERO),
    };

    summary
        .contract_month
        .through(summary.last_month)
        .map(|month| {
            let (next, entry) = depreciate_month(&schedule, state, month);
            state = next;
            entry
        })
        .collect()
}
