use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::calendar::YearMonth;
use crate::time_value::annuity_payment;
use crate::types::{Money, Rate};
use crate::ImmocalcResult;

/// Tolerance for the soft "should sum to 100%" checks.
const SHARE_TOLERANCE: Decimal = dec!(0.000001);

const DEFAULT_INSTALLMENT_SHARES: [Decimal; 6] = [
    dec!(0.30),
    dec!(0.15),
    dec!(0.13),
    dec!(0.12),
    dec!(0.14),
    dec!(0.16),
];

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// How a loan's fixed monthly payment is specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Repayment {
    /// Initial annual principal repayment as a fraction of the loan (German annuity loan).
    TilgungRate { rate: Rate },
    /// Full amortisation over a fixed number of years.
    TermYears { years: u32 },
}

impl Default for Repayment {
    fn default() -> Self {
        Repayment::TilgungRate { rate: Decimal::ZERO }
    }
}

/// One loan facility as entered by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanSpec {
    /// Facility size. Subsidized loan: `None` means no facility.
    /// Main loan: `None` means "derive from the financing need".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_limit: Option<Money>,
    /// Annual nominal interest rate
    pub interest_rate: Rate,
    pub repayment: Repayment,
    /// Whole years after rent start during which only interest is paid
    pub tilgung_free_years: u32,
}

/// A construction-progress installment: `share` of the total purchase price
/// falls due `month_offset` months after the contract month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub share: Rate,
    pub month_offset: u32,
}

/// The complete, immutable input of a projection run.
///
/// Every field has a default (the reference scenario), so a partial JSON or
/// YAML document deserialises into a full configuration. Unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    // --- Purchase & property ---
    pub purchase_price: Money,
    /// Ancillary price component (parking space / garage)
    pub parking_price: Money,
    pub living_area_sqm: Decimal,
    /// Depreciable (building) share of the total investment
    pub land_ratio: Rate,

    // --- Transaction costs, as fractions of the total purchase price ---
    pub transfer_tax_rate: Rate,
    pub notary_rate: Rate,
    pub land_registry_rate: Rate,

    /// Equity as a fraction of the total investment
    pub equity_ratio: Rate,

    // --- Rent (monthly) ---
    pub rent_per_sqm: Money,
    pub parking_rent: Money,
    pub rent_growth_rate: Rate,

    // --- Furnishing ---
    pub furnishing_cost: Money,
    pub furnishing_depreciation_rate: Rate,
    pub furnishing_depreciation_years: u32,

    // --- Maintenance (monthly) ---
    pub maintenance_base: Money,
    pub wg_management_fee: Money,
    pub unit_management_fee: Money,
    pub maintenance_growth_rate: Rate,

    // --- Depreciation ---
    pub sonder_afa_rate: Rate,
    pub sonder_afa_years: u32,
    pub sonder_afa_base_amount: Money,
    pub degressive_afa_rate: Rate,
    pub degressive_years: u32,
    pub linear_years: u32,

    // --- Financing ---
    pub subsidized_loan: LoanSpec,
    pub main_loan: LoanSpec,
    /// Commitment fee per month on undrawn main-loan capacity
    pub bereitstellungszins_rate: Rate,
    pub grace_period_months: u32,

    // --- Tax ---
    pub marginal_tax_rate: Rate,

    // --- Timeline ---
    pub contract_date: NaiveDate,
    pub construction_end: NaiveDate,
    pub output_years: u32,
    pub installments: Vec<Installment>,

    // --- Exit ---
    /// Annual appreciation of the property used for the hypothetical sale
    pub sale_growth_rate: Rate,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let contract_date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap_or_default();
        let construction_end = NaiveDate::from_ymd_opt(2027, 12, 31).unwrap_or_default();
        let months_between = YearMonth::from_date(construction_end)
            .months_since(YearMonth::from_date(contract_date))
            .max(0) as u32;

        let installments = DEFAULT_INSTALLMENT_SHARES
            .iter()
            .zip(default_installment_offsets(
                DEFAULT_INSTALLMENT_SHARES.len(),
                months_between,
            ))
            .map(|(&share, month_offset)| Installment {
                share,
                month_offset,
            })
            .collect();

        Self {
            purchase_price: dec!(389000),
            parking_price: dec!(39900),
            living_area_sqm: dec!(41.39),
            land_ratio: dec!(0.81),
            transfer_tax_rate: dec!(0.035),
            notary_rate: dec!(0.015),
            land_registry_rate: dec!(0.005),
            equity_ratio: dec!(0.10),
            rent_per_sqm: dec!(28.0),
            parking_rent: dec!(100),
            rent_growth_rate: dec!(0.02),
            furnishing_cost: dec!(5000),
            furnishing_depreciation_rate: dec!(0.10),
            furnishing_depreciation_years: 10,
            maintenance_base: dec!(5),
            wg_management_fee: dec!(30),
            unit_management_fee: Decimal::ZERO,
            maintenance_growth_rate: dec!(0.02),
            sonder_afa_rate: dec!(0.05),
            sonder_afa_years: 4,
            sonder_afa_base_amount: dec!(100000),
            degressive_afa_rate: dec!(0.05),
            degressive_years: 10,
            linear_years: 40,
            subsidized_loan: LoanSpec {
                principal_limit: Some(dec!(100000)),
                interest_rate: dec!(0.0219),
                repayment: Repayment::TilgungRate { rate: dec!(0.02) },
                tilgung_free_years: 0,
            },
            main_loan: LoanSpec {
                principal_limit: None,
                interest_rate: dec!(0.04),
                repayment: Repayment::TilgungRate { rate: dec!(0.015) },
                tilgung_free_years: 0,
            },
            bereitstellungszins_rate: dec!(0.0025),
            grace_period_months: 12,
            marginal_tax_rate: dec!(0.42),
            contract_date,
            construction_end,
            output_years: 30,
            installments,
            sale_growth_rate: dec!(0.02),
        }
    }
}

impl ProjectionConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> ImmocalcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a configuration from an already-parsed document.
    pub fn from_value(value: serde_json::Value) -> ImmocalcResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Month offsets for `count` installments spread evenly from the contract
/// month (offset 0) to the construction-end month (`months_between`).
/// The last installment is pinned to construction end; a single installment
/// falls on construction end.
pub fn default_installment_offsets(count: usize, months_between: u32) -> Vec<u32> {
    match count {
        0 => Vec::new(),
        1 => vec![months_between],
        _ => {
            let steps = (count - 1) as u64;
            let span = u64::from(months_between);
            let mut offsets: Vec<u32> = (0..count as u64)
                // round(k * span / steps), halves rounded up
                .map(|k| ((2 * k * span + steps) / (2 * steps)) as u32)
                .collect();
            if let Some(last) = offsets.last_mut() {
                *last = months_between;
            }
            offsets
        }
    }
}

// ---------------------------------------------------------------------------
// Normalised loan terms
// ---------------------------------------------------------------------------

/// A loan resolved to its canonical form: rate plus fixed monthly annuity.
/// `tilgung_rate` and `term_months` are the derived display figures of
/// whichever representation the caller did not enter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal_limit: Money,
    pub annual_rate: Rate,
    pub monthly_payment: Money,
    /// Initial annual principal repayment implied by the payment
    pub tilgung_rate: Rate,
    /// Months to full repayment; `None` if the payment never amortises the loan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    pub tilgung_free_months: u32,
    /// Headline interest on the full limit, not simulated
    pub annual_interest: Money,
    pub monthly_interest: Money,
    /// Headline principal repayment on the full limit, not simulated
    pub annual_tilgung: Money,
    pub monthly_tilgung: Money,
}

impl LoanTerms {
    fn new(
        principal_limit: Money,
        annual_rate: Rate,
        monthly_payment: Money,
        tilgung_rate: Rate,
        term_months: Option<u32>,
        tilgung_free_months: u32,
    ) -> Self {
        let annual_interest = principal_limit * annual_rate;
        let annual_tilgung = principal_limit * tilgung_rate;
        Self {
            principal_limit,
            annual_rate,
            monthly_payment,
            tilgung_rate,
            term_months,
            tilgung_free_months,
            annual_interest,
            monthly_interest: annual_interest / dec!(12),
            annual_tilgung,
            monthly_tilgung: annual_tilgung / dec!(12),
        }
    }

    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / dec!(12)
    }
}

impl LoanSpec {
    /// Resolve either repayment representation into `LoanTerms` for a loan of `principal`.
    pub fn resolve(&self, principal: Money) -> LoanTerms {
        let principal = principal.max(Decimal::ZERO);
        let monthly_rate = self.interest_rate / dec!(12);
        let tilgung_free_months = self.tilgung_free_years.saturating_mul(12);

        match self.repayment {
            Repayment::TilgungRate { rate } => {
                let monthly_payment = principal * (self.interest_rate + rate) / dec!(12);
                LoanTerms::new(
                    principal,
                    self.interest_rate,
                    monthly_payment,
                    rate,
                    implied_term_months(principal, monthly_rate, monthly_payment),
                    tilgung_free_months,
                )
            }
            Repayment::TermYears { years } => {
                let periods = years.saturating_mul(12);
                // A zero term has no annuity; validation reports it.
                let monthly_payment =
                    annuity_payment(principal, monthly_rate, periods).unwrap_or(Decimal::ZERO);
                let tilgung_rate = if principal.is_zero() || periods == 0 {
                    Decimal::ZERO
                } else {
                    monthly_payment * dec!(12) / principal - self.interest_rate
                };
                LoanTerms::new(
                    principal,
                    self.interest_rate,
                    monthly_payment,
                    tilgung_rate,
                    (periods > 0).then_some(periods),
                    tilgung_free_months,
                )
            }
        }
    }
}

/// n = -ln(1 - P*i/A) / ln(1+i), rounded up to whole months.
fn implied_term_months(principal: Money, monthly_rate: Rate, payment: Money) -> Option<u32> {
    if principal.is_zero() {
        return Some(0);
    }
    if payment <= Decimal::ZERO {
        return None;
    }
    if monthly_rate.is_zero() {
        return (principal / payment).ceil().to_u32();
    }

    let interest_share = principal * monthly_rate / payment;
    if interest_share >= Decimal::ONE {
        return None;
    }

    let numerator = (Decimal::ONE - interest_share).checked_ln()?;
    let denominator = (Decimal::ONE + monthly_rate).checked_ln()?;
    if denominator.is_zero() {
        return None;
    }
    // Rounded first so ln() noise cannot push an exact term up a month
    (-numerator / denominator).round_dp(6).ceil().to_u32()
}

// ---------------------------------------------------------------------------
// Derived headline figures
// ---------------------------------------------------------------------------

/// Figures derived once from the configuration and shared, read-only, by
/// every stage of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseSummary {
    /// Purchase price + parking price
    pub total_purchase_price: Money,
    /// Apartment-only price per sqm (0 for a zero living area)
    pub price_per_sqm: Money,
    pub depreciation_base_price: Money,
    pub transfer_tax: Money,
    pub notary_fees: Money,
    pub land_registry_fees: Money,
    pub total_transaction_costs: Money,
    /// Total purchase price + transaction costs
    pub total_investment: Money,
    /// Total investment × land ratio; the opening degressive base
    pub total_depreciation_base: Money,
    pub equity: Money,
    pub monthly_rent_apartment: Money,
    pub monthly_rent_total: Money,
    pub annual_rent_total: Money,
    pub yearly_furnishing_depreciation: Money,
    pub monthly_maintenance: Money,
    /// Total investment + furnishing − equity
    pub financing_need: Money,
    pub subsidized_loan: LoanTerms,
    pub main_loan: LoanTerms,
    /// Combined initial monthly annuity of both loans
    pub total_monthly_loan_payment: Money,
    pub contract_month: YearMonth,
    /// First month after the construction-end month
    pub rent_start: YearMonth,
    /// December of the final output year
    pub last_month: YearMonth,
}

impl PurchaseSummary {
    pub fn from_config(config: &ProjectionConfig) -> Self {
        let total_purchase_price = config.purchase_price + config.parking_price;
        let price_per_sqm = if config.living_area_sqm > Decimal::ZERO {
            config.purchase_price / config.living_area_sqm
        } else {
            Decimal::ZERO
        };

        let transfer_tax = total_purchase_price * config.transfer_tax_rate;
        let notary_fees = total_purchase_price * config.notary_rate;
        let land_registry_fees = total_purchase_price * config.land_registry_rate;
        let total_transaction_costs = transfer_tax + notary_fees + land_registry_fees;

        let total_investment = total_purchase_price + total_transaction_costs;
        let equity = total_investment * config.equity_ratio;

        let monthly_rent_apartment = config.rent_per_sqm * config.living_area_sqm;
        let monthly_rent_total = monthly_rent_apartment + config.parking_rent;

        let financing_need = total_investment + config.furnishing_cost - equity;
        let subsidized_limit = config
            .subsidized_loan
            .principal_limit
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        let main_limit = config
            .main_loan
            .principal_limit
            .unwrap_or(financing_need - subsidized_limit)
            .max(Decimal::ZERO);

        let subsidized_loan = config.subsidized_loan.resolve(subsidized_limit);
        let main_loan = config.main_loan.resolve(main_limit);
        let total_monthly_loan_payment = subsidized_loan.monthly_payment + main_loan.monthly_payment;

        let contract_month = YearMonth::from_date(config.contract_date);
        let rent_start = YearMonth::from_date(config.construction_end).add_months(1);
        let last_month = YearMonth::new(contract_month.year(), 12)
            .unwrap_or(contract_month)
            .add_months((i64::from(config.output_years) - 1) * 12);

        Self {
            total_purchase_price,
            price_per_sqm,
            depreciation_base_price: total_purchase_price * config.land_ratio,
            transfer_tax,
            notary_fees,
            land_registry_fees,
            total_transaction_costs,
            total_investment,
            total_depreciation_base: total_investment * config.land_ratio,
            equity,
            monthly_rent_apartment,
            monthly_rent_total,
            annual_rent_total: monthly_rent_total * dec!(12),
            yearly_furnishing_depreciation: config.furnishing_cost
                * config.furnishing_depreciation_rate,
            monthly_maintenance: config.maintenance_base
                + config.wg_management_fee
                + config.unit_management_fee,
            financing_need,
            subsidized_loan,
            main_loan,
            total_monthly_loan_payment,
            contract_month,
            rent_start,
            last_month,
        }
    }

    /// Number of simulated months, contract month through `last_month`.
    pub fn total_months(&self) -> usize {
        (self.last_month.months_since(self.contract_month) + 1).max(0) as usize
    }

    pub fn first_year(&self) -> i32 {
        self.contract_month.year()
    }

    pub fn last_year(&self) -> i32 {
        self.last_month.year()
    }
}

// ---------------------------------------------------------------------------
// Soft validation
// ---------------------------------------------------------------------------

/// Advisory findings about the configuration. Never blocks a run.
pub fn validate(config: &ProjectionConfig, summary: &PurchaseSummary) -> Vec<String> {
    let mut warnings = Vec::new();

    let total_shares: Decimal = config.installments.iter().map(|i| i.share).sum();
    if (total_shares - Decimal::ONE).abs() > SHARE_TOLERANCE {
        warnings.push(format!(
            "Total installment shares = {:.3}; they should equal 1.0",
            total_shares
        ));
    }

    let furnishing_total =
        config.furnishing_depreciation_rate * Decimal::from(config.furnishing_depreciation_years);
    if (furnishing_total - Decimal::ONE).abs() > SHARE_TOLERANCE {
        warnings.push(format!(
            "Furnishing depreciation total = {:.1}% (rate × years); it should equal 100%",
            furnishing_total * dec!(100)
        ));
    }

    let rates = [
        ("land_ratio", config.land_ratio),
        ("transfer_tax_rate", config.transfer_tax_rate),
        ("notary_rate", config.notary_rate),
        ("land_registry_rate", config.land_registry_rate),
        ("equity_ratio", config.equity_ratio),
        ("rent_growth_rate", config.rent_growth_rate),
        ("furnishing_depreciation_rate", config.furnishing_depreciation_rate),
        ("maintenance_growth_rate", config.maintenance_growth_rate),
        ("sonder_afa_rate", config.sonder_afa_rate),
        ("degressive_afa_rate", config.degressive_afa_rate),
        ("subsidized_loan.interest_rate", config.subsidized_loan.interest_rate),
        ("main_loan.interest_rate", config.main_loan.interest_rate),
        ("bereitstellungszins_rate", config.bereitstellungszins_rate),
        ("marginal_tax_rate", config.marginal_tax_rate),
        ("sale_growth_rate", config.sale_growth_rate),
    ];
    for (field, rate) in rates {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            warnings.push(format!("{field} = {rate} lies outside [0, 1]"));
        }
    }

    for (name, spec) in [("subsidized_loan", &config.subsidized_loan), ("main_loan", &config.main_loan)] {
        if let Repayment::TermYears { years: 0 } = spec.repayment {
            warnings.push(format!(
                "{name} has a term of 0 years; no principal is scheduled"
            ));
        }
    }

    if config.output_years == 0 {
        warnings.push("Output horizon is 0 years; no rows are produced".into());
    } else {
        let horizon = summary.total_months() as u64;
        for (index, installment) in config.installments.iter().enumerate() {
            if u64::from(installment.month_offset) >= horizon {
                warnings.push(format!(
                    "Installment {} (offset {} months) falls after the last simulated month and is never drawn",
                    index + 1,
                    installment.month_offset
                ));
            }
        }
    }

    if summary.rent_start <= summary.contract_month {
        warnings.push(format!(
            "Construction end precedes the contract month; rental starts in {}",
            summary.rent_start
        ));
    }

    if config.living_area_sqm <= Decimal::ZERO {
        warnings.push("Living area is zero; price per sqm reported as 0".into());
    }

    warnings
}
