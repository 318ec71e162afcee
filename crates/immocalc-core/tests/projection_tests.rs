use immocalc_core::projection::{
    run_projection, LoanSpec, Phase, ProjectionConfig, Repayment, YearMonth,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

// ===========================================================================
// Reference scenario
// ===========================================================================

#[test]
fn test_reference_scenario_first_month() {
    let out = run_projection(&ProjectionConfig::default());
    let summary = &out.result.summary;
    let first = &out.result.ledger[0];
    let first_cash = &out.result.cashflow[0];

    assert_eq!(summary.total_purchase_price, dec!(428900));
    assert_eq!(summary.total_transaction_costs, dec!(23589.5));
    assert_eq!(summary.rent_start, ym(2028, 1));

    assert_eq!(first.month, ym(2025, 9));
    assert_eq!(first.phase, Phase::Construction);
    // Transaction costs + furnishing + the 30% installment due at signing
    assert_eq!(
        first.draw,
        dec!(23589.5) + dec!(5000) + dec!(0.30) * dec!(428900)
    );
    assert_eq!(first.equity_used, summary.equity);
    assert_eq!(first.total_principal, Decimal::ZERO);
    assert_eq!(first.bereitstellung, Decimal::ZERO);

    assert_eq!(first_cash.rent, Decimal::ZERO);
    assert_eq!(first_cash.total_depreciation, Decimal::ZERO);
    // Interest accrues only on what has been drawn
    let expected_interest = first.subsidized.balance * dec!(0.0219) / dec!(12)
        + first.main.balance * dec!(0.04) / dec!(12);
    assert_eq!(first_cash.interest, expected_interest);
}

#[test]
fn test_reference_scenario_shape() {
    let out = run_projection(&ProjectionConfig::default());
    let result = &out.result;

    assert_eq!(result.ledger.len(), 352);
    assert_eq!(result.ledger.last().unwrap().month, ym(2054, 12));
    assert_eq!(result.yearly.first().unwrap().year, 2025);
    assert_eq!(result.yearly.last().unwrap().year, 2054);
    assert_eq!(result.returns.len(), result.yearly.len());

    for pair in result.ledger.windows(2) {
        assert_eq!(pair[1].month, pair[0].month.add_months(1));
    }
}

// ===========================================================================
// Financing invariants
// ===========================================================================

#[test]
fn test_balances_stay_within_limits() {
    let out = run_projection(&ProjectionConfig::default());
    let summary = &out.result.summary;
    for entry in &out.result.ledger {
        assert!(entry.subsidized.balance >= Decimal::ZERO);
        assert!(entry.main.balance >= Decimal::ZERO);
        assert!(
            entry.subsidized.balance <= summary.subsidized_loan.principal_limit,
            "{}: subsidized {}",
            entry.month,
            entry.subsidized.balance
        );
        assert!(
            entry.main.balance <= summary.main_loan.principal_limit,
            "{}: main {}",
            entry.month,
            entry.main.balance
        );
    }
}

#[test]
fn test_total_draws_equal_investment_plus_furnishing() {
    let out = run_projection(&ProjectionConfig::default());
    let summary = &out.result.summary;
    let draws: Decimal = out.result.ledger.iter().map(|e| e.draw).sum();
    assert_eq!(draws, summary.total_investment + dec!(5000));

    let funded: Decimal = out
        .result
        .ledger
        .iter()
        .map(|e| e.equity_used + e.subsidized.draw + e.main.draw)
        .sum();
    assert_eq!(funded, draws);
}

#[test]
fn test_equity_pool_consumed_before_loans() {
    let out = run_projection(&ProjectionConfig::default());
    let equity: Decimal = out.result.ledger.iter().map(|e| e.equity_used).sum();
    assert_eq!(equity, out.result.summary.equity);
    assert_eq!(out.result.ledger[0].equity_used, equity);
}

#[test]
fn test_tilgung_free_years_suppress_principal() {
    let config = ProjectionConfig {
        subsidized_loan: LoanSpec {
            principal_limit: Some(dec!(100000)),
            interest_rate: dec!(0.0219),
            repayment: Repayment::TilgungRate { rate: dec!(0.02) },
            tilgung_free_years: 3,
        },
        ..ProjectionConfig::default()
    };
    let out = run_projection(&config);
    for entry in &out.result.ledger {
        if entry.month < ym(2031, 1) {
            assert_eq!(entry.subsidized.principal, Decimal::ZERO, "{}", entry.month);
        }
    }
    let first_repayment = out
        .result
        .ledger
        .iter()
        .find(|e| e.month == ym(2031, 1))
        .unwrap();
    assert!(first_repayment.subsidized.principal > Decimal::ZERO);
    // Main loan has no tilgung-free period of its own
    let rental_start = out
        .result
        .ledger
        .iter()
        .find(|e| e.month == ym(2028, 1))
        .unwrap();
    assert!(rental_start.main.principal > Decimal::ZERO);
}

// ===========================================================================
// Depreciation invariants
// ===========================================================================

#[test]
fn test_depreciation_round_trip() {
    let out = run_projection(&ProjectionConfig::default());
    let base = out.result.summary.total_depreciation_base;
    let building: Decimal = out
        .result
        .cashflow
        .iter()
        .map(|r| r.depreciation.building())
        .sum();
    assert!(
        (building - base).abs() < dec!(0.001),
        "building depreciation {building} vs base {base}"
    );
}

#[test]
fn test_depreciation_base_non_increasing() {
    let out = run_projection(&ProjectionConfig::default());
    let mut previous = out.result.summary.total_depreciation_base;
    for r in &out.result.cashflow {
        assert!(r.remaining_depreciation_base <= previous, "{}", r.month);
        assert!(r.remaining_depreciation_base >= Decimal::ZERO);
        previous = r.remaining_depreciation_base;
    }
}

// ===========================================================================
// Tax and returns
// ===========================================================================

#[test]
fn test_tax_adjustment_sign_and_magnitude() {
    let config = ProjectionConfig {
        marginal_tax_rate: dec!(0.30),
        ..ProjectionConfig::default()
    };
    let out = run_projection(&config);
    for r in &out.result.cashflow {
        assert_eq!(r.tax_adjustment, -r.taxable_income * dec!(0.30));
        assert_eq!(
            r.taxable_income.is_sign_negative() && !r.taxable_income.is_zero(),
            r.tax_adjustment > Decimal::ZERO
        );
    }
}

#[test]
fn test_yearly_tax_matches_monthly() {
    let out = run_projection(&ProjectionConfig::default());
    for year in &out.result.yearly {
        let monthly: Decimal = out
            .result
            .cashflow
            .iter()
            .filter(|r| r.month.year() == year.year)
            .map(|r| r.tax_adjustment)
            .sum();
        assert_eq!(year.tax_adjustment, monthly, "{}", year.year);
    }
}

#[test]
fn test_returns_rows_are_consistent() {
    let out = run_projection(&ProjectionConfig::default());
    for row in &out.result.returns {
        assert_eq!(row.net_sale_proceeds, row.projected_price - row.outstanding_loan);
        assert_eq!(
            row.total_outflow,
            row.cumulative_equity + row.cumulative_interest + row.cumulative_maintenance
        );
        assert_eq!(row.total_inflow, row.cumulative_rent + row.cumulative_tax);
        assert_eq!(
            row.profit,
            row.net_sale_proceeds + row.total_inflow - row.total_outflow
        );
        assert_eq!(row.holding_years as i32, row.year - 2025 + 1);
    }
}

#[test]
fn test_sale_growth_override_changes_only_returns() {
    let base = run_projection(&ProjectionConfig::default());
    let flat = run_projection(&ProjectionConfig {
        sale_growth_rate: Decimal::ZERO,
        ..ProjectionConfig::default()
    });
    assert_eq!(base.result.ledger, flat.result.ledger);
    assert_eq!(base.result.yearly, flat.result.yearly);
    assert!(flat
        .result
        .returns
        .iter()
        .all(|r| r.projected_price == dec!(428900)));
}

// ===========================================================================
// Determinism and degenerate inputs
// ===========================================================================

#[test]
fn test_idempotent() {
    let config = ProjectionConfig::default();
    let first = run_projection(&config);
    let second = run_projection(&config);
    assert_eq!(
        serde_json::to_string(&first.result).unwrap(),
        serde_json::to_string(&second.result).unwrap()
    );
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn test_degenerate_configuration_still_produces_output() {
    let config = ProjectionConfig {
        living_area_sqm: Decimal::ZERO,
        rent_per_sqm: Decimal::ZERO,
        parking_rent: Decimal::ZERO,
        furnishing_depreciation_years: 0,
        main_loan: LoanSpec {
            principal_limit: None,
            interest_rate: Decimal::ZERO,
            repayment: Repayment::TermYears { years: 0 },
            tilgung_free_years: 0,
        },
        ..ProjectionConfig::default()
    };
    let out = run_projection(&config);
    assert_eq!(out.result.ledger.len(), 352);
    assert_eq!(out.result.summary.price_per_sqm, Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("Living area")));
    assert!(out.warnings.iter().any(|w| w.contains("term of 0 years")));
    assert!(out.warnings.iter().any(|w| w.contains("Furnishing")));
}

#[test]
fn test_partial_yaml_style_json_configuration() {
    let config: ProjectionConfig = serde_json::from_value(serde_json::json!({
        "purchase_price": "250000",
        "parking_price": "0",
        "output_years": 10,
        "installments": [{"share": "1.0", "month_offset": 0}]
    }))
    .unwrap();
    let out = run_projection(&config);
    assert_eq!(out.result.summary.total_purchase_price, dec!(250000));
    assert_eq!(out.result.yearly.len(), 10);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}
