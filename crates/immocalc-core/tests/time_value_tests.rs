use immocalc_core::time_value::{annuity_payment, irr, npv};
use immocalc_core::ImmocalcError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// IRR
// ===========================================================================

#[test]
fn test_irr_two_point_series() {
    let rate = irr(&[dec!(-100), dec!(110)], dec!(0.10)).unwrap();
    assert!((rate - dec!(0.10)).abs() < dec!(0.0001), "IRR {rate}");
}

#[test]
fn test_irr_zeroes_npv() {
    let flows = [
        dec!(-45000),
        dec!(-3200),
        dec!(1800),
        dec!(2100),
        dec!(2300),
        dec!(120000),
    ];
    let rate = irr(&flows, dec!(0.10)).unwrap();
    let residual = npv(rate, &flows).unwrap();
    assert!(residual.abs() < dec!(0.01), "NPV at IRR {rate} = {residual}");
}

#[test]
fn test_irr_is_independent_of_guess() {
    let flows = [dec!(-1000), dec!(300), dec!(400), dec!(500)];
    let a = irr(&flows, dec!(0.05)).unwrap();
    let b = irr(&flows, dec!(0.50)).unwrap();
    assert!((a - b).abs() < dec!(0.00001), "{a} vs {b}");
}

#[test]
fn test_irr_rejects_same_sign_series() {
    let positive = irr(&[dec!(100), dec!(110)], dec!(0.10));
    assert!(matches!(
        positive,
        Err(ImmocalcError::FinancialImpossibility(_))
    ));
    let single = irr(&[dec!(-100)], dec!(0.10));
    assert!(matches!(single, Err(ImmocalcError::InsufficientData(_))));
}

// ===========================================================================
// Annuity
// ===========================================================================

#[test]
fn test_annuity_repays_principal() {
    let principal = dec!(250000);
    let monthly_rate = dec!(0.035) / dec!(12);
    let payment = annuity_payment(principal, monthly_rate, 300).unwrap();

    let mut balance = principal;
    for _ in 0..300 {
        balance = balance + balance * monthly_rate - payment;
    }
    assert!(balance.abs() < dec!(0.01), "residual balance {balance}");
}

#[test]
fn test_annuity_zero_rate() {
    let payment = annuity_payment(dec!(36000), Decimal::ZERO, 360).unwrap();
    assert_eq!(payment, dec!(100));
}
