use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ImmocalcError;
use crate::types::{Money, Rate};
use crate::ImmocalcResult;

/// NPV magnitude below which a rate is accepted as the IRR.
pub const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
/// Upper bound on Newton steps and, separately, on bisection halvings.
pub const MAX_IRR_ITERATIONS: u32 = 100;

const RATE_TOLERANCE: Decimal = dec!(0.000000000001);
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(100);

/// Rates probed for a sign change when Newton-Raphson leaves the search interval.
const BRACKET_GRID: [Decimal; 13] = [
    dec!(-0.99),
    dec!(-0.9),
    dec!(-0.5),
    dec!(-0.2),
    dec!(0),
    dec!(0.05),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(5),
    dec!(25),
    dec!(100),
];

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ImmocalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(ImmocalcError::invalid_input(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    npv_and_derivative(rate, cash_flows)
        .map(|(value, _)| value)
        .ok_or_else(|| {
            ImmocalcError::invalid_input(
                "rate",
                format!("Discount factors at {rate} exceed the decimal range"),
            )
        })
}

/// Internal Rate of Return: bounded Newton-Raphson from `guess`, falling back
/// to bisection over a fixed rate grid when Newton stalls or leaves
/// (-99%, 10000%).
///
/// A series without both an inflow and an outflow has no IRR and is reported
/// as `FinancialImpossibility`; an unbracketable series as `ConvergenceFailure`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> ImmocalcResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ImmocalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    if !(has_inflow && has_outflow) {
        return Err(ImmocalcError::FinancialImpossibility(
            "IRR requires at least one positive and one negative cash flow".into(),
        ));
    }

    let mut rate = guess.clamp(RATE_FLOOR, RATE_CEILING);

    for _ in 0..MAX_IRR_ITERATIONS {
        let Some((value, slope)) = npv_and_derivative(rate, cash_flows) else {
            break;
        };

        if value.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if slope.is_zero() {
            break;
        }

        let Some(next) = value
            .checked_div(slope)
            .and_then(|step| rate.checked_sub(step))
        else {
            break;
        };

        // Guard against divergence
        if next <= RATE_FLOOR || next >= RATE_CEILING {
            break;
        }

        if (next - rate).abs() < RATE_TOLERANCE {
            return Ok(next);
        }

        rate = next;
    }

    bisect_irr(cash_flows)
}

fn bisect_irr(cash_flows: &[Money]) -> ImmocalcResult<Rate> {
    let evaluate = |rate: Rate| npv_and_derivative(rate, cash_flows).map(|(value, _)| value);

    let samples: Vec<(Rate, Money)> = BRACKET_GRID
        .iter()
        .filter_map(|&rate| evaluate(rate).map(|value| (rate, value)))
        .collect();

    if let Some(&(rate, _)) = samples
        .iter()
        .find(|(_, value)| value.abs() < CONVERGENCE_THRESHOLD)
    {
        return Ok(rate);
    }

    let bracket = samples.windows(2).find(|pair| {
        pair[0].1.is_sign_negative() != pair[1].1.is_sign_negative()
    });

    let Some(pair) = bracket else {
        return Err(ImmocalcError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: samples.last().map(|(_, value)| *value).unwrap_or(Decimal::MAX),
        });
    };

    let (mut lo, mut lo_value) = pair[0];
    let (mut hi, _) = pair[1];
    let mut last_delta = lo_value;

    for _ in 0..MAX_IRR_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let Some(mid_value) = evaluate(mid) else {
            break;
        };
        last_delta = mid_value;

        if mid_value.abs() < CONVERGENCE_THRESHOLD || hi - lo < RATE_TOLERANCE {
            return Ok(mid);
        }

        if mid_value.is_sign_negative() == lo_value.is_sign_negative() {
            lo = mid;
            lo_value = mid_value;
        } else {
            hi = mid;
        }
    }

    Err(ImmocalcError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
/// `None` when a discount factor leaves the decimal range.
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^0 = 1

    for (t, cf) in cash_flows.iter().enumerate() {
        let term = cf.checked_mul(discount)?;
        value = value.checked_add(term)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let d_term = Decimal::from(t as i64)
                .checked_mul(term)?
                .checked_div(one_plus_r)?;
            slope = slope.checked_sub(d_term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((value, slope))
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> ImmocalcResult<Money> {
    if nper == 0 {
        return Err(ImmocalcError::invalid_input("nper", "Number of periods must be > 0"));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powi(i64::from(nper))
        .ok_or_else(|| {
            ImmocalcError::invalid_input("nper", format!("(1 + {rate})^{nper} exceeds the decimal range"))
        })?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(ImmocalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(-(present_value * factor + future_value) / annuity_factor)
}

/// Level payment that amortises `principal` over `periods` at `periodic_rate`:
/// `P * i / (1 - (1+i)^-n)`, or `P / n` at a zero rate.
pub fn annuity_payment(principal: Money, periodic_rate: Rate, periods: u32) -> ImmocalcResult<Money> {
    pmt(periodic_rate, periods, principal, Decimal::ZERO).map(|payment| -payment)
}
