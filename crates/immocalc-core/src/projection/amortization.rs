use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calendar::YearMonth;
use super::config::{LoanTerms, ProjectionConfig, PurchaseSummary};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before rent start: interest-only, commitment fee after the grace period
    Construction,
    /// From rent start: fixed annuity
    Rental,
}

/// One facility's movements in one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanMonth {
    pub draw: Money,
    pub interest: Money,
    pub principal: Money,
    /// Interest + principal
    pub payment: Money,
    /// Closing balance
    pub balance: Money,
}

/// One simulated month of the financing ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthLedgerEntry {
    pub month: YearMonth,
    pub phase: Phase,
    /// Cash requirement of the month (transaction costs, furnishing, installments)
    pub draw: Money,
    pub equity_used: Money,
    pub subsidized: LoanMonth,
    pub main: LoanMonth,
    /// Main-loan limit not yet drawn
    pub main_undrawn: Money,
    /// Commitment fee on `main_undrawn`
    pub bereitstellung: Money,
    /// Interest on both loans plus bereitstellung
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_payment: Money,
    pub total_balance: Money,
}

// ---------------------------------------------------------------------------
// Loan and equity state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LoanAccount {
    terms: LoanTerms,
    balance: Money,
    drawn: Money,
}

impl LoanAccount {
    fn new(terms: LoanTerms) -> Self {
        Self {
            terms,
            balance: Decimal::ZERO,
            drawn: Decimal::ZERO,
        }
    }

    /// Draw `amount`, or only what still fits under the limit when `capped`.
    /// Returns the amount actually drawn.
    fn draw(&mut self, amount: Money, capped: bool) -> Money {
        let taken = if capped {
            amount.min((self.terms.principal_limit - self.balance).max(Decimal::ZERO))
        } else {
            amount
        };
        self.balance += taken;
        self.drawn += taken;
        taken
    }

    fn undrawn(&self) -> Money {
        (self.terms.principal_limit - self.drawn).max(Decimal::ZERO)
    }

    fn interest(&self) -> Money {
        self.balance * self.terms.monthly_rate()
    }

    /// Annuity minus interest, clamped to the balance; zero while tilgung-free.
    fn scheduled_principal(&self, interest: Money, months_into_rental: i64) -> Money {
        if months_into_rental < i64::from(self.terms.tilgung_free_months) {
            return Decimal::ZERO;
        }
        (self.terms.monthly_payment - interest)
            .max(Decimal::ZERO)
            .min(self.balance)
    }

    fn repay(&mut self, principal: Money) {
        self.balance = (self.balance - principal).max(Decimal::ZERO);
    }
}

/// Cross-month accumulator threaded through the simulation loop.
#[derive(Debug, Clone)]
struct AmortizationState {
    subsidized: LoanAccount,
    main: LoanAccount,
    equity_remaining: Money,
}

impl AmortizationState {
    fn open(summary: &PurchaseSummary) -> Self {
        Self {
            subsidized: LoanAccount::new(summary.subsidized_loan.clone()),
            main: LoanAccount::new(summary.main_loan.clone()),
            equity_remaining: summary.equity.max(Decimal::ZERO),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the month-by-month financing ledger from the contract month through
/// December of the last output year.
///
/// Each month's cash requirement is met from equity first, then from the
/// subsidized loan up to its limit, and the remainder from the main loan.
pub fn simulate_amortization(
    config: &ProjectionConfig,
    summary: &PurchaseSummary,
) -> Vec<MonthLedgerEntry> {
    let mut ledger = Vec::with_capacity(summary.total_months());
    let mut state = AmortizationState::open(summary);

    for (index, month) in summary.contract_month.through(summary.last_month).enumerate() {
        let draw = draw_for_month(config, summary, index as i64);
        let (next, entry) = step(state, config, summary, index as i64, month, draw);
        tracing::trace!(
            month = %entry.month,
            draw = %entry.draw,
            interest = %entry.total_interest,
            balance = %entry.total_balance,
            "ledger month"
        );
        state = next;
        ledger.push(entry);
    }

    ledger
}

/// Cash requirement in month `index` (0 = contract month).
pub fn draw_for_month(config: &ProjectionConfig, summary: &PurchaseSummary, index: i64) -> Money {
    let upfront = if index == 0 {
        summary.total_transaction_costs + config.furnishing_cost
    } else {
        Decimal::ZERO
    };

    let installments: Money = config
        .installments
        .iter()
        .filter(|installment| i64::from(installment.month_offset) == index)
        .map(|installment| installment.share * summary.total_purchase_price)
        .sum();

    upfront + installments
}

fn step(
    mut state: AmortizationState,
    config: &ProjectionConfig,
    summary: &PurchaseSummary,
    index: i64,
    month: YearMonth,
    draw: Money,
) -> (AmortizationState, MonthLedgerEntry) {
    // --- Equity-first waterfall ---
    let equity_used = draw.min(state.equity_remaining).max(Decimal::ZERO);
    state.equity_remaining -= equity_used;
    let financed = (draw - equity_used).max(Decimal::ZERO);

    let subsidized_draw = state.subsidized.draw(financed, true);
    let main_draw = state.main.draw(financed - subsidized_draw, false);

    // --- Interest and principal ---
    let phase = if month < summary.rent_start {
        Phase::Construction
    } else {
        Phase::Rental
    };

    let subsidized_interest = state.subsidized.interest();
    let main_interest = state.main.interest();

    let (subsidized_principal, main_principal, bereitstellung) = match phase {
        Phase::Construction => {
            let fee = if index >= i64::from(config.grace_period_months) {
                state.main.undrawn() * config.bereitstellungszins_rate
            } else {
                Decimal::ZERO
            };
            (Decimal::ZERO, Decimal::ZERO, fee)
        }
        Phase::Rental => {
            let months_into_rental = month.months_since(summary.rent_start);
            let subsidized_principal = state
                .subsidized
                .scheduled_principal(subsidized_interest, months_into_rental);
            let main_principal = state
                .main
                .scheduled_principal(main_interest, months_into_rental);
            state.subsidized.repay(subsidized_principal);
            state.main.repay(main_principal);
            (subsidized_principal, main_principal, Decimal::ZERO)
        }
    };

    let subsidized = LoanMonth {
        draw: subsidized_draw,
        interest: subsidized_interest,
        principal: subsidized_principal,
        payment: subsidized_interest + subsidized_principal,
        balance: state.subsidized.balance,
    };
    let main = LoanMonth {
        draw: main_draw,
        interest: main_interest,
        principal: main_principal,
        payment: main_interest + main_principal,
        balance: state.main.balance,
    };

    let total_interest = subsidized.interest + main.interest + bereitstellung;
    let total_principal = subsidized.principal + main.principal;

    let entry = MonthLedgerEntry {
        month,
        phase,
        draw,
        equity_used,
        main_undrawn: state.main.undrawn(),
        bereitstellung,
        total_interest,
        total_principal,
        total_payment: total_interest + total_principal,
        total_balance: subsidized.balance + main.balance,
        subsidized,
        main,
    };

    (state, entry)
}
