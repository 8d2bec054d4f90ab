//! Simple-interest amortization.
//!
//! Interest is simple and prorated over the term:
//! `interest = principal * rate * months / 1200`. The schedule divides
//! `principal + interest` into equal monthly installments, with the
//! residual cents folded into the final installment so the schedule
//! sums to the total exactly.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::loan::error::LoanError;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One row of a repayment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// 1-based period number.
    pub period: u32,
    /// Date the installment falls due.
    pub due_date: NaiveDate,
    /// Amount due this period.
    pub amount: Decimal,
    /// Amount due up to and including this period.
    pub cumulative: Decimal,
    /// Amount still due after this period.
    pub remaining: Decimal,
}

/// The computed financials of a loan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amortization {
    /// Principal borrowed.
    pub principal: Decimal,
    /// Annual interest rate in percent, as captured at request time.
    pub annual_rate: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// Total interest over the term.
    pub interest: Decimal,
    /// Principal plus interest.
    pub total_payable: Decimal,
    /// Regular monthly installment (the final one absorbs rounding).
    pub monthly_installment: Decimal,
    /// Per-period schedule; `term_months` entries.
    pub schedule: Vec<ScheduleEntry>,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Amortization {
    /// Computes the full amortization for a loan request.
    ///
    /// `start_date` anchors the due dates: installment `k` falls due
    /// `k` months after it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPrincipal`, `InvalidTerm` or `InvalidRate` when
    /// the inputs are out of range.
    pub fn compute(
        principal: Decimal,
        annual_rate: Decimal,
        term_months: u32,
        max_term_months: u32,
        start_date: NaiveDate,
    ) -> Result<Self, LoanError> {
        if principal <= Decimal::ZERO {
            return Err(LoanError::InvalidPrincipal(principal));
        }
        if term_months == 0 || term_months > max_term_months {
            return Err(LoanError::InvalidTerm {
                term: term_months,
                max: max_term_months,
            });
        }
        if annual_rate < Decimal::ZERO || annual_rate > ONE_HUNDRED {
            return Err(LoanError::InvalidRate(annual_rate));
        }

        let months = Decimal::from(term_months);
        let interest = round2(principal * annual_rate * months / Decimal::from(1200));
        let total_payable = principal + interest;
        let monthly_installment = round2(total_payable / months);

        let mut schedule = Vec::with_capacity(term_months as usize);
        let mut cumulative = Decimal::ZERO;
        for period in 1..=term_months {
            let amount = if period == term_months {
                total_payable - cumulative
            } else {
                monthly_installment
            };
            cumulative += amount;
            schedule.push(ScheduleEntry {
                period,
                due_date: start_date
                    .checked_add_months(Months::new(period))
                    .unwrap_or(start_date),
                amount,
                cumulative,
                remaining: total_payable - cumulative,
            });
        }

        Ok(Self {
            principal,
            annual_rate,
            term_months,
            interest,
            total_payable,
            monthly_installment,
            schedule,
        })
    }

    /// Date the final installment falls due.
    #[must_use]
    pub fn final_due_date(&self) -> Option<NaiveDate> {
        self.schedule.last().map(|entry| entry.due_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_fifty_thousand_at_ten_percent_over_a_year() {
        let amortization =
            Amortization::compute(dec!(50_000), dec!(10), 12, 12, start()).unwrap();

        assert_eq!(amortization.interest, dec!(5000.00));
        assert_eq!(amortization.total_payable, dec!(55_000.00));
        assert_eq!(amortization.monthly_installment, dec!(4583.33));

        let last = amortization.schedule.last().unwrap();
        // 55,000 - 11 * 4,583.33 = 4,583.37
        assert_eq!(last.amount, dec!(4583.37));
        assert_eq!(last.remaining, Decimal::ZERO);
        assert_eq!(last.cumulative, dec!(55_000.00));
    }

    #[test]
    fn test_due_dates_advance_monthly() {
        let amortization = Amortization::compute(dec!(12_000), dec!(5), 3, 12, start()).unwrap();
        let dates: Vec<NaiveDate> = amortization
            .schedule
            .iter()
            .map(|entry| entry.due_date)
            .collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                NaiveDate::from_ymd_opt(2026, 4, 15).unwrap(),
            ]
        );
        assert_eq!(amortization.final_due_date(), dates.last().copied());
    }

    #[test]
    fn test_end_of_month_start_clamps() {
        let eom = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let amortization = Amortization::compute(dec!(10_000), dec!(10), 2, 12, eom).unwrap();
        assert_eq!(
            amortization.schedule[0].due_date,
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_zero_rate_means_no_interest() {
        let amortization =
            Amortization::compute(dec!(30_000), Decimal::ZERO, 6, 12, start()).unwrap();
        assert_eq!(amortization.interest, Decimal::ZERO);
        assert_eq!(amortization.total_payable, dec!(30_000));
        assert_eq!(amortization.monthly_installment, dec!(5000.00));
    }

    #[test]
    fn test_single_month_term() {
        let amortization = Amortization::compute(dec!(20_000), dec!(12), 1, 12, start()).unwrap();
        // 20,000 * 12 * 1 / 1200 = 200
        assert_eq!(amortization.interest, dec!(200.00));
        assert_eq!(amortization.schedule.len(), 1);
        assert_eq!(amortization.schedule[0].amount, dec!(20_200.00));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(Amortization::compute(Decimal::ZERO, dec!(10), 12, 12, start()).is_err());
        assert!(Amortization::compute(dec!(-5), dec!(10), 12, 12, start()).is_err());
        assert!(Amortization::compute(dec!(5000), dec!(10), 0, 12, start()).is_err());
        assert!(Amortization::compute(dec!(5000), dec!(10), 13, 12, start()).is_err());
        assert!(Amortization::compute(dec!(5000), dec!(-1), 12, 12, start()).is_err());
        assert!(Amortization::compute(dec!(5000), dec!(101), 12, 12, start()).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        /// The schedule always sums to the total payable, to the cent.
        #[test]
        fn prop_schedule_sums_to_total(
            principal_cents in 1i64..1_000_000_000,
            rate_pct in 0u32..=100,
            term in 1u32..=12,
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let rate = Decimal::from(rate_pct);
            let amortization =
                Amortization::compute(principal, rate, term, 12, start()).unwrap();

            let sum: Decimal = amortization
                .schedule
                .iter()
                .map(|entry| entry.amount)
                .sum();
            prop_assert_eq!(sum, amortization.total_payable);
            prop_assert_eq!(
                amortization.schedule.last().unwrap().remaining,
                Decimal::ZERO
            );
            prop_assert_eq!(amortization.schedule.len(), term as usize);
        }

        /// Remaining amounts decrease monotonically across the schedule.
        #[test]
        fn prop_remaining_is_monotonic(
            principal_cents in 1i64..1_000_000_000,
            rate_pct in 0u32..=100,
            term in 1u32..=12,
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let amortization =
                Amortization::compute(principal, Decimal::from(rate_pct), term, 12, start())
                    .unwrap();

            let mut previous = amortization.total_payable;
            for entry in &amortization.schedule {
                prop_assert!(entry.remaining < previous || entry.amount == Decimal::ZERO);
                prop_assert!(entry.remaining >= Decimal::ZERO);
                previous = entry.remaining;
            }
        }
    }
}
