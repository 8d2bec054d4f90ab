//! Group balance accumulator.
//!
//! The group balance is a derived value: it must always equal the fold
//! of all ledger events for the group. Repositories maintain it
//! incrementally inside the transaction that records the triggering
//! event; this module is the pure recomputation and the single place
//! where the non-negativity invariant is enforced.

use rust_decimal::Decimal;
use thiserror::Error;

/// A balance-affecting ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEvent {
    /// Money entering the group pot (savings, penalty, interest, fee,
    /// loan repayment).
    Credit(Decimal),
    /// Money leaving the group pot (withdrawal, loan disbursement).
    Debit(Decimal),
}

/// Balance invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// Applying the event would drive the balance negative.
    #[error("debit of {debit} exceeds balance {balance}")]
    WouldGoNegative {
        /// Balance before the event.
        balance: Decimal,
        /// Attempted debit amount.
        debit: Decimal,
    },

    /// A negative amount was supplied for an event.
    #[error("event amount must not be negative: {0}")]
    NegativeAmount(Decimal),
}

/// Applies one event to a balance.
///
/// # Errors
///
/// Returns `BalanceError::WouldGoNegative` instead of producing a
/// negative balance; the triggering operation must fail rather than be
/// applied.
pub fn apply_event(balance: Decimal, event: BalanceEvent) -> Result<Decimal, BalanceError> {
    match event {
        BalanceEvent::Credit(amount) => {
            if amount < Decimal::ZERO {
                return Err(BalanceError::NegativeAmount(amount));
            }
            Ok(balance + amount)
        }
        BalanceEvent::Debit(amount) => {
            if amount < Decimal::ZERO {
                return Err(BalanceError::NegativeAmount(amount));
            }
            if amount > balance {
                return Err(BalanceError::WouldGoNegative {
                    balance,
                    debit: amount,
                });
            }
            Ok(balance - amount)
        }
    }
}

/// Recomputes a balance from the full event history.
///
/// # Errors
///
/// Returns the first invariant violation encountered; a history that
/// was recorded through `apply_event` never fails.
pub fn recompute<I>(events: I) -> Result<Decimal, BalanceError>
where
    I: IntoIterator<Item = BalanceEvent>,
{
    events
        .into_iter()
        .try_fold(Decimal::ZERO, |balance, event| apply_event(balance, event))
}

/// Funds a group can still lend out.
///
/// The balance already excludes disbursed principal; `reserved` is the
/// principal of loan requests still pending (excluding the loan under
/// consideration, if any), so concurrent requests cannot over-promise
/// the same funds.
#[must_use]
pub fn available_loan_funds(balance: Decimal, reserved: Decimal) -> Decimal {
    (balance - reserved).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_increases_balance() {
        let balance = apply_event(dec!(1000), BalanceEvent::Credit(dec!(500))).unwrap();
        assert_eq!(balance, dec!(1500));
    }

    #[test]
    fn test_debit_decreases_balance() {
        let balance = apply_event(dec!(1000), BalanceEvent::Debit(dec!(400))).unwrap();
        assert_eq!(balance, dec!(600));
    }

    #[test]
    fn test_debit_to_exactly_zero() {
        let balance = apply_event(dec!(1000), BalanceEvent::Debit(dec!(1000))).unwrap();
        assert_eq!(balance, Decimal::ZERO);
    }

    #[test]
    fn test_overdraw_fails() {
        let result = apply_event(dec!(1000), BalanceEvent::Debit(dec!(1000.01)));
        assert_eq!(
            result,
            Err(BalanceError::WouldGoNegative {
                balance: dec!(1000),
                debit: dec!(1000.01),
            })
        );
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(apply_event(dec!(100), BalanceEvent::Credit(dec!(-1))).is_err());
        assert!(apply_event(dec!(100), BalanceEvent::Debit(dec!(-1))).is_err());
    }

    #[test]
    fn test_recompute_history() {
        let events = vec![
            BalanceEvent::Credit(dec!(100_000)),
            BalanceEvent::Debit(dec!(50_000)),
            BalanceEvent::Credit(dec!(55_000)),
        ];
        assert_eq!(recompute(events).unwrap(), dec!(105_000));
    }

    #[test]
    fn test_available_loan_funds() {
        assert_eq!(available_loan_funds(dec!(100_000), dec!(30_000)), dec!(70_000));
        assert_eq!(available_loan_funds(dec!(20_000), dec!(30_000)), Decimal::ZERO);
        assert_eq!(available_loan_funds(dec!(50_000), Decimal::ZERO), dec!(50_000));
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000_00).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Applying events one by one always matches the full
        /// recomputation over the same history.
        #[test]
        fn prop_incremental_equals_recomputed(
            amounts in prop::collection::vec((amount_strategy(), any::<bool>()), 0..40),
        ) {
            let mut events = Vec::with_capacity(amounts.len());
            let mut incremental = Decimal::ZERO;

            for (amount, credit) in amounts {
                let event = if credit {
                    BalanceEvent::Credit(amount)
                } else {
                    BalanceEvent::Debit(amount)
                };
                // Skip events the accumulator would have refused.
                if let Ok(next) = apply_event(incremental, event) {
                    incremental = next;
                    events.push(event);
                }
            }

            prop_assert_eq!(recompute(events).unwrap(), incremental);
        }

        /// A recorded history never yields a negative balance.
        #[test]
        fn prop_balance_never_negative(
            amounts in prop::collection::vec((amount_strategy(), any::<bool>()), 0..40),
        ) {
            let mut balance = Decimal::ZERO;
            for (amount, credit) in amounts {
                let event = if credit {
                    BalanceEvent::Credit(amount)
                } else {
                    BalanceEvent::Debit(amount)
                };
                if let Ok(next) = apply_event(balance, event) {
                    balance = next;
                }
                prop_assert!(balance >= Decimal::ZERO);
            }
        }
    }
}
