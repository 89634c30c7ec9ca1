use chrono::{Months, NaiveDate};

use super::error::EngineError;
use super::types::{Projection, validate_terms};

/// Window used for the "pay it off in three years" payment.
pub const FIXED_WINDOW_MONTHS: i32 = 36;
/// Horizon of the suggested-payment heuristic (five years).
pub const HEURISTIC_PAYOFF_MONTHS: f64 = 60.0;

pub fn monthly_rate(apr: f64) -> f64 {
    apr / 100.0 / 12.0
}

/// Interest accrued over one month on `balance`, rounded to a minor unit.
pub fn monthly_interest(balance: i64, apr: f64) -> i64 {
    (balance as f64 * monthly_rate(apr)).round() as i64
}

/// Projects a single debt forward from `today` at a constant monthly payment.
///
/// A `minimum_payment` of zero means "none set": the projection then assumes
/// the five-year heuristic payment. A payment that does not exceed the
/// monthly interest yields an unbounded projection (`months_to_payoff: None`),
/// which is a result rather than an error.
pub fn project(
    balance: i64,
    apr: f64,
    minimum_payment: i64,
    today: NaiveDate,
) -> Result<Projection, EngineError> {
    validate_terms(balance, apr, minimum_payment)?;

    let rate = monthly_rate(apr);
    let interest = monthly_interest(balance, apr);
    let window_payment = payment_for_fixed_window(balance, rate, FIXED_WINDOW_MONTHS);
    let heuristic = heuristic_payment(balance, interest);

    if minimum_payment > 0 && minimum_payment <= interest {
        return Ok(unbounded(interest, window_payment, heuristic));
    }

    let (months, total_interest, suggested_payment) = if minimum_payment == 0 {
        let months = if rate > 0.0 {
            months_at_payment(balance, rate, heuristic)
        } else {
            Some(heuristic_months(balance))
        };
        match months {
            Some(n) => (
                n,
                interest.saturating_mul(i64::from(n)),
                Some(heuristic.round() as i64),
            ),
            None => return Ok(unbounded(interest, window_payment, heuristic)),
        }
    } else if rate > 0.0 {
        match months_at_payment(balance, rate, minimum_payment as f64) {
            Some(n) => {
                let paid = minimum_payment as f64 * f64::from(n);
                let total = (paid - balance as f64).round() as i64;
                (n, total.max(0), None)
            }
            None => return Ok(unbounded(interest, window_payment, heuristic)),
        }
    } else {
        let n = balance
            .unsigned_abs()
            .div_ceil(minimum_payment.unsigned_abs());
        (u32::try_from(n).unwrap_or(u32::MAX), 0, None)
    };

    Ok(Projection {
        monthly_interest: interest,
        months_to_payoff: Some(months),
        total_interest,
        payoff_date: add_months(today, months),
        payment_for_36_month_payoff: window_payment,
        suggested_payment,
    })
}

/// Level payment that retires `balance` in exactly `months` months.
pub fn payment_for_fixed_window(balance: i64, rate: f64, months: i32) -> i64 {
    if balance <= 0 || months <= 0 {
        return 0;
    }
    let balance = balance as f64;
    if rate > 0.0 {
        let growth = (1.0 + rate).powi(months);
        (balance * rate * growth / (growth - 1.0)).round() as i64
    } else {
        (balance / f64::from(months)).round() as i64
    }
}

pub fn add_months(today: NaiveDate, months: u32) -> Option<NaiveDate> {
    today.checked_add_months(Months::new(months))
}

fn heuristic_payment(balance: i64, interest: i64) -> f64 {
    interest as f64 + balance as f64 / HEURISTIC_PAYOFF_MONTHS
}

/// The heuristic payment is exactly `balance / 60` at a zero rate, so the
/// window is known without dividing floats.
fn heuristic_months(balance: i64) -> u32 {
    if balance == 0 {
        0
    } else {
        HEURISTIC_PAYOFF_MONTHS as u32
    }
}

/// Number of whole months a constant `payment` needs to clear `balance` at a
/// positive monthly `rate`. `None` when the payment never outruns the interest.
fn months_at_payment(balance: i64, rate: f64, payment: f64) -> Option<u32> {
    if balance == 0 {
        return Some(0);
    }
    if payment <= 0.0 {
        return None;
    }
    let arg = 1.0 - rate * balance as f64 / payment;
    if arg <= 0.0 {
        return None;
    }
    let months = (-arg.ln() / rate.ln_1p()).ceil();
    if !months.is_finite() || months < 0.0 || months > f64::from(u32::MAX) {
        return None;
    }
    Some(months as u32)
}

fn unbounded(interest: i64, window_payment: i64, heuristic: f64) -> Projection {
    Projection {
        monthly_interest: interest,
        months_to_payoff: None,
        total_interest: 0,
        payoff_date: None,
        payment_for_36_month_payoff: window_payment,
        suggested_payment: Some(heuristic.round() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_assume, proptest};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid date")
    }

    #[test]
    fn standard_branch_matches_amortization_formula() {
        let p = project(500_000, 24.0, 15_000, today()).expect("projection");
        assert_eq!(p.monthly_interest, 10_000);
        assert_eq!(p.months_to_payoff, Some(56));
        assert_eq!(p.total_interest, 15_000 * 56 - 500_000);
        assert_eq!(p.payoff_date, NaiveDate::from_ymd_opt(2030, 9, 15));
        assert_eq!(p.payment_for_36_month_payoff, 19_616);
        assert_eq!(p.suggested_payment, None);
    }

    #[test]
    fn payment_at_or_below_interest_never_pays_off() {
        let p = project(500_000, 24.0, 10_000, today()).expect("projection");
        assert!(p.is_unbounded());
        assert_eq!(p.total_interest, 0);
        assert_eq!(p.payoff_date, None);
        assert_eq!(p.suggested_payment, Some(18_333));
        assert!(p.payment_for_36_month_payoff > p.monthly_interest);
    }

    #[test]
    fn zero_rate_divides_balance_by_payment() {
        let p = project(10_000, 0.0, 3_000, today()).expect("projection");
        assert_eq!(p.monthly_interest, 0);
        assert_eq!(p.months_to_payoff, Some(4));
        assert_eq!(p.total_interest, 0);
        assert_eq!(p.payment_for_36_month_payoff, 278);
    }

    #[test]
    fn missing_minimum_uses_five_year_heuristic() {
        let p = project(600_000, 12.0, 0, today()).expect("projection");
        assert_eq!(p.monthly_interest, 6_000);
        assert_eq!(p.suggested_payment, Some(16_000));
        assert_eq!(p.months_to_payoff, Some(48));
        assert_eq!(p.total_interest, 6_000 * 48);
    }

    #[test]
    fn missing_minimum_at_zero_rate_takes_sixty_months() {
        let p = project(120_000, 0.0, 0, today()).expect("projection");
        assert_eq!(p.months_to_payoff, Some(60));
        assert_eq!(p.total_interest, 0);
        assert_eq!(p.suggested_payment, Some(2_000));
    }

    #[test]
    fn missing_minimum_at_zero_rate_is_exactly_sixty_months() {
        for balance in [11, 21, 42, 88, 100_012] {
            let p = project(balance, 0.0, 0, today()).expect("projection");
            assert_eq!(p.months_to_payoff, Some(60), "balance {balance}");
            assert_eq!(p.payoff_date, NaiveDate::from_ymd_opt(2031, 1, 15));
        }
    }

    #[test]
    fn extreme_zero_rate_terms_do_not_overflow() {
        let p = project(i64::MAX, 0.0, i64::MAX, today()).expect("projection");
        assert_eq!(p.months_to_payoff, Some(1));
        assert_eq!(p.total_interest, 0);

        let p = project(i64::MAX, 0.0, 1, today()).expect("projection");
        assert_eq!(p.months_to_payoff, Some(u32::MAX));
        assert_eq!(p.payoff_date, None);
    }

    #[test]
    fn zero_balance_is_paid_today() {
        let p = project(0, 18.0, 2_500, today()).expect("projection");
        assert_eq!(p.months_to_payoff, Some(0));
        assert_eq!(p.total_interest, 0);
        assert_eq!(p.payoff_date, Some(today()));
        assert_eq!(p.payment_for_36_month_payoff, 0);
    }

    #[test]
    fn rejects_out_of_domain_inputs() {
        assert!(matches!(
            project(-1, 10.0, 100, today()),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            project(100, -0.5, 100, today()),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            project(100, f64::NAN, 100, today()),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            project(100, 10.0, -5, today()),
            Err(EngineError::InvalidInput(_))
        ));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_payment_above_interest_is_finite(
            balance in 1i64..10_000_000,
            apr_bp in 0u32..4_000,
            margin in 1i64..100_000
        ) {
            let apr = f64::from(apr_bp) / 100.0;
            let minimum = monthly_interest(balance, apr) + margin;
            let p = project(balance, apr, minimum, today()).expect("projection");
            let n = p.months_to_payoff.expect("finite payoff");
            prop_assert!(n >= 1);
            let expected = minimum * i64::from(n) - balance;
            if apr_bp > 0 {
                prop_assert!((p.total_interest - expected).abs() <= 1);
            } else {
                prop_assert_eq!(p.total_interest, 0);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_zero_rate_without_minimum_takes_sixty_months(balance in 1i64..100_000_000) {
            let p = project(balance, 0.0, 0, today()).expect("projection");
            prop_assert_eq!(p.months_to_payoff, Some(60));
            prop_assert_eq!(p.total_interest, 0);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_payment_not_above_interest_is_unbounded(
            balance in 10_000i64..10_000_000,
            apr_bp in 100u32..4_000,
            pick in 0u32..10_000
        ) {
            let apr = f64::from(apr_bp) / 100.0;
            let interest = monthly_interest(balance, apr);
            prop_assume!(interest > 0);
            let minimum = 1 + (i64::from(pick) * interest) / 10_000;
            prop_assume!(minimum <= interest);
            let p = project(balance, apr, minimum, today()).expect("projection");
            prop_assert!(p.months_to_payoff.is_none());
            prop_assert!(p.payoff_date.is_none());
            prop_assert!(p.payment_for_36_month_payoff > p.monthly_interest);
        }
    }
}
