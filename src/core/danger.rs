use super::error::EngineError;
use super::projection::monthly_interest;
use super::types::validate_terms;

const APR_FACTOR_CAP: f64 = 30.0;
const BALANCE_FACTOR_CAP: f64 = 30.0;
const DOLLARS_PER_BALANCE_POINT: f64 = 333.0;

/// Composite 0-100 risk score: APR factor (0-30) + balance factor (0-30) +
/// payment coverage factor (0-40).
pub fn danger_score(balance: i64, apr: f64, minimum_payment: i64) -> Result<u8, EngineError> {
    validate_terms(balance, apr, minimum_payment)?;

    let apr_factor = apr.min(APR_FACTOR_CAP);
    let balance_dollars = balance as f64 / 100.0;
    let balance_factor = (balance_dollars / DOLLARS_PER_BALANCE_POINT)
        .round()
        .min(BALANCE_FACTOR_CAP);
    let coverage = coverage_factor(minimum_payment, monthly_interest(balance, apr));

    let score = (apr_factor + balance_factor + coverage).round().clamp(0.0, 100.0);
    Ok(score as u8)
}

/// Points for how thinly the minimum payment covers monthly interest.
fn coverage_factor(minimum_payment: i64, interest: i64) -> f64 {
    if minimum_payment == 0 || interest == 0 {
        return 0.0;
    }
    let ratio = minimum_payment as f64 / interest as f64;
    if ratio < 1.10 {
        40.0
    } else if ratio < 1.50 {
        30.0
    } else if ratio < 2.00 {
        20.0
    } else if ratio < 3.00 {
        10.0
    } else {
        0.0
    }
}
