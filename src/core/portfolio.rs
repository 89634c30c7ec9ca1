use chrono::NaiveDate;

use super::danger::danger_score;
use super::error::EngineError;
use super::projection::project;
use super::types::{Debt, PortfolioSummary, WhatIfResult};

/// Compares the debt's current trajectory with one where the minimum payment
/// is raised by `extra_payment`.
pub fn what_if(
    debt: &Debt,
    extra_payment: i64,
    today: NaiveDate,
) -> Result<WhatIfResult, EngineError> {
    if extra_payment < 0 {
        return Err(EngineError::invalid("extra payment must be >= 0"));
    }
    debt.validate()?;

    let minimum = debt.minimum_or_zero();
    let baseline = project(debt.current_balance, debt.apr, minimum, today)?;
    let scenario = project(
        debt.current_balance,
        debt.apr,
        minimum.saturating_add(extra_payment),
        today,
    )?;

    let months_saved = match (baseline.months_to_payoff, scenario.months_to_payoff) {
        (Some(before), Some(after)) => before.saturating_sub(after),
        _ => 0,
    };
    let interest_saved = (baseline.total_interest - scenario.total_interest).max(0);

    Ok(WhatIfResult {
        debt_id: debt.id.clone(),
        extra_payment,
        baseline_payoff_date: baseline.payoff_date,
        new_payoff_date: scenario.payoff_date,
        baseline,
        scenario,
        months_saved,
        interest_saved,
    })
}

/// Aggregates the active debts. Projections are recomputed from the raw
/// terms rather than read from the cached fields.
pub fn summarize(debts: &[Debt], today: NaiveDate) -> Result<PortfolioSummary, EngineError> {
    let active = debts.iter().filter(|d| d.is_active()).collect::<Vec<_>>();
    if active.is_empty() {
        return Ok(PortfolioSummary::default());
    }

    let mut summary = PortfolioSummary {
        debt_count: active.len(),
        ..PortfolioSummary::default()
    };
    let mut apr_sum = 0.0;
    let mut danger_sum = 0_u64;

    for debt in &active {
        debt.validate()?;
        let minimum = debt.minimum_or_zero();
        let projection = project(debt.current_balance, debt.apr, minimum, today)?;

        summary.total_balance = summary.total_balance.saturating_add(debt.current_balance);
        summary.total_minimum_payment = summary.total_minimum_payment.saturating_add(minimum);
        summary.highest_apr = summary.highest_apr.max(debt.apr);
        summary.total_projected_interest = summary
            .total_projected_interest
            .saturating_add(projection.total_interest);
        apr_sum += debt.apr;
        let score = danger_score(debt.current_balance, debt.apr, minimum)?;
        danger_sum = danger_sum.saturating_add(u64::from(score));

        if let Some(date) = projection.payoff_date {
            summary.earliest_payoff_date =
                Some(summary.earliest_payoff_date.map_or(date, |d| d.min(date)));
            summary.latest_payoff_date =
                Some(summary.latest_payoff_date.map_or(date, |d| d.max(date)));
        }
    }

    let count = active.len() as f64;
    summary.average_apr = (apr_sum / count * 100.0).round() / 100.0;
    summary.average_danger_score = (danger_sum as f64 / count).round() as u8;
    Ok(summary)
}
