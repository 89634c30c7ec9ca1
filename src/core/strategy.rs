use chrono::NaiveDate;

use super::danger::danger_score;
use super::error::EngineError;
use super::projection::{monthly_rate, project};
use super::types::{Debt, PayoffEntry, StrategyComparison, StrategyKind, StrategyResult};

/// Hard stop for every simulation; reaching it with a residual balance is
/// reported on the result, not raised.
pub const MAX_SIMULATION_MONTHS: u32 = 360;

#[derive(Debug, Clone, Copy)]
struct ScratchDebt {
    source: usize,
    balance: i64,
    rate: f64,
    minimum: i64,
    paid: i64,
    interest: i64,
    payoff_month: Option<u32>,
}

impl ScratchDebt {
    fn new(source: usize, debt: &Debt) -> Self {
        Self {
            source,
            balance: debt.current_balance,
            rate: monthly_rate(debt.apr),
            minimum: debt.minimum_or_zero(),
            paid: 0,
            interest: 0,
            payoff_month: None,
        }
    }

    fn accrue(&mut self) {
        let interest = (self.balance as f64 * self.rate).round() as i64;
        self.balance = self.balance.saturating_add(interest);
        self.interest = self.interest.saturating_add(interest);
    }

    fn pay(&mut self, amount: i64) {
        let amount = amount.min(self.balance).max(0);
        self.balance -= amount;
        self.paid = self.paid.saturating_add(amount);
    }

    /// Marks the payoff the first time the balance reaches zero.
    fn settle(&mut self, month: u32) -> bool {
        if self.balance > 0 || self.payoff_month.is_some() {
            return false;
        }
        self.balance = 0;
        self.payoff_month = Some(month);
        true
    }
}

#[derive(Debug)]
struct SimulationOutcome {
    months: u32,
    scratch: Vec<ScratchDebt>,
    payoff_sequence: Vec<usize>,
}

impl SimulationOutcome {
    fn total_interest(&self) -> i64 {
        self.scratch.iter().fold(0, |acc, d| acc.saturating_add(d.interest))
    }

    fn residual_balance(&self) -> i64 {
        self.scratch.iter().fold(0, |acc, d| acc.saturating_add(d.balance))
    }
}

/// Runs avalanche, snowball and hybrid orderings over the debts that still
/// carry a balance and compares them against paying minimums only.
pub fn compare_strategies(
    debts: &[Debt],
    extra_budget: i64,
    today: NaiveDate,
) -> Result<StrategyComparison, EngineError> {
    let debts = payable_debts(debts, extra_budget)?;
    let baseline_interest = baseline_interest(&debts, today)?;

    let mut strategies = Vec::with_capacity(StrategyKind::ALL.len());
    for kind in StrategyKind::ALL {
        let order = order_debts(&debts, kind)?;
        strategies.push(build_result(&debts, kind, &order, extra_budget, baseline_interest));
    }

    let recommended = if debts.is_empty() {
        None
    } else {
        strategies
            .iter()
            .min_by_key(|r| (r.total_interest_paid, r.months_to_debt_free))
            .map(|r| r.strategy)
    };

    Ok(StrategyComparison {
        extra_budget,
        baseline_interest,
        strategies,
        recommended,
    })
}

pub fn simulate_strategy(
    debts: &[Debt],
    kind: StrategyKind,
    extra_budget: i64,
    today: NaiveDate,
) -> Result<StrategyResult, EngineError> {
    let debts = payable_debts(debts, extra_budget)?;
    let baseline_interest = baseline_interest(&debts, today)?;
    let order = order_debts(&debts, kind)?;
    Ok(build_result(&debts, kind, &order, extra_budget, baseline_interest))
}

/// Indices of `debts` in the order a strategy targets them. Ties keep the
/// input order.
pub fn order_debts(debts: &[Debt], kind: StrategyKind) -> Result<Vec<usize>, EngineError> {
    let mut order = (0..debts.len()).collect::<Vec<_>>();
    match kind {
        StrategyKind::Avalanche => {
            order.sort_by(|&a, &b| debts[b].apr.total_cmp(&debts[a].apr));
        }
        StrategyKind::Snowball => {
            order.sort_by_key(|&i| debts[i].current_balance);
        }
        StrategyKind::Hybrid => {
            let scores = debts
                .iter()
                .map(|d| danger_score(d.current_balance, d.apr, d.minimum_or_zero()))
                .collect::<Result<Vec<_>, _>>()?;
            order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));
        }
    }
    Ok(order)
}

fn payable_debts(debts: &[Debt], extra_budget: i64) -> Result<Vec<Debt>, EngineError> {
    if extra_budget < 0 {
        return Err(EngineError::invalid("extra budget must be >= 0"));
    }
    let mut payable = Vec::with_capacity(debts.len());
    for debt in debts {
        debt.validate()?;
        if debt.current_balance > 0 {
            payable.push(debt.clone());
        }
    }
    Ok(payable)
}

/// Total interest if every debt were paid at its minimum independently.
fn baseline_interest(debts: &[Debt], today: NaiveDate) -> Result<i64, EngineError> {
    let mut total = 0_i64;
    for debt in debts {
        let projection = project(debt.current_balance, debt.apr, debt.minimum_or_zero(), today)?;
        total = total.saturating_add(projection.total_interest);
    }
    Ok(total)
}

fn build_result(
    debts: &[Debt],
    kind: StrategyKind,
    order: &[usize],
    extra_budget: i64,
    baseline_interest: i64,
) -> StrategyResult {
    let outcome = run_simulation(debts, order, extra_budget);
    let total_interest_paid = outcome.total_interest();
    let residual_balance = outcome.residual_balance();

    let unpaid = outcome
        .scratch
        .iter()
        .enumerate()
        .filter(|(_, d)| d.payoff_month.is_none())
        .map(|(pos, _)| pos);
    let payoffs = outcome
        .payoff_sequence
        .iter()
        .copied()
        .chain(unpaid)
        .map(|pos| {
            let scratch = &outcome.scratch[pos];
            let debt = &debts[scratch.source];
            PayoffEntry {
                debt_id: debt.id.clone(),
                name: debt.name.clone(),
                payoff_month: scratch.payoff_month,
                total_paid: scratch.paid,
                total_interest: scratch.interest,
            }
        })
        .collect();

    StrategyResult {
        strategy: kind,
        order: order.iter().map(|&i| debts[i].id.clone()).collect(),
        total_interest_paid,
        months_to_debt_free: outcome.months,
        interest_saved: (baseline_interest - total_interest_paid).max(0),
        hit_cap: residual_balance > 0,
        residual_balance,
        payoffs,
    }
}

fn run_simulation(debts: &[Debt], order: &[usize], extra_budget: i64) -> SimulationOutcome {
    let mut scratch = order
        .iter()
        .map(|&i| ScratchDebt::new(i, &debts[i]))
        .collect::<Vec<_>>();
    let mut payoff_sequence = Vec::with_capacity(scratch.len());
    let mut available_extra = extra_budget;
    let mut month = 0_u32;

    while month < MAX_SIMULATION_MONTHS && scratch.iter().any(|d| d.balance > 0) {
        month += 1;
        // Minimums freed this month roll into the extra budget from next month.
        let mut released = 0_i64;

        for (pos, debt) in scratch.iter_mut().enumerate() {
            if debt.balance <= 0 {
                continue;
            }
            debt.accrue();
            let minimum = debt.minimum;
            debt.pay(minimum);
            if debt.settle(month) {
                released = released.saturating_add(debt.minimum);
                payoff_sequence.push(pos);
            }
        }

        if available_extra > 0 {
            let target = scratch.iter_mut().enumerate().find(|(_, d)| d.balance > 0);
            if let Some((pos, target)) = target {
                target.pay(available_extra);
                if target.settle(month) {
                    released = released.saturating_add(target.minimum);
                    payoff_sequence.push(pos);
                }
            }
        }

        available_extra = available_extra.saturating_add(released);
    }

    SimulationOutcome {
        months: month,
        scratch,
        payoff_sequence,
    }
}
