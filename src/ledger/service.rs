use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::core::{
    Debt, DebtId, DebtStatus, EngineError, NewDebt, Payment, PaymentInstruction, PortfolioSummary,
    StrategyComparison, WhatIfResult, compare_strategies, monthly_interest, summarize,
    validate_new_debt, what_if,
};

use super::store::DebtStore;

/// Source of "today" for payoff dates.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Outcome of a recorded payment: the immutable payment and the debt with its
/// balance, status and projection fields rebuilt.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPayment {
    pub payment: Payment,
    pub debt: Debt,
}

/// Facade threading an explicit store and clock through the calculators.
pub struct DebtEngine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    sequence: Arc<AtomicU64>,
}

impl<S> Clone for DebtEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            sequence: Arc::clone(&self.sequence),
        }
    }
}

impl<S> DebtEngine<S>
where
    S: DebtStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn register_debt(&self, new_debt: NewDebt) -> Result<Debt, EngineError> {
        validate_new_debt(&new_debt)?;
        let id = match new_debt.id {
            Some(id) if self.store.find_debt(&id)?.is_some() => {
                return Err(EngineError::invalid(format!("debt {id} already exists")));
            }
            Some(id) => id,
            None => self.unused_debt_id()?,
        };

        let mut debt = Debt {
            id,
            name: new_debt.name,
            category: new_debt.category,
            original_balance: new_debt.balance,
            current_balance: new_debt.balance,
            apr: new_debt.apr,
            minimum_payment: new_debt.minimum_payment,
            status: DebtStatus::Active,
            death_date: None,
            total_projected_interest: 0,
            danger_score: 0,
        };
        let projection = debt.refresh_projection(self.clock.today())?;
        if projection.is_unbounded() {
            warn!(debt_id = %debt.id, "minimum payment does not cover monthly interest");
        }

        self.store.save_debt(debt.clone())?;
        info!(
            debt_id = %debt.id,
            balance = debt.current_balance,
            apr = debt.apr,
            "debt registered"
        );
        Ok(debt)
    }

    /// Next `debt-NNNNNN` id that no stored debt already uses; explicit ids may
    /// occupy the generated namespace.
    fn unused_debt_id(&self) -> Result<DebtId, EngineError> {
        loop {
            let next = self.sequence.fetch_add(1, Ordering::Relaxed);
            let id = DebtId(format!("debt-{next:06}"));
            if self.store.find_debt(&id)?.is_none() {
                return Ok(id);
            }
        }
    }

    pub fn debt(&self, id: &DebtId) -> Result<Debt, EngineError> {
        self.store
            .find_debt(id)?
            .ok_or_else(|| EngineError::NotFound { id: id.clone() })
    }

    /// Applies a payment: interest first (one month's accrual at the current
    /// balance), the remainder to principal. Surplus beyond the balance is not
    /// carried forward. The debt is saved before its payment record is
    /// appended, so a failed save leaves no orphaned payment.
    pub fn record_payment(
        &self,
        instruction: PaymentInstruction,
    ) -> Result<RecordedPayment, EngineError> {
        if instruction.amount <= 0 {
            return Err(EngineError::invalid("payment amount must be > 0"));
        }
        let mut debt = self.debt(&instruction.debt_id)?;
        debt.validate()?;

        let interest = monthly_interest(debt.current_balance, debt.apr);
        let interest_portion = instruction.amount.min(interest);
        let principal_portion = instruction.amount - interest_portion;
        debt.current_balance = (debt.current_balance - principal_portion).max(0);

        if debt.current_balance == 0 {
            debt.status = DebtStatus::PaidOff;
        }
        let projection = debt.refresh_projection(self.clock.today())?;

        let payment = Payment {
            debt_id: debt.id.clone(),
            amount: instruction.amount,
            principal_portion,
            interest_portion,
            payment_date: instruction.payment_date,
            external_ref: instruction.external_ref,
        };
        self.store.save_debt(debt.clone())?;
        self.store.append_payment(payment.clone())?;

        info!(
            debt_id = %debt.id,
            amount = payment.amount,
            principal = principal_portion,
            interest = interest_portion,
            balance = debt.current_balance,
            "payment recorded"
        );
        if debt.status == DebtStatus::PaidOff {
            info!(debt_id = %debt.id, "debt paid off");
        } else if projection.is_unbounded() {
            warn!(debt_id = %debt.id, "debt will not pay off at its minimum payment");
        }

        Ok(RecordedPayment { payment, debt })
    }

    pub fn payments(&self, id: &DebtId) -> Result<Vec<Payment>, EngineError> {
        self.debt(id)?;
        Ok(self.store.list_payments(id)?)
    }

    pub fn what_if(&self, id: &DebtId, extra_payment: i64) -> Result<WhatIfResult, EngineError> {
        let debt = self.debt(id)?;
        what_if(&debt, extra_payment, self.clock.today())
    }

    pub fn compare_strategies(&self, extra_budget: i64) -> Result<StrategyComparison, EngineError> {
        let debts = self.store.list_active_debts()?;
        let comparison = compare_strategies(&debts, extra_budget, self.clock.today())?;
        for result in comparison.strategies.iter().filter(|r| r.hit_cap) {
            warn!(
                strategy = result.strategy.label(),
                residual = result.residual_balance,
                "strategy did not clear all debts within the simulation cap"
            );
        }
        debug!(
            debts = debts.len(),
            extra_budget,
            baseline_interest = comparison.baseline_interest,
            recommended = comparison.recommended.map(|k| k.label()),
            "strategies compared"
        );
        Ok(comparison)
    }

    pub fn summary(&self) -> Result<PortfolioSummary, EngineError> {
        let debts = self.store.list_active_debts()?;
        summarize(&debts, self.clock.today())
    }
}
