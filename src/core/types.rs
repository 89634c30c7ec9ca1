use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::danger::danger_score;
use super::error::EngineError;
use super::projection::project;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtId(pub String);

impl DebtId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DebtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtCategory {
    CreditCard,
    PersonalLoan,
    AutoLoan,
    Mortgage,
    StudentLoan,
    Medical,
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    PaidOff,
    Defaulted,
    Deferred,
}

/// A debt record. Balances are integer minor currency units (cents).
///
/// `death_date`, `total_projected_interest` and `danger_score` are a
/// materialized view of (balance, APR, minimum payment) and are rebuilt by
/// [`Debt::refresh_projection`]; nothing reads them as the source of truth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub category: DebtCategory,
    pub original_balance: i64,
    pub current_balance: i64,
    pub apr: f64,
    pub minimum_payment: Option<i64>,
    pub status: DebtStatus,
    pub death_date: Option<NaiveDate>,
    pub total_projected_interest: i64,
    pub danger_score: u8,
}

impl Debt {
    /// Minimum payment with "undetermined" mapped to zero.
    pub fn minimum_or_zero(&self) -> i64 {
        self.minimum_payment.unwrap_or(0)
    }

    pub fn is_active(&self) -> bool {
        self.status == DebtStatus::Active && self.current_balance > 0
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        validate_terms(self.current_balance, self.apr, self.minimum_or_zero())?;
        if self.original_balance < 0 {
            return Err(EngineError::invalid("original balance must be >= 0"));
        }
        Ok(())
    }

    pub fn refresh_projection(&mut self, today: NaiveDate) -> Result<Projection, EngineError> {
        let minimum = self.minimum_or_zero();
        let projection = project(self.current_balance, self.apr, minimum, today)?;
        self.death_date = projection.payoff_date;
        self.total_projected_interest = projection.total_interest;
        self.danger_score = danger_score(self.current_balance, self.apr, minimum)?;
        Ok(projection)
    }
}

pub(crate) fn validate_terms(
    balance: i64,
    apr: f64,
    minimum_payment: i64,
) -> Result<(), EngineError> {
    if balance < 0 {
        return Err(EngineError::invalid("balance must be >= 0"));
    }
    if !apr.is_finite() || apr < 0.0 {
        return Err(EngineError::invalid("apr must be a finite value >= 0"));
    }
    if minimum_payment < 0 {
        return Err(EngineError::invalid("minimum payment must be >= 0"));
    }
    Ok(())
}

pub fn validate_new_debt(new_debt: &NewDebt) -> Result<(), EngineError> {
    if new_debt.name.trim().is_empty() {
        return Err(EngineError::invalid("debt name must not be empty"));
    }
    validate_terms(
        new_debt.balance,
        new_debt.apr,
        new_debt.minimum_payment.unwrap_or(0),
    )
}

/// Input for registering a new debt. The current balance doubles as the
/// immutable original balance.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebt {
    #[serde(default)]
    pub id: Option<DebtId>,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: DebtCategory,
    pub balance: i64,
    pub apr: f64,
    #[serde(default)]
    pub minimum_payment: Option<i64>,
}

fn default_category() -> DebtCategory {
    DebtCategory::Other
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstruction {
    pub debt_id: DebtId,
    pub amount: i64,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub external_ref: Option<String>,
}

/// Immutable payment record; `principal_portion + interest_portion == amount`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub debt_id: DebtId,
    pub amount: i64,
    pub principal_portion: i64,
    pub interest_portion: i64,
    pub payment_date: NaiveDate,
    pub external_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub monthly_interest: i64,
    /// `None` means the balance never reaches zero at this payment.
    pub months_to_payoff: Option<u32>,
    pub total_interest: i64,
    pub payoff_date: Option<NaiveDate>,
    #[serde(rename = "paymentFor36MonthPayoff")]
    pub payment_for_36_month_payoff: i64,
    pub suggested_payment: Option<i64>,
}

impl Projection {
    pub fn is_unbounded(&self) -> bool {
        self.months_to_payoff.is_none()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Avalanche,
    Snowball,
    Hybrid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::Avalanche, Self::Snowball, Self::Hybrid];

    pub fn label(self) -> &'static str {
        match self {
            Self::Avalanche => "avalanche",
            Self::Snowball => "snowball",
            Self::Hybrid => "hybrid",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffEntry {
    pub debt_id: DebtId,
    pub name: String,
    /// 1-based simulation month, `None` if still owing at the cap.
    pub payoff_month: Option<u32>,
    pub total_paid: i64,
    pub total_interest: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub strategy: StrategyKind,
    pub order: Vec<DebtId>,
    pub total_interest_paid: i64,
    pub months_to_debt_free: u32,
    pub interest_saved: i64,
    pub hit_cap: bool,
    pub residual_balance: i64,
    pub payoffs: Vec<PayoffEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub extra_budget: i64,
    pub baseline_interest: i64,
    pub strategies: Vec<StrategyResult>,
    pub recommended: Option<StrategyKind>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfResult {
    pub debt_id: DebtId,
    pub extra_payment: i64,
    pub baseline: Projection,
    pub scenario: Projection,
    pub months_saved: u32,
    pub interest_saved: i64,
    pub baseline_payoff_date: Option<NaiveDate>,
    pub new_payoff_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub debt_count: usize,
    pub total_balance: i64,
    pub total_minimum_payment: i64,
    pub highest_apr: f64,
    pub average_apr: f64,
    pub total_projected_interest: i64,
    pub earliest_payoff_date: Option<NaiveDate>,
    pub latest_payoff_date: Option<NaiveDate>,
    pub average_danger_score: u8,
}
