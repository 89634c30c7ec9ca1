mod danger;
mod error;
mod portfolio;
mod projection;
mod strategy;
mod types;

pub use danger::danger_score;
pub use error::{EngineError, StoreError};
pub use portfolio::{summarize, what_if};
pub use projection::{
    FIXED_WINDOW_MONTHS, HEURISTIC_PAYOFF_MONTHS, add_months, monthly_interest, monthly_rate,
    payment_for_fixed_window, project,
};
pub use strategy::{MAX_SIMULATION_MONTHS, compare_strategies, order_debts, simulate_strategy};
pub use types::{
    Debt, DebtCategory, DebtId, DebtStatus, NewDebt, Payment, PaymentInstruction, PayoffEntry,
    PortfolioSummary, Projection, StrategyComparison, StrategyKind, StrategyResult, WhatIfResult,
    validate_new_debt,
};
