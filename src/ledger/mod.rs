mod service;
mod store;

pub use service::{Clock, DebtEngine, FixedClock, RecordedPayment, SystemClock};
pub use store::{DebtStore, InMemoryDebtStore};
