use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::core::{Debt, DebtId, Payment, StoreError};

/// Persistence collaborator. Implementations own durability and must
/// serialize payment recording per debt id (row lock or version check) so a
/// balance is never read-modify-written from a stale copy.
pub trait DebtStore: Send + Sync {
    fn find_debt(&self, id: &DebtId) -> Result<Option<Debt>, StoreError>;
    fn save_debt(&self, debt: Debt) -> Result<(), StoreError>;
    fn append_payment(&self, payment: Payment) -> Result<(), StoreError>;
    fn list_active_debts(&self) -> Result<Vec<Debt>, StoreError>;
    /// Payments for one debt, newest first.
    fn list_payments(&self, id: &DebtId) -> Result<Vec<Payment>, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    debts: BTreeMap<DebtId, Debt>,
    payments: Vec<Payment>,
}

/// Process-local store used by the HTTP adapter and tests.
#[derive(Debug, Default)]
pub struct InMemoryDebtStore {
    tables: Mutex<Tables>,
}

impl InMemoryDebtStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_debts(&self) -> Result<Vec<Debt>, StoreError> {
        Ok(self.lock()?.debts.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("debt table lock poisoned".to_string()))
    }
}

impl DebtStore for InMemoryDebtStore {
    fn find_debt(&self, id: &DebtId) -> Result<Option<Debt>, StoreError> {
        Ok(self.lock()?.debts.get(id).cloned())
    }

    fn save_debt(&self, debt: Debt) -> Result<(), StoreError> {
        self.lock()?.debts.insert(debt.id.clone(), debt);
        Ok(())
    }

    fn append_payment(&self, payment: Payment) -> Result<(), StoreError> {
        self.lock()?.payments.push(payment);
        Ok(())
    }

    fn list_active_debts(&self) -> Result<Vec<Debt>, StoreError> {
        Ok(self
            .lock()?
            .debts
            .values()
            .filter(|d| d.is_active())
            .cloned()
            .collect())
    }

    fn list_payments(&self, id: &DebtId) -> Result<Vec<Payment>, StoreError> {
        let tables = self.lock()?;
        let mut payments = tables
            .payments
            .iter()
            .enumerate()
            .filter(|(_, p)| &p.debt_id == id)
            .collect::<Vec<_>>();
        // Newest date first; same-day payments newest insertion first.
        payments.sort_by(|(ia, a), (ib, b)| {
            b.payment_date.cmp(&a.payment_date).then(ib.cmp(ia))
        });
        Ok(payments.into_iter().map(|(_, p)| p.clone()).collect())
    }
}
