//! Saving, reloading and completing bills.

use super::{mirror, PosApp, PosError, PosResult};
use crate::export::Receipt;
use crate::models::{Transaction, TransactionStatus};
use crate::repository::PosStore;

impl<S: PosStore> PosApp<S> {
    /// Park the bill as a saved transaction.
    ///
    /// The first save inserts a record; later saves of the same bill overwrite
    /// it in place and keep its invoice number.
    pub fn save_transaction(&mut self) -> PosResult<Transaction> {
        if self.bill.is_empty() {
            return Err(PosError::EmptyBill);
        }

        let mut tx = self.bill.snapshot(TransactionStatus::Saved);
        if let Some(id) = tx.id {
            match mirror(&mut self.store, "update transaction", |s| {
                s.update_transaction(&tx)
            }) {
                Some(true) => {
                    tracing::info!(id, invoice = %tx.invoice_number, "Updated saved transaction");
                    return Ok(tx);
                }
                // Write failed and was logged; the bill keeps its record
                None => return Ok(tx),
                Some(false) => {
                    tracing::debug!(id, "Saved transaction missing, storing a new record");
                    tx.id = None;
                }
            }
        }

        match mirror(&mut self.store, "insert transaction", |s| {
            s.insert_transaction(&tx)
        }) {
            Some(id) => {
                tx.id = Some(id);
                self.bill.mark_saved(id, &tx.invoice_number);
                tracing::info!(id, invoice = %tx.invoice_number, "Saved transaction");
            }
            None => self.bill.forget_saved(),
        }

        Ok(tx)
    }

    /// Load a stored transaction into the bill.
    ///
    /// Saving afterwards overwrites a saved record; a completed record is
    /// loaded as a new bill.
    pub fn load_transaction(&mut self, id: i64) -> PosResult<Transaction> {
        let tx = self
            .store
            .get_transaction(id)?
            .ok_or(PosError::TransactionNotFound(id))?;
        self.bill.restore(&tx);
        tracing::debug!(id, status = tx.status.as_str(), "Loaded transaction");
        Ok(tx)
    }

    /// Complete the bill as a new record and show its receipt.
    ///
    /// The bill itself is left as is.
    pub fn generate_receipt(&mut self) -> PosResult<Receipt> {
        if self.bill.is_empty() {
            return Err(PosError::EmptyBill);
        }

        let mut tx = self.bill.snapshot(TransactionStatus::Completed);
        tx.id = mirror(&mut self.store, "insert completed transaction", |s| {
            s.insert_transaction(&tx)
        });
        tracing::info!(id = ?tx.id, invoice = %tx.invoice_number, total = tx.total, "Generated receipt");

        self.receipt = Some(tx.clone());
        Ok(Receipt::new(&self.config, tx))
    }

    /// The receipt on screen, if any.
    pub fn receipt(&self) -> Option<Receipt> {
        self.receipt
            .as_ref()
            .map(|tx| Receipt::new(&self.config, tx.clone()))
    }

    pub fn dismiss_receipt(&mut self) {
        self.receipt = None;
    }

    /// History, most recent first, optionally narrowed by patient name or id.
    pub fn list_transactions(&self, patient_filter: Option<&str>) -> PosResult<Vec<Transaction>> {
        let filter = patient_filter.map(str::trim).filter(|f| !f.is_empty());
        Ok(self.store.list_transactions(filter)?)
    }

    /// Delete every stored transaction.
    pub fn clear_transaction_history(&mut self) -> usize {
        let cleared = mirror(&mut self.store, "clear transactions", |s| {
            s.clear_transactions()
        })
        .unwrap_or(0);
        self.bill.forget_saved();
        tracing::info!(cleared, "Cleared transaction history");
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, DbResult};
    use crate::models::{PatientInfo, Service, SystemConfig, User};
    use crate::pos::BillAction;
    use crate::repository::{
        ConfigRepository, MemoryStore, ServiceRepository, TransactionRepository, UserRepository,
    };

    /// Memory store whose transaction overwrites always fail.
    #[derive(Default)]
    struct ReadOnlyUpdates(MemoryStore);

    impl ServiceRepository for ReadOnlyUpdates {
        fn list_services(&self) -> DbResult<Vec<Service>> {
            self.0.list_services()
        }
        fn upsert_service(&mut self, service: &Service) -> DbResult<()> {
            self.0.upsert_service(service)
        }
        fn delete_service(&mut self, id: i64) -> DbResult<bool> {
            self.0.delete_service(id)
        }
        fn replace_services(&mut self, services: &[Service]) -> DbResult<()> {
            self.0.replace_services(services)
        }
    }

    impl TransactionRepository for ReadOnlyUpdates {
        fn insert_transaction(&mut self, transaction: &Transaction) -> DbResult<i64> {
            self.0.insert_transaction(transaction)
        }
        fn update_transaction(&mut self, _transaction: &Transaction) -> DbResult<bool> {
            Err(DbError::Constraint("database is locked".into()))
        }
        fn get_transaction(&self, id: i64) -> DbResult<Option<Transaction>> {
            self.0.get_transaction(id)
        }
        fn list_transactions(&self, patient_filter: Option<&str>) -> DbResult<Vec<Transaction>> {
            self.0.list_transactions(patient_filter)
        }
        fn clear_transactions(&mut self) -> DbResult<usize> {
            self.0.clear_transactions()
        }
    }

    impl ConfigRepository for ReadOnlyUpdates {
        fn load_config(&self) -> DbResult<Option<SystemConfig>> {
            self.0.load_config()
        }
        fn save_config(&mut self, config: &SystemConfig) -> DbResult<()> {
            self.0.save_config(config)
        }
    }

    impl UserRepository for ReadOnlyUpdates {
        fn insert_user(&mut self, user: &User) -> DbResult<()> {
            self.0.insert_user(user)
        }
        fn get_user(&self, username: &str) -> DbResult<Option<User>> {
            self.0.get_user(username)
        }
        fn update_user(&mut self, user: &User) -> DbResult<bool> {
            self.0.update_user(user)
        }
    }

    fn app_with_bill() -> PosApp<MemoryStore> {
        let mut app = PosApp::open(MemoryStore::new()).unwrap();
        app.add_to_bill(1).unwrap();
        app.add_to_bill(4).unwrap();
        app.apply(BillAction::SetPatient(PatientInfo {
            name: "Ada Obi".into(),
            id: "PT-001".into(),
            phone: String::new(),
        }))
        .unwrap();
        app
    }

    #[test]
    fn test_empty_bill_rejected() {
        let mut app = PosApp::open(MemoryStore::new()).unwrap();
        assert!(matches!(app.save_transaction(), Err(PosError::EmptyBill)));
        assert!(matches!(app.generate_receipt(), Err(PosError::EmptyBill)));
        assert!(app.list_transactions(None).unwrap().is_empty());
    }

    #[test]
    fn test_save_reuses_record() {
        let mut app = app_with_bill();
        let first = app.save_transaction().unwrap();
        let id = first.id.unwrap();
        assert_eq!(app.bill().transaction_id(), Some(id));

        app.add_to_bill(4).unwrap();
        let second = app.save_transaction().unwrap();
        assert_eq!(second.id, Some(id));
        assert_eq!(second.invoice_number, first.invoice_number);

        let stored = app.list_transactions(None).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].subtotal, 5400.0);
    }

    #[test]
    fn test_receipt_always_new_record() {
        let mut app = app_with_bill();
        let saved = app.save_transaction().unwrap();

        let receipt = app.generate_receipt().unwrap();
        assert_ne!(receipt.transaction.id, saved.id);
        assert_eq!(receipt.transaction.status, TransactionStatus::Completed);
        assert!(app.receipt().is_some());

        app.generate_receipt().unwrap();
        assert_eq!(app.list_transactions(None).unwrap().len(), 3);

        app.dismiss_receipt();
        assert!(app.receipt().is_none());
    }

    #[test]
    fn test_load_saved_then_overwrite() {
        let mut app = app_with_bill();
        let saved = app.save_transaction().unwrap();
        app.new_transaction();

        let loaded = app.load_transaction(saved.id.unwrap()).unwrap();
        assert_eq!(loaded.patient.name, "Ada Obi");
        assert_eq!(app.bill().items().len(), 2);

        app.apply(BillAction::SetDiscount(10.0)).unwrap();
        app.save_transaction().unwrap();

        let stored = app.store().get_transaction(saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.discount, 10.0);
        assert_eq!(app.list_transactions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_load_completed_as_copy() {
        let mut app = app_with_bill();
        let completed = app.generate_receipt().unwrap().transaction;
        app.new_transaction();

        app.load_transaction(completed.id.unwrap()).unwrap();
        assert_eq!(app.bill().transaction_id(), None);

        let copy = app.save_transaction().unwrap();
        assert_ne!(copy.id, completed.id);

        let original = app.store().get_transaction(completed.id.unwrap()).unwrap().unwrap();
        assert_eq!(original.status, TransactionStatus::Completed);
        assert_eq!(app.list_transactions(None).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing() {
        let mut app = app_with_bill();
        assert!(matches!(
            app.load_transaction(404),
            Err(PosError::TransactionNotFound(404))
        ));
    }

    #[test]
    fn test_filter_and_clear() {
        let mut app = app_with_bill();
        app.save_transaction().unwrap();
        app.new_transaction();
        app.add_to_bill(2).unwrap();
        app.generate_receipt().unwrap();

        assert_eq!(app.list_transactions(Some("ada")).unwrap().len(), 1);
        assert_eq!(app.list_transactions(Some("pt-001")).unwrap().len(), 1);
        assert_eq!(app.list_transactions(Some("walk-in")).unwrap().len(), 1);
        assert_eq!(app.list_transactions(Some("  ")).unwrap().len(), 2);

        assert_eq!(app.clear_transaction_history(), 2);
        assert!(app.list_transactions(None).unwrap().is_empty());
    }

    #[test]
    fn test_save_after_history_cleared() {
        let mut app = app_with_bill();
        app.save_transaction().unwrap();
        app.clear_transaction_history();

        let tx = app.save_transaction().unwrap();
        assert!(tx.id.is_some());
        assert_eq!(app.list_transactions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_overwrite_keeps_single_record() {
        let mut app = PosApp::open(ReadOnlyUpdates::default()).unwrap();
        app.add_to_bill(1).unwrap();
        let first = app.save_transaction().unwrap();
        let id = first.id.unwrap();

        app.add_to_bill(2).unwrap();
        let second = app.save_transaction().unwrap();
        assert_eq!(second.id, Some(id));
        assert_eq!(second.invoice_number, first.invoice_number);
        assert_eq!(app.bill().transaction_id(), Some(id));
        assert_eq!(app.list_transactions(None).unwrap().len(), 1);
    }
}
