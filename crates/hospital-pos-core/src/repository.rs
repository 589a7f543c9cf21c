//! Storage seam between the application state and a persistence backend.
//!
//! Each collection gets a small save/get/list/delete trait. [`Database`]
//! implements them on SQLite; [`MemoryStore`] keeps everything in process and
//! is useful for hosts without a writable disk and for tests.
//!
//! [`Database`]: crate::db::Database

use std::collections::BTreeMap;

use crate::db::{DbError, DbResult};
use crate::models::{Service, SystemConfig, Transaction, TransactionStatus, User};

/// Billable service collection.
pub trait ServiceRepository {
    /// All services in id order.
    fn list_services(&self) -> DbResult<Vec<Service>>;

    fn upsert_service(&mut self, service: &Service) -> DbResult<()>;

    fn delete_service(&mut self, id: i64) -> DbResult<bool>;

    /// Replace the whole collection atomically.
    fn replace_services(&mut self, services: &[Service]) -> DbResult<()>;
}

/// Saved and completed bills.
pub trait TransactionRepository {
    /// Store a transaction under a fresh id and return that id.
    fn insert_transaction(&mut self, transaction: &Transaction) -> DbResult<i64>;

    /// Overwrite a saved transaction by id.
    ///
    /// Returns `false` when no saved record with that id exists; completed
    /// records are never touched.
    fn update_transaction(&mut self, transaction: &Transaction) -> DbResult<bool>;

    fn get_transaction(&self, id: i64) -> DbResult<Option<Transaction>>;

    /// Most recent first, optionally filtered on patient display name or id.
    fn list_transactions(&self, patient_filter: Option<&str>) -> DbResult<Vec<Transaction>>;

    fn clear_transactions(&mut self) -> DbResult<usize>;
}

/// The singleton configuration record.
pub trait ConfigRepository {
    fn load_config(&self) -> DbResult<Option<SystemConfig>>;

    fn save_config(&mut self, config: &SystemConfig) -> DbResult<()>;
}

/// Operator accounts keyed by username.
pub trait UserRepository {
    /// Fails with [`DbError::Constraint`] when the username is taken.
    fn insert_user(&mut self, user: &User) -> DbResult<()>;

    fn get_user(&self, username: &str) -> DbResult<Option<User>>;

    fn update_user(&mut self, user: &User) -> DbResult<bool>;
}

/// Everything the point of sale persists.
pub trait PosStore:
    ServiceRepository + TransactionRepository + ConfigRepository + UserRepository
{
}

impl<T> PosStore for T where
    T: ServiceRepository + TransactionRepository + ConfigRepository + UserRepository
{
}

/// Process-local store with the same semantics as the SQLite backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    services: BTreeMap<i64, Service>,
    transactions: BTreeMap<i64, Transaction>,
    next_transaction_id: i64,
    config: Option<SystemConfig>,
    users: BTreeMap<String, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServiceRepository for MemoryStore {
    fn list_services(&self) -> DbResult<Vec<Service>> {
        Ok(self.services.values().cloned().collect())
    }

    fn upsert_service(&mut self, service: &Service) -> DbResult<()> {
        self.services.insert(service.id, service.clone());
        Ok(())
    }

    fn delete_service(&mut self, id: i64) -> DbResult<bool> {
        Ok(self.services.remove(&id).is_some())
    }

    fn replace_services(&mut self, services: &[Service]) -> DbResult<()> {
        self.services = services.iter().map(|s| (s.id, s.clone())).collect();
        Ok(())
    }
}

impl TransactionRepository for MemoryStore {
    fn insert_transaction(&mut self, transaction: &Transaction) -> DbResult<i64> {
        self.next_transaction_id += 1;
        let id = self.next_transaction_id;
        let mut stored = transaction.clone();
        stored.id = Some(id);
        self.transactions.insert(id, stored);
        Ok(id)
    }

    fn update_transaction(&mut self, transaction: &Transaction) -> DbResult<bool> {
        let Some(id) = transaction.id else {
            return Ok(false);
        };
        match self.transactions.get_mut(&id) {
            Some(existing) if existing.status == TransactionStatus::Saved => {
                *existing = transaction.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn get_transaction(&self, id: i64) -> DbResult<Option<Transaction>> {
        Ok(self.transactions.get(&id).cloned())
    }

    fn list_transactions(&self, patient_filter: Option<&str>) -> DbResult<Vec<Transaction>> {
        let mut list: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|t| patient_filter.map_or(true, |f| t.matches_patient(f)))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    fn clear_transactions(&mut self) -> DbResult<usize> {
        let count = self.transactions.len();
        self.transactions.clear();
        Ok(count)
    }
}

impl ConfigRepository for MemoryStore {
    fn load_config(&self) -> DbResult<Option<SystemConfig>> {
        Ok(self.config.clone())
    }

    fn save_config(&mut self, config: &SystemConfig) -> DbResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }
}

impl UserRepository for MemoryStore {
    fn insert_user(&mut self, user: &User) -> DbResult<()> {
        if self.users.contains_key(&user.username) {
            return Err(DbError::Constraint(format!(
                "username already exists: {}",
                user.username
            )));
        }
        self.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn get_user(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.users.get(username).cloned())
    }

    fn update_user(&mut self, user: &User) -> DbResult<bool> {
        match self.users.get_mut(&user.username) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
