//! Point-of-sale application state.
//!
//! [`PosApp`] owns the catalog, the in-progress bill, the terminal
//! configuration and the visible receipt. Every change lands in memory first;
//! catalog, config and transaction writes are then mirrored to the store.
//! A failed mirror write is logged and the in-memory change kept.

mod bill;
mod catalog;
mod credentials;
mod settings;
mod transactions;
mod users;

pub use bill::*;
pub use catalog::*;
pub use credentials::*;
pub use settings::*;

use thiserror::Error;

use crate::db::{DbError, DbResult};
use crate::export::CsvImportError;
use crate::models::{default_services, SystemConfig, Transaction, DEFAULT_ADMIN_PASSWORD};
use crate::repository::PosStore;

/// Application errors.
#[derive(Error, Debug)]
pub enum PosError {
    #[error("Please fill all fields: {0} is missing or invalid")]
    MissingField(&'static str),

    #[error("Service not found: {0}")]
    ServiceNotFound(i64),

    #[error("No service ids left to assign")]
    IdsExhausted,

    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Please add services to the bill first")]
    EmptyBill,

    #[error("You can only select up to {limit} quick access services")]
    QuickAccessLimit { limit: usize },

    #[error("Image must be less than 2MB (got {size} bytes)")]
    ImageTooLarge { size: usize },

    #[error("Not an image: {0}")]
    InvalidImage(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Incorrect admin password")]
    IncorrectPassword,

    #[error("Credential error: {0}")]
    Credential(String),

    #[error(transparent)]
    Bill(#[from] BillError),

    #[error("CSV import failed: {0}")]
    Csv(#[from] CsvImportError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type PosResult<T> = Result<T, PosError>;

/// The billing terminal.
pub struct PosApp<S: PosStore> {
    store: S,
    catalog: Catalog,
    bill: Bill,
    config: SystemConfig,
    /// Completed transaction whose receipt is on screen
    receipt: Option<Transaction>,
}

impl<S: PosStore> PosApp<S> {
    /// Load state from the store, seeding the default catalog and config on
    /// first run.
    pub fn open(mut store: S) -> PosResult<Self> {
        let mut services = store.list_services()?;
        if services.is_empty() {
            services = default_services();
            mirror(&mut store, "seed services", |s| s.replace_services(&services));
            tracing::info!(count = services.len(), "Seeded default services");
        }

        let config = match store.load_config()? {
            Some(config) => config,
            None => {
                let config = SystemConfig::new(hash_password(DEFAULT_ADMIN_PASSWORD)?);
                mirror(&mut store, "seed config", |s| s.save_config(&config));
                config
            }
        };

        Ok(Self {
            store,
            catalog: Catalog::new(services),
            bill: Bill::new(),
            config,
            receipt: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn bill(&self) -> &Bill {
        &self.bill
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a change to the in-progress bill.
    pub fn apply(&mut self, action: BillAction) -> PosResult<()> {
        tracing::debug!(?action, "Bill action");
        self.bill.apply(action).map_err(Into::into)
    }

    /// Add a catalog service to the bill by id.
    pub fn add_to_bill(&mut self, service_id: i64) -> PosResult<()> {
        let service = self
            .catalog
            .get(service_id)
            .cloned()
            .ok_or(PosError::ServiceNotFound(service_id))?;
        self.apply(BillAction::Add(service))
    }

    /// Discard the bill and start a new transaction.
    pub fn new_transaction(&mut self) {
        self.bill.clear();
    }
}

/// Run a store write whose failure must not undo the in-memory change.
fn mirror<S, T, F>(store: &mut S, operation: &str, write: F) -> Option<T>
where
    S: PosStore,
    F: FnOnce(&mut S) -> DbResult<T>,
{
    match write(store) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(%error, operation, "Storage write failed, keeping in-memory state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItemId, QUICK_ACCESS_LIMIT};
    use crate::repository::{ConfigRepository, MemoryStore, ServiceRepository};

    #[test]
    fn test_open_seeds_defaults() {
        let app = PosApp::open(MemoryStore::new()).unwrap();

        assert_eq!(app.catalog().services().len(), 8);
        assert_eq!(app.store().list_services().unwrap().len(), 8);
        assert_eq!(app.config().quick_access_services.len(), QUICK_ACCESS_LIMIT);

        let stored = app.store().load_config().unwrap().unwrap();
        assert!(stored.admin_password_hash.starts_with("$argon2"));
        assert!(app.verify_admin_password(DEFAULT_ADMIN_PASSWORD));
    }

    #[test]
    fn test_open_keeps_existing_state() {
        let mut store = MemoryStore::new();
        store
            .upsert_service(&crate::models::Service {
                id: 42,
                name: "Dialysis".into(),
                price: 60000.0,
                category: "Therapy".into(),
            })
            .unwrap();
        let mut config = SystemConfig::new("hash".into());
        config.hospital_name = "Ikeja Clinic".into();
        store.save_config(&config).unwrap();

        let app = PosApp::open(store).unwrap();
        assert_eq!(app.catalog().services().len(), 1);
        assert_eq!(app.config().hospital_name, "Ikeja Clinic");
    }

    #[test]
    fn test_add_to_bill() {
        let mut app = PosApp::open(MemoryStore::new()).unwrap();
        app.add_to_bill(1).unwrap();
        app.add_to_bill(1).unwrap();

        assert_eq!(app.bill().items()[0].id, LineItemId::Service(1));
        assert_eq!(app.bill().items()[0].quantity, 2);
        assert!(matches!(app.add_to_bill(999), Err(PosError::ServiceNotFound(999))));

        app.new_transaction();
        assert!(app.bill().is_empty());
    }
}
