//! Hospital POS Core Library
//!
//! Local-first billing terminal for hospital cashiers: a service catalog, an
//! in-progress bill, saved and completed transactions, receipts and terminal
//! settings, persisted in SQLite and exposed to mobile and desktop hosts
//! through UniFFI.
//!
//! # Architecture
//!
//! ```text
//!  Host UI ──► HospitalPosCore (FFI, Arc<Mutex<_>>)
//!                     │
//!                     ▼
//!                  PosApp ── Catalog · Bill · SystemConfig · Receipt
//!                     │
//!          mirror writes / queries (PosStore)
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!       Database            MemoryStore
//!       (SQLite)            (in process)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Service, LineItem, Transaction, SystemConfig, User)
//! - [`repository`]: Storage traits and the in-memory store
//! - [`pos`]: Application state and operations
//! - [`export`]: Catalog CSV and receipt rendering

pub mod db;
pub mod export;
pub mod models;
pub mod pos;
pub mod repository;

// Re-export commonly used types
pub use db::Database;
pub use export::{format_naira, Receipt};
pub use models::{
    HospitalIdentity, LineItem, LineItemId, PatientInfo, Service, ServiceDraft, SystemConfig,
    Transaction, TransactionStatus, User,
};
pub use pos::{Bill, BillAction, ImportReport, PosApp, PosError};
pub use repository::{MemoryStore, PosStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HospitalPosError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for HospitalPosError {
    fn from(e: db::DbError) -> Self {
        HospitalPosError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for HospitalPosError {
    fn from(e: serde_json::Error) -> Self {
        HospitalPosError::SerializationError(e.to_string())
    }
}

impl From<models::ParseLineItemIdError> for HospitalPosError {
    fn from(e: models::ParseLineItemIdError) -> Self {
        HospitalPosError::InvalidInput(e.to_string())
    }
}

impl From<PosError> for HospitalPosError {
    fn from(e: PosError) -> Self {
        let message = e.to_string();
        match e {
            PosError::Database(db) => db.into(),
            PosError::ServiceNotFound(_)
            | PosError::TransactionNotFound(_)
            | PosError::UserNotFound(_) => HospitalPosError::NotFound(message),
            PosError::InvalidCredentials
            | PosError::IncorrectPassword
            | PosError::Credential(_) => HospitalPosError::AuthError(message),
            _ => HospitalPosError::InvalidInput(message),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for HospitalPosError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HospitalPosError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a terminal backed by the database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<HospitalPosCore>, HospitalPosError> {
    let db = Database::open(&path)?;
    HospitalPosCore::new(db)
}

/// Create a terminal on an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<HospitalPosCore>, HospitalPosError> {
    let db = Database::open_in_memory()?;
    HospitalPosCore::new(db)
}

/// Install a stdout log subscriber, e.g. `"info,hospital_pos_core=debug"`.
///
/// Later calls are ignored.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<(), HospitalPosError> {
    let filter = EnvFilter::try_new(&filter)
        .map_err(|e| HospitalPosError::InvalidInput(format!("Invalid log filter: {}", e)))?;

    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        tracing::debug!(error = %e, "Logging already initialised");
    }
    Ok(())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe terminal wrapper for FFI.
#[derive(uniffi::Object)]
pub struct HospitalPosCore {
    app: Arc<Mutex<PosApp<Database>>>,
}

impl HospitalPosCore {
    fn new(db: Database) -> Result<Arc<Self>, HospitalPosError> {
        let app = PosApp::open(db)?;
        Ok(Arc::new(Self {
            app: Arc::new(Mutex::new(app)),
        }))
    }
}

#[uniffi::export]
impl HospitalPosCore {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    pub fn list_services(&self) -> Result<Vec<FfiService>, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.catalog().services().iter().cloned().map(Into::into).collect())
    }

    /// Case-insensitive search over name and category.
    pub fn search_services(&self, term: String) -> Result<Vec<FfiService>, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.catalog().search(&term).into_iter().cloned().map(Into::into).collect())
    }

    /// Categories offered by the service editor.
    pub fn service_categories(&self) -> Vec<String> {
        models::CATEGORIES.iter().map(|c| c.to_string()).collect()
    }

    pub fn add_service(
        &self,
        name: String,
        price: f64,
        category: String,
    ) -> Result<FfiService, HospitalPosError> {
        let mut app = self.app.lock()?;
        let service = app.add_service(ServiceDraft::new(name, price, category))?;
        Ok(service.into())
    }

    pub fn edit_service(
        &self,
        id: i64,
        name: String,
        price: f64,
        category: String,
    ) -> Result<FfiService, HospitalPosError> {
        let mut app = self.app.lock()?;
        let service = app.edit_service(id, ServiceDraft::new(name, price, category))?;
        Ok(service.into())
    }

    /// Delete a service. The host asks for confirmation first.
    pub fn delete_service(&self, id: i64) -> Result<(), HospitalPosError> {
        let mut app = self.app.lock()?;
        app.delete_service(id)?;
        Ok(())
    }

    pub fn reset_services(&self) -> Result<(), HospitalPosError> {
        let mut app = self.app.lock()?;
        app.reset_services();
        Ok(())
    }

    pub fn import_services_csv(&self, text: String) -> Result<FfiImportReport, HospitalPosError> {
        let mut app = self.app.lock()?;
        let report = app.import_services_csv(&text)?;
        Ok(report.into())
    }

    pub fn export_services_csv(&self) -> Result<String, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.export_services_csv())
    }

    pub fn quick_access_services(&self) -> Result<Vec<FfiService>, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.quick_access_services().into_iter().cloned().map(Into::into).collect())
    }

    // =========================================================================
    // Bill Operations
    // =========================================================================

    pub fn get_bill(&self) -> Result<FfiBill, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.bill().into())
    }

    pub fn add_to_bill(&self, service_id: i64) -> Result<FfiBill, HospitalPosError> {
        let mut app = self.app.lock()?;
        app.add_to_bill(service_id)?;
        Ok(app.bill().into())
    }

    pub fn add_custom_item(
        &self,
        name: String,
        total_price: f64,
        category: String,
    ) -> Result<FfiBill, HospitalPosError> {
        self.apply(BillAction::AddCustom {
            name,
            total_price,
            category,
        })
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update_quantity(
        &self,
        line_item_id: String,
        quantity: i64,
    ) -> Result<FfiBill, HospitalPosError> {
        let id: LineItemId = line_item_id.parse()?;
        self.apply(BillAction::SetQuantity { id, quantity })
    }

    pub fn decrement_item(&self, line_item_id: String) -> Result<FfiBill, HospitalPosError> {
        self.apply(BillAction::Decrement(line_item_id.parse()?))
    }

    pub fn remove_item(&self, line_item_id: String) -> Result<FfiBill, HospitalPosError> {
        self.apply(BillAction::Remove(line_item_id.parse()?))
    }

    /// Percentage; clamped to 0..=100.
    pub fn set_discount(&self, discount: f64) -> Result<FfiBill, HospitalPosError> {
        self.apply(BillAction::SetDiscount(discount))
    }

    pub fn set_patient(&self, patient: FfiPatientInfo) -> Result<FfiBill, HospitalPosError> {
        self.apply(BillAction::SetPatient(patient.into()))
    }

    /// Clear the bill and forget any saved transaction.
    pub fn new_transaction(&self) -> Result<FfiBill, HospitalPosError> {
        self.apply(BillAction::Clear)
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    pub fn save_transaction(&self) -> Result<FfiTransaction, HospitalPosError> {
        let mut app = self.app.lock()?;
        Ok(app.save_transaction()?.into())
    }

    pub fn load_transaction(&self, id: i64) -> Result<FfiTransaction, HospitalPosError> {
        let mut app = self.app.lock()?;
        Ok(app.load_transaction(id)?.into())
    }

    pub fn generate_receipt(&self) -> Result<FfiReceipt, HospitalPosError> {
        let mut app = self.app.lock()?;
        FfiReceipt::try_from(app.generate_receipt()?)
    }

    /// The receipt currently on screen.
    pub fn current_receipt(&self) -> Result<Option<FfiReceipt>, HospitalPosError> {
        let app = self.app.lock()?;
        app.receipt().map(FfiReceipt::try_from).transpose()
    }

    pub fn dismiss_receipt(&self) -> Result<(), HospitalPosError> {
        let mut app = self.app.lock()?;
        app.dismiss_receipt();
        Ok(())
    }

    /// Most recent first, optionally filtered by patient name or id.
    pub fn list_transactions(
        &self,
        patient_filter: Option<String>,
    ) -> Result<Vec<FfiTransaction>, HospitalPosError> {
        let app = self.app.lock()?;
        let transactions = app.list_transactions(patient_filter.as_deref())?;
        Ok(transactions.into_iter().map(Into::into).collect())
    }

    pub fn clear_transaction_history(&self) -> Result<u64, HospitalPosError> {
        let mut app = self.app.lock()?;
        Ok(app.clear_transaction_history() as u64)
    }

    // =========================================================================
    // Settings Operations
    // =========================================================================

    pub fn get_config(&self) -> Result<FfiSystemConfig, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.config().into())
    }

    pub fn update_hospital_identity(
        &self,
        identity: FfiHospitalIdentity,
    ) -> Result<FfiSystemConfig, HospitalPosError> {
        let mut app = self.app.lock()?;
        app.update_hospital_identity(identity.into())?;
        Ok(app.config().into())
    }

    pub fn set_logo(&self, bytes: Vec<u8>, mime_type: String) -> Result<(), HospitalPosError> {
        let mut app = self.app.lock()?;
        app.set_logo(&bytes, &mime_type)?;
        Ok(())
    }

    pub fn clear_logo(&self) -> Result<(), HospitalPosError> {
        let mut app = self.app.lock()?;
        app.clear_logo();
        Ok(())
    }

    /// Returns whether the service is now pinned.
    pub fn toggle_quick_access(&self, service_id: i64) -> Result<bool, HospitalPosError> {
        let mut app = self.app.lock()?;
        Ok(app.toggle_quick_access(service_id)?)
    }

    pub fn verify_admin_password(&self, attempt: String) -> Result<bool, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.verify_admin_password(&attempt))
    }

    pub fn change_admin_password(
        &self,
        current: String,
        new_password: String,
    ) -> Result<(), HospitalPosError> {
        let mut app = self.app.lock()?;
        app.change_admin_password(&current, &new_password)?;
        Ok(())
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    pub fn register_user(
        &self,
        username: String,
        password: String,
        confirm_password: String,
    ) -> Result<FfiUser, HospitalPosError> {
        let mut app = self.app.lock()?;
        Ok(app.register_user(&username, &password, &confirm_password)?.into())
    }

    pub fn login(&self, username: String, password: String) -> Result<FfiUser, HospitalPosError> {
        let app = self.app.lock()?;
        Ok(app.login(&username, &password)?.into())
    }

    pub fn set_profile_image(
        &self,
        username: String,
        bytes: Vec<u8>,
        mime_type: String,
    ) -> Result<FfiUser, HospitalPosError> {
        let mut app = self.app.lock()?;
        Ok(app.set_profile_image(&username, &bytes, &mime_type)?.into())
    }
}

impl HospitalPosCore {
    fn apply(&self, action: BillAction) -> Result<FfiBill, HospitalPosError> {
        let mut app = self.app.lock()?;
        app.apply(action)?;
        Ok(app.bill().into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe catalog service.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiService {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub category: String,
}

impl From<Service> for FfiService {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
            price: service.price,
            category: service.category,
        }
    }
}

/// FFI-safe import report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportReport {
    pub imported: Vec<FfiService>,
    pub skipped_invalid: u32,
    pub skipped_duplicate: u32,
}

impl From<ImportReport> for FfiImportReport {
    fn from(report: ImportReport) -> Self {
        Self {
            imported: report.imported.into_iter().map(Into::into).collect(),
            skipped_invalid: report.skipped_invalid as u32,
            skipped_duplicate: report.skipped_duplicate as u32,
        }
    }
}

/// FFI-safe line item. `id` is the service id or `custom-<uuid>`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLineItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub quantity: u32,
    pub line_total: f64,
    pub is_custom: bool,
}

impl From<LineItem> for FfiLineItem {
    fn from(item: LineItem) -> Self {
        Self {
            id: item.id.to_string(),
            line_total: item.line_total(),
            is_custom: item.is_custom(),
            name: item.name,
            price: item.price,
            category: item.category,
            quantity: item.quantity,
        }
    }
}

/// FFI-safe patient details.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInfo {
    pub name: String,
    pub id: String,
    pub phone: String,
}

impl From<PatientInfo> for FfiPatientInfo {
    fn from(patient: PatientInfo) -> Self {
        Self {
            name: patient.name,
            id: patient.id,
            phone: patient.phone,
        }
    }
}

impl From<FfiPatientInfo> for PatientInfo {
    fn from(patient: FfiPatientInfo) -> Self {
        PatientInfo {
            name: patient.name,
            id: patient.id,
            phone: patient.phone,
        }
    }
}

/// FFI-safe in-progress bill with derived totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBill {
    pub items: Vec<FfiLineItem>,
    pub patient: FfiPatientInfo,
    pub subtotal: f64,
    pub discount: f64,
    pub discount_amount: f64,
    pub total: f64,
    /// Saved transaction the next save will overwrite
    pub transaction_id: Option<i64>,
}

impl From<&Bill> for FfiBill {
    fn from(bill: &Bill) -> Self {
        let totals = bill.totals();
        Self {
            items: bill.items().iter().cloned().map(Into::into).collect(),
            patient: bill.patient().clone().into(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            discount_amount: totals.discount_amount,
            total: totals.total,
            transaction_id: bill.transaction_id(),
        }
    }
}

/// FFI-safe transaction record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTransaction {
    pub id: Option<i64>,
    pub invoice_number: String,
    pub patient: FfiPatientInfo,
    pub items: Vec<FfiLineItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub discount_amount: f64,
    pub total: f64,
    pub date: String,
    pub timestamp: i64,
    /// `saved` or `completed`
    pub status: String,
}

impl From<Transaction> for FfiTransaction {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            invoice_number: tx.invoice_number,
            patient: tx.patient.into(),
            items: tx.items.into_iter().map(Into::into).collect(),
            subtotal: tx.subtotal,
            discount: tx.discount,
            discount_amount: tx.discount_amount,
            total: tx.total,
            date: tx.date,
            timestamp: tx.timestamp,
            status: tx.status.as_str().to_string(),
        }
    }
}

/// FFI-safe receipt with ready-to-share renderings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReceipt {
    pub hospital: FfiHospitalIdentity,
    pub logo: Option<String>,
    pub transaction: FfiTransaction,
    pub text: String,
    pub json: String,
}

impl TryFrom<Receipt> for FfiReceipt {
    type Error = HospitalPosError;

    fn try_from(receipt: Receipt) -> Result<Self, Self::Error> {
        let text = receipt.to_text();
        let json = receipt.to_json()?;
        Ok(Self {
            hospital: receipt.hospital.into(),
            logo: receipt.logo,
            transaction: receipt.transaction.into(),
            text,
            json,
        })
    }
}

/// FFI-safe hospital identity.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHospitalIdentity {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub tagline: String,
}

impl From<HospitalIdentity> for FfiHospitalIdentity {
    fn from(identity: HospitalIdentity) -> Self {
        Self {
            name: identity.name,
            address: identity.address,
            phone: identity.phone,
            tagline: identity.tagline,
        }
    }
}

impl From<FfiHospitalIdentity> for HospitalIdentity {
    fn from(identity: FfiHospitalIdentity) -> Self {
        HospitalIdentity {
            name: identity.name,
            address: identity.address,
            phone: identity.phone,
            tagline: identity.tagline,
        }
    }
}

/// FFI-safe configuration. The admin password hash stays in the core.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSystemConfig {
    pub identity: FfiHospitalIdentity,
    pub hospital_logo: Option<String>,
    pub quick_access_services: Vec<i64>,
}

impl From<&SystemConfig> for FfiSystemConfig {
    fn from(config: &SystemConfig) -> Self {
        Self {
            identity: config.identity().into(),
            hospital_logo: config.hospital_logo.clone(),
            quick_access_services: config.quick_access_services.clone(),
        }
    }
}

/// FFI-safe operator account.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub username: String,
    pub profile_image: Option<String>,
    pub created_at: String,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            profile_image: user.profile_image,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_bill_flow() {
        let core = open_database_in_memory().unwrap();

        let bill = core.add_to_bill(1).unwrap();
        assert_eq!(bill.items[0].id, "1");

        let bill = core
            .add_custom_item("Dressing".into(), 750.0, "Procedure".into())
            .unwrap();
        let custom_id = bill.items[1].id.clone();
        assert!(custom_id.starts_with("custom-"));

        let bill = core.update_quantity("1".into(), 3).unwrap();
        assert_eq!(bill.subtotal, 15750.0);

        let bill = core.remove_item(custom_id).unwrap();
        assert_eq!(bill.items.len(), 1);

        assert!(matches!(
            core.update_quantity("nonsense".into(), 1),
            Err(HospitalPosError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ffi_receipt() {
        let core = open_database_in_memory().unwrap();
        assert!(matches!(
            core.generate_receipt(),
            Err(HospitalPosError::InvalidInput(_))
        ));

        core.add_to_bill(7).unwrap();
        let receipt = core.generate_receipt().unwrap();
        assert_eq!(receipt.transaction.status, "completed");
        assert!(receipt.text.contains("ECG x1 - ₦3,000.00"));
        assert!(core.current_receipt().unwrap().is_some());

        core.dismiss_receipt().unwrap();
        assert!(core.current_receipt().unwrap().is_none());
        assert_eq!(core.list_transactions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_ffi_error_mapping() {
        let core = open_database_in_memory().unwrap();
        assert!(matches!(
            core.load_transaction(1),
            Err(HospitalPosError::NotFound(_))
        ));
        assert!(matches!(
            core.login("nobody".into(), "pw".into()),
            Err(HospitalPosError::AuthError(_))
        ));
        assert!(matches!(
            core.set_logo(vec![0; 16], "text/plain".into()),
            Err(HospitalPosError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging("warn".into()).unwrap();
        init_logging("debug".into()).unwrap();
        assert!(init_logging("hospital_pos_core=loud".into()).is_err());
    }
}
