//! The in-progress bill.
//!
//! [`Bill`] is plain state; every change goes through [`Bill::apply`] (or one
//! of the methods it dispatches to). Totals are derived on demand, so they can
//! never disagree with the line items.

use thiserror::Error;

use crate::models::{
    is_valid_price, BillTotals, LineItem, LineItemId, PatientInfo, Service, Transaction,
    TransactionStatus, DEFAULT_CATEGORY,
};

/// Bill validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillError {
    #[error("Please enter both name and price")]
    MissingCustomName,

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("No line item with id {0}")]
    UnknownItem(LineItemId),
}

/// A single change to the bill.
#[derive(Debug, Clone, PartialEq)]
pub enum BillAction {
    /// Add one of a catalog service
    Add(Service),
    /// Add an uncataloged charge
    AddCustom {
        name: String,
        total_price: f64,
        category: String,
    },
    /// Set a quantity; zero or less removes the line
    SetQuantity { id: LineItemId, quantity: i64 },
    /// Take one away; removes the line at zero
    Decrement(LineItemId),
    Remove(LineItemId),
    /// Percentage, clamped to [0, 100]
    SetDiscount(f64),
    SetPatient(PatientInfo),
    /// Start a new transaction
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bill {
    items: Vec<LineItem>,
    patient: PatientInfo,
    discount: f64,
    /// Id of the saved transaction this bill was stored as or loaded from
    transaction_id: Option<i64>,
    invoice_number: Option<String>,
}

impl Bill {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action.
    pub fn apply(&mut self, action: BillAction) -> Result<(), BillError> {
        match action {
            BillAction::Add(service) => {
                self.add(&service);
                Ok(())
            }
            BillAction::AddCustom {
                name,
                total_price,
                category,
            } => self.add_custom(name, total_price, category).map(|_| ()),
            BillAction::SetQuantity { id, quantity } => self.update_quantity(&id, quantity),
            BillAction::Decrement(id) => self.decrement(&id),
            BillAction::Remove(id) => self
                .remove(&id)
                .map(|_| ())
                .ok_or(BillError::UnknownItem(id)),
            BillAction::SetDiscount(discount) => {
                self.set_discount(discount);
                Ok(())
            }
            BillAction::SetPatient(patient) => {
                self.patient = patient;
                Ok(())
            }
            BillAction::Clear => {
                self.clear();
                Ok(())
            }
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn patient(&self) -> &PatientInfo {
        &self.patient
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn transaction_id(&self) -> Option<i64> {
        self.transaction_id
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> BillTotals {
        BillTotals::compute(&self.items, self.discount)
    }

    /// Add one of a service, bumping the quantity if it is already billed.
    pub fn add(&mut self, service: &Service) {
        let id = LineItemId::Service(service.id);
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(LineItem::from_service(service)),
        }
    }

    /// Add an uncataloged charge with quantity 1.
    pub fn add_custom(
        &mut self,
        name: String,
        total_price: f64,
        category: String,
    ) -> Result<&LineItem, BillError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BillError::MissingCustomName);
        }
        if !is_valid_price(total_price) {
            return Err(BillError::InvalidPrice(total_price));
        }
        let category = match category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            c => c.to_string(),
        };

        self.items
            .push(LineItem::custom(name.to_string(), total_price, category));
        Ok(&self.items[self.items.len() - 1])
    }

    /// Set the quantity of a line; zero or less removes it.
    ///
    /// Custom charges keep quantity 1.
    pub fn update_quantity(&mut self, id: &LineItemId, quantity: i64) -> Result<(), BillError> {
        if quantity <= 0 {
            return self
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| BillError::UnknownItem(id.clone()));
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| BillError::UnknownItem(id.clone()))?;
        if item.is_custom() {
            tracing::debug!(%id, "custom line items keep quantity 1");
            return Ok(());
        }
        item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        Ok(())
    }

    /// Take one away from a line.
    pub fn decrement(&mut self, id: &LineItemId) -> Result<(), BillError> {
        let quantity = self
            .items
            .iter()
            .find(|item| &item.id == id)
            .map(|item| i64::from(item.quantity))
            .ok_or_else(|| BillError::UnknownItem(id.clone()))?;
        self.update_quantity(id, quantity - 1)
    }

    pub fn remove(&mut self, id: &LineItemId) -> Option<LineItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Clamp to [0, 100]; NaN counts as no discount.
    pub fn set_discount(&mut self, discount: f64) {
        self.discount = if discount.is_nan() {
            0.0
        } else {
            discount.clamp(0.0, 100.0)
        };
    }

    pub fn set_patient(&mut self, patient: PatientInfo) {
        self.patient = patient;
    }

    /// Empty the bill and forget the saved transaction.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Load a stored transaction into the bill.
    ///
    /// Only saved transactions are remembered for later overwrites; a
    /// completed one is loaded as a fresh copy.
    pub fn restore(&mut self, transaction: &Transaction) {
        self.items = transaction.items.clone();
        self.patient = transaction.patient.clone();
        self.set_discount(transaction.discount);
        if transaction.status == TransactionStatus::Saved {
            self.transaction_id = transaction.id;
            self.invoice_number = Some(transaction.invoice_number.clone());
        } else {
            self.transaction_id = None;
            self.invoice_number = None;
        }
    }

    /// Remember where the bill was stored.
    pub(crate) fn mark_saved(&mut self, id: i64, invoice_number: &str) {
        self.transaction_id = Some(id);
        self.invoice_number = Some(invoice_number.to_string());
    }

    pub(crate) fn forget_saved(&mut self) {
        self.transaction_id = None;
        self.invoice_number = None;
    }

    /// Freeze the bill into a transaction record.
    ///
    /// Saved snapshots keep the id and invoice number of an earlier save.
    pub fn snapshot(&self, status: TransactionStatus) -> Transaction {
        let mut tx = Transaction::snapshot(
            self.patient.clone(),
            self.items.clone(),
            self.discount,
            status,
        );
        if status == TransactionStatus::Saved {
            tx.id = self.transaction_id;
            if let Some(invoice_number) = &self.invoice_number {
                tx.invoice_number = invoice_number.clone();
            }
        }
        tx
    }
}
