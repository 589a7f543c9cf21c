//! Persisted bill snapshots.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::bill::{LineItem, PatientInfo};

/// Lifecycle state of a stored transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Work in progress, may be overwritten by later saves
    Saved,
    /// Receipt generated, immutable
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Saved => "saved",
            TransactionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "saved" => Some(TransactionStatus::Saved),
            "completed" => Some(TransactionStatus::Completed),
            _ => None,
        }
    }
}

/// Subtotal, discount and total of a bill.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BillTotals {
    pub subtotal: f64,
    /// Discount percentage in [0, 100]
    pub discount: f64,
    pub discount_amount: f64,
    pub total: f64,
}

impl BillTotals {
    /// Derive totals from line items and a discount percentage.
    pub fn compute(items: &[LineItem], discount: f64) -> Self {
        let subtotal: f64 = items.iter().map(LineItem::line_total).sum();
        let discount_amount = subtotal * (discount / 100.0);
        Self {
            subtotal,
            discount,
            discount_amount,
            total: subtotal - discount_amount,
        }
    }
}

/// A saved or completed bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Storage id; `None` until first persisted
    pub id: Option<i64>,
    pub invoice_number: String,
    pub patient: PatientInfo,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub discount_amount: f64,
    pub total: f64,
    /// RFC 3339 creation time
    pub date: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub status: TransactionStatus,
}

impl Transaction {
    /// Snapshot a bill at the current time.
    pub fn snapshot(
        patient: PatientInfo,
        items: Vec<LineItem>,
        discount: f64,
        status: TransactionStatus,
    ) -> Self {
        let now = Utc::now();
        let totals = BillTotals::compute(&items, discount);
        Self {
            id: None,
            invoice_number: invoice_number_at(now),
            patient,
            items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            discount_amount: totals.discount_amount,
            total: totals.total,
            date: now.to_rfc3339(),
            timestamp: now.timestamp_millis(),
            status,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    pub fn totals(&self) -> BillTotals {
        BillTotals {
            subtotal: self.subtotal,
            discount: self.discount,
            discount_amount: self.discount_amount,
            total: self.total,
        }
    }

    /// Case-insensitive substring match on patient display name or patient id.
    pub fn matches_patient(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.patient.display_name().to_lowercase().contains(&term)
            || self.patient.id.to_lowercase().contains(&term)
    }
}

/// `INV-<year>-<last six digits of the millisecond clock>`.
pub fn invoice_number_at(at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis().rem_euclid(1_000_000);
    format!("INV-{}-{:06}", at.year(), millis)
}
