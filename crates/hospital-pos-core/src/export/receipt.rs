//! Receipt rendering for printing and sharing.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::models::{HospitalIdentity, SystemConfig, Transaction};

/// Placeholder for missing patient fields.
const NOT_AVAILABLE: &str = "N/A";

/// A completed bill together with the identity printed on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub hospital: HospitalIdentity,
    /// Inline `data:` URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub transaction: Transaction,
}

impl Receipt {
    pub fn new(config: &SystemConfig, transaction: Transaction) -> Self {
        Self {
            hospital: config.identity(),
            logo: config.hospital_logo.clone(),
            transaction,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text receipt suitable for messaging apps and email bodies.
    pub fn to_text(&self) -> String {
        let tx = &self.transaction;
        let (date, time) = match DateTime::parse_from_rfc3339(&tx.date) {
            Ok(at) => (
                at.format("%d/%m/%Y").to_string(),
                at.format("%H:%M:%S").to_string(),
            ),
            Err(_) => (tx.date.clone(), String::new()),
        };

        let mut lines = vec![
            self.hospital.name.clone(),
            self.hospital.address.clone(),
            format!("Tel: {}", self.hospital.phone),
            String::new(),
            format!("Invoice #: {}", tx.invoice_number),
            format!("Date: {}", date),
            format!("Time: {}", time),
            String::new(),
            format!("Patient: {}", tx.patient.display_name()),
            format!("ID: {}", or_not_available(&tx.patient.id)),
            format!("Phone: {}", or_not_available(&tx.patient.phone)),
            String::new(),
            "SERVICES:".to_string(),
        ];

        lines.extend(tx.items.iter().map(|item| {
            format!(
                "{} x{} - {}",
                item.name,
                item.quantity,
                format_naira(item.line_total())
            )
        }));

        lines.push(String::new());
        lines.push(format!("Subtotal: {}", format_naira(tx.subtotal)));
        if tx.discount > 0.0 {
            lines.push(format!(
                "Discount ({}%): -{}",
                tx.discount,
                format_naira(tx.discount_amount)
            ));
        }
        lines.push(format!("TOTAL: {}", format_naira(tx.total)));
        lines.push(String::new());
        lines.push(self.hospital.tagline.clone());

        lines.join("\n")
    }
}

fn or_not_available(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

/// Format an amount as Nigerian naira, e.g. `₦1,234,567.50`.
pub fn format_naira(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("₦{}", amount);
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}₦{}.{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, PatientInfo, Service, TransactionStatus};

    fn make_receipt(discount: f64, patient: PatientInfo) -> Receipt {
        let consult = Service {
            id: 1,
            name: "General Consultation".into(),
            price: 5000.0,
            category: "Consultation".into(),
        };
        let mut line = LineItem::from_service(&consult);
        line.quantity = 2;

        let mut tx = Transaction::snapshot(patient, vec![line], discount, TransactionStatus::Completed);
        tx.invoice_number = "INV-2024-123456".into();
        tx.date = "2024-03-05T14:07:09+00:00".into();

        Receipt::new(&SystemConfig::new("hash".into()), tx)
    }

    #[test]
    fn test_format_naira() {
        assert_eq!(format_naira(0.0), "₦0.00");
        assert_eq!(format_naira(200.0), "₦200.00");
        assert_eq!(format_naira(5000.0), "₦5,000.00");
        assert_eq!(format_naira(1234567.5), "₦1,234,567.50");
        assert_eq!(format_naira(0.125), "₦0.13");
        assert_eq!(format_naira(-1500.0), "-₦1,500.00");
        assert_eq!(format_naira(-0.001), "₦0.00");
    }

    #[test]
    fn test_text_walk_in() {
        let text = make_receipt(0.0, PatientInfo::default()).to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Lagos General Hospital");
        assert_eq!(lines[2], "Tel: +234 123 456 7890");
        assert!(text.contains("Invoice #: INV-2024-123456"));
        assert!(text.contains("Date: 05/03/2024"));
        assert!(text.contains("Time: 14:07:09"));
        assert!(text.contains("Patient: Walk-in Patient"));
        assert!(text.contains("ID: N/A"));
        assert!(text.contains("General Consultation x2 - ₦10,000.00"));
        assert!(!text.contains("Discount"));
        assert!(text.contains("TOTAL: ₦10,000.00"));
        assert_eq!(*lines.last().unwrap(), "Your Health, Our Priority");
    }

    #[test]
    fn test_text_with_discount() {
        let patient = PatientInfo {
            name: "Ada Obi".into(),
            id: "PT-7".into(),
            phone: "0803 000 0000".into(),
        };
        let text = make_receipt(12.5, patient).to_text();

        assert!(text.contains("Patient: Ada Obi"));
        assert!(text.contains("Phone: 0803 000 0000"));
        assert!(text.contains("Discount (12.5%): -₦1,250.00"));
        assert!(text.contains("TOTAL: ₦8,750.00"));
    }

    #[test]
    fn test_json() {
        let json = make_receipt(0.0, PatientInfo::default()).to_json().unwrap();
        assert!(json.contains("INV-2024-123456"));
        assert!(json.contains("Lagos General Hospital"));
    }
}
