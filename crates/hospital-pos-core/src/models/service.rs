//! Billable service catalog models.

use serde::{Deserialize, Serialize};

/// Category assigned to imported rows that carry none.
pub const DEFAULT_CATEGORY: &str = "General";

/// Categories offered by the service editor.
pub const CATEGORIES: [&str; 10] = [
    "Consultation",
    "Laboratory",
    "Radiology",
    "Medication",
    "Accommodation",
    "Procedure",
    "Diagnostic",
    "Emergency",
    "Therapy",
    "Surgery",
];

/// A single billable service in the hospital catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    /// Unique identifier (timestamp-derived for user-created services)
    pub id: i64,
    /// Display name
    pub name: String,
    /// Unit price, never negative
    pub price: f64,
    /// Free-form category (e.g., "Laboratory")
    pub category: String,
}

/// User-supplied fields for creating or editing a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDraft {
    pub name: String,
    pub price: f64,
    pub category: String,
}

impl ServiceDraft {
    pub fn new(name: impl Into<String>, price: f64, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            category: category.into(),
        }
    }

    /// Check that every field is filled in and the price is usable.
    ///
    /// Returns the name of the first offending field.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if !is_valid_price(self.price) {
            Some("price")
        } else if self.category.trim().is_empty() {
            Some("category")
        } else {
            None
        }
    }

    /// Build the service this draft describes under the given id.
    pub fn into_service(self, id: i64) -> Service {
        Service {
            id,
            name: self.name.trim().to_string(),
            price: self.price,
            category: self.category.trim().to_string(),
        }
    }
}

impl Service {
    /// Case-insensitive substring match on name or category.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.category.to_lowercase().contains(&term)
    }
}

/// Prices must be finite and non-negative.
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

/// The catalog a fresh installation starts with.
pub fn default_services() -> Vec<Service> {
    [
        (1, "General Consultation", 5000.0, "Consultation"),
        (2, "Blood Test - Full Panel", 15000.0, "Laboratory"),
        (3, "X-Ray Chest", 8000.0, "Radiology"),
        (4, "Paracetamol 500mg", 200.0, "Medication"),
        (5, "Private Ward (per day)", 25000.0, "Accommodation"),
        (6, "Surgery - Appendectomy", 150000.0, "Procedure"),
        (7, "ECG", 3000.0, "Diagnostic"),
        (8, "Insulin Injection", 1500.0, "Medication"),
    ]
    .into_iter()
    .map(|(id, name, price, category)| Service {
        id,
        name: name.to_string(),
        price,
        category: category.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_name_or_category() {
        let service = Service {
            id: 1,
            name: "X-Ray Chest".into(),
            price: 8000.0,
            category: "Radiology".into(),
        };

        assert!(service.matches("x-ray"));
        assert!(service.matches("RADIO"));
        assert!(service.matches(""));
        assert!(!service.matches("blood"));
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(ServiceDraft::new("ECG", 3000.0, "Diagnostic").missing_field(), None);
        assert_eq!(ServiceDraft::new("  ", 3000.0, "Diagnostic").missing_field(), Some("name"));
        assert_eq!(ServiceDraft::new("ECG", -1.0, "Diagnostic").missing_field(), Some("price"));
        assert_eq!(ServiceDraft::new("ECG", f64::NAN, "Diagnostic").missing_field(), Some("price"));
        assert_eq!(ServiceDraft::new("ECG", 3000.0, "").missing_field(), Some("category"));
    }

    #[test]
    fn test_default_services() {
        let services = default_services();
        assert_eq!(services.len(), 8);
        assert_eq!(services[0].name, "General Consultation");
        assert!(services.iter().all(|s| CATEGORIES.contains(&s.category.as_str())));
    }
}
