//! Line items and patient details attached to a bill.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::service::Service;

/// Display name used when a bill has no patient name.
pub const WALK_IN_PATIENT: &str = "Walk-in Patient";

const CUSTOM_PREFIX: &str = "custom-";

/// Identifier of a line item on a bill.
///
/// Catalog items reuse the service id so adding the same service twice finds
/// the existing line. Custom items get a fresh id every time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LineItemId {
    Service(i64),
    Custom(String),
}

impl LineItemId {
    /// Generate a new custom item id.
    pub fn new_custom() -> Self {
        LineItemId::Custom(format!("{}{}", CUSTOM_PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, LineItemId::Custom(_))
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineItemId::Service(id) => write!(f, "{}", id),
            LineItemId::Custom(id) => f.write_str(id),
        }
    }
}

/// Error parsing a line item id.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid line item id: {0}")]
pub struct ParseLineItemIdError(pub String);

impl FromStr for LineItemId {
    type Err = ParseLineItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with(CUSTOM_PREFIX) && s.len() > CUSTOM_PREFIX.len() {
            return Ok(LineItemId::Custom(s.to_string()));
        }
        s.parse::<i64>()
            .map(LineItemId::Service)
            .map_err(|_| ParseLineItemIdError(s.to_string()))
    }
}

/// A service (or custom charge) on the in-progress bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub id: LineItemId,
    pub name: String,
    /// Unit price; for custom items this is the fixed total
    pub price: f64,
    pub category: String,
    /// Always at least 1; custom items stay at 1
    pub quantity: u32,
}

impl LineItem {
    /// Line item for a catalog service with quantity 1.
    pub fn from_service(service: &Service) -> Self {
        Self {
            id: LineItemId::Service(service.id),
            name: service.name.clone(),
            price: service.price,
            category: service.category.clone(),
            quantity: 1,
        }
    }

    /// Ad-hoc charge that is not in the catalog.
    pub fn custom(name: String, total_price: f64, category: String) -> Self {
        Self {
            id: LineItemId::new_custom(),
            name,
            price: total_price,
            category,
            quantity: 1,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.id.is_custom()
    }

    /// Price times quantity.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Free-text patient details; every field may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientInfo {
    pub name: String,
    pub id: String,
    pub phone: String,
}

impl PatientInfo {
    /// Patient name, or the walk-in placeholder.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            WALK_IN_PATIENT
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_id_round_trip_text() {
        let service = LineItemId::Service(42);
        assert_eq!(service.to_string(), "42");
        assert_eq!("42".parse::<LineItemId>().unwrap(), service);

        let custom = LineItemId::new_custom();
        let text = custom.to_string();
        assert!(text.starts_with("custom-"));
        assert_eq!(text.parse::<LineItemId>().unwrap(), custom);
    }

    #[test]
    fn test_line_item_id_rejects_garbage() {
        assert!("abc".parse::<LineItemId>().is_err());
        assert!("custom-".parse::<LineItemId>().is_err());
    }

    #[test]
    fn test_custom_ids_unique() {
        let a = LineItem::custom("Dressing".into(), 500.0, "Procedure".into());
        let b = LineItem::custom("Dressing".into(), 500.0, "Procedure".into());
        assert_ne!(a.id, b.id);
        assert!(a.is_custom());
        assert_eq!(a.quantity, 1);
    }

    #[test]
    fn test_display_name() {
        let mut patient = PatientInfo::default();
        assert_eq!(patient.display_name(), "Walk-in Patient");
        patient.name = "Ada Obi".into();
        assert_eq!(patient.display_name(), "Ada Obi");
    }
}
