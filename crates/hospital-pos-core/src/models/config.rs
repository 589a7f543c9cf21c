//! Hospital identity and terminal settings.

use serde::{Deserialize, Serialize};

/// Maximum number of services pinned to the quick access panel.
pub const QUICK_ACCESS_LIMIT: usize = 6;

/// Largest accepted logo or profile image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Admin password of a fresh installation.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Singleton configuration record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemConfig {
    pub hospital_name: String,
    pub hospital_address: String,
    pub hospital_phone: String,
    /// Inline `data:` URL
    pub hospital_logo: Option<String>,
    pub tagline: String,
    /// Service ids pinned for one-click addition
    pub quick_access_services: Vec<i64>,
    /// Argon2 PHC string, never the password itself
    pub admin_password_hash: String,
}

/// Identity fields edited together on the settings screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalIdentity {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub tagline: String,
}

impl SystemConfig {
    /// Factory defaults protected by the given admin password hash.
    pub fn new(admin_password_hash: String) -> Self {
        Self {
            hospital_name: "Lagos General Hospital".into(),
            hospital_address: "Victoria Island, Lagos".into(),
            hospital_phone: "+234 123 456 7890".into(),
            hospital_logo: None,
            tagline: "Your Health, Our Priority".into(),
            quick_access_services: (1..=QUICK_ACCESS_LIMIT as i64).collect(),
            admin_password_hash,
        }
    }

    pub fn identity(&self) -> HospitalIdentity {
        HospitalIdentity {
            name: self.hospital_name.clone(),
            address: self.hospital_address.clone(),
            phone: self.hospital_phone.clone(),
            tagline: self.tagline.clone(),
        }
    }

    pub fn apply_identity(&mut self, identity: HospitalIdentity) {
        self.hospital_name = identity.name;
        self.hospital_address = identity.address;
        self.hospital_phone = identity.phone;
        self.tagline = identity.tagline;
    }

    pub fn is_quick_access(&self, service_id: i64) -> bool {
        self.quick_access_services.contains(&service_id)
    }
}
