//! Hospital identity, logo, quick access and admin password.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{hash_password, mirror, verify_password, PosApp, PosError, PosResult};
use crate::models::{HospitalIdentity, MAX_IMAGE_BYTES, QUICK_ACCESS_LIMIT};
use crate::repository::PosStore;

/// Encode an uploaded image as an inline `data:` URL.
pub fn image_data_url(bytes: &[u8], mime_type: &str) -> PosResult<String> {
    let mime_type = mime_type.trim().to_ascii_lowercase();
    let subtype = mime_type.strip_prefix("image/").unwrap_or("");
    if subtype.is_empty() || subtype.contains(|c: char| c == ';' || c.is_whitespace()) {
        return Err(PosError::InvalidImage(mime_type));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(PosError::ImageTooLarge { size: bytes.len() });
    }
    Ok(format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)))
}

impl<S: PosStore> PosApp<S> {
    /// Replace name, address, phone and tagline in one go.
    pub fn update_hospital_identity(&mut self, identity: HospitalIdentity) -> PosResult<()> {
        if identity.name.trim().is_empty() {
            return Err(PosError::MissingField("hospital name"));
        }
        self.config.apply_identity(identity);
        self.save_config("update hospital identity");
        Ok(())
    }

    pub fn set_logo(&mut self, bytes: &[u8], mime_type: &str) -> PosResult<()> {
        let logo = image_data_url(bytes, mime_type)?;
        self.config.hospital_logo = Some(logo);
        self.save_config("set logo");
        tracing::info!(size = bytes.len(), "Updated hospital logo");
        Ok(())
    }

    pub fn clear_logo(&mut self) {
        self.config.hospital_logo = None;
        self.save_config("clear logo");
    }

    /// Pin or unpin a service. Returns whether it is now pinned.
    pub fn toggle_quick_access(&mut self, service_id: i64) -> PosResult<bool> {
        let pinned = &mut self.config.quick_access_services;
        let now_pinned = match pinned.iter().position(|id| *id == service_id) {
            Some(index) => {
                pinned.remove(index);
                false
            }
            None => {
                if self.catalog.get(service_id).is_none() {
                    return Err(PosError::ServiceNotFound(service_id));
                }
                if pinned.len() >= QUICK_ACCESS_LIMIT {
                    return Err(PosError::QuickAccessLimit {
                        limit: QUICK_ACCESS_LIMIT,
                    });
                }
                pinned.push(service_id);
                true
            }
        };

        self.save_config("toggle quick access");
        tracing::debug!(service_id, now_pinned, "Toggled quick access");
        Ok(now_pinned)
    }

    pub fn verify_admin_password(&self, attempt: &str) -> bool {
        verify_password(attempt, &self.config.admin_password_hash)
    }

    pub fn change_admin_password(&mut self, current: &str, new_password: &str) -> PosResult<()> {
        if !self.verify_admin_password(current) {
            return Err(PosError::IncorrectPassword);
        }
        if new_password.is_empty() {
            return Err(PosError::MissingField("new password"));
        }
        self.config.admin_password_hash = hash_password(new_password)?;
        self.save_config("change admin password");
        tracing::info!("Changed admin password");
        Ok(())
    }

    pub(super) fn save_config(&mut self, operation: &str) {
        let config = &self.config;
        mirror(&mut self.store, operation, |s| s.save_config(config));
    }
}
