//! In-memory service catalog and the catalog screens' operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{mirror, PosApp, PosError, PosResult};
use crate::export::{export_services_csv, parse_services_csv};
use crate::models::{default_services, LineItemId, Service, ServiceDraft};
use crate::repository::PosStore;

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<Service>,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
}

/// Services in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, id: i64) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Blank terms match everything.
    pub fn search(&self, term: &str) -> Vec<&Service> {
        let term = term.trim();
        self.services.iter().filter(|s| s.matches(term)).collect()
    }

    /// Next free id: the current millisecond clock, or one past the largest
    /// id in use if that is later.
    pub fn next_id(&self) -> PosResult<i64> {
        let now = Utc::now().timestamp_millis();
        let max = self.services.iter().map(|s| s.id).max().unwrap_or(0);
        let next = max.checked_add(1).ok_or(PosError::IdsExhausted)?;
        Ok(now.max(next))
    }

    pub fn add(&mut self, draft: ServiceDraft) -> PosResult<Service> {
        if let Some(field) = draft.missing_field() {
            return Err(PosError::MissingField(field));
        }
        let service = draft.into_service(self.next_id()?);
        self.services.push(service.clone());
        Ok(service)
    }

    /// Overwrite name, price and category.
    pub fn edit(&mut self, id: i64, draft: ServiceDraft) -> PosResult<Service> {
        if let Some(field) = draft.missing_field() {
            return Err(PosError::MissingField(field));
        }
        let slot = self
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(PosError::ServiceNotFound(id))?;
        *slot = draft.into_service(id);
        Ok(slot.clone())
    }

    pub fn delete(&mut self, id: i64) -> Option<Service> {
        let index = self.services.iter().position(|s| s.id == id)?;
        Some(self.services.remove(index))
    }

    /// Append drafts under fresh consecutive ids.
    ///
    /// Nothing is added unless every draft gets an id.
    pub fn extend(&mut self, drafts: Vec<ServiceDraft>) -> PosResult<Vec<Service>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let first = self.next_id()?;
        i64::try_from(drafts.len() - 1)
            .ok()
            .and_then(|span| first.checked_add(span))
            .ok_or(PosError::IdsExhausted)?;

        let added: Vec<Service> = drafts
            .into_iter()
            .zip(first..)
            .map(|(draft, id)| draft.into_service(id))
            .collect();
        self.services.extend(added.iter().cloned());
        Ok(added)
    }

    pub fn reset(&mut self) {
        self.services = default_services();
    }

    pub fn to_csv(&self) -> String {
        export_services_csv(&self.services)
    }
}

impl<S: PosStore> PosApp<S> {
    pub fn add_service(&mut self, draft: ServiceDraft) -> PosResult<Service> {
        let service = self.catalog.add(draft)?;
        mirror(&mut self.store, "add service", |s| s.upsert_service(&service));
        tracing::info!(id = service.id, name = %service.name, "Added service");
        Ok(service)
    }

    pub fn edit_service(&mut self, id: i64, draft: ServiceDraft) -> PosResult<Service> {
        let service = self.catalog.edit(id, draft)?;
        mirror(&mut self.store, "edit service", |s| s.upsert_service(&service));
        tracing::info!(id, name = %service.name, "Updated service");
        Ok(service)
    }

    /// Delete a service, drop it from the in-progress bill and unpin it.
    ///
    /// Saved transactions keep their copies of the line.
    pub fn delete_service(&mut self, id: i64) -> PosResult<Service> {
        let service = self.catalog.delete(id).ok_or(PosError::ServiceNotFound(id))?;
        self.bill.remove(&LineItemId::Service(id));
        mirror(&mut self.store, "delete service", |s| s.delete_service(id));
        if self.config.is_quick_access(id) {
            self.config.quick_access_services.retain(|&pinned| pinned != id);
            self.save_config("unpin deleted service");
        }
        tracing::info!(id, name = %service.name, "Deleted service");
        Ok(service)
    }

    /// Replace the catalog with the defaults.
    pub fn reset_services(&mut self) {
        self.catalog.reset();
        let services = self.catalog.services();
        mirror(&mut self.store, "reset services", |s| s.replace_services(services));

        let before = self.config.quick_access_services.len();
        let catalog = &self.catalog;
        self.config
            .quick_access_services
            .retain(|&pinned| catalog.get(pinned).is_some());
        if self.config.quick_access_services.len() != before {
            self.save_config("unpin removed services");
        }
        tracing::info!("Reset services to defaults");
    }

    /// Import services from CSV text.
    ///
    /// A missing name or price column rejects the file and leaves the catalog
    /// untouched.
    pub fn import_services_csv(&mut self, text: &str) -> PosResult<ImportReport> {
        let parsed = parse_services_csv(
            text,
            self.catalog.services().iter().map(|s| s.name.as_str()),
        )?;

        let imported = self.catalog.extend(parsed.drafts)?;
        if !imported.is_empty() {
            let services = self.catalog.services();
            mirror(&mut self.store, "import services", |s| s.replace_services(services));
        }

        tracing::info!(
            imported = imported.len(),
            skipped_invalid = parsed.skipped_invalid,
            skipped_duplicate = parsed.skipped_duplicate,
            "Imported services"
        );

        Ok(ImportReport {
            imported,
            skipped_invalid: parsed.skipped_invalid,
            skipped_duplicate: parsed.skipped_duplicate,
        })
    }

    pub fn export_services_csv(&self) -> String {
        self.catalog.to_csv()
    }

    /// Pinned services in catalog order.
    pub fn quick_access_services(&self) -> Vec<&Service> {
        self.catalog
            .services()
            .iter()
            .filter(|s| self.config.is_quick_access(s.id))
            .take(crate::models::QUICK_ACCESS_LIMIT)
            .collect()
    }
}
