//! Service catalog database operations.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::Service;
use crate::repository::ServiceRepository;

const UPSERT_SERVICE: &str = r#"
    INSERT INTO services (id, name, price, category, updated_at)
    VALUES (?1, ?2, ?3, ?4, datetime('now'))
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        price = excluded.price,
        category = excluded.category,
        updated_at = datetime('now')
"#;

impl ServiceRepository for Database {
    fn list_services(&self) -> DbResult<Vec<Service>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, price, category FROM services ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
                price: row.get(2)?,
                category: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn upsert_service(&mut self, service: &Service) -> DbResult<()> {
        self.conn.execute(
            UPSERT_SERVICE,
            params![service.id, service.name, service.price, service.category],
        )?;
        Ok(())
    }

    fn delete_service(&mut self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM services WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn replace_services(&mut self, services: &[Service]) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM services", [])?;
        {
            let mut stmt = tx.prepare(UPSERT_SERVICE)?;
            for service in services {
                stmt.execute(params![
                    service.id,
                    service.name,
                    service.price,
                    service.category
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_services;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn service(id: i64, name: &str, price: f64) -> Service {
        Service {
            id,
            name: name.into(),
            price,
            category: "Laboratory".into(),
        }
    }

    #[test]
    fn test_upsert_and_list() {
        let mut db = setup_db();

        db.upsert_service(&service(20, "Malaria Test", 2500.0)).unwrap();
        db.upsert_service(&service(10, "Urinalysis", 1800.0)).unwrap();

        let services = db.list_services().unwrap();
        assert_eq!(services.len(), 2);
        // Id order
        assert_eq!(services[0].name, "Urinalysis");
        assert_eq!(services[1].price, 2500.0);
    }

    #[test]
    fn test_upsert_updates() {
        let mut db = setup_db();

        db.upsert_service(&service(1, "Original Name", 100.0)).unwrap();
        db.upsert_service(&service(1, "Updated Name", 150.0)).unwrap();

        let services = db.list_services().unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "Updated Name");
        assert_eq!(services[0].price, 150.0);
    }

    #[test]
    fn test_delete() {
        let mut db = setup_db();

        db.upsert_service(&service(1, "ECG", 3000.0)).unwrap();
        assert!(db.delete_service(1).unwrap());
        assert!(!db.delete_service(1).unwrap());
        assert!(db.list_services().unwrap().is_empty());
    }

    #[test]
    fn test_replace_services() {
        let mut db = setup_db();

        db.upsert_service(&service(99, "Stale", 1.0)).unwrap();
        db.replace_services(&default_services()).unwrap();

        let services = db.list_services().unwrap();
        assert_eq!(services, default_services());
    }
}
