//! Transaction database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Transaction, TransactionStatus, WALK_IN_PATIENT};
use crate::repository::TransactionRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT id, invoice_number, patient_name, patient_id, patient_phone, line_items,
           subtotal, discount, discount_amount, total, date, timestamp, status
    FROM transactions
"#;

impl TransactionRepository for Database {
    fn insert_transaction(&mut self, transaction: &Transaction) -> DbResult<i64> {
        let line_items_json = serde_json::to_string(&transaction.items)?;

        self.conn.execute(
            r#"
            INSERT INTO transactions (
                invoice_number, patient_name, patient_id, patient_phone, line_items,
                subtotal, discount, discount_amount, total, date, timestamp, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                transaction.invoice_number,
                transaction.patient.name,
                transaction.patient.id,
                transaction.patient.phone,
                line_items_json,
                transaction.subtotal,
                transaction.discount,
                transaction.discount_amount,
                transaction.total,
                transaction.date,
                transaction.timestamp,
                transaction.status.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_transaction(&mut self, transaction: &Transaction) -> DbResult<bool> {
        let Some(id) = transaction.id else {
            return Ok(false);
        };
        let line_items_json = serde_json::to_string(&transaction.items)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE transactions SET
                invoice_number = ?2,
                patient_name = ?3,
                patient_id = ?4,
                patient_phone = ?5,
                line_items = ?6,
                subtotal = ?7,
                discount = ?8,
                discount_amount = ?9,
                total = ?10,
                date = ?11,
                timestamp = ?12,
                status = ?13
            WHERE id = ?1 AND status = 'saved'
            "#,
            params![
                id,
                transaction.invoice_number,
                transaction.patient.name,
                transaction.patient.id,
                transaction.patient.phone,
                line_items_json,
                transaction.subtotal,
                transaction.discount,
                transaction.discount_amount,
                transaction.total,
                transaction.date,
                transaction.timestamp,
                transaction.status.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn get_transaction(&self, id: i64) -> DbResult<Option<Transaction>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], TransactionRow::from_row)
            .optional()?;

        row.map(|row| row.try_into()).transpose()
    }

    fn list_transactions(&self, patient_filter: Option<&str>) -> DbResult<Vec<Transaction>> {
        let pattern = patient_filter.map(|f| format!("%{}%", escape_like(f)));
        let sql = format!(
            r#"{}
            WHERE ?1 IS NULL
               OR (CASE WHEN trim(patient_name) = '' THEN ?2 ELSE trim(patient_name) END)
                  LIKE ?1 ESCAPE '\'
               OR patient_id LIKE ?1 ESCAPE '\'
            ORDER BY timestamp DESC, id DESC
            "#,
            SELECT_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern, WALK_IN_PATIENT], TransactionRow::from_row)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row?.try_into()?);
        }
        Ok(transactions)
    }

    fn clear_transactions(&mut self) -> DbResult<usize> {
        Ok(self.conn.execute("DELETE FROM transactions", [])?)
    }
}

/// Intermediate row struct for database mapping.
struct TransactionRow {
    id: i64,
    invoice_number: String,
    patient_name: String,
    patient_id: String,
    patient_phone: String,
    line_items: String,
    subtotal: f64,
    discount: f64,
    discount_amount: f64,
    total: f64,
    date: String,
    timestamp: i64,
    status: String,
}

impl TransactionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            invoice_number: row.get(1)?,
            patient_name: row.get(2)?,
            patient_id: row.get(3)?,
            patient_phone: row.get(4)?,
            line_items: row.get(5)?,
            subtotal: row.get(6)?,
            discount: row.get(7)?,
            discount_amount: row.get(8)?,
            total: row.get(9)?,
            date: row.get(10)?,
            timestamp: row.get(11)?,
            status: row.get(12)?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let status = TransactionStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown status: {}", row.status)))?;

        Ok(Transaction {
            id: Some(row.id),
            invoice_number: row.invoice_number,
            patient: crate::models::PatientInfo {
                name: row.patient_name,
                id: row.patient_id,
                phone: row.patient_phone,
            },
            items: serde_json::from_str(&row.line_items)?,
            subtotal: row.subtotal,
            discount: row.discount,
            discount_amount: row.discount_amount,
            total: row.total,
            date: row.date,
            timestamp: row.timestamp,
            status,
        })
    }
}

/// Escape LIKE wildcards so the filter is a plain substring match.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_services, LineItem, LineItemId, PatientInfo};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_transaction(name: &str, patient_id: &str, timestamp: i64) -> Transaction {
        let services = default_services();
        let mut consult = LineItem::from_service(&services[0]);
        consult.quantity = 2;
        let custom = LineItem::custom("Wound dressing".into(), 750.0, "Procedure".into());

        let mut tx = Transaction::snapshot(
            PatientInfo {
                name: name.into(),
                id: patient_id.into(),
                phone: "0803".into(),
            },
            vec![consult, custom],
            10.0,
            TransactionStatus::Saved,
        );
        tx.timestamp = timestamp;
        tx
    }

    #[test]
    fn test_insert_and_get() {
        let mut db = setup_db();
        let tx = make_transaction("Ada Obi", "PT-1", 1);

        let id = db.insert_transaction(&tx).unwrap();
        let stored = db.get_transaction(id).unwrap().unwrap();

        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.patient.name, "Ada Obi");
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[0].id, LineItemId::Service(1));
        assert_eq!(stored.items[0].quantity, 2);
        assert!(stored.items[1].is_custom());
        assert_eq!(stored.subtotal, 10750.0);
        assert_eq!(stored.total, tx.total);
        assert_eq!(stored.status, TransactionStatus::Saved);
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_transaction(404).unwrap().is_none());
    }

    #[test]
    fn test_update_saved() {
        let mut db = setup_db();
        let mut tx = make_transaction("Ada Obi", "PT-1", 1);

        let id = db.insert_transaction(&tx).unwrap();
        tx.id = Some(id);
        tx.discount = 50.0;
        assert!(db.update_transaction(&tx).unwrap());

        assert_eq!(db.get_transaction(id).unwrap().unwrap().discount, 50.0);
        assert_eq!(db.list_transactions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_update_completed_is_noop() {
        let mut db = setup_db();
        let mut tx = make_transaction("Ada Obi", "PT-1", 1);
        tx.status = TransactionStatus::Completed;

        let id = db.insert_transaction(&tx).unwrap();
        tx.id = Some(id);
        tx.discount = 50.0;
        assert!(!db.update_transaction(&tx).unwrap());
        assert_eq!(db.get_transaction(id).unwrap().unwrap().discount, 10.0);
    }

    #[test]
    fn test_update_without_id() {
        let mut db = setup_db();
        let tx = make_transaction("Ada Obi", "PT-1", 1);
        assert!(!db.update_transaction(&tx).unwrap());
    }

    #[test]
    fn test_list_most_recent_first() {
        let mut db = setup_db();
        db.insert_transaction(&make_transaction("First", "PT-1", 100)).unwrap();
        db.insert_transaction(&make_transaction("Second", "PT-2", 300)).unwrap();
        db.insert_transaction(&make_transaction("Third", "PT-3", 200)).unwrap();

        let names: Vec<String> = db
            .list_transactions(None)
            .unwrap()
            .into_iter()
            .map(|t| t.patient.name)
            .collect();
        assert_eq!(names, vec!["Second", "Third", "First"]);
    }

    #[test]
    fn test_list_filter() {
        let mut db = setup_db();
        db.insert_transaction(&make_transaction("Ada Obi", "PT-100", 1)).unwrap();
        db.insert_transaction(&make_transaction("Chidi Okafor", "PT-200", 2)).unwrap();
        db.insert_transaction(&make_transaction("", "", 3)).unwrap();

        let by_name = db.list_transactions(Some("obi")).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].patient.name, "Ada Obi");

        let by_id = db.list_transactions(Some("pt-2")).unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].patient.id, "PT-200");

        let walk_in = db.list_transactions(Some("walk-in")).unwrap();
        assert_eq!(walk_in.len(), 1);
        assert_eq!(walk_in[0].patient.name, "");

        // Wildcards are literal
        assert!(db.list_transactions(Some("%")).unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut db = setup_db();
        db.insert_transaction(&make_transaction("Ada", "1", 1)).unwrap();
        db.insert_transaction(&make_transaction("Bola", "2", 2)).unwrap();

        assert_eq!(db.clear_transactions().unwrap(), 2);
        assert!(db.list_transactions(None).unwrap().is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
