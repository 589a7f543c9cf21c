//! SQLite schema definition.

/// Complete database schema for the hospital POS.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Service Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS services (
    id INTEGER PRIMARY KEY,                      -- timestamp-derived, or 1..8 for defaults
    name TEXT NOT NULL,
    price REAL NOT NULL CHECK (price >= 0),
    category TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_services_name ON services(name);
CREATE INDEX IF NOT EXISTS idx_services_category ON services(category);

-- ============================================================================
-- Transactions (saved bills are mutable, completed ones are not)
-- ============================================================================

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_number TEXT NOT NULL,
    patient_name TEXT NOT NULL DEFAULT '',
    patient_id TEXT NOT NULL DEFAULT '',
    patient_phone TEXT NOT NULL DEFAULT '',
    line_items TEXT NOT NULL DEFAULT '[]',       -- JSON array of LineItem
    subtotal REAL NOT NULL,
    discount REAL NOT NULL CHECK (discount >= 0 AND discount <= 100),
    discount_amount REAL NOT NULL,
    total REAL NOT NULL,
    date TEXT NOT NULL,                          -- RFC 3339
    timestamp INTEGER NOT NULL,                  -- milliseconds since epoch
    status TEXT NOT NULL CHECK (status IN ('saved', 'completed'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_patient_id ON transactions(patient_id);
CREATE INDEX IF NOT EXISTS idx_transactions_patient_name ON transactions(patient_name);

-- Completed receipts cannot change
CREATE TRIGGER IF NOT EXISTS transactions_completed_immutable
BEFORE UPDATE ON transactions
WHEN old.status = 'completed'
BEGIN
    SELECT RAISE(ABORT, 'Completed transactions are immutable');
END;

-- ============================================================================
-- Configuration (single key 'systemConfig')
-- ============================================================================

CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                         -- JSON object
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Users
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    profile_image TEXT,
    created_at TEXT NOT NULL
);
"#;
