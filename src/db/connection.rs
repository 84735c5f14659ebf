use rusqlite::{Connection, Result};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS donations (
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        donor_name TEXT NOT NULL,
        recipient_name TEXT NOT NULL,
        amount TEXT NOT NULL,
        payment_method TEXT NOT NULL CHECK (payment_method IN ('cash', 'bank_transfer', 'e_wallet', 'other')),
        zakat_type TEXT NOT NULL,
        notes TEXT,
        donor_signature TEXT,
        recipient_signature TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_donations_date ON donations (date);
    CREATE TABLE IF NOT EXISTS donation_beneficiaries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        donation_id TEXT NOT NULL REFERENCES donations (id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK (kind IN ('self', 'family', 'badal', 'other')),
        name TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_beneficiaries_donation ON donation_beneficiaries (donation_id);
";

pub fn establish_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

#[cfg(test)]
pub fn establish_test_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}
