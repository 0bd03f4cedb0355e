use std::path::Path;
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{BudgetError, Result};
use crate::models::{KeywordRule, KeywordType, NewTransaction, Transaction};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS keyword_rules (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    rule_type TEXT NOT NULL,
    phrases TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    amount TEXT NOT NULL,
    description TEXT NOT NULL,
    bank TEXT NOT NULL,
    reference_id TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_dedup
    ON transactions (owner_id, bank, reference_id);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    bank TEXT NOT NULL,
    imported INTEGER NOT NULL,
    duplicates INTEGER NOT NULL,
    excluded INTEGER NOT NULL,
    failed_rows INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Storage seams used by the ingestion and reporting core
// ---------------------------------------------------------------------------

/// Where accepted statement rows end up, and where dedup looks for them.
pub trait TransactionStore {
    fn transaction_exists(&self, owner_id: i64, reference_id: &str, bank: &str) -> Result<bool>;
    fn insert_transaction(&self, txn: &NewTransaction) -> Result<i64>;
    fn transactions_for_owner(&self, owner_id: i64) -> Result<Vec<Transaction>>;
}

/// Read side of the owner's keyword rules.
pub trait RuleStore {
    fn rules_by_type(&self, owner_id: i64, kind: KeywordType) -> Result<Vec<KeywordRule>>;
}

impl TransactionStore for Connection {
    fn transaction_exists(&self, owner_id: i64, reference_id: &str, bank: &str) -> Result<bool> {
        let mut stmt = self.prepare_cached(
            "SELECT 1 FROM transactions WHERE owner_id = ?1 AND reference_id = ?2 AND bank = ?3",
        )?;
        Ok(stmt.exists(rusqlite::params![owner_id, reference_id, bank])?)
    }

    fn insert_transaction(&self, txn: &NewTransaction) -> Result<i64> {
        let mut stmt = self.prepare_cached(
            "INSERT INTO transactions (owner_id, date, amount, description, bank, reference_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        stmt.execute(rusqlite::params![
            txn.owner_id,
            txn.date,
            txn.amount.to_string(),
            txn.description,
            txn.bank,
            txn.reference_id,
        ])?;
        Ok(self.last_insert_rowid())
    }

    fn transactions_for_owner(&self, owner_id: i64) -> Result<Vec<Transaction>> {
        let mut stmt = self.prepare(
            "SELECT id, owner_id, date, amount, description, bank, reference_id \
             FROM transactions WHERE owner_id = ?1 ORDER BY date, id",
        )?;
        let rows = stmt
            .query_map([owner_id], transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl RuleStore for Connection {
    fn rules_by_type(&self, owner_id: i64, kind: KeywordType) -> Result<Vec<KeywordRule>> {
        let mut stmt = self.prepare(
            "SELECT id, owner_id, category, rule_type, phrases FROM keyword_rules \
             WHERE owner_id = ?1 AND rule_type = ?2 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![owner_id, kind.as_str()], rule_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

pub fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let amount: String = row.get(3)?;
    Ok(Transaction {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        date: row.get(2)?,
        amount: Decimal::from_str(&amount)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        description: row.get(4)?,
        bank: row.get(5)?,
        reference_id: row.get(6)?,
    })
}

pub fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<KeywordRule> {
    let kind: String = row.get(3)?;
    let phrases: String = row.get(4)?;
    Ok(KeywordRule {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        category: row.get(2)?,
        kind: kind
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        phrases: serde_json::from_str(&phrases)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
    })
}

pub fn get_rule(conn: &Connection, id: i64) -> Result<Option<KeywordRule>> {
    let rule = conn
        .query_row(
            "SELECT id, owner_id, category, rule_type, phrases FROM keyword_rules WHERE id = ?1",
            [id],
            rule_from_row,
        )
        .optional()?;
    Ok(rule)
}

/// Only the owner may delete a transaction; anything else is unknown.
pub fn delete_transaction(conn: &Connection, owner_id: i64, id: i64) -> Result<()> {
    let deleted = conn.execute(
        "DELETE FROM transactions WHERE id = ?1 AND owner_id = ?2",
        rusqlite::params![id, owner_id],
    )?;
    if deleted == 0 {
        return Err(BudgetError::UnknownTransaction(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        conn.execute(
            "INSERT INTO owners (username, first_name, last_name) VALUES ('maija', 'Maija', 'Meikäläinen')",
            [],
        )
        .unwrap();
        (dir, conn)
    }

    fn sample_txn(reference_id: &str) -> NewTransaction {
        NewTransaction {
            owner_id: 1,
            date: NaiveDate::from_ymd_opt(2023, 4, 23).unwrap(),
            amount: Decimal::from_str("-12.50").unwrap(),
            description: "k-market kamppi".to_string(),
            bank: "s-pankki".to_string(),
            reference_id: reference_id.to_string(),
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["owners", "keyword_rules", "transactions", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_transaction_roundtrip_keeps_exact_amount() {
        let (_dir, conn) = test_db();
        conn.insert_transaction(&sample_txn("abc123")).unwrap();
        let stored = conn.transactions_for_owner(1).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, Decimal::from_str("-12.50").unwrap());
        assert_eq!(stored[0].date, NaiveDate::from_ymd_opt(2023, 4, 23).unwrap());
    }

    #[test]
    fn test_transaction_exists_is_scoped_by_bank_and_owner() {
        let (_dir, conn) = test_db();
        conn.insert_transaction(&sample_txn("abc123")).unwrap();
        assert!(conn.transaction_exists(1, "abc123", "s-pankki").unwrap());
        assert!(!conn.transaction_exists(1, "abc123", "op-pankki").unwrap());
        assert!(!conn.transaction_exists(2, "abc123", "s-pankki").unwrap());
    }

    #[test]
    fn test_unique_index_rejects_duplicate_key() {
        let (_dir, conn) = test_db();
        conn.insert_transaction(&sample_txn("abc123")).unwrap();
        assert!(conn.insert_transaction(&sample_txn("abc123")).is_err());
    }

    #[test]
    fn test_delete_transaction_checks_owner() {
        let (_dir, conn) = test_db();
        let id = conn.insert_transaction(&sample_txn("abc123")).unwrap();
        assert!(matches!(
            delete_transaction(&conn, 2, id),
            Err(BudgetError::UnknownTransaction(_))
        ));
        delete_transaction(&conn, 1, id).unwrap();
        assert!(conn.transactions_for_owner(1).unwrap().is_empty());
    }

    #[test]
    fn test_rules_by_type_decodes_phrases() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO keyword_rules (owner_id, category, rule_type, phrases) VALUES (1, 'food', 'INCLUDED', ?1)",
            [r#"["k-market","lidl"]"#],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO keyword_rules (owner_id, category, rule_type, phrases) VALUES (1, 'excluded', 'EXCLUDED', ?1)",
            [r#"["oma siirto"]"#],
        )
        .unwrap();
        let included = conn.rules_by_type(1, KeywordType::Included).unwrap();
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].phrases, vec!["k-market", "lidl"]);
        let excluded = conn.rules_by_type(1, KeywordType::Excluded).unwrap();
        assert_eq!(excluded[0].category, "excluded");
    }
}
