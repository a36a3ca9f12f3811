//! `sqlite` store: durable ledger backed by a single SQLite file.
//!
//! ## Schema (v2)
//!
//! ```text
//! transactions(id TEXT PRIMARY KEY, title TEXT NOT NULL, amount TEXT NOT NULL,
//!              session_id TEXT NOT NULL, created_at TEXT NOT NULL)
//! transactions_session_idx ON transactions(session_id)
//! ```
//!
//! Amounts are stored as decimal text and summed in Rust, so fractional
//! values never pass through floating point. v1 databases (integer amounts)
//! are rebuilt in place on open.
//!
//! There is no session table. Listing order is the implicit `rowid`, which
//! SQLite assigns monotonically on insert.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::LedgerError;
use crate::identity::{self, SessionId};
use crate::ledger::{Entry, EntryId, LedgerStore};

const SCHEMA_VERSION: i64 = 2;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS transactions (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        session_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS transactions_session_idx
        ON transactions (session_id);
";

/// v1 stored `amount INTEGER`. SQLite cannot change a column type, so the
/// table is copied (keeping rowid order) and swapped.
const MIGRATE_V1: &str = "
    ALTER TABLE transactions RENAME TO transactions_v1;
    DROP INDEX IF EXISTS transactions_session_idx;
";

const COPY_V1: &str = "
    INSERT INTO transactions (id, title, amount, session_id, created_at)
        SELECT id, title, CAST(amount AS TEXT), session_id, created_at
        FROM transactions_v1 ORDER BY rowid;
    DROP TABLE transactions_v1;
";

const SELECT_COLUMNS: &str = "SELECT id, title, amount, session_id, created_at FROM transactions";

#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    db_path: PathBuf,
}

/// Raw column values before identifier and amount decoding.
type RawRow = (String, String, String, String, String);

impl SqliteLedgerStore {
    /// Open (and if needed create) the database at `db_path`, applying the
    /// schema on first use.
    pub fn open(db_path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LedgerError::Store(format!("sqlite: cannot create {}: {e}", parent.display()))
            })?;
        }
        let store = Self { db_path: db_path.to_path_buf() };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<(), LedgerError> {
        let mut conn = self.open_conn()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .map_err(|e| LedgerError::Store(format!("sqlite: read schema version: {e}")))?;

        let steps: &[&str] = match version {
            0 => &[CREATE_TABLE],
            1 => &[MIGRATE_V1, CREATE_TABLE, COPY_V1],
            SCHEMA_VERSION => return Ok(()),
            other => {
                return Err(LedgerError::Store(format!(
                    "sqlite: unsupported schema version {other}, expected {SCHEMA_VERSION}"
                )));
            }
        };

        let tx = conn
            .transaction()
            .map_err(|e| LedgerError::Store(format!("sqlite: begin schema upgrade: {e}")))?;
        for step in steps {
            tx.execute_batch(step).map_err(|e| {
                LedgerError::Store(format!("sqlite: upgrade schema from v{version}: {e}"))
            })?;
        }
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| LedgerError::Store(format!("sqlite: set schema version: {e}")))?;
        tx.commit()
            .map_err(|e| LedgerError::Store(format!("sqlite: commit schema upgrade: {e}")))?;

        if version != 0 {
            info!(
                path = %self.db_path.display(),
                from = version,
                to = SCHEMA_VERSION,
                "sqlite schema upgraded"
            );
        }
        Ok(())
    }

    fn open_conn(&self) -> Result<Connection, LedgerError> {
        let conn = Connection::open(&self.db_path).map_err(|e| {
            LedgerError::Store(format!("sqlite: open {}: {e}", self.db_path.display()))
        })?;

        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| LedgerError::Store(format!("sqlite: set busy_timeout: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| LedgerError::Store(format!("sqlite: set journal_mode WAL: {e}")))?;

        Ok(conn)
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn decode_amount(raw: &str) -> Result<Decimal, LedgerError> {
        Decimal::from_str(raw)
            .map_err(|e| LedgerError::Store(format!("sqlite: corrupt amount '{raw}': {e}")))
    }

    fn decode((id, title, amount, session_id, created_at): RawRow) -> Result<Entry, LedgerError> {
        let id = EntryId::parse(&id)
            .map_err(|_| LedgerError::Store(format!("sqlite: corrupt entry id '{id}'")))?;
        let amount = Self::decode_amount(&amount)?;
        let session_id: SessionId = identity::validate(&session_id).map_err(|_| {
            LedgerError::Store(format!("sqlite: corrupt session id on entry {id}"))
        })?;
        Ok(Entry { id, title, amount, session_id, created_at })
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn backend(&self) -> &str {
        "sqlite"
    }

    fn append(&self, entry: &Entry) -> Result<(), LedgerError> {
        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO transactions (id, title, amount, session_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id.to_string(),
                entry.title,
                entry.amount.to_string(),
                entry.session_id.to_string(),
                entry.created_at,
            ],
        )
        .map_err(|e| LedgerError::Store(format!("sqlite: insert entry {}: {e}", entry.id)))?;
        Ok(())
    }

    fn list_by_session(&self, session: &SessionId) -> Result<Vec<Entry>, LedgerError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE session_id = ?1 ORDER BY rowid"))
            .map_err(|e| LedgerError::Store(format!("sqlite: prepare list: {e}")))?;

        let rows = stmt
            .query_map(params![session.to_string()], Self::read_row)
            .map_err(|e| LedgerError::Store(format!("sqlite: query list: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| LedgerError::Store(format!("sqlite: map list row: {e}")))?;
            entries.push(Self::decode(raw)?);
        }
        Ok(entries)
    }

    fn find(&self, id: &EntryId) -> Result<Option<Entry>, LedgerError> {
        let conn = self.open_conn()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                Self::read_row,
            )
            .optional()
            .map_err(|e| LedgerError::Store(format!("sqlite: find entry {id}: {e}")))?;
        raw.map(Self::decode).transpose()
    }

    fn total(&self) -> Result<Decimal, LedgerError> {
        let conn = self.open_conn()?;
        // SQLite's SUM would coerce decimal text to REAL.
        let mut stmt = conn
            .prepare("SELECT amount FROM transactions")
            .map_err(|e| LedgerError::Store(format!("sqlite: prepare sum: {e}")))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| LedgerError::Store(format!("sqlite: query sum: {e}")))?;

        let mut total = Decimal::ZERO;
        for row in rows {
            let raw = row.map_err(|e| LedgerError::Store(format!("sqlite: map sum row: {e}")))?;
            total = total
                .checked_add(Self::decode_amount(&raw)?)
                .ok_or_else(|| LedgerError::Store("sqlite: sum amounts: decimal overflow".into()))?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, SqliteLedgerStore) {
        let temp = TempDir::new().expect("tempdir");
        let store = SqliteLedgerStore::open(&temp.path().join("db").join("app.db"))
            .expect("open sqlite store");
        (temp, store)
    }

    fn entry(session: SessionId, title: &str, amount: i64) -> Entry {
        Entry {
            id: EntryId::new(),
            title: title.to_string(),
            amount: Decimal::from(amount),
            session_id: session,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn open_creates_parent_dir_and_schema() {
        let (temp, store) = make_store();
        assert!(temp.path().join("db").join("app.db").exists());
        assert_eq!(store.total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn reopen_keeps_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db");
        let session = identity::issue();
        let e = entry(session, "Salary", 100);
        SqliteLedgerStore::open(&path).unwrap().append(&e).unwrap();

        let reopened = SqliteLedgerStore::open(&path).unwrap();
        assert_eq!(reopened.find(&e.id).unwrap(), Some(e));
    }

    #[test]
    fn unknown_schema_version_is_refused() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 7;")
            .unwrap();
        let err = SqliteLedgerStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version 7"));
    }

    #[test]
    fn list_is_scoped_and_in_insertion_order() {
        let (_temp, store) = make_store();
        let a = identity::issue();
        let b = identity::issue();
        let first = entry(a, "first", 1);
        let other = entry(b, "other", 5);
        let second = entry(a, "second", -2);
        store.append(&first).unwrap();
        store.append(&other).unwrap();
        store.append(&second).unwrap();

        let listed = store.list_by_session(&a).unwrap();
        assert_eq!(listed, vec![first, second]);
        assert_eq!(store.list_by_session(&b).unwrap(), vec![other]);
        assert!(store.list_by_session(&identity::issue()).unwrap().is_empty());
    }

    #[test]
    fn find_missing_returns_none() {
        let (_temp, store) = make_store();
        assert_eq!(store.find(&EntryId::new()).unwrap(), None);
    }

    #[test]
    fn total_sums_across_sessions() {
        let (_temp, store) = make_store();
        store.append(&entry(identity::issue(), "in", 100)).unwrap();
        store.append(&entry(identity::issue(), "out", -30)).unwrap();
        assert_eq!(store.total().unwrap(), Decimal::from(70));
    }

    #[test]
    fn fractional_amounts_round_trip_exactly() {
        let (_temp, store) = make_store();
        let session = identity::issue();
        let mut coffee = entry(session, "coffee", 0);
        coffee.amount = Decimal::new(-1250, 2);
        let mut refund = entry(session, "refund", 0);
        refund.amount = Decimal::new(1, 1);
        store.append(&coffee).unwrap();
        store.append(&refund).unwrap();

        assert_eq!(store.find(&coffee.id).unwrap().unwrap().amount, Decimal::new(-1250, 2));
        assert_eq!(store.total().unwrap(), Decimal::new(-1240, 2));
    }

    #[test]
    fn v1_database_is_upgraded_in_place() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db");
        let session = identity::issue();
        let first = EntryId::new();
        let second = EntryId::new();
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE transactions (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    amount INTEGER NOT NULL,
                    session_id TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX transactions_session_idx ON transactions (session_id);
                PRAGMA user_version = 1;",
            )
            .unwrap();
            for (id, amount) in [(second, 100), (first, -40)] {
                conn.execute(
                    "INSERT INTO transactions VALUES (?1, 'legacy', ?2, ?3, '2025-01-01T00:00:00.000Z')",
                    params![id.to_string(), amount, session.to_string()],
                )
                .unwrap();
            }
        }

        let store = SqliteLedgerStore::open(&path).unwrap();
        let listed = store.list_by_session(&session).unwrap();
        assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(store.total().unwrap(), Decimal::from(60));

        let version: i64 = store
            .open_conn()
            .unwrap()
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let mut tip = entry(session, "tip", 0);
        tip.amount = Decimal::new(25, 1);
        store.append(&tip).unwrap();
        assert_eq!(store.total().unwrap(), Decimal::new(625, 1));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let (_temp, store) = make_store();
        let e = entry(identity::issue(), "once", 1);
        store.append(&e).unwrap();
        assert!(matches!(store.append(&e), Err(LedgerError::Store(_))));
    }
}
