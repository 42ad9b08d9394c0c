use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tally_core::{Money, PartyId, ScopeId};

use crate::{
    DebtEntry, EntryFilter, EntryKind, LedgerError, LedgerResult, LedgerStore, Operation,
};

const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS debt_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scope INTEGER NOT NULL,
    from_party TEXT NOT NULL,
    to_party TEXT NOT NULL,
    amount INTEGER NOT NULL,
    reason TEXT,
    kind TEXT NOT NULL,
    operation_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS debt_idx_pair ON debt_entries(scope, from_party, to_party);
CREATE INDEX IF NOT EXISTS debt_idx_operation ON debt_entries(scope, operation_id);
CREATE INDEX IF NOT EXISTS debt_idx_created ON debt_entries(scope, created_at);
"#;

/// SQLite-backed store, the durable backend for live deployments.
///
/// Opens a fresh connection per call; SQLite's own locking serializes
/// writers against readers, and `busy_timeout` bounds the wait before a
/// contended call fails with [`LedgerError::Storage`] instead of hanging
/// the dispatch loop.
#[derive(Clone, Debug)]
pub struct SqliteLedgerStore {
    path: PathBuf,
}

impl SqliteLedgerStore {
    pub fn open(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let store = Self { path: path.into() };
        store.connect()?.execute_batch(LEDGER_SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> LedgerResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;",
        )?;
        Ok(conn)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn append_operation(&self, entries: &[DebtEntry]) -> LedgerResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for entry in entries {
            tx.execute(
                "INSERT INTO debt_entries (
                    scope, from_party, to_party, amount, reason, kind, operation_id, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.scope.value(),
                    entry.from.as_str(),
                    entry.to.as_str(),
                    entry.amount.minor(),
                    entry.reason,
                    entry.kind.as_str(),
                    entry.operation_id as i64,
                    entry.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn pair_sum(&self, scope: ScopeId, from: &PartyId, to: &PartyId) -> LedgerResult<Money> {
        let conn = self.connect()?;
        let minor: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM debt_entries
             WHERE scope = ?1 AND from_party = ?2 AND to_party = ?3",
            params![scope.value(), from.as_str(), to.as_str()],
            |row| row.get(0),
        )?;
        Ok(Money::from_minor(minor))
    }

    fn entries(&self, filter: &EntryFilter) -> LedgerResult<Vec<DebtEntry>> {
        let conn = self.connect()?;
        let mut sql = String::from(
            "SELECT scope, from_party, to_party, amount, reason, kind, operation_id, created_at
             FROM debt_entries
             WHERE scope = ?1 AND (?2 IS NULL OR created_at >= ?2)",
        );
        sql.push_str(if filter.ascending {
            " ORDER BY created_at ASC, id ASC"
        } else {
            " ORDER BY created_at DESC, id DESC"
        });
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?3");
        }

        let mut params: Vec<Value> = vec![
            Value::Integer(filter.scope.value()),
            filter
                .since
                .map(|since| Value::from(since.to_rfc3339()))
                .unwrap_or(Value::Null),
        ];
        if let Some(limit) = filter.limit {
            params.push(Value::Integer(limit as i64));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row)?);
        }
        Ok(entries)
    }

    fn latest_operation(&self, scope: ScopeId) -> LedgerResult<Operation> {
        let conn = self.connect()?;
        let id: Option<i64> = conn.query_row(
            "SELECT MAX(operation_id) FROM debt_entries WHERE scope = ?1",
            params![scope.value()],
            |row| row.get(0),
        )?;
        let id = id.ok_or(LedgerError::NotFound)?;

        let mut stmt = conn.prepare(
            "SELECT scope, from_party, to_party, amount, reason, kind, operation_id, created_at
             FROM debt_entries
             WHERE scope = ?1 AND operation_id = ?2
             ORDER BY id ASC",
        )?;
        let mut rows = stmt.query(params![scope.value(), id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(row_to_entry(row)?);
        }
        let author = entries
            .first()
            .map(|entry| entry.from.clone())
            .ok_or(LedgerError::NotFound)?;
        Ok(Operation {
            id: id as u64,
            author,
            entries,
        })
    }

    fn delete_operation(&self, scope: ScopeId, operation_id: u64) -> LedgerResult<usize> {
        let conn = self.connect()?;
        let deleted = conn.execute(
            "DELETE FROM debt_entries WHERE scope = ?1 AND operation_id = ?2",
            params![scope.value(), operation_id as i64],
        )?;
        Ok(deleted)
    }

    fn latest_operation_id(&self) -> LedgerResult<Option<u64>> {
        let conn = self.connect()?;
        let id: Option<i64> = conn.query_row(
            "SELECT MAX(operation_id) FROM debt_entries",
            [],
            |row| row.get(0),
        )?;
        Ok(id.map(|value| value as u64))
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> LedgerResult<DebtEntry> {
    let scope: i64 = row.get(0)?;
    let from: String = row.get(1)?;
    let to: String = row.get(2)?;
    let amount: i64 = row.get(3)?;
    let reason: Option<String> = row.get(4)?;
    let kind_str: String = row.get(5)?;
    let operation_id: i64 = row.get(6)?;
    let created_at_str: String = row.get(7)?;

    let kind = EntryKind::from_str(&kind_str).map_err(LedgerError::Serialization)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|err| {
            LedgerError::Serialization(format!("invalid timestamp {created_at_str}: {err}"))
        })?
        .with_timezone(&Utc);

    Ok(DebtEntry {
        scope: ScopeId::new(scope),
        from: PartyId::new(from),
        to: PartyId::new(to),
        amount: Money::from_minor(amount),
        reason,
        kind,
        operation_id: operation_id as u64,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn entry(
        scope: ScopeId,
        from: &str,
        to: &str,
        amount: i64,
        operation_id: u64,
        created_at: DateTime<Utc>,
    ) -> DebtEntry {
        DebtEntry {
            scope,
            from: PartyId::new(from),
            to: PartyId::new(to),
            amount: Money::from_minor(amount),
            reason: Some("обед".to_owned()),
            kind: EntryKind::Debt,
            operation_id,
            created_at,
        }
    }

    #[test]
    fn roundtrips_an_operation() {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("ledger.db")).unwrap();
        let scope = ScopeId::new(7);
        let now = Utc::now();
        store
            .append_operation(&[
                entry(scope, "ivan", "maria", 5025, 1, now),
                entry(scope, "ivan", "oleg", 5025, 1, now),
            ])
            .unwrap();

        let loaded = store.entries(&EntryFilter::for_scope(scope)).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].amount, Money::from_minor(5025));
        assert_eq!(loaded[0].kind, EntryKind::Debt);
        assert_eq!(loaded[0].reason.as_deref(), Some("обед"));
    }

    #[test]
    fn pair_sum_matches_direction_exactly() {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("ledger.db")).unwrap();
        let scope = ScopeId::new(1);
        let now = Utc::now();
        let ivan = PartyId::new("ivan");
        let maria = PartyId::new("maria");
        store
            .append_operation(&[entry(scope, "ivan", "maria", 100, 1, now)])
            .unwrap();
        store
            .append_operation(&[entry(scope, "maria", "ivan", 30, 2, now)])
            .unwrap();

        assert_eq!(
            store.pair_sum(scope, &ivan, &maria).unwrap(),
            Money::from_minor(100)
        );
        assert_eq!(
            store.pair_sum(scope, &maria, &ivan).unwrap(),
            Money::from_minor(30)
        );
        // Other scopes stay invisible.
        let elsewhere = ScopeId::new(2);
        assert_eq!(
            store.pair_sum(elsewhere, &ivan, &maria).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn latest_operation_reports_author_and_entries() {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("ledger.db")).unwrap();
        let scope = ScopeId::new(1);
        let now = Utc::now();
        store
            .append_operation(&[entry(scope, "ivan", "maria", 100, 1, now)])
            .unwrap();
        store
            .append_operation(&[
                entry(scope, "maria", "ivan", 40, 2, now),
                entry(scope, "maria", "oleg", 40, 2, now),
            ])
            .unwrap();

        let operation = store.latest_operation(scope).unwrap();
        assert_eq!(operation.id, 2);
        assert_eq!(operation.author, PartyId::new("maria"));
        assert_eq!(operation.entries.len(), 2);

        assert!(matches!(
            store.latest_operation(ScopeId::new(99)),
            Err(LedgerError::NotFound)
        ));
    }

    #[test]
    fn delete_operation_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("ledger.db")).unwrap();
        let scope = ScopeId::new(1);
        let now = Utc::now();
        store
            .append_operation(&[
                entry(scope, "ivan", "maria", 100, 1, now),
                entry(scope, "ivan", "oleg", 100, 1, now),
            ])
            .unwrap();

        assert_eq!(store.delete_operation(scope, 1).unwrap(), 2);
        assert_eq!(store.delete_operation(scope, 1).unwrap(), 0);
        assert!(store.entries(&EntryFilter::for_scope(scope)).unwrap().is_empty());
    }

    #[test]
    fn since_filter_windows_and_orders_newest_first() {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("ledger.db")).unwrap();
        let scope = ScopeId::new(1);
        let now = Utc::now();
        store
            .append_operation(&[entry(scope, "ivan", "maria", 10, 1, now - Duration::days(3))])
            .unwrap();
        store
            .append_operation(&[entry(scope, "ivan", "maria", 20, 2, now - Duration::hours(1))])
            .unwrap();
        store
            .append_operation(&[entry(scope, "ivan", "maria", 30, 3, now)])
            .unwrap();

        let filter = EntryFilter::for_scope(scope).with_since(now - Duration::days(1));
        let recent = store.entries(&filter).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount, Money::from_minor(30));
        assert_eq!(recent[1].amount, Money::from_minor(20));
    }

    #[test]
    fn latest_operation_id_spans_scopes() {
        let dir = tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("ledger.db")).unwrap();
        assert_eq!(store.latest_operation_id().unwrap(), None);

        let now = Utc::now();
        store
            .append_operation(&[entry(ScopeId::new(1), "ivan", "maria", 10, 4, now)])
            .unwrap();
        store
            .append_operation(&[entry(ScopeId::new(2), "oleg", "maria", 10, 9, now)])
            .unwrap();
        assert_eq!(store.latest_operation_id().unwrap(), Some(9));
    }
}
