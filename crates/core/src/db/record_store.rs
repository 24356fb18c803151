use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{ExtractionRecord, ResolutionRecord};
use crate::model::{
    identity_key, CompanyRecord, FieldName, FieldValue, KnownField, Source, SourceRecord,
};
use crate::normalize::{normalize, normalize_value, NormalizeError, RawFields};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// More than one row shares an identity key; lookups for it cannot be answered.
    #[error("Store integrity error: {count} records share the company key '{key}'")]
    StoreIntegrity { key: String, count: usize },

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Company '{0}' already exists")]
    DuplicateCompany(String),

    #[error("Cannot change company identity from '{from}' to '{to}'")]
    IdentityChange { from: String, to: String },

    /// A stored value no longer passes normalization.
    #[error("Stored value is invalid: {0}")]
    InvalidStoredValue(#[from] NormalizeError),

    #[error("Stored extraction is not valid JSON: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed system-of-record.
///
/// This is the only component that mutates persisted state. It is
/// responsible for:
/// - Opening/creating the DB file and applying schema migrations.
/// - Case-insensitive, exact-name lookups keyed by `identity_key`.
/// - Whole-record, write-through updates with an audit trail.
///
/// Writes take `&mut self` and run inside an IMMEDIATE transaction, so a
/// read-modify-write never interleaves with another writer.
#[derive(Debug)]
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) a record store at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        Self::from_connection(conn)
    }

    /// In-memory store; each instance is isolated.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "synchronous", "FULL")?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Look up a company by name, ignoring case and surrounding/repeated whitespace.
    pub fn find(&self, company_name: &str) -> StoreResult<CompanyRecord> {
        single_row(&self.conn, company_name).map(|(_, record)| record)
    }

    /// Whether a company with this identity exists (duplicates count as existing).
    pub fn exists(&self, company_name: &str) -> StoreResult<bool> {
        Ok(count_key(&self.conn, &identity_key(company_name))? > 0)
    }

    /// List every stored company (ordered by id).
    pub fn list(&self) -> StoreResult<Vec<CompanyRecord>> {
        let sql = format!("SELECT id, {} FROM companies ORDER BY id", column_list());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_columns)?;

        let mut out = Vec::new();
        for row in rows {
            let (_, columns) = row?;
            out.push(record_from_columns(columns)?);
        }
        Ok(out)
    }

    /// Insert a new company and return its row id.
    pub fn insert(&mut self, record: &CompanyRecord) -> StoreResult<i64> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = insert_row(&tx, record)?;
        tx.commit()?;
        info!(company = record.company_name(), "inserted company");
        Ok(id)
    }

    /// Insert many companies atomically: either all land or none do.
    pub fn insert_all(&mut self, records: &[CompanyRecord]) -> StoreResult<usize> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for record in records {
            insert_row(&tx, record)?;
        }
        tx.commit()?;
        info!(count = records.len(), "inserted companies");
        Ok(records.len())
    }

    /// Overwrite one field of a company's record and return the updated record.
    ///
    /// `None` clears the field. The record is replaced as a whole inside a
    /// transaction and the change is appended to the resolution log before
    /// commit; an interrupted write leaves the prior record intact.
    pub fn update(
        &mut self,
        company_name: &str,
        field: &FieldName,
        new_value: Option<FieldValue>,
    ) -> StoreResult<CompanyRecord> {
        let known = field.known().ok_or_else(|| StoreError::UnknownField(field.to_string()))?;

        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (id, current) = single_row(&tx, company_name)?;

        if known.is_identity() {
            let proposed =
                new_value.as_ref().map(FieldValue::to_storage_string).unwrap_or_default();
            if identity_key(&proposed) != current.identity_key() {
                warn!(
                    company = current.company_name(),
                    proposed = %proposed,
                    "rejected identity change"
                );
                return Err(StoreError::IdentityChange {
                    from: current.company_name().to_string(),
                    to: proposed,
                });
            }
        }

        let old_value = current.get(known).map(FieldValue::to_storage_string);
        let mut updated = current.clone();
        updated.set(known, new_value);

        let assignments = KnownField::ALL
            .iter()
            .enumerate()
            .map(|(idx, field)| format!("{} = ?{}", field.column(), idx + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE companies SET company_key = ?1, {assignments} WHERE id = ?{}",
            KnownField::ALL.len() + 2
        );
        let mut values = vec![SqlValue::Text(updated.identity_key())];
        values.extend(storage_values(&updated));
        values.push(SqlValue::Integer(id));
        tx.execute(&sql, params_from_iter(values))?;

        tx.execute(
            r#"
            INSERT INTO resolutions (company_key, field, old_value, new_value, resolved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                updated.identity_key(),
                known.label(),
                old_value,
                updated.get(known).map(FieldValue::to_storage_string),
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        info!(company = updated.company_name(), field = known.label(), "updated record");
        Ok(updated)
    }

    /// Resolution log for one company (oldest first).
    pub fn resolution_history(&self, company_name: &str) -> StoreResult<Vec<ResolutionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT company_key, field, old_value, new_value, resolved_at
            FROM resolutions
            WHERE company_key = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![identity_key(company_name)], |row| {
            Ok(ResolutionRecord {
                company_key: row.get(0)?,
                field: row.get(1)?,
                old_value: row.get(2)?,
                new_value: row.get(3)?,
                resolved_at: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Remember the latest normalized PDF extraction for a company.
    pub fn save_extraction(
        &self,
        company_name: &str,
        document_sha256: Option<&str>,
        fields: &SourceRecord,
    ) -> StoreResult<()> {
        let fields_json = serde_json::to_string(&fields.to_raw_fields())?;
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO extractions
                (company_key, document_sha256, fields_json, extracted_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                identity_key(company_name),
                document_sha256,
                fields_json,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Latest stored extraction for a company, if any.
    pub fn latest_extraction(&self, company_name: &str) -> StoreResult<Option<ExtractionRecord>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT company_key, document_sha256, fields_json, extracted_at
                FROM extractions
                WHERE company_key = ?1
                "#,
                params![identity_key(company_name)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((company_key, document_sha256, fields_json, extracted_at)) = row else {
            return Ok(None);
        };
        let raw: RawFields = serde_json::from_str(&fields_json)?;
        let fields = normalize(&raw, Source::Pdf)?;
        Ok(Some(ExtractionRecord { company_key, document_sha256, extracted_at, fields }))
    }
}

fn column_list() -> String {
    KnownField::ALL.iter().map(|field| field.column()).collect::<Vec<_>>().join(", ")
}

type RawRow = (i64, Vec<Option<String>>);

fn read_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    let id: i64 = row.get(0)?;
    let mut columns = Vec::with_capacity(KnownField::ALL.len());
    for idx in 0..KnownField::ALL.len() {
        columns.push(row.get::<_, Option<String>>(idx + 1)?);
    }
    Ok((id, columns))
}

/// Rebuild a record from stored text, through the same normalizer used for ingestion.
fn record_from_columns(columns: Vec<Option<String>>) -> StoreResult<CompanyRecord> {
    let mut record: Option<CompanyRecord> = None;
    let mut values = Vec::new();
    for (field, stored) in KnownField::ALL.into_iter().zip(columns) {
        let Some(stored) = stored else { continue };
        let name = FieldName::Known(field);
        match normalize_value(&name, &Value::String(stored))? {
            Some(FieldValue::Text(company)) if field.is_identity() => {
                record = Some(CompanyRecord::new(company));
            }
            Some(value) => values.push((field, value)),
            None => {}
        }
    }

    let mut record = record.ok_or(NormalizeError::MissingCompanyName)?;
    for (field, value) in values {
        record.set(field, Some(value));
    }
    Ok(record)
}

fn storage_values(record: &CompanyRecord) -> Vec<SqlValue> {
    KnownField::ALL
        .iter()
        .map(|field| match record.get(*field) {
            Some(value) => SqlValue::Text(value.to_storage_string()),
            None => SqlValue::Null,
        })
        .collect()
}

fn count_key(conn: &Connection, key: &str) -> StoreResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM companies WHERE company_key = ?1",
        params![key],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Exactly one row for the name's identity key, or the matching error.
fn single_row(conn: &Connection, company_name: &str) -> StoreResult<(i64, CompanyRecord)> {
    let key = identity_key(company_name);
    let sql =
        format!("SELECT id, {} FROM companies WHERE company_key = ?1 ORDER BY id", column_list());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![key], read_columns)?.collect::<Result<Vec<_>, _>>()?;

    match rows.len() {
        0 => Err(StoreError::CompanyNotFound(company_name.trim().to_string())),
        1 => {
            let mut rows = rows;
            let (id, columns) = rows.remove(0);
            Ok((id, record_from_columns(columns)?))
        }
        count => {
            warn!(key = %key, count, "duplicate company identity");
            Err(StoreError::StoreIntegrity { key, count })
        }
    }
}

fn insert_row(conn: &Connection, record: &CompanyRecord) -> StoreResult<i64> {
    let key = record.identity_key();
    if count_key(conn, &key)? > 0 {
        return Err(StoreError::DuplicateCompany(record.company_name().to_string()));
    }

    let placeholders = (0..KnownField::ALL.len())
        .map(|idx| format!("?{}", idx + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO companies (company_key, {}) VALUES (?1, {placeholders})",
        column_list()
    );
    let mut values = vec![SqlValue::Text(key)];
    values.extend(storage_values(record));
    conn.execute(&sql, params_from_iter(values))?;
    Ok(conn.last_insert_rowid())
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: companies table (one column per known field)
/// - 2: add resolutions log and extractions snapshot tables
fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS companies (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                company_key         TEXT NOT NULL,
                company_name        TEXT NOT NULL,
                industry            TEXT,
                location            TEXT,
                ceo                 TEXT,
                founded             TEXT,
                number_of_employees TEXT,
                revenue             TEXT,
                debt_in_millions    TEXT,
                net_income_margin   TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_companies_key ON companies (company_key);

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS resolutions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                company_key TEXT NOT NULL,
                field       TEXT NOT NULL,
                old_value   TEXT,
                new_value   TEXT,
                resolved_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_resolutions_key ON resolutions (company_key);

            CREATE TABLE IF NOT EXISTS extractions (
                company_key     TEXT PRIMARY KEY,
                document_sha256 TEXT,
                fields_json     TEXT NOT NULL,
                extracted_at    TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> StoreResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retailco() -> CompanyRecord {
        CompanyRecord::new("RetailCo")
            .with_value(KnownField::Location, "Chicago")
            .with_value(KnownField::Revenue, 900_000_i64)
    }

    #[test]
    fn columns_follow_schema_order() {
        assert!(column_list().starts_with("company_name, industry, location"));
        assert!(column_list().ends_with("net_income_margin"));
    }

    #[test]
    fn stored_values_round_trip_through_the_normalizer() {
        let mut store = RecordStore::open_in_memory().unwrap();
        let record = retailco().with_value(
            KnownField::Founded,
            chrono::NaiveDate::from_ymd_opt(1999, 4, 1).unwrap(),
        );
        store.insert(&record).unwrap();
        assert_eq!(store.find("retailco").unwrap(), record);
    }

    #[test]
    fn update_clears_a_field_with_none() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&retailco()).unwrap();
        let updated =
            store.update("RetailCo", &FieldName::Known(KnownField::Location), None).unwrap();
        assert!(updated.get(KnownField::Location).is_none());
        assert!(store.find("RetailCo").unwrap().get(KnownField::Location).is_none());
    }

    #[test]
    fn identity_may_change_case_but_not_key() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.insert(&retailco()).unwrap();
        let name = FieldName::Known(KnownField::CompanyName);

        let updated = store.update("retailco", &name, Some(FieldValue::from("RETAILCO"))).unwrap();
        assert_eq!(updated.company_name(), "RETAILCO");

        let err = store.update("retailco", &name, Some(FieldValue::from("ShopCo"))).unwrap_err();
        assert!(matches!(err, StoreError::IdentityChange { .. }));
        let err = store.update("retailco", &name, None).unwrap_err();
        assert!(matches!(err, StoreError::IdentityChange { .. }));
        assert_eq!(store.find("retailco").unwrap().company_name(), "RETAILCO");
    }
}
