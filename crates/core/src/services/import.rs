use std::io::Read;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{RecordStore, StoreError};
use crate::model::KnownField;
use crate::normalize::{normalize_company, normalize_field_name, NormalizeError, RawFields};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
    #[error("CSV has no 'Company Name' column")]
    MissingCompanyColumn,
    #[error("Line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: NormalizeError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_blank: usize,
}

/// Load system-of-record rows from CSV.
///
/// Headers must name known fields and include `Company Name`. Every row is
/// normalized before anything is written, and rows are inserted in one
/// transaction: a bad row or a duplicate company imports nothing.
pub fn import_csv<R: Read>(
    store: &mut RecordStore,
    reader: R,
) -> Result<ImportReport, ImportError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();

    let mut columns = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        match normalize_field_name(header).known() {
            Some(field) => columns.push(field),
            None => return Err(ImportError::UnknownColumn(header.to_string())),
        }
    }
    if !columns.contains(&KnownField::CompanyName) {
        return Err(ImportError::MissingCompanyColumn);
    }

    let mut records = Vec::new();
    let mut report = ImportReport::default();
    for row in csv.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            report.skipped_blank += 1;
            continue;
        }
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();

        let mut raw = RawFields::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            raw.insert(header.to_string(), Value::String(cell.to_string()));
        }
        let record =
            normalize_company(&raw).map_err(|source| ImportError::Row { line, source })?;
        debug!(line, company = record.company_name(), "parsed csv row");
        records.push(record);
    }

    report.imported = store.insert_all(&records)?;
    info!(imported = report.imported, skipped = report.skipped_blank, "imported csv");
    Ok(report)
}
