//! discrepancy-core
//!
//! Core library for reconciling company data extracted from PDFs against a
//! system-of-record.
//!
//! This crate defines the data model, the field normalizer, the discrepancy
//! comparator, the SQLite-backed record store, and the compare/resolve
//! workflows built on top of them.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI, HTTP server).

pub mod model;
pub mod normalize;
pub mod compare;
pub mod db;
pub mod services;

pub use compare::{compare, compare_with, CompareOptions};
pub use model::{
    ComparisonEntry, ComparisonSummary, CompanyRecord, EntryStatus, FieldName, FieldValue,
    KnownField, Source, SourceRecord,
};
pub use normalize::{normalize, NormalizeError, RawFields};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
