//! Discrepancy comparator.
//!
//! Joins a database-side and a PDF-side `SourceRecord` into one entry per
//! field in the union of both. Database fields come first in database order,
//! then PDF-only fields in PDF order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{
    ComparisonEntry, ComparisonSummary, EntryStatus, FieldValue, KnownField, SourceRecord,
};

/// Comparison policy.
///
/// Numbers match exactly unless a tolerance is configured; a tolerance of
/// `0.01` accepts `|db - pdf| <= 0.01`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    #[serde(default)]
    pub numeric_tolerance: Decimal,
}

impl CompareOptions {
    pub fn with_tolerance(numeric_tolerance: Decimal) -> Self {
        Self { numeric_tolerance: numeric_tolerance.abs() }
    }

    /// Whether two normalized values count as equal under this policy.
    pub fn values_match(&self, database: &FieldValue, pdf: &FieldValue) -> bool {
        match (database, pdf) {
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a == b
                    || a.checked_sub(*b)
                        .map(|delta| delta.abs() <= self.numeric_tolerance.abs())
                        .unwrap_or(false)
            }
            (a, b) => a == b,
        }
    }
}

/// Compare with exact numeric equality.
pub fn compare(database: &SourceRecord, pdf: &SourceRecord) -> ComparisonSummary {
    compare_with(database, pdf, &CompareOptions::default())
}

/// Compare under an explicit policy. Neither input is modified.
pub fn compare_with(
    database: &SourceRecord,
    pdf: &SourceRecord,
    options: &CompareOptions,
) -> ComparisonSummary {
    let mut entries = Vec::with_capacity(database.len() + pdf.len());

    for (field, db_value) in database.iter() {
        let pdf_value = pdf.get(field);
        let status = match pdf_value {
            Some(pdf_value) if options.values_match(db_value, pdf_value) => EntryStatus::Match,
            Some(_) => EntryStatus::Mismatch,
            None => EntryStatus::MissingInPdf,
        };
        entries.push(ComparisonEntry {
            field: field.clone(),
            database_value: Some(db_value.clone()),
            pdf_value: pdf_value.cloned(),
            matched: status == EntryStatus::Match,
            status,
        });
    }

    for (field, pdf_value) in pdf.iter() {
        if database.contains(field) {
            continue;
        }
        entries.push(ComparisonEntry {
            field: field.clone(),
            database_value: None,
            pdf_value: Some(pdf_value.clone()),
            matched: false,
            status: EntryStatus::MissingInDatabase,
        });
    }

    let company_name = database
        .company_name()
        .or_else(|| pdf.company_name())
        .unwrap_or_default()
        .to_string();

    let summary = ComparisonSummary { company_name, entries };
    debug!(
        company = %summary.company_name,
        entries = summary.entries.len(),
        discrepancies = summary.discrepancies().count(),
        "compared records"
    );
    summary
}

/// Convenience for callers that only care about one known field.
pub fn field_matches(summary: &ComparisonSummary, field: KnownField) -> bool {
    summary.known_entry(field).map(|entry| entry.matched).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{FieldName, Source};
    use crate::normalize::{normalize, RawFields};

    fn record(value: serde_json::Value, source: Source) -> SourceRecord {
        let raw: RawFields = serde_json::from_value(value).unwrap();
        normalize(&raw, source).unwrap()
    }

    #[test]
    fn identical_records_match_everywhere() {
        let fields = json!({
            "Company Name": "RetailCo",
            "Location": "Chicago",
            "Revenue": 900000,
            "Founded": "1999-04-01",
            "Extra Field": "x"
        });
        let db = record(fields.clone(), Source::Database);
        let pdf = record(fields, Source::Pdf);
        let summary = compare(&db, &pdf);
        assert_eq!(summary.entries.len(), 5);
        assert!(summary.entries.iter().all(|entry| entry.matched));
        assert!(summary.is_reconciled());
    }

    #[test]
    fn retailco_revenue_discrepancy() {
        let db = record(json!({"Company Name": "RetailCo", "Revenue": 900000}), Source::Database);
        let pdf = record(json!({"Company Name": "RetailCo", "Revenue": "1,000,000"}), Source::Pdf);
        let summary = compare(&db, &pdf);

        assert_eq!(summary.company_name, "RetailCo");
        assert_eq!(summary.entries.len(), 2);
        assert!(summary.entries[0].matched);
        let revenue = &summary.entries[1];
        assert_eq!(revenue.field, FieldName::Known(KnownField::Revenue));
        assert_eq!(revenue.database_value, Some(FieldValue::from(900_000_i64)));
        assert_eq!(revenue.pdf_value, Some(FieldValue::from(1_000_000_i64)));
        assert!(!revenue.matched);
        assert_eq!(revenue.status, EntryStatus::Mismatch);
    }

    #[test]
    fn pdf_only_field_has_no_database_value() {
        let db = record(json!({"Company Name": "RetailCo"}), Source::Database);
        let pdf =
            record(json!({"Company Name": "RetailCo", "Extra Field": "Extra Value"}), Source::Pdf);
        let summary = compare(&db, &pdf);
        let extra = summary.entry(&FieldName::Other("extra field".into())).unwrap();
        assert_eq!(extra.database_value, None);
        assert!(!extra.matched);
        assert_eq!(extra.status, EntryStatus::MissingInDatabase);
    }

    #[test]
    fn database_only_field_is_missing_in_pdf() {
        let db =
            record(json!({"Company Name": "RetailCo", "Location": "Chicago"}), Source::Database);
        let pdf = record(json!({"Company Name": "RetailCo"}), Source::Pdf);
        let summary = compare(&db, &pdf);
        let location = summary.known_entry(KnownField::Location).unwrap();
        assert_eq!(location.pdf_value, None);
        assert_eq!(location.status, EntryStatus::MissingInPdf);
        assert!(!field_matches(&summary, KnownField::Location));
    }

    #[test]
    fn ordering_is_database_first_then_pdf_only_in_pdf_order() {
        let db = record(
            json!({"Company Name": "RetailCo", "Location": "Chicago", "Debt (in millions)": 100}),
            Source::Database,
        );
        let pdf = record(
            json!({
                "Zeta": 1,
                "Debt (in millions)": 110,
                "Company Name": "RetailCo",
                "Alpha": 2
            }),
            Source::Pdf,
        );
        let names: Vec<_> =
            compare(&db, &pdf).entries.iter().map(|entry| entry.field.to_string()).collect();
        assert_eq!(names, vec!["Company Name", "Location", "Debt (in millions)", "zeta", "alpha"]);
    }

    #[test]
    fn numeric_equality_is_exact_by_default() {
        let db = record(json!({"Revenue": "1000000.00"}), Source::Database);
        let pdf = record(json!({"Revenue": "1000000.01"}), Source::Pdf);
        assert!(!compare(&db, &pdf).entries[0].matched);

        let same_value = record(json!({"Revenue": 1000000}), Source::Pdf);
        assert!(compare(&db, &same_value).entries[0].matched);
    }

    #[test]
    fn configured_tolerance_accepts_small_deltas_only() {
        let options = CompareOptions::with_tolerance(Decimal::new(5, 2));
        let db = record(json!({"Revenue": "100.00"}), Source::Database);
        let close = record(json!({"Revenue": "100.05"}), Source::Pdf);
        let far = record(json!({"Revenue": "100.06"}), Source::Pdf);
        assert!(compare_with(&db, &close, &options).entries[0].matched);
        assert!(!compare_with(&db, &far, &options).entries[0].matched);
    }

    #[test]
    fn different_value_kinds_never_match() {
        let options = CompareOptions::default();
        assert!(!options.values_match(&FieldValue::from("5"), &FieldValue::from(5_i64)));
    }

    #[test]
    fn inputs_are_not_modified() {
        let db = record(json!({"Company Name": "A", "Revenue": 1}), Source::Database);
        let pdf = record(json!({"Company Name": "A", "Other": "x"}), Source::Pdf);
        let (db_before, pdf_before) = (db.clone(), pdf.clone());
        let _ = compare(&db, &pdf);
        assert_eq!(db, db_before);
        assert_eq!(pdf, pdf_before);
    }

    #[test]
    fn summary_serializes_with_match_key() {
        let db = record(json!({"Company Name": "RetailCo", "Revenue": 900000}), Source::Database);
        let pdf = record(json!({"Company Name": "RetailCo", "Revenue": "1,000,000"}), Source::Pdf);
        let value = serde_json::to_value(compare(&db, &pdf)).unwrap();
        assert_eq!(
            value["entries"][1],
            json!({
                "field": "Revenue",
                "database": 900000,
                "pdf": 1000000,
                "match": false,
                "status": "mismatch"
            })
        );
    }
}
