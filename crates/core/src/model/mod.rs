//! Core data model for company records and their comparison.
//!
//! This module defines:
//! - The closed field vocabulary (`KnownField`) and its passthrough wrapper (`FieldName`).
//! - Normalized scalar values (`FieldValue`).
//! - Per-source records (`SourceRecord`) and the system-of-record row (`CompanyRecord`).
//! - Comparison output (`ComparisonEntry`, `ComparisonSummary`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Value type expected for a known field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Date => write!(f, "date"),
        }
    }
}

/// Fields the system-of-record has a column for.
///
/// Declaration order is schema order: it drives column layout and the order
/// of database-side entries in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnownField {
    CompanyName,
    Industry,
    Location,
    Ceo,
    Founded,
    NumberOfEmployees,
    Revenue,
    DebtInMillions,
    NetIncomeMargin,
}

impl KnownField {
    pub const ALL: [KnownField; 9] = [
        KnownField::CompanyName,
        KnownField::Industry,
        KnownField::Location,
        KnownField::Ceo,
        KnownField::Founded,
        KnownField::NumberOfEmployees,
        KnownField::Revenue,
        KnownField::DebtInMillions,
        KnownField::NetIncomeMargin,
    ];

    /// Canonical, human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            KnownField::CompanyName => "Company Name",
            KnownField::Industry => "Industry",
            KnownField::Location => "Location",
            KnownField::Ceo => "CEO",
            KnownField::Founded => "Founded",
            KnownField::NumberOfEmployees => "Number of Employees",
            KnownField::Revenue => "Revenue",
            KnownField::DebtInMillions => "Debt (in millions)",
            KnownField::NetIncomeMargin => "Net Income Margin (%)",
        }
    }

    /// Column name in the `companies` table.
    pub fn column(self) -> &'static str {
        match self {
            KnownField::CompanyName => "company_name",
            KnownField::Industry => "industry",
            KnownField::Location => "location",
            KnownField::Ceo => "ceo",
            KnownField::Founded => "founded",
            KnownField::NumberOfEmployees => "number_of_employees",
            KnownField::Revenue => "revenue",
            KnownField::DebtInMillions => "debt_in_millions",
            KnownField::NetIncomeMargin => "net_income_margin",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            KnownField::CompanyName
            | KnownField::Industry
            | KnownField::Location
            | KnownField::Ceo => FieldKind::Text,
            KnownField::Founded => FieldKind::Date,
            KnownField::NumberOfEmployees
            | KnownField::Revenue
            | KnownField::DebtInMillions
            | KnownField::NetIncomeMargin => FieldKind::Number,
        }
    }

    /// Alternate spellings, already in canonical-key form (lowercase, single spaces).
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            KnownField::CompanyName => &["company", "company name", "name", "companyname"],
            KnownField::Industry => &["sector"],
            KnownField::Location => &["headquarters", "hq", "city"],
            KnownField::Ceo => &["ceo name", "chief executive officer", "chief executive"],
            KnownField::Founded => &["founded date", "founding date", "date founded", "founded on"],
            KnownField::NumberOfEmployees => {
                &["employees", "employee count", "headcount", "num employees"]
            }
            KnownField::Revenue => &["revenues", "total revenue", "annual revenue"],
            KnownField::DebtInMillions => &["debt", "debt in millions", "total debt"],
            KnownField::NetIncomeMargin => &[
                "net income margin",
                "net income margin %",
                "net income margin (percent)",
                "net margin",
            ],
        }
    }

    /// The identity field is the record key and cannot be re-pointed by an update.
    pub fn is_identity(self) -> bool {
        matches!(self, KnownField::CompanyName)
    }

    /// Look up a known field by canonical key (see `normalize::canonical_key`).
    pub fn from_key(key: &str) -> Option<Self> {
        KnownField::ALL
            .into_iter()
            .find(|field| field.label().to_lowercase() == key || field.aliases().contains(&key))
    }
}

impl fmt::Display for KnownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A canonical field identifier: either part of the known vocabulary or an
/// unknown key passed through in canonical-key form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    Known(KnownField),
    Other(String),
}

impl FieldName {
    pub fn as_str(&self) -> &str {
        match self {
            FieldName::Known(field) => field.label(),
            FieldName::Other(key) => key,
        }
    }

    pub fn known(&self) -> Option<KnownField> {
        match self {
            FieldName::Known(field) => Some(*field),
            FieldName::Other(_) => None,
        }
    }
}

impl From<KnownField> for FieldName {
    fn from(field: KnownField) -> Self {
        FieldName::Known(field)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A normalized scalar value.
///
/// Equality is structural: numbers compare by decimal value (`5.0 == 5.00`),
/// dates by calendar day, text exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Date(_) => FieldKind::Date,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Canonical text form, used for persistence. Feeding it back through the
    /// normalizer yields an equal value.
    pub fn to_storage_string(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Number(number) => number.normalize().to_string(),
            FieldValue::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_string())
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<Decimal> for FieldValue {
    fn from(number: Decimal) -> Self {
        FieldValue::Number(number)
    }
}

impl From<i64> for FieldValue {
    fn from(number: i64) -> Self {
        FieldValue::Number(Decimal::from(number))
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(date: NaiveDate) -> Self {
        FieldValue::Date(date)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Number(number) => {
                let number = number.normalize();
                if number.fract().is_zero() {
                    if let Some(int) = number.to_i64() {
                        return serializer.serialize_i64(int);
                    }
                }
                match number.to_f64() {
                    Some(float) => serializer.serialize_f64(float),
                    None => serializer.serialize_str(&number.to_string()),
                }
            }
            FieldValue::Date(date) => {
                serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
            }
        }
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Pdf,
    Database,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Pdf => "pdf",
            Source::Database => "database",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(Source::Pdf),
            "database" | "db" => Ok(Source::Database),
            other => Err(format!("Invalid source '{other}'. Allowed: pdf, database")),
        }
    }
}

/// Normalized field map tagged with its provenance.
///
/// Field names are unique and keep their input order. There is no mutating
/// API: a record is fixed once its source produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    source: Source,
    fields: Vec<(FieldName, FieldValue)>,
}

impl SourceRecord {
    /// Callers guarantee `fields` has no duplicate names.
    pub(crate) fn from_fields(source: Source, fields: Vec<(FieldName, FieldValue)>) -> Self {
        Self { source, fields }
    }

    pub fn empty(source: Source) -> Self {
        Self { source, fields: Vec::new() }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn get(&self, name: &FieldName) -> Option<&FieldValue> {
        self.fields.iter().find(|(field, _)| field == name).map(|(_, value)| value)
    }

    pub fn get_known(&self, field: KnownField) -> Option<&FieldValue> {
        self.get(&FieldName::Known(field))
    }

    pub fn contains(&self, name: &FieldName) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (field, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `Company Name` value, if present.
    pub fn company_name(&self) -> Option<&str> {
        self.get_known(KnownField::CompanyName).and_then(FieldValue::as_text)
    }

    /// Raw (pre-normalization) form keyed by field label, values in storage form.
    pub fn to_raw_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(field, value)| {
                (field.as_str().to_string(), serde_json::Value::String(value.to_storage_string()))
            })
            .collect()
    }
}

impl Serialize for SourceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Collapse whitespace and lowercase a company name into its lookup key.
pub fn identity_key(company_name: &str) -> String {
    company_name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// System-of-record row for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    company_name: String,
    values: BTreeMap<KnownField, FieldValue>,
}

impl CompanyRecord {
    pub fn new(company_name: impl Into<String>) -> Self {
        let company_name = company_name.into().trim().to_string();
        let mut values = BTreeMap::new();
        values.insert(KnownField::CompanyName, FieldValue::Text(company_name.clone()));
        Self { company_name, values }
    }

    /// Builder-style helper, mainly for tests and imports.
    pub fn with_value(mut self, field: KnownField, value: impl Into<FieldValue>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn identity_key(&self) -> String {
        identity_key(&self.company_name)
    }

    pub fn get(&self, field: KnownField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Values in schema order.
    pub fn values(&self) -> impl Iterator<Item = (KnownField, &FieldValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Set or clear a value. The identity field is never cleared.
    pub(crate) fn set(&mut self, field: KnownField, value: Option<FieldValue>) {
        match value {
            Some(value) => {
                if field.is_identity() {
                    self.company_name = value.to_storage_string();
                }
                self.values.insert(field, value);
            }
            None if field.is_identity() => {}
            None => {
                self.values.remove(&field);
            }
        }
    }

    /// Database-side view of this record for comparison.
    pub fn to_source_record(&self) -> SourceRecord {
        let fields = self
            .values
            .iter()
            .map(|(field, value)| (FieldName::Known(*field), value.clone()))
            .collect();
        SourceRecord::from_fields(Source::Database, fields)
    }
}

impl Serialize for CompanyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_source_record().serialize(serializer)
    }
}

/// Per-field verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Present on both sides and equal.
    Match,
    /// Present on both sides with different values.
    Mismatch,
    /// Present in the database record only.
    MissingInPdf,
    /// Present in the PDF extraction only.
    MissingInDatabase,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Match => "match",
            EntryStatus::Mismatch => "mismatch",
            EntryStatus::MissingInPdf => "missing_in_pdf",
            EntryStatus::MissingInDatabase => "missing_in_database",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub field: FieldName,
    #[serde(rename = "database")]
    pub database_value: Option<FieldValue>,
    #[serde(rename = "pdf")]
    pub pdf_value: Option<FieldValue>,
    #[serde(rename = "match")]
    pub matched: bool,
    pub status: EntryStatus,
}

/// Tally of entries by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub missing_in_pdf: usize,
    pub missing_in_database: usize,
}

/// Result of comparing one company's database record against a PDF extraction.
/// Built per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub company_name: String,
    pub entries: Vec<ComparisonEntry>,
}

impl ComparisonSummary {
    pub fn entry(&self, field: &FieldName) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|entry| &entry.field == field)
    }

    pub fn known_entry(&self, field: KnownField) -> Option<&ComparisonEntry> {
        self.entry(&FieldName::Known(field))
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &ComparisonEntry> {
        self.entries.iter().filter(|entry| !entry.matched)
    }

    pub fn is_reconciled(&self) -> bool {
        self.entries.iter().all(|entry| entry.matched)
    }

    pub fn counts(&self) -> SummaryCounts {
        let mut counts = SummaryCounts { total: self.entries.len(), ..SummaryCounts::default() };
        for entry in &self.entries {
            match entry.status {
                EntryStatus::Match => counts.matched += 1,
                EntryStatus::Mismatch => counts.mismatched += 1,
                EntryStatus::MissingInPdf => counts.missing_in_pdf += 1,
                EntryStatus::MissingInDatabase => counts.missing_in_database += 1,
            }
        }
        counts
    }
}
