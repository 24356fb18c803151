//! Field normalization shared by every path that produces a comparable value.
//!
//! PDF extractions, stored database columns, CSV imports and user corrections
//! all pass through `normalize_value`, so a value stored by a resolution is
//! always comparable to a value extracted later.
//!
//! Unknown field names are passed through (never dropped) in canonical-key
//! form: lowercased, `_`/`-` turned into spaces, whitespace collapsed.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    CompanyRecord, FieldKind, FieldName, FieldValue, KnownField, Source, SourceRecord,
};

/// Raw field map as produced by an extractor or a CSV row. Keeps insertion order.
pub type RawFields = serde_json::Map<String, Value>;

const DATE_FORMATS: &[&str] =
    &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A value could not be coerced to the type its field requires.
    #[error("Field '{field}': cannot interpret '{value}' as {expected}")]
    InvalidValue { field: String, value: String, expected: FieldKind },

    /// Two input keys collapse onto the same canonical field.
    #[error("Fields '{first}' and '{second}' both normalize to '{field}'")]
    DuplicateField { field: String, first: String, second: String },

    /// A field outside the known vocabulary where only known fields are allowed.
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Record has no 'Company Name' value")]
    MissingCompanyName,
}

/// Canonical key form of a raw field name.
pub fn canonical_key(raw: &str) -> String {
    raw.replace(['_', '-'], " ").split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Map a raw field name onto the known vocabulary, or pass it through.
pub fn normalize_field_name(raw: &str) -> FieldName {
    let key = canonical_key(raw);
    match KnownField::from_key(&key) {
        Some(field) => FieldName::Known(field),
        None => FieldName::Other(key),
    }
}

/// Coerce one raw value for `field`.
///
/// Returns `Ok(None)` for null and blank values: the field is absent.
pub fn normalize_value(
    field: &FieldName,
    raw: &Value,
) -> Result<Option<FieldValue>, NormalizeError> {
    if is_blank(raw) {
        return Ok(None);
    }
    let value = match field.known().map(KnownField::kind) {
        Some(FieldKind::Text) => coerce_text(field, raw)?,
        Some(FieldKind::Number) => coerce_number(field, raw)?,
        Some(FieldKind::Date) => coerce_date(field, raw)?,
        None => infer_value(raw),
    };
    Ok(Some(value))
}

/// Normalize a whole raw field map into a `SourceRecord`.
pub fn normalize(raw: &RawFields, source: Source) -> Result<SourceRecord, NormalizeError> {
    let mut seen: HashMap<FieldName, &str> = HashMap::new();
    let mut fields = Vec::with_capacity(raw.len());

    for (raw_name, raw_value) in raw {
        let name = normalize_field_name(raw_name);
        if let Some(first) = seen.insert(name.clone(), raw_name.as_str()) {
            return Err(NormalizeError::DuplicateField {
                field: name.to_string(),
                first: first.to_string(),
                second: raw_name.clone(),
            });
        }
        if name.known().is_none() {
            debug!(field = %name, source = %source, "passing through unknown field");
        }
        if let Some(value) = normalize_value(&name, raw_value)? {
            fields.push((name, value));
        }
    }

    Ok(SourceRecord::from_fields(source, fields))
}

/// Normalize a raw map into a system-of-record row.
///
/// Only known fields are accepted and `Company Name` is required.
pub fn normalize_company(raw: &RawFields) -> Result<CompanyRecord, NormalizeError> {
    let record = normalize(raw, Source::Database)?;
    let company_name = record.company_name().ok_or(NormalizeError::MissingCompanyName)?;

    let mut company = CompanyRecord::new(company_name);
    for (name, value) in record.iter() {
        match name.known() {
            Some(field) => company.set(field, Some(value.clone())),
            None => return Err(NormalizeError::UnknownField(name.to_string())),
        }
    }
    Ok(company)
}

/// Parse a numeric-looking string: sign, currency symbol, thousands
/// separators, fraction, trailing `%`, or accounting parentheses.
pub fn parse_number(text: &str) -> Option<Decimal> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| {
        Regex::new(
            r"^(?P<open>\()?\s*(?P<sign>[+-])?\s*[$€£]?\s*(?P<int>\d{1,3}(?:,\d{3})+|\d+)(?P<frac>\.\d+)?\s*%?\s*(?P<close>\))?$",
        )
        .expect("number pattern is valid")
    });

    let caps = re.captures(text.trim())?;
    let parenthesized = caps.name("open").is_some();
    if parenthesized != caps.name("close").is_some() {
        return None;
    }

    let mut digits = caps["int"].replace(',', "");
    if let Some(frac) = caps.name("frac") {
        digits.push_str(frac.as_str());
    }
    let magnitude = Decimal::from_str(&digits).ok()?;
    let negative = parenthesized ^ (caps.name("sign").map(|m| m.as_str()) == Some("-"));
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a date in one of the accepted layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn invalid(field: &FieldName, raw: &Value, expected: FieldKind) -> NormalizeError {
    let value = match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    NormalizeError::InvalidValue { field: field.to_string(), value, expected }
}

fn coerce_text(field: &FieldName, raw: &Value) -> Result<FieldValue, NormalizeError> {
    match raw {
        Value::String(text) => Ok(FieldValue::Text(text.trim().to_string())),
        Value::Number(number) => Ok(FieldValue::Text(number.to_string())),
        Value::Bool(flag) => Ok(FieldValue::Text(flag.to_string())),
        _ => Err(invalid(field, raw, FieldKind::Text)),
    }
}

fn coerce_number(field: &FieldName, raw: &Value) -> Result<FieldValue, NormalizeError> {
    let number = match raw {
        Value::String(text) => parse_number(text),
        Value::Number(number) => decimal_from_json(number),
        _ => None,
    };
    number.map(FieldValue::Number).ok_or_else(|| invalid(field, raw, FieldKind::Number))
}

/// Dates accept a bare four-digit year, kept at year precision as a number.
fn coerce_date(field: &FieldName, raw: &Value) -> Result<FieldValue, NormalizeError> {
    let value = match raw {
        Value::String(text) => parse_date(text)
            .map(FieldValue::Date)
            .or_else(|| parse_year(text).map(FieldValue::from)),
        Value::Number(number) => {
            number.as_i64().filter(|year| is_year(*year)).map(FieldValue::from)
        }
        _ => None,
    };
    value.ok_or_else(|| invalid(field, raw, FieldKind::Date))
}

fn parse_year(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.len() != 4 || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|year| is_year(*year))
}

fn is_year(year: i64) -> bool {
    (1000..=9999).contains(&year)
}

fn infer_value(raw: &Value) -> FieldValue {
    match raw {
        Value::String(text) => {
            if let Some(number) = parse_number(text) {
                FieldValue::Number(number)
            } else if let Some(date) = parse_date(text) {
                FieldValue::Date(date)
            } else {
                FieldValue::Text(text.trim().to_string())
            }
        }
        Value::Number(number) => decimal_from_json(number)
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::Text(number.to_string())),
        Value::Bool(flag) => FieldValue::Text(flag.to_string()),
        other => FieldValue::Text(other.to_string()),
    }
}

fn decimal_from_json(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(int) = number.as_i64() {
        return Some(Decimal::from(int));
    }
    if let Some(int) = number.as_u64() {
        return Some(Decimal::from(int));
    }
    let text = number.to_string();
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}
