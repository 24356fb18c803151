use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::compare::{compare_with, CompareOptions};
use crate::db::RecordStore;
use crate::model::{ComparisonSummary, FieldName, KnownField, Source, SourceRecord};
use crate::normalize::{normalize_field_name, normalize_value};
use crate::services::error::EngineError;

/// A user's decision about one discrepant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub company_name: String,
    /// Field name as the user typed it; normalized before use.
    pub field: String,
    /// Raw value; `null` or blank clears the field.
    pub new_value: Value,
    /// `Pdf` writes `new_value` to the record; `Database` keeps the stored value.
    #[serde(default = "default_source")]
    pub authoritative_source: Source,
}

fn default_source() -> Source {
    Source::Pdf
}

impl ResolveRequest {
    pub fn new(
        company_name: impl Into<String>,
        field: impl Into<String>,
        new_value: impl Into<Value>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            field: field.into(),
            new_value: new_value.into(),
            authoritative_source: Source::Pdf,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.authoritative_source = source;
        self
    }
}

/// Map a user-supplied field name onto a stored column, or reject it.
pub fn resolve_field(raw: &str) -> Result<KnownField, EngineError> {
    match normalize_field_name(raw).known() {
        Some(field) => Ok(field),
        None => {
            warn!(field = raw, "rejected resolution for unknown field");
            Err(EngineError::UnknownField(raw.trim().to_string()))
        }
    }
}

/// Apply one correction and return the re-computed summary against `pdf`.
///
/// The field and the value are validated before the store is touched, so a
/// rejected request leaves no trace. The value goes through the same
/// normalizer as extracted values.
pub fn resolve(
    store: &mut RecordStore,
    request: &ResolveRequest,
    pdf: &SourceRecord,
    options: &CompareOptions,
) -> Result<ComparisonSummary, EngineError> {
    let field = FieldName::Known(resolve_field(&request.field)?);
    let new_value = normalize_value(&field, &request.new_value)?;

    let record = match request.authoritative_source {
        Source::Pdf => store.update(&request.company_name, &field, new_value)?,
        Source::Database => {
            let record = store.find(&request.company_name)?;
            info!(company = record.company_name(), field = %field, "kept database value");
            record
        }
    };

    Ok(compare_with(&record.to_source_record(), pdf, options))
}
