use serde::{Deserialize, Serialize};

use crate::model::SourceRecord;

/// One applied correction, as kept in the resolution log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionRecord {
    /// Identity key of the company the correction applied to.
    pub company_key: String,
    /// Canonical label of the corrected field.
    pub field: String,
    /// Stored form before the correction (`None` if the field was empty).
    pub old_value: Option<String>,
    /// Stored form after the correction (`None` if the field was cleared).
    pub new_value: Option<String>,
    /// RFC 3339 timestamp.
    pub resolved_at: String,
}

/// Latest normalized PDF extraction remembered for a company.
///
/// Resolutions re-compare against this so the caller sees whether the
/// discrepancy is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub company_key: String,
    /// SHA-256 of the source document, when the extraction came from PDF bytes.
    pub document_sha256: Option<String>,
    pub extracted_at: String,
    pub fields: SourceRecord,
}
