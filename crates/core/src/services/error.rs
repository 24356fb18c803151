use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::normalize::NormalizeError;
use crate::services::extraction::ExtractionError;

/// Every failure the compare and resolve flows can report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("No company name was given and the PDF has no 'Company Name' field")]
    MissingCompanyName,
}

/// Stable, machine-readable classification of an `EngineError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Normalization,
    CompanyNotFound,
    UnknownField,
    IdentityChange,
    DuplicateCompany,
    StoreIntegrity,
    Extraction,
    MissingCompanyName,
    Storage,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Normalization => "normalization_error",
            ErrorKind::CompanyNotFound => "company_not_found",
            ErrorKind::UnknownField => "unknown_field",
            ErrorKind::IdentityChange => "identity_change",
            ErrorKind::DuplicateCompany => "duplicate_company",
            ErrorKind::StoreIntegrity => "store_integrity_error",
            ErrorKind::Extraction => "extraction_error",
            ErrorKind::MissingCompanyName => "missing_company_name",
            ErrorKind::Storage => "storage_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Normalize(err) => normalize_kind(err),
            EngineError::Store(err) => match err {
                StoreError::CompanyNotFound(_) => ErrorKind::CompanyNotFound,
                StoreError::UnknownField(_) => ErrorKind::UnknownField,
                StoreError::IdentityChange { .. } => ErrorKind::IdentityChange,
                StoreError::DuplicateCompany(_) => ErrorKind::DuplicateCompany,
                StoreError::StoreIntegrity { .. } | StoreError::InvalidStoredValue(_) => {
                    ErrorKind::StoreIntegrity
                }
                StoreError::Sql(_)
                | StoreError::UnsupportedSchemaVersion { .. }
                | StoreError::InvalidSnapshot(_) => ErrorKind::Storage,
            },
            EngineError::Extraction(_) => ErrorKind::Extraction,
            EngineError::UnknownField(_) => ErrorKind::UnknownField,
            EngineError::MissingCompanyName => ErrorKind::MissingCompanyName,
        }
    }
}

fn normalize_kind(err: &NormalizeError) -> ErrorKind {
    match err {
        NormalizeError::UnknownField(_) => ErrorKind::UnknownField,
        NormalizeError::MissingCompanyName => ErrorKind::MissingCompanyName,
        NormalizeError::InvalidValue { .. } | NormalizeError::DuplicateField { .. } => {
            ErrorKind::Normalization
        }
    }
}
