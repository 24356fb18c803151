use tracing::info;

use crate::compare::{compare_with, CompareOptions};
use crate::db::RecordStore;
use crate::model::{ComparisonSummary, Source, SourceRecord};
use crate::normalize::{normalize, RawFields};
use crate::services::error::EngineError;
use crate::services::extraction::{sha256_hex, Extractor};
use crate::services::resolution::{resolve, resolve_field, ResolveRequest};

/// Runs the compare and resolve flows against one record store.
///
/// The store is the only state shared between flows. Each call runs to
/// completion and nothing is retried.
pub struct Reconciler<'a> {
    pub store: &'a mut RecordStore,
    pub extractor: &'a dyn Extractor,
    pub options: CompareOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a mut RecordStore, extractor: &'a dyn Extractor) -> Self {
        Self { store, extractor, options: CompareOptions::default() }
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// Extract fields from a PDF and compare them with the stored record.
    ///
    /// `company_name` falls back to the extracted `Company Name`.
    pub fn compare_pdf(
        &mut self,
        pdf_bytes: &[u8],
        company_name: Option<&str>,
    ) -> Result<ComparisonSummary, EngineError> {
        let raw = self.extractor.extract(pdf_bytes)?;
        info!(extractor = self.extractor.name(), fields = raw.len(), "extracted pdf fields");
        self.compare_fields(&raw, company_name, Some(sha256_hex(pdf_bytes)))
    }

    /// Compare an already-extracted field map with the stored record and
    /// remember it as the company's latest extraction.
    pub fn compare_fields(
        &mut self,
        raw: &RawFields,
        company_name: Option<&str>,
        document_sha256: Option<String>,
    ) -> Result<ComparisonSummary, EngineError> {
        let pdf = normalize(raw, Source::Pdf)?;
        let company_name = match company_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => pdf.company_name().ok_or(EngineError::MissingCompanyName)?.to_string(),
        };

        let record = self.store.find(&company_name)?;
        let summary = compare_with(&record.to_source_record(), &pdf, &self.options);
        self.store.save_extraction(record.company_name(), document_sha256.as_deref(), &pdf)?;

        let counts = summary.counts();
        info!(
            company = record.company_name(),
            matched = counts.matched,
            discrepancies = summary.discrepancies().count(),
            "compared pdf against record"
        );
        Ok(summary)
    }

    /// Apply a correction and compare the result with the latest stored extraction.
    pub fn resolve(&mut self, request: &ResolveRequest) -> Result<ComparisonSummary, EngineError> {
        resolve_field(&request.field)?;
        let pdf = match self.store.latest_extraction(&request.company_name)? {
            Some(extraction) => extraction.fields,
            None => SourceRecord::empty(Source::Pdf),
        };
        resolve(self.store, request, &pdf, &self.options)
    }
}
