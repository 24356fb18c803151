use std::path::Path;

use anyhow::{Context, Result};
use discrepancy_core::model::Source;
use discrepancy_core::services::{sha256_hex, Reconciler, ResolveRequest};
use serde_json::Value;
use tracing::info;

use crate::commands::{open_project, print_json, print_summary, read_extracted_fields};

/// Where the PDF side of a comparison comes from.
#[derive(Debug, Clone, Copy)]
pub enum PdfInput<'a> {
    /// A PDF document, run through the configured extractor.
    Document(&'a Path),
    /// A JSON object of already-extracted fields.
    Extracted(&'a Path),
}

/// Compare a PDF (or its extracted fields) with the stored record.
pub fn compare_command(
    root: &str,
    input: PdfInput<'_>,
    company: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut ctx = open_project(root)?;
    let extractor = ctx.extractor();
    let options = ctx.config.compare.clone();
    let mut reconciler = Reconciler::new(&mut ctx.store, extractor.as_ref()).with_options(options);

    let summary = match input {
        PdfInput::Document(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read PDF at {}", path.display()))?;
            info!(path = %path.display(), sha256 = %sha256_hex(&bytes), "comparing document");
            reconciler.compare_pdf(&bytes, company)
        }
        PdfInput::Extracted(path) => {
            let raw = read_extracted_fields(path)?;
            reconciler.compare_fields(&raw, company, None)
        }
    }
    .context("Comparison failed")?;

    if json {
        return print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

/// Resolve one field and print the re-computed comparison.
pub fn resolve_command(
    root: &str,
    company: &str,
    field: &str,
    value: &str,
    source: Source,
    json: bool,
) -> Result<()> {
    let mut ctx = open_project(root)?;
    let extractor = ctx.extractor();
    let options = ctx.config.compare.clone();
    let request = ResolveRequest::new(company, field, Value::String(value.to_string()))
        .with_source(source);

    let summary = Reconciler::new(&mut ctx.store, extractor.as_ref())
        .with_options(options)
        .resolve(&request)
        .context("Resolution failed")?;

    if json {
        return print_json(&summary);
    }
    match source {
        Source::Pdf => println!("Updated '{}' for {}", field, summary.company_name),
        Source::Database => {
            println!("Kept database value of '{}' for {}", field, summary.company_name)
        }
    }
    print_summary(&summary);
    Ok(())
}
