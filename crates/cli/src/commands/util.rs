use std::path::Path;

use anyhow::{anyhow, Context, Result};
use discrepancy_core::db::ProjectContext;
use discrepancy_core::model::{ComparisonSummary, FieldValue};
use discrepancy_core::RawFields;
use serde::Serialize;
use serde_json::Value;

use crate::canonicalize_or_current;

/// Resolve `root` and open the project's config and record store.
pub fn open_project(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(&root_path)
        .with_context(|| format!("Failed to open project at {}", root_path.display()))
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Split a `Field=Value` argument.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid field assignment '{raw}' (expected Field=Value)"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(anyhow!("Invalid field assignment '{raw}' (field name is empty)"));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

/// Read a JSON object of extracted fields from disk.
pub fn read_extracted_fields(path: &Path) -> Result<RawFields> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read extracted fields at {}", path.display()))?;
    match serde_json::from_str::<Value>(&body)
        .with_context(|| format!("Failed to parse extracted fields JSON at {}", path.display()))?
    {
        Value::Object(fields) => Ok(fields),
        _ => Err(anyhow!("Extracted fields at {} must be a JSON object", path.display())),
    }
}

fn cell(value: Option<&FieldValue>) -> String {
    value.map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

/// Human-readable table for a comparison summary.
pub fn print_summary(summary: &ComparisonSummary) {
    println!("Company: {}", summary.company_name);

    let rows: Vec<[String; 4]> = summary
        .entries
        .iter()
        .map(|entry| {
            [
                entry.field.to_string(),
                cell(entry.database_value.as_ref()),
                cell(entry.pdf_value.as_ref()),
                entry.status.to_string(),
            ]
        })
        .collect();
    let headers = ["FIELD", "DATABASE", "PDF", "STATUS"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    println!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {}",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    );
    for row in &rows {
        println!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        );
    }

    let counts = summary.counts();
    println!(
        "{} field(s): {} match, {} mismatch, {} missing in PDF, {} missing in database",
        counts.total,
        counts.matched,
        counts.mismatched,
        counts.missing_in_pdf,
        counts.missing_in_database
    );
}
