use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use discrepancy_core::db::ResolutionRecord;
use discrepancy_core::model::KnownField;
use discrepancy_core::normalize::normalize_company;
use discrepancy_core::services::import_csv;
use discrepancy_core::RawFields;
use serde_json::Value;

use crate::commands::{open_project, parse_assignment, print_json};

/// Load companies from a system-of-record CSV.
pub fn import_csv_command(root: &str, path: &str, json: bool) -> Result<()> {
    let mut ctx = open_project(root)?;
    let file = File::open(path).with_context(|| format!("Failed to open CSV at {path}"))?;
    let report = import_csv(&mut ctx.store, BufReader::new(file))
        .with_context(|| format!("Failed to import {path}"))?;

    if json {
        return print_json(&report);
    }
    println!("Imported {} compan{} from {path}", report.imported, plural(report.imported));
    if report.skipped_blank > 0 {
        println!("Skipped {} blank row(s)", report.skipped_blank);
    }
    Ok(())
}

/// Add one company, with optional `Field=Value` assignments.
pub fn add_company_command(root: &str, name: &str, fields: &[String]) -> Result<()> {
    let mut ctx = open_project(root)?;

    let mut raw = RawFields::new();
    raw.insert(KnownField::CompanyName.label().to_string(), Value::String(name.to_string()));
    for assignment in fields {
        let (field, value) = parse_assignment(assignment)?;
        raw.insert(field, Value::String(value));
    }
    let record = normalize_company(&raw).context("Invalid company record")?;
    ctx.store.insert(&record).context("Failed to insert company")?;

    println!("Added company '{}' ({} field(s))", record.company_name(), record.values().count());
    Ok(())
}

/// List every company in the system-of-record.
pub fn list_companies_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let companies = ctx.store.list().context("Failed to list companies")?;

    if json {
        return print_json(&companies);
    }
    if companies.is_empty() {
        println!("No companies found.");
        return Ok(());
    }
    println!("Companies:");
    for company in &companies {
        println!("- {} ({} field(s))", company.company_name(), company.values().count());
    }
    Ok(())
}

/// Print one company's stored record.
pub fn show_company_command(root: &str, name: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let company = ctx.store.find(name).with_context(|| format!("Failed to look up '{name}'"))?;

    if json {
        return print_json(&company);
    }
    println!("{}", company.company_name());
    for (field, value) in company.values() {
        println!("  {}: {}", field, value);
    }
    Ok(())
}

/// Print the resolution log for one company.
pub fn history_command(root: &str, name: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    ctx.store.find(name).with_context(|| format!("Failed to look up '{name}'"))?;
    let history: Vec<ResolutionRecord> =
        ctx.store.resolution_history(name).context("Failed to read resolution history")?;

    if json {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("No resolutions recorded for '{name}'.");
        return Ok(());
    }
    for entry in &history {
        println!(
            "{}  {}: {} -> {}",
            entry.resolved_at,
            entry.field,
            entry.old_value.as_deref().unwrap_or("-"),
            entry.new_value.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
