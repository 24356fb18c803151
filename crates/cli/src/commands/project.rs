use std::fs;

use anyhow::{Context, Result};
use discrepancy_core::db::{ProjectConfig, ProjectLayout, RecordStore};
use serde::Serialize;

use crate::commands::{open_project, print_dir_status, print_json};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub company_count: usize,
    pub extractor: Option<String>,
    pub numeric_tolerance: String,
    pub server_bind: String,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;

    let config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the record store immediately so follow-on commands (and tests)
    // can rely on its presence.
    RecordStore::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize record store at {}", layout.db_path.display())
    })?;

    println!("Initialized discrepancy checker project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let companies = ctx.store.list().context("Failed to list companies")?;
    let extractor = ctx.config.extractor.as_ref().map(|extractor| {
        std::iter::once(extractor.program.as_str())
            .chain(extractor.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    });

    if json {
        return print_json(&ProjectInfoSnapshot {
            name: ctx.config.name.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.project_config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            db_path: ctx.config.db.path.clone(),
            company_count: companies.len(),
            extractor,
            numeric_tolerance: ctx.config.compare.numeric_tolerance.to_string(),
            server_bind: ctx.config.server.bind.clone(),
        });
    }

    println!("Discrepancy Checker Project Info");
    println!("================================");
    println!("Name: {}", ctx.config.name);
    println!("Root: {}", ctx.layout.root.display());
    println!("Config file: {}", ctx.layout.project_config_path.display());
    println!("Config version: {}", ctx.config.config_version);
    println!("DB path (config): {}", ctx.config.db.path);
    println!("Companies: {}", companies.len());
    println!("Extractor: {}", extractor.as_deref().unwrap_or("(not configured)"));
    println!("Numeric tolerance: {}", ctx.config.compare.numeric_tolerance);
    println!("Server bind: {}", ctx.config.server.bind);
    println!();
    println!("Directories:");
    print_dir_status("Meta dir (.discrepancy)", &ctx.layout.meta_dir);

    Ok(())
}
