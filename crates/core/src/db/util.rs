use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::db::{ProjectConfig, ProjectLayout, RecordStore};

/// Load the project config JSON from disk for a given layout.
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    let config_json = std::fs::read_to_string(&layout.project_config_path).with_context(|| {
        format!("Failed to read project config at {}", layout.project_config_path.display())
    })?;
    let config: ProjectConfig =
        serde_json::from_str(&config_json).context("Failed to parse project config JSON")?;
    if config.compare.numeric_tolerance.is_sign_negative() {
        bail!("compare.numeric_tolerance must not be negative");
    }
    Ok(config)
}

/// Resolve the DB path (respecting relative/absolute config) and open the RecordStore.
pub fn open_record_store(layout: &ProjectLayout) -> Result<(ProjectConfig, PathBuf, RecordStore)> {
    let config = load_project_config(layout)?;
    let config_db_path = std::path::Path::new(&config.db.path);
    let db_path = if config_db_path.is_absolute() {
        config_db_path.to_path_buf()
    } else {
        layout.root.join(config_db_path)
    };
    let store = RecordStore::open(&db_path)
        .with_context(|| format!("Failed to open record store at {}", db_path.display()))?;
    Ok((config, db_path, store))
}
