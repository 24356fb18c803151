use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::db::{open_record_store, ProjectConfig, ProjectLayout, RecordStore};
use crate::services::extraction::{extractor_from_config, Extractor};

/// Convenience wrapper bundling layout, config, db path, and an open RecordStore.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub db_path: PathBuf,
    pub store: RecordStore,
}

impl ProjectContext {
    /// Load project config and open the record store for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, db_path, store) = open_record_store(&layout)?;
        Ok(Self { layout, config, db_path, store })
    }

    /// Extractor described by the project config.
    pub fn extractor(&self) -> Box<dyn Extractor> {
        extractor_from_config(self.config.extractor.as_ref())
    }
}
