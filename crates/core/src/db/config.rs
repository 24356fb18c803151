use serde::{Deserialize, Serialize};

use crate::compare::CompareOptions;

/// Default address for the HTTP surface.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the record store file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// External extraction service, invoked as a program that reads PDF bytes on
/// stdin and prints a JSON object of fields on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Name of an environment variable holding the service key. When set, the
    /// variable must be present and is forwarded to the program as
    /// `EXTRACTION_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

/// Serializable configuration describing a discrepancy-checker project.
///
/// This lives at `.discrepancy/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not the data.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    /// Comparison policy (numeric tolerance; exact by default).
    #[serde(default)]
    pub compare: CompareOptions,
    /// Extraction service; `compare --pdf` and `/upload-pdf` fail without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<ExtractorConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            compare: CompareOptions::default(),
            extractor: None,
            server: ServerConfig::default(),
        }
    }
}
