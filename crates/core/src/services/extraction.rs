use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::ExtractorConfig;
use crate::normalize::RawFields;

/// Environment variable through which the configured API key reaches the extractor program.
pub const FORWARDED_API_KEY_ENV: &str = "EXTRACTION_API_KEY";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No extraction service is configured (add an `extractor` section to the project config)")]
    NotConfigured,
    #[error("Environment variable {0} holding the extraction API key is not set")]
    MissingApiKey(String),
    #[error("Failed to spawn extractor '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Extractor exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Extractor output is not a JSON object: {0}")]
    InvalidOutput(String),
}

/// Turns PDF bytes into a raw field map. Implementations may block.
pub trait Extractor: Send + Sync {
    fn extract(&self, pdf: &[u8]) -> Result<RawFields, ExtractionError>;
    fn name(&self) -> &'static str;
}

/// Runs an external program: PDF bytes on stdin, a JSON object of fields on stdout.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    api_key_env: Option<String>,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), api_key_env: None }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            api_key_env: config.api_key_env.clone(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }
}

impl Extractor for CommandExtractor {
    fn extract(&self, pdf: &[u8]) -> Result<RawFields, ExtractionError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(var) = &self.api_key_env {
            let key = std::env::var(var).map_err(|_| ExtractionError::MissingApiKey(var.clone()))?;
            command.env(FORWARDED_API_KEY_ENV, key);
        }

        let spawn_error =
            |source| ExtractionError::Spawn { program: self.program.clone(), source };
        let mut child = command.spawn().map_err(spawn_error)?;
        let mut stdin = child.stdin.take();

        // The child may fill its stdout pipe before it has read all of stdin.
        let output = std::thread::scope(|scope| {
            scope.spawn(move || {
                if let Some(stdin) = stdin.as_mut() {
                    if let Err(err) = stdin.write_all(pdf) {
                        debug!(error = %err, "extractor closed stdin early");
                    }
                }
            });
            child.wait_with_output()
        })
        .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(program = %self.program, status = %output.status, "extractor failed");
            return Err(ExtractionError::Failed { status: output.status.to_string(), stderr });
        }

        match serde_json::from_slice::<Value>(&output.stdout) {
            Ok(Value::Object(fields)) => {
                debug!(program = %self.program, fields = fields.len(), "extractor returned fields");
                Ok(fields)
            }
            Ok(other) => Err(ExtractionError::InvalidOutput(format!("got {}", json_kind(&other)))),
            Err(err) => Err(ExtractionError::InvalidOutput(err.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Returns the same field map for every document.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    fields: RawFields,
}

impl StaticExtractor {
    pub fn new(fields: RawFields) -> Self {
        Self { fields }
    }
}

impl Extractor for StaticExtractor {
    fn extract(&self, _pdf: &[u8]) -> Result<RawFields, ExtractionError> {
        Ok(self.fields.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Placeholder used when the project has no extractor configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredExtractor;

impl Extractor for UnconfiguredExtractor {
    fn extract(&self, _pdf: &[u8]) -> Result<RawFields, ExtractionError> {
        Err(ExtractionError::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}

/// Build the extractor a project config asks for.
pub fn extractor_from_config(config: Option<&ExtractorConfig>) -> Box<dyn Extractor> {
    match config {
        Some(config) => Box::new(CommandExtractor::from_config(config)),
        None => Box::new(UnconfiguredExtractor),
    }
}

/// Hex-encoded SHA-256 of a document.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
