use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use discrepancy_checker::commands::{
    add_company_command, compare_command, history_command, import_csv_command,
    init_project_command, list_companies_command, project_info_command, resolve_command,
    serve_command, show_company_command, PdfInput,
};
use discrepancy_checker::init_logging;
use discrepancy_core::model::Source;

/// Reconcile company data extracted from PDFs against a system-of-record.
///
/// This CLI is a thin wrapper around `discrepancy-core` (exposed in code as
/// `discrepancy_core`). All substantive logic lives in the library so it can
/// be tested thoroughly and reused from the HTTP server.
#[derive(Parser, Debug)]
#[command(
    name = "discrepancy-checker",
    version,
    about = "PDF vs. system-of-record discrepancy checker",
    long_about = None
)]
struct Cli {
    /// Log progress at info level (overridden by DISCREPANCY_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new project at the given root.
    ///
    /// This will:
    /// - Create a `.discrepancy` metadata directory.
    /// - Write a `.discrepancy/project.json` config file.
    /// - Create the empty record store.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Load companies from a CSV whose headers are known field names.
    ///
    /// The import is all-or-nothing.
    ImportCsv {
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the CSV file.
        #[arg(long)]
        path: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Add a single company to the system-of-record.
    AddCompany {
        #[arg(long, default_value = ".")]
        root: String,

        /// Company name (the record's identity).
        #[arg(long)]
        name: String,

        /// Field assignment, e.g. `--field "Revenue=900000"`. Repeatable.
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// List all companies in the system-of-record.
    ListCompanies {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show one company's stored record.
    ShowCompany {
        #[arg(long, default_value = ".")]
        root: String,

        /// Company name (case-insensitive).
        #[arg(long)]
        name: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compare a PDF with the stored record for its company.
    ///
    /// Use `--pdf` to run the configured extractor, or `--extracted` to supply
    /// the extracted fields as a JSON object.
    Compare {
        #[arg(long, default_value = ".")]
        root: String,

        /// Company name. Defaults to the PDF's `Company Name` field.
        #[arg(long)]
        company: Option<String>,

        /// PDF document to extract.
        #[arg(long, conflicts_with = "extracted", required_unless_present = "extracted")]
        pdf: Option<PathBuf>,

        /// JSON file holding already-extracted fields.
        #[arg(long)]
        extracted: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Resolve a discrepancy for one field.
    ///
    /// With `--source pdf` (default) the value is written to the record; with
    /// `--source database` the stored value is kept and nothing is written.
    Resolve {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        field: String,

        /// New value; an empty string clears the field.
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Authoritative source (pdf|database).
        #[arg(long, default_value = "pdf", value_parser = parse_source)]
        source: Source,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the resolution log for one company.
    History {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        company: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Serve the HTTP API (`/upload-pdf`, `/update-db`).
    Serve {
        #[arg(long, default_value = ".")]
        root: String,

        /// Listen address. Defaults to `server.bind` from the project config.
        #[arg(long)]
        bind: Option<String>,
    },
}

fn parse_source(raw: &str) -> Result<Source, String> {
    raw.parse()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::ImportCsv { root, path, json } => import_csv_command(&root, &path, json)?,
        Command::AddCompany { root, name, fields } => add_company_command(&root, &name, &fields)?,
        Command::ListCompanies { root, json } => list_companies_command(&root, json)?,
        Command::ShowCompany { root, name, json } => show_company_command(&root, &name, json)?,
        Command::Compare { root, company, pdf, extracted, json } => {
            let input = match (&pdf, &extracted) {
                (Some(path), _) => PdfInput::Document(path),
                (None, Some(path)) => PdfInput::Extracted(path),
                (None, None) => bail!("one of --pdf or --extracted is required"),
            };
            compare_command(&root, input, company.as_deref(), json)?
        }
        Command::Resolve { root, company, field, value, source, json } => {
            resolve_command(&root, &company, &field, &value, source, json)?
        }
        Command::History { root, company, json } => history_command(&root, &company, json)?,
        Command::Serve { root, bind } => serve_command(&root, bind)?,
    }

    Ok(())
}
