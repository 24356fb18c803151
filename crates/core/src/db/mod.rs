//! Record store integration and project layout definitions.
//!
//! This module wraps a SQLite database holding:
//! - The system-of-record (`companies`, one column per known field)
//! - The resolution log (every applied correction)
//! - The latest normalized PDF extraction per company
//!
//! It also defines:
//! - `ProjectConfig`: serializable project metadata and policy.
//! - `ProjectLayout`: computed paths for project files.
//! - `ProjectContext`: config + open store for a project root.

pub mod config;
pub mod context;
pub mod layout;
pub mod models;
pub mod record_store;
pub mod util;

pub use config::*;
pub use context::*;
pub use layout::*;
pub use models::*;
pub use record_store::*;
pub use util::*;
