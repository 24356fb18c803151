//! Workflows composed from the normalizer, comparator and record store.
//!
//! - `extraction`: the seam to the external PDF field extractor.
//! - `resolution`: validated single-field corrections.
//! - `reconcile`: the compare and resolve flows over one store.
//! - `import`: loading a system-of-record CSV.

pub mod error;
pub mod extraction;
pub mod import;
pub mod reconcile;
pub mod resolution;

pub use error::{EngineError, ErrorKind};
pub use extraction::{
    extractor_from_config, sha256_hex, CommandExtractor, ExtractionError, Extractor,
    StaticExtractor, UnconfiguredExtractor,
};
pub use import::{import_csv, ImportError, ImportReport};
pub use reconcile::Reconciler;
pub use resolution::{resolve, ResolveRequest};
