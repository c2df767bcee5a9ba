//! Sprig Core — manifest model, invariants, metrics and extraction

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod manifest;
pub mod metrics;
pub mod model;
pub mod rewrite;


#[cfg(test)]
pub mod test_utils;

pub use audit::{audit, Alert, FileAudit};
pub use cache::RunCache;
pub use config::{ProjectConfig, PythonVersion, Thresholds, CONFIG_FILE};
pub use error::{Diagnostic, Partial, Result, SprigError};
pub use extraction::{closure, extract, Depths, Extraction, ExtractionSeed};
pub use graph::{SymbolGraph, SymbolKey};
pub use manifest::{
    assemble, insert_dependency, DependencyInfo, DependentInfo, ExternalOrigin, FileManifest,
    Manifest, SymbolManifest,
};
pub use metrics::{count_code, measure, CommentSyntax, Metrics};
pub use model::{DeclarationRole, FileId, Language, Span, SymbolId, SymbolKind};
pub use rewrite::{remove, remove_ranges, ByteRange, Removal};
