//! Error taxonomy shared by every sprig crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SprigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("Resolution error in {file}: {reason}")]
    Resolution { file: String, reason: String },

    #[error("Invalid range {start}..{end} for text of {len} bytes: {reason}")]
    InvalidRange {
        start: usize,
        end: usize,
        len: usize,
        reason: &'static str,
    },

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("Unknown symbol {symbol} in {file}")]
    UnknownSymbol { file: String, symbol: String },

    #[error("Unsupported language `{0}`")]
    UnsupportedLanguage(String),

    #[error("Manifest invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, SprigError>;

/// A value produced alongside the non-fatal issues found while producing it.
#[derive(Debug)]
pub struct Partial<T> {
    pub value: T,
    pub issues: Vec<SprigError>,
}

impl<T> Partial<T> {
    pub fn new(value: T) -> Self {
        Partial {
            value,
            issues: Vec::new(),
        }
    }

    pub fn with_issues(value: T, issues: Vec<SprigError>) -> Self {
        Partial { value, issues }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A per-file problem recorded during a build. Never aborts the run.
#[derive(Debug)]
pub struct Diagnostic {
    pub file: String,
    pub error: SprigError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.error)
    }
}
