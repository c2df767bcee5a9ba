//! Core data structures shared by the resolvers and the manifest

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

/// Project-relative file path with `/` separators.
pub type FileId = String;

/// Qualified symbol identifier, unique within its file.
pub type SymbolId = String;

/// Discriminates what kind of declaration a symbol represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    // ── Types ───────────────────────────────────────────────
    Class,
    Struct,
    Enum,
    Union,
    Interface,
    Record,
    Delegate,
    Typedef,

    // ── Values ──────────────────────────────────────────────
    Function,
    Variable,
    Macro,

    // ── Containers ──────────────────────────────────────────
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Union => "union",
            SymbolKind::Interface => "interface",
            SymbolKind::Record => "record",
            SymbolKind::Delegate => "delegate",
            SymbolKind::Typedef => "typedef",
            SymbolKind::Function => "function",
            SymbolKind::Variable => "variable",
            SymbolKind::Macro => "macro",
            SymbolKind::Module => "module",
        }
    }
}

/// Whether a declaration carries a body or only announces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationRole {
    #[default]
    Definition,
    Signature,
}

/// Supported languages for syntax-aware analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    CSharp,
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("c") | Some("h") => Some(Language::C),
            Some("cs") => Some(Language::CSharp),
            Some("py") => Some(Language::Python),
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Some(Language::JavaScript),
            Some("ts") | Some("tsx") | Some("mts") | Some("cts") => Some(Language::TypeScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::CSharp => "csharp",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    pub fn all() -> [Language; 5] {
        [
            Language::C,
            Language::CSharp,
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
        ]
    }
}

impl std::str::FromStr for Language {
    type Err = crate::SprigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            _ => Err(crate::SprigError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Accepts the serialized names plus the short aliases `FromStr` knows.
impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A region of source text, in UTF-8 byte offsets and zero-based rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_row: usize,
    pub end_row: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, start_row: usize, end_row: usize) -> Self {
        Span {
            start,
            end,
            start_row,
            end_row,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line_count(&self) -> usize {
        self.end_row.saturating_sub(self.start_row) + 1
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn as_range(&self) -> crate::rewrite::ByteRange {
        crate::rewrite::ByteRange::new(self.start, self.end)
    }
}
