//! Sprig Indexer — parsing, language plugins and manifest building

pub mod coordinator;
pub mod discovery;
pub mod languages;
pub mod parser_pool;
pub mod plugin;
pub mod project;
pub mod syntax;

#[cfg(test)]
pub mod tests;

pub use coordinator::{analyze, BuildOutput, Coordinator};
pub use discovery::{discover, DiscoveredFile, Discovery};
pub use languages::Plugins;
pub use parser_pool::{create_parser_pool, ParseRequest, ParseResult, ParserPool};
pub use plugin::{
    ExportedSymbol, ExternalModule, ImportBinding, ImportKind, ImportStatement, LanguagePlugin,
    ModuleResolution, SymbolUsage,
};
pub use project::{file_id, ParsedFile, Project, SourceFile};
