//! C language plugin

mod exports;
mod includes;
mod usages;

use crate::plugin::{ExportedSymbol, ImportStatement, LanguagePlugin, ModuleResolution, SymbolUsage};
use crate::project::{ParsedFile, Project};
use includes::{IncludeClosure, Registry};
use sprig_core::{FileId, Language, Partial, RunCache};
use std::sync::{Arc, OnceLock};

const COMPLEXITY_KINDS: &[&str] = &[
    "if_statement",
    "while_statement",
    "for_statement",
    "do_statement",
    "case_statement",
    "conditional_expression",
    "preproc_if",
    "preproc_ifdef",
    "preproc_elif",
];

pub struct CPlugin<'a> {
    project: &'a Project,
    exports: RunCache<FileId, Vec<ExportedSymbol>>,
    imports: RunCache<FileId, Vec<ImportStatement>>,
    closures: RunCache<FileId, IncludeClosure>,
    registry: OnceLock<Registry>,
}

impl<'a> CPlugin<'a> {
    pub fn new(project: &'a Project) -> Self {
        CPlugin {
            project,
            exports: RunCache::new(),
            imports: RunCache::new(),
            closures: RunCache::new(),
            registry: OnceLock::new(),
        }
    }

    fn files(&self) -> impl Iterator<Item = &'a ParsedFile> {
        self.project.files_in(&[Language::C])
    }

    fn is_c_file(&self, id: &str) -> bool {
        self.project
            .file(id)
            .is_some_and(|f| f.language == Language::C)
    }

    fn exports_of(&self, id: &str) -> Arc<Vec<ExportedSymbol>> {
        self.exports.get_or_insert_with(&id.to_string(), || {
            self.project
                .file(id)
                .map(|f| exports::collect(f).value)
                .unwrap_or_default()
        })
    }

    fn imports_of(&self, id: &str) -> Arc<Vec<ImportStatement>> {
        self.imports.get_or_insert_with(&id.to_string(), || {
            self.project
                .file(id)
                .map(includes::collect)
                .unwrap_or_default()
        })
    }

    fn include_closure(&self, file: &ParsedFile) -> Arc<IncludeClosure> {
        self.closures
            .get_or_insert_with(&file.id, || self.compute_closure(file))
    }

    fn registry(&self) -> &Registry {
        self.registry.get_or_init(|| Registry::build(self))
    }
}

impl LanguagePlugin for CPlugin<'_> {
    fn resolve_exports(&self, file: &ParsedFile) -> Partial<Vec<ExportedSymbol>> {
        exports::collect(file)
    }

    fn resolve_imports(&self, file: &ParsedFile) -> Vec<ImportStatement> {
        self.imports_of(&file.id).as_ref().clone()
    }

    fn resolve_specifier(&self, specifier: &str, from: &ParsedFile) -> ModuleResolution {
        self.resolve_include(specifier, from)
    }

    fn resolve_usages(
        &self,
        file: &ParsedFile,
        exports: &[ExportedSymbol],
        imports: &[ImportStatement],
    ) -> Vec<SymbolUsage> {
        usages::resolve(self, file, exports, imports)
    }

    fn complexity_kinds(&self) -> &'static [&'static str] {
        COMPLEXITY_KINDS
    }
}
