//! JavaScript and TypeScript language plugin

mod exports;
mod imports;
mod usages;

use crate::plugin::{
    ExportedSymbol, ExternalModule, ImportStatement, LanguagePlugin, ModuleResolution, SymbolUsage,
};
use crate::project::{join, ParsedFile, Project};
use exports::ModuleExports;
use sprig_core::{FileId, Language, Partial, RunCache};
use std::sync::Arc;
use usages::Target;

const COMPLEXITY_KINDS: &[&str] = &[
    "if_statement",
    "while_statement",
    "for_statement",
    "for_in_statement",
    "do_statement",
    "switch_case",
    "ternary_expression",
    "try_statement",
    "catch_clause",
    "finally_clause",
];

/// Suffixes tried, in order, after the exact path.
const EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".d.ts"];

pub struct JavaScriptPlugin<'a> {
    project: &'a Project,
    exports: RunCache<FileId, ModuleExports>,
    imports: RunCache<FileId, Vec<ImportStatement>>,
}

impl<'a> JavaScriptPlugin<'a> {
    pub fn new(project: &'a Project) -> Self {
        JavaScriptPlugin {
            project,
            exports: RunCache::new(),
            imports: RunCache::new(),
        }
    }

    fn exports_of(&self, id: &str) -> Arc<ModuleExports> {
        self.exports.get_or_insert_with(&id.to_string(), || {
            self.project
                .file(id)
                .map(|f| exports::collect(f).value)
                .unwrap_or_default()
        })
    }

    fn imports_of(&self, id: &str) -> Arc<Vec<ImportStatement>> {
        self.imports.get_or_insert_with(&id.to_string(), || {
            self.project.file(id).map(imports::collect).unwrap_or_default()
        })
    }

    fn is_script(&self, id: &str) -> bool {
        self.project
            .file(id)
            .is_some_and(|f| matches!(f.language, Language::JavaScript | Language::TypeScript))
    }

    /// Relative specifiers resolve against the importing directory, trying
    /// the exact path, known extensions, then an `index` file.
    fn locate(&self, from: &ParsedFile, specifier: &str) -> Option<FileId> {
        let base = join(from.dir(), specifier)?;
        if self.is_script(&base) {
            return Some(base);
        }
        let with_extension = EXTENSIONS
            .iter()
            .map(|ext| format!("{base}{ext}"))
            .find(|candidate| self.is_script(candidate));
        if with_extension.is_some() {
            return with_extension;
        }
        let index = if base.is_empty() {
            "index".to_string()
        } else {
            format!("{base}/index")
        };
        EXTENSIONS
            .iter()
            .map(|ext| format!("{index}{ext}"))
            .find(|candidate| self.is_script(candidate))
    }

    fn target_of(&self, from: &ParsedFile, specifier: &str) -> Target {
        if is_relative(specifier) {
            return match self.locate(from, specifier) {
                Some(file) => Target::Internal(file),
                None => {
                    tracing::debug!("{}: unresolved import {}", from.id, specifier);
                    Target::External(ExternalModule {
                        id: specifier.to_string(),
                        origin: None,
                    })
                }
            };
        }
        Target::External(ExternalModule {
            id: package_name(specifier).to_string(),
            origin: None,
        })
    }

    fn resolve_module(&self, from: &ParsedFile, specifier: &str) -> ModuleResolution {
        match self.target_of(from, specifier) {
            Target::Internal(file) => ModuleResolution::internal([file]),
            Target::External(module) => ModuleResolution::external(module.id, module.origin),
        }
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// `@scope/name` or the first path segment of a bare specifier.
fn package_name(specifier: &str) -> &str {
    let mut segments = specifier.match_indices('/').map(|(i, _)| i);
    let end = if specifier.starts_with('@') {
        segments.nth(1)
    } else {
        segments.next()
    };
    &specifier[..end.unwrap_or(specifier.len())]
}

impl LanguagePlugin for JavaScriptPlugin<'_> {
    fn resolve_exports(&self, file: &ParsedFile) -> Partial<Vec<ExportedSymbol>> {
        let exports = exports::collect(file);
        Partial::with_issues(exports.value.symbols, exports.issues)
    }

    fn resolve_imports(&self, file: &ParsedFile) -> Vec<ImportStatement> {
        self.imports_of(&file.id).as_ref().clone()
    }

    fn resolve_specifier(&self, specifier: &str, from: &ParsedFile) -> ModuleResolution {
        self.resolve_module(from, specifier)
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
