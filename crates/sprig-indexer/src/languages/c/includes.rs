//! `#include` collection, header lookup and header/implementation pairing

use super::CPlugin;
use crate::plugin::{ImportStatement, ModuleResolution};
use crate::project::{join, node_span, strip_extension, ParsedFile};
use crate::syntax::visit_all;
use sprig_core::{DeclarationRole, FileId, SymbolKind};
use std::collections::{BTreeMap, BTreeSet};

/// Function definitions of every C file, by name.
#[derive(Debug, Default)]
pub(super) struct Registry {
    definitions: BTreeMap<String, Vec<FileId>>,
}

impl Registry {
    pub(super) fn build(plugin: &CPlugin) -> Self {
        let mut registry = Registry::default();
        for file in plugin.files() {
            for symbol in plugin.exports_of(&file.id).iter() {
                let defines_function = symbol.kind == SymbolKind::Function
                    && symbol.role == DeclarationRole::Definition;
                if defines_function {
                    registry
                        .definitions
                        .entry(symbol.id.clone())
                        .or_default()
                        .push(file.id.clone());
                }
            }
        }
        tracing::debug!("C registry holds {} function definitions", registry.definitions.len());
        registry
    }

    /// The first file other than `except` defining `name`.
    pub(super) fn definition_of(&self, name: &str, except: &str) -> Option<&FileId> {
        self.definitions.get(name)?.iter().find(|f| f.as_str() != except)
    }
}

/// Files an include makes visible, in include order.
#[derive(Debug, Default)]
pub(super) struct IncludeClosure {
    pub internal: Vec<FileId>,
}

pub(super) fn collect(file: &ParsedFile) -> Vec<ImportStatement> {
    let mut includes = Vec::new();
    visit_all(file.root(), &mut |node| {
        if node.kind() == "preproc_include" {
            if let Some(path) = node.child_by_field_name("path") {
                let text = file.text(path).trim();
                let specifier = match path.kind() {
                    "system_lib_string" => text.to_string(),
                    _ => text.trim_matches('"').to_string(),
                };
                includes.push(ImportStatement::normal(specifier, node_span(node)).wildcard());
            }
            return false;
        }
        node.kind() != "function_definition"
    });
    includes
}

impl<'a> CPlugin<'a> {
    /// Find the project file a quoted include names.
    fn locate(&self, specifier: &str, from: &ParsedFile) -> Option<FileId> {
        let relative = join(from.dir(), specifier).filter(|id| self.is_c_file(id));
        if relative.is_some() {
            return relative;
        }
        let rooted = join("", specifier).filter(|id| self.is_c_file(id));
        if rooted.is_some() {
            return rooted;
        }

        let suffix = format!("/{}", specifier.trim_start_matches("./"));
        let matches: Vec<&FileId> = self
            .files()
            .map(|f| &f.id)
            .filter(|id| id.ends_with(&suffix))
            .collect();
        if matches.len() > 1 {
            tracing::warn!(
                "{}: include \"{}\" is ambiguous ({} candidates), using {}",
                from.id,
                specifier,
                matches.len(),
                matches[0]
            );
        }
        matches.first().map(|id| id.to_string())
    }

    /// Implementation files paired with a header: the same stem with `.c`,
    /// else every file defining a function the header declares.
    pub(super) fn pairs_of(&self, header: &str) -> BTreeSet<FileId> {
        let mut pairs = BTreeSet::new();
        if !header.ends_with(".h") {
            return pairs;
        }

        let sibling = format!("{}.c", strip_extension(header));
        if self.is_c_file(&sibling) {
            pairs.insert(sibling);
            return pairs;
        }

        let registry = self.registry();
        for symbol in self.exports_of(header).iter() {
            if symbol.kind == SymbolKind::Function && symbol.role == DeclarationRole::Signature {
                if let Some(def) = registry.definition_of(&symbol.id, header) {
                    pairs.insert(def.clone());
                }
            }
        }
        pairs
    }

    pub(super) fn resolve_include(&self, specifier: &str, from: &ParsedFile) -> ModuleResolution {
        if specifier.starts_with('<') {
            return ModuleResolution::external(specifier, None);
        }
        match self.locate(specifier, from) {
            Some(header) => {
                let mut files = self.pairs_of(&header);
                files.remove(&from.id);
                files.insert(header);
                ModuleResolution::internal(files)
            }
            None => {
                tracing::debug!("{}: include \"{}\" not in project", from.id, specifier);
                ModuleResolution::external(specifier, None)
            }
        }
    }

    /// Headers reachable through includes, depth first in include order,
    /// with their paired implementation files. Never contains `file` itself.
    pub(super) fn compute_closure(&self, file: &ParsedFile) -> IncludeClosure {
        let mut closure = IncludeClosure::default();
        let mut visited: BTreeSet<FileId> = BTreeSet::from([file.id.clone()]);
        self.walk_includes(file, &mut visited, &mut closure);
        closure
    }

    fn walk_includes(
        &self,
        file: &ParsedFile,
        visited: &mut BTreeSet<FileId>,
        closure: &mut IncludeClosure,
    ) {
        for include in self.imports_of(&file.id).iter() {
            if include.specifier.starts_with('<') {
                continue;
            }
            let Some(header) = self.locate(&include.specifier, file) else {
                continue;
            };
            if !visited.insert(header.clone()) {
                continue;
            }
            closure.internal.push(header.clone());
            for pair in self.pairs_of(&header) {
                if visited.insert(pair.clone()) {
                    closure.internal.push(pair);
                }
            }
            if let Some(parsed) = self.project.file(&header) {
                self.walk_includes(parsed, visited, closure);
            }
        }
    }
}
