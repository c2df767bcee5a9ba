//! Python usage resolver
//!
//! Every import binds a local name to a module or to an item of a module.
//! References inside a symbol are identifier chains (`a`, `a.b.c`); the head
//! is looked up in the file's bindings and the rest of the chain walks
//! submodules and module attributes. Items are followed through the target
//! module's own imports, so re-exports land on the declaring file.

use super::PythonPlugin;
use super::modules::ModuleRef;
use crate::plugin::{ExportedSymbol, ExternalModule, ImportKind, ImportStatement, SymbolUsage};
use crate::project::ParsedFile;
use crate::syntax::named_children;
use sprig_core::{FileId, SymbolId};
use std::collections::{BTreeMap, BTreeSet};
use tree_sitter::Node;

/// What a specifier points at.
#[derive(Debug, Clone)]
pub(super) enum Target {
    Internal(ModuleRef),
    External(ExternalModule),
}

/// What a local name is bound to by an import.
#[derive(Debug, Clone)]
enum Binding {
    /// `consumed` chain segments are already covered by the module itself:
    /// 1 for `import a` or `import a.b as x`, 2 for an external `import a.b`.
    Module { target: Target, consumed: usize },
    Item { target: Target, name: String },
}

/// End point of an item lookup.
#[derive(Debug, Clone)]
enum Resolved {
    Symbol { file: FileId, id: SymbolId },
    Module(ModuleRef),
    External { module: ExternalModule, item: Option<String> },
}

type Visited = BTreeSet<(ModuleRef, String)>;

pub(super) fn resolve(
    plugin: &PythonPlugin,
    file: &ParsedFile,
    exports: &[ExportedSymbol],
    imports: &[ImportStatement],
) -> Vec<SymbolUsage> {
    let mut usages = Vec::new();

    for import in imports {
        usages.extend(
            plugin
                .resolve_module(&file.id, &import.specifier)
                .file_scope_usages(),
        );
        // `from pkg import sub` depends on the submodule file too
        if let Target::Internal(module) = plugin.target_of(&file.id, &import.specifier) {
            for binding in &import.bindings {
                if let Some(child) = plugin.tree().child(module, &binding.name) {
                    if let Some(child_file) = &plugin.tree().get(child).file {
                        usages.push(SymbolUsage::module(None, child_file.clone()));
                    }
                }
            }
        }
    }

    let bindings = bind(plugin, &file.id, imports);
    let own: BTreeSet<&str> = exports.iter().map(|s| s.id.as_str()).collect();
    let resolver = Resolver {
        plugin,
        file,
        bindings: &bindings,
        own: &own,
    };

    let top_level = named_children(file.root());

    for symbol in exports {
        let mut refs = BTreeSet::new();
        for node in top_level
            .iter()
            .filter(|n| n.start_byte() >= symbol.span.start && n.end_byte() <= symbol.span.end)
        {
            references(file, *node, &mut refs);
        }
        for chain in &refs {
            if chain[0] == symbol.name && !bindings.contains_key(&chain[0]) {
                continue;
            }
            usages.extend(resolver.usage(Some(symbol.id.as_str()), chain));
        }
    }

    // module-level code outside any symbol
    let mut refs = BTreeSet::new();
    for node in &top_level {
        let owned = exports
            .iter()
            .any(|s| node.start_byte() >= s.span.start && node.end_byte() <= s.span.end);
        if !owned {
            references(file, *node, &mut refs);
        }
    }
    for chain in &refs {
        usages.extend(resolver.usage(None, chain));
    }

    usages
}

/// Local name bindings made by a file's imports; later imports shadow earlier ones.
fn bind(
    plugin: &PythonPlugin,
    file: &str,
    imports: &[ImportStatement],
) -> BTreeMap<String, Binding> {
    let mut bindings = BTreeMap::new();

    for import in imports {
        match (import.kind, import.wildcard) {
            (ImportKind::Normal, _) => {
                let parts = import.specifier.split('.').count();
                match (&import.alias, plugin.target_of(file, &import.specifier)) {
                    (Some(alias), target) => {
                        bindings.insert(alias.clone(), Binding::Module { target, consumed: 1 });
                    }
                    (None, Target::External(module)) => {
                        let head = head_of(&import.specifier);
                        bindings.insert(
                            head.to_string(),
                            Binding::Module {
                                target: Target::External(module),
                                consumed: parts,
                            },
                        );
                    }
                    (None, full) => {
                        let head = head_of(&import.specifier);
                        let binding = match plugin.target_of(file, head) {
                            Target::Internal(module) => Binding::Module {
                                target: Target::Internal(module),
                                consumed: 1,
                            },
                            Target::External(_) => Binding::Module {
                                target: full,
                                consumed: parts,
                            },
                        };
                        bindings.insert(head.to_string(), binding);
                    }
                }
            }
            (ImportKind::Selective, true) => {
                if let Target::Internal(module) = plugin.target_of(file, &import.specifier) {
                    for name in plugin.wildcard_names(module) {
                        bindings.insert(
                            name.clone(),
                            Binding::Item {
                                target: Target::Internal(module),
                                name,
                            },
                        );
                    }
                }
            }
            (ImportKind::Selective, false) => {
                let target = plugin.target_of(file, &import.specifier);
                for binding in &import.bindings {
                    bindings.insert(
                        binding.local().to_string(),
                        Binding::Item {
                            target: target.clone(),
                            name: binding.name.clone(),
                        },
                    );
                }
            }
        }
    }

    bindings
}

pub(super) fn head_of(specifier: &str) -> &str {
    specifier.split('.').next().unwrap_or(specifier)
}

struct Resolver<'r, 'a> {
    plugin: &'r PythonPlugin<'a>,
    file: &'r ParsedFile,
    bindings: &'r BTreeMap<String, Binding>,
    own: &'r BTreeSet<&'r str>,
}

impl Resolver<'_, '_> {
    fn usage(&self, from: Option<&str>, chain: &[String]) -> Option<SymbolUsage> {
        let head = chain.first()?;

        let Some(binding) = self.bindings.get(head) else {
            // same-file reference
            return self.own.contains(head.as_str()).then(|| {
                SymbolUsage::internal(from, self.file.id.clone(), head.clone(), head.clone())
            });
        };

        let (resolved, local) = match binding {
            Binding::Item {
                target: Target::Internal(module),
                name,
            } => {
                let resolved = self.plugin.resolve_item(*module, name, &mut Visited::new())?;
                self.follow(resolved, chain, 1)
            }
            Binding::Item {
                target: Target::External(module),
                name,
            } => (
                Resolved::External {
                    module: module.clone(),
                    item: Some(name.clone()),
                },
                head.clone(),
            ),
            Binding::Module {
                target: Target::Internal(module),
                consumed,
            } => self.follow(Resolved::Module(*module), chain, *consumed),
            Binding::Module {
                target: Target::External(module),
                consumed,
            } => match chain.get(*consumed) {
                Some(item) => (
                    Resolved::External {
                        module: module.clone(),
                        item: Some(item.clone()),
                    },
                    chain[..=*consumed].join("."),
                ),
                None => (
                    Resolved::External {
                        module: module.clone(),
                        item: None,
                    },
                    head.clone(),
                ),
            },
        };

        match resolved {
            Resolved::Symbol { file, id } => {
                tracing::debug!("{} -> {}#{} as {}", self.file.id, file, id, local);
                Some(SymbolUsage::internal(from, file, local, id))
            }
            Resolved::Module(module) => self
                .plugin
                .tree()
                .get(module)
                .file
                .clone()
                .map(|file| SymbolUsage::module(from, file)),
            Resolved::External { module, item } => Some(SymbolUsage::external(
                from,
                &module,
                item.as_deref().map(|item| (local.as_str(), item)),
            )),
        }
    }

    /// Walk the rest of `chain` from index `next` while it names submodules
    /// or module attributes.
    fn follow(&self, start: Resolved, chain: &[String], next: usize) -> (Resolved, String) {
        let mut current = start;
        let mut index = next;

        while let Resolved::Module(module) = &current {
            let Some(attribute) = chain.get(index) else {
                break;
            };
            match self.plugin.resolve_item(*module, attribute, &mut Visited::new()) {
                Some(found) => {
                    current = found;
                    index += 1;
                }
                None => break,
            }
        }

        let local = chain[..index.clamp(1, chain.len())].join(".");
        (current, local)
    }
}

impl PythonPlugin<'_> {
    /// Find `name` as seen from `module`: a declared symbol, a submodule, or
    /// something the module itself imports.
    fn resolve_item(
        &self,
        module: ModuleRef,
        name: &str,
        visited: &mut Visited,
    ) -> Option<Resolved> {
        if !visited.insert((module, name.to_string())) {
            tracing::debug!("import cycle while resolving {}", name);
            return None;
        }

        let tree = self.tree();
        let file = tree.get(module).file.as_ref();

        if let Some(file) = file {
            if self.exports_of(file).iter().any(|s| s.id == name) {
                return Some(Resolved::Symbol {
                    file: file.clone(),
                    id: name.to_string(),
                });
            }
        }
        if let Some(child) = tree.child(module, name) {
            return Some(Resolved::Module(child));
        }

        let file = file?;
        for import in self.imports_of(file).iter().rev() {
            match (import.kind, import.wildcard) {
                (ImportKind::Selective, true) => {
                    if let Target::Internal(source) = self.target_of(file, &import.specifier) {
                        if self.is_public(source, name) {
                            if let Some(found) = self.resolve_item(source, name, visited) {
                                return Some(found);
                            }
                        }
                    }
                }
                (ImportKind::Selective, false) => {
                    let Some(binding) = import.bindings.iter().find(|b| b.local() == name) else {
                        continue;
                    };
                    return match self.target_of(file, &import.specifier) {
                        Target::Internal(source) => {
                            self.resolve_item(source, &binding.name, visited)
                        }
                        Target::External(module) => Some(Resolved::External {
                            module,
                            item: Some(binding.name.clone()),
                        }),
                    };
                }
                (ImportKind::Normal, _) => {
                    let head = head_of(&import.specifier);
                    let specifier = match &import.alias {
                        Some(alias) if alias == name => import.specifier.as_str(),
                        None if head == name => head,
                        _ => continue,
                    };
                    return match self.target_of(file, specifier) {
                        Target::Internal(source) => Some(Resolved::Module(source)),
                        Target::External(module) => Some(Resolved::External { module, item: None }),
                    };
                }
            }
        }
        None
    }

    /// Names `from module import *` binds.
    fn wildcard_names(&self, module: ModuleRef) -> Vec<String> {
        let Some(file) = &self.tree().get(module).file else {
            return Vec::new();
        };
        match self.public_names_of(file).as_ref() {
            Some(public) => public.clone(),
            None => self
                .exports_of(file)
                .iter()
                .filter(|s| !s.name.starts_with('_'))
                .map(|s| s.name.clone())
                .collect(),
        }
    }

    fn is_public(&self, module: ModuleRef, name: &str) -> bool {
        let Some(file) = &self.tree().get(module).file else {
            return false;
        };
        match self.public_names_of(file).as_ref() {
            Some(public) => public.iter().any(|p| p == name),
            None => !name.starts_with('_'),
        }
    }
}

/// Collect identifier chains referenced under `node`, skipping imports and
/// names being bound rather than read.
fn references(file: &ParsedFile, node: Node, refs: &mut BTreeSet<Vec<String>>) {
    match node.kind() {
        "import_statement" | "import_from_statement" | "future_import_statement" => {}
        "identifier" | "attribute" => match chain(file, node) {
            Some(chain) => {
                refs.insert(chain);
            }
            None => {
                if let Some(object) = node.child_by_field_name("object") {
                    references(file, object, refs);
                }
            }
        },
        "function_definition" | "class_definition" => {
            let name = node.child_by_field_name("name").map(|n| n.id());
            for child in named_children(node) {
                if Some(child.id()) != name {
                    references(file, child, refs);
                }
            }
        }
        "assignment" => {
            for field in ["right", "type"] {
                if let Some(child) = node.child_by_field_name(field) {
                    references(file, child, refs);
                }
            }
        }
        "keyword_argument" => {
            if let Some(value) = node.child_by_field_name("value") {
                references(file, value, refs);
            }
        }
        "parameters" | "lambda_parameters" => {
            for parameter in named_children(node) {
                for field in ["type", "value"] {
                    if let Some(child) = parameter.child_by_field_name(field) {
                        references(file, child, refs);
                    }
                }
            }
        }
        _ => {
            for child in named_children(node) {
                references(file, child, refs);
            }
        }
    }
}

/// `a.b.c` as `["a", "b", "c"]` when built from plain identifiers only.
fn chain(file: &ParsedFile, node: Node) -> Option<Vec<String>> {
    match node.kind() {
        "identifier" => Some(vec![file.text(node).to_string()]),
        "attribute" => {
            let mut parts = chain(file, node.child_by_field_name("object")?)?;
            parts.push(file.text(node.child_by_field_name("attribute")?).to_string());
            Some(parts)
        }
        _ => None,
    }
}
