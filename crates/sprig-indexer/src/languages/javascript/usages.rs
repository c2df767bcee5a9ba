//! JS/TS usage resolver

use super::exports::DEFAULT_EXPORT;
use super::JavaScriptPlugin;
use crate::plugin::{ExportedSymbol, ExternalModule, ImportKind, ImportStatement, SymbolUsage};
use crate::project::ParsedFile;
use crate::syntax::visit_within;
use sprig_core::{FileId, SymbolId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub(super) enum Target {
    Internal(FileId),
    External(ExternalModule),
}

#[derive(Debug, Clone)]
enum Binding {
    /// `import * as ns`, `const ns = require(...)`
    Namespace(Target),
    Item { target: Target, name: String },
}

#[derive(Debug, Clone)]
enum Resolved {
    Symbol { file: FileId, id: SymbolId },
    Module(FileId),
    External { module: ExternalModule, item: Option<String> },
}

type Visited = BTreeSet<(FileId, String)>;

#[derive(Default)]
struct References {
    names: BTreeSet<String>,
    /// `ns.member` and `ns.Type` pairs.
    members: BTreeSet<(String, String)>,
}

pub(super) fn resolve(
    plugin: &JavaScriptPlugin,
    file: &ParsedFile,
    exports: &[ExportedSymbol],
    imports: &[ImportStatement],
) -> Vec<SymbolUsage> {
    let mut usages = Vec::new();
    for import in imports {
        usages.extend(plugin.resolve_module(file, &import.specifier).file_scope_usages());
    }

    let bindings = bind(plugin, file, imports);
    let own: BTreeMap<&str, &str> = exports
        .iter()
        .map(|s| (s.name.as_str(), s.id.as_str()))
        .collect();

    for symbol in exports {
        let from = Some(symbol.id.as_str());
        let refs = references(file, symbol);

        for name in &refs.names {
            if let Some(binding) = bindings.get(name) {
                usages.push(plugin.binding_usage(from, name, binding));
            } else if let Some(id) = own.get(name.as_str()) {
                if *id != symbol.id {
                    usages.push(SymbolUsage::internal(from, file.id.clone(), name.clone(), *id));
                }
            }
        }

        for (head, member) in &refs.members {
            if let Some(Binding::Namespace(target)) = bindings.get(head) {
                let local = format!("{head}.{member}");
                usages.extend(plugin.member_usage(from, &local, target, member));
            }
        }
    }

    usages
}

fn bind(
    plugin: &JavaScriptPlugin,
    file: &ParsedFile,
    imports: &[ImportStatement],
) -> BTreeMap<String, Binding> {
    let mut bindings = BTreeMap::new();

    // re-exports bind nothing locally
    for import in imports.iter().filter(|i| !i.reexport) {
        let target = plugin.target_of(file, &import.specifier);
        match import.kind {
            ImportKind::Normal => {
                if let Some(alias) = &import.alias {
                    bindings.insert(alias.clone(), Binding::Namespace(target));
                }
            }
            ImportKind::Selective => {
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

fn references(file: &ParsedFile, symbol: &ExportedSymbol) -> References {
    let mut refs = References::default();

    visit_within(file.root(), &symbol.span, &mut |node| {
        match node.kind() {
            "identifier" | "type_identifier" | "shorthand_property_identifier" => {
                refs.names.insert(file.text(node).to_string());
            }
            "member_expression" => {
                let object = node.child_by_field_name("object");
                let property = node.child_by_field_name("property");
                if let (Some(object), Some(property)) = (object, property) {
                    if object.kind() == "identifier" {
                        refs.members.insert((
                            file.text(object).to_string(),
                            file.text(property).to_string(),
                        ));
                    }
                }
            }
            "nested_type_identifier" => {
                let module = node.child_by_field_name("module");
                let name = node.child_by_field_name("name");
                if let (Some(module), Some(name)) = (module, name) {
                    if module.kind() == "identifier" {
                        refs.members
                            .insert((file.text(module).to_string(), file.text(name).to_string()));
                    }
                }
            }
            _ => {}
        }
        true
    });

    refs.names.remove(&symbol.name);
    refs
}

impl JavaScriptPlugin<'_> {
    fn binding_usage(&self, from: Option<&str>, local: &str, binding: &Binding) -> SymbolUsage {
        let resolved = match binding {
            Binding::Namespace(Target::Internal(file)) => Resolved::Module(file.clone()),
            Binding::Namespace(Target::External(module)) => Resolved::External {
                module: module.clone(),
                item: None,
            },
            Binding::Item {
                target: Target::External(module),
                name,
            } => Resolved::External {
                module: module.clone(),
                item: Some(name.clone()),
            },
            // a named binding falls back to the default export
            Binding::Item {
                target: Target::Internal(file),
                name,
            } => self
                .resolve_export(file, name, &mut Visited::new())
                .or_else(|| self.resolve_export(file, DEFAULT_EXPORT, &mut Visited::new()))
                .unwrap_or_else(|| Resolved::Module(file.clone())),
        };
        usage_of(from, local, resolved)
    }

    fn member_usage(
        &self,
        from: Option<&str>,
        local: &str,
        target: &Target,
        member: &str,
    ) -> Option<SymbolUsage> {
        let resolved = match target {
            Target::Internal(file) => self.resolve_export(file, member, &mut Visited::new())?,
            Target::External(module) => Resolved::External {
                module: module.clone(),
                item: Some(member.to_string()),
            },
        };
        Some(usage_of(from, local, resolved))
    }

    /// Find the declaration behind export `name` of `file`, following
    /// `export ... from` statements and export clauses over imports.
    fn resolve_export(&self, file: &str, name: &str, visited: &mut Visited) -> Option<Resolved> {
        if !visited.insert((file.to_string(), name.to_string())) {
            tracing::debug!("re-export cycle at {}#{}", file, name);
            return None;
        }

        let exports = self.exports_of(file);
        if let Some(symbol) = exports.symbols.iter().find(|s| s.exported && s.answers_to(name)) {
            return Some(Resolved::Symbol {
                file: file.to_string(),
                id: symbol.id.clone(),
            });
        }

        let parsed = self.project.file(file)?;
        let imports = self.imports_of(file);

        // `import { x } from 'm'; export { x as y }`
        if let Some(clause) = exports.clauses.iter().find(|c| c.local() == name) {
            let forwarded = imports
                .iter()
                .filter(|i| !i.reexport)
                .find_map(|import| {
                    let target = self.target_of(parsed, &import.specifier);
                    if import.alias.as_deref() == Some(clause.name.as_str()) {
                        return Some(match target {
                            Target::Internal(file) => Some(Resolved::Module(file)),
                            Target::External(module) => {
                                Some(Resolved::External { module, item: None })
                            }
                        });
                    }
                    let binding = import.bindings.iter().find(|b| b.local() == clause.name)?;
                    Some(match target {
                        Target::Internal(source) => {
                            self.resolve_export(&source, &binding.name, visited)
                        }
                        Target::External(module) => Some(Resolved::External {
                            module,
                            item: Some(binding.name.clone()),
                        }),
                    })
                });
            if let Some(found) = forwarded {
                return found;
            }
        }

        for import in imports.iter().filter(|i| i.reexport) {
            let target = self.target_of(parsed, &import.specifier);
            match (import.kind, import.wildcard) {
                (ImportKind::Normal, _) if import.alias.as_deref() == Some(name) => {
                    return match target {
                        Target::Internal(source) => Some(Resolved::Module(source)),
                        Target::External(module) => Some(Resolved::External { module, item: None }),
                    };
                }
                // `export *` never forwards the default export
                (ImportKind::Selective, true) if name != DEFAULT_EXPORT => {
                    if let Target::Internal(source) = target {
                        if let Some(found) = self.resolve_export(&source, name, visited) {
                            return Some(found);
                        }
                    }
                }
                (ImportKind::Selective, false) => {
                    let Some(binding) = import.bindings.iter().find(|b| b.local() == name) else {
                        continue;
                    };
                    return match target {
                        Target::Internal(source) => {
                            self.resolve_export(&source, &binding.name, visited)
                        }
                        Target::External(module) => Some(Resolved::External {
                            module,
                            item: Some(binding.name.clone()),
                        }),
                    };
                }
                _ => {}
            }
        }
        None
    }
}

fn usage_of(from: Option<&str>, local: &str, resolved: Resolved) -> SymbolUsage {
    match resolved {
        Resolved::Symbol { file, id } => SymbolUsage::internal(from, file, local, id),
        Resolved::Module(file) => SymbolUsage::module(from, file),
        Resolved::External { module, item } => {
            SymbolUsage::external(from, &module, item.as_deref().map(|item| (local, item)))
        }
    }
}
