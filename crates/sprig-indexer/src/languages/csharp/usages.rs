//! C# usage resolver
//!
//! Simple names resolve through alias usings, the enclosing namespace chain,
//! imported namespaces and static-using classes, in that order. Dotted names
//! resolve as fully qualified types. Member calls whose name is a visible
//! extension method link to the declaring static class.

use super::namespaces::{NamespaceIndex, Target};
use super::types::dotted;
use super::usings::alias_target;
use super::CSharpPlugin;
use crate::plugin::{ExportedSymbol, ImportStatement, SymbolUsage};
use crate::project::ParsedFile;
use crate::syntax::visit_within;
use std::collections::{BTreeMap, BTreeSet};

/// What a file's `using`s bring into scope.
struct Scope {
    aliases: BTreeMap<String, String>,
    namespaces: Vec<String>,
    static_classes: Vec<String>,
}

impl Scope {
    fn new(index: &NamespaceIndex, usings: &[ImportStatement]) -> Self {
        let mut scope = Scope {
            aliases: BTreeMap::new(),
            namespaces: Vec::new(),
            static_classes: Vec::new(),
        };

        for using in usings {
            if let Some((local, full)) = alias_target(using) {
                scope.aliases.insert(local.to_string(), full);
            } else if using.is_static {
                if let Some(Target::Type(id)) = index.resolve(&using.specifier) {
                    scope.static_classes.push(id);
                }
            } else if !scope.namespaces.contains(&using.specifier) {
                scope.namespaces.push(using.specifier.clone());
            }
        }
        for global in &index.global_usings {
            if !scope.namespaces.contains(global) {
                scope.namespaces.push(global.clone());
            }
        }
        scope
    }
}

#[derive(Default)]
struct References {
    names: BTreeSet<String>,
    qualified: BTreeSet<String>,
    member_calls: BTreeSet<String>,
}

pub(super) fn resolve(
    plugin: &CSharpPlugin,
    file: &ParsedFile,
    exports: &[ExportedSymbol],
    imports: &[ImportStatement],
) -> Vec<SymbolUsage> {
    let index = plugin.index();
    let scope = Scope::new(index, imports);
    let mut usages = Vec::new();

    for using in imports {
        let specifier = alias_target(using)
            .map_or_else(|| using.specifier.clone(), |(_, full)| full);
        let resolution = plugin.resolve_name(&specifier);
        if resolution.is_external() {
            usages.extend(resolution.file_scope_usages());
        }
    }

    let declared: BTreeMap<String, String> = plugin
        .types_of(&file.id)
        .iter()
        .map(|decl| (decl.id(), decl.namespace.clone()))
        .collect();

    for symbol in exports {
        let from = Some(symbol.id.as_str());
        let namespace = declared.get(&symbol.id).map_or("", String::as_str);
        let refs = references(file, symbol);

        let mut extension_scope: Vec<String> = scope.namespaces.clone();
        let mut enclosing = namespace;
        loop {
            extension_scope.push(enclosing.to_string());
            match enclosing.rsplit_once('.') {
                Some((parent, _)) => enclosing = parent,
                None => break,
            }
        }

        // Parts of a partial type depend on each other.
        if let Some(entry) = index.type_entry(&symbol.id) {
            for part in entry.files.iter().filter(|f| **f != file.id) {
                usages.push(SymbolUsage::internal(from, part.clone(), &symbol.name, &symbol.id));
            }
        }

        let mut link = |local: &str, id: String| {
            if id == symbol.id {
                return;
            }
            let Some(entry) = index.type_entry(&id) else {
                return;
            };
            for target in &entry.files {
                tracing::debug!("{}#{} -> {}#{}", file.id, symbol.id, target, id);
                usages.push(SymbolUsage::internal(from, target.clone(), local, id.clone()));
            }
        };

        for name in &refs.names {
            if let Some(id) = resolve_simple(index, &scope, namespace, name) {
                link(name, id);
            }
        }

        for name in &refs.qualified {
            if let Some(id) = resolve_qualified(index, &scope, namespace, name) {
                link(name, id);
            }
        }

        for method in &refs.member_calls {
            for extension in index.extensions_named(method, &extension_scope) {
                link(method, extension.class.clone());
            }
        }
    }

    usages
}

fn resolve_simple(
    index: &NamespaceIndex,
    scope: &Scope,
    namespace: &str,
    name: &str,
) -> Option<String> {
    if let Some(full) = scope.aliases.get(name) {
        if let Some(Target::Type(id)) = index.resolve(full) {
            return Some(id);
        }
    }
    if let Some(id) = index.lookup_from(namespace, name) {
        return Some(id);
    }
    for imported in &scope.namespaces {
        let id = format!("{imported}.{name}");
        if index.type_entry(&id).is_some() {
            return Some(id);
        }
    }
    scope
        .static_classes
        .iter()
        .find(|class| {
            index
                .type_entry(class)
                .is_some_and(|entry| entry.members.contains(name))
        })
        .cloned()
}

/// Resolve `A.B.C`, trying the longest type prefix first. The head may be
/// an alias or relative to the enclosing or imported namespaces.
fn resolve_qualified(
    index: &NamespaceIndex,
    scope: &Scope,
    namespace: &str,
    name: &str,
) -> Option<String> {
    let parts: Vec<&str> = name.split('.').collect();
    let head = parts.first()?;

    for len in (1..=parts.len()).rev() {
        let candidate = parts[..len].join(".");

        if index.type_entry(&candidate).is_some() {
            return Some(candidate);
        }
        if let Some(full) = scope.aliases.get(*head) {
            let rest = parts[1..len].join(".");
            let id = if rest.is_empty() {
                full.clone()
            } else {
                format!("{full}.{rest}")
            };
            if index.type_entry(&id).is_some() {
                return Some(id);
            }
        }
        if let Some(id) = index.lookup_from(namespace, &candidate) {
            return Some(id);
        }
        for imported in &scope.namespaces {
            let id = format!("{imported}.{candidate}");
            if index.type_entry(&id).is_some() {
                return Some(id);
            }
        }
    }
    None
}

fn references(file: &ParsedFile, symbol: &ExportedSymbol) -> References {
    let mut refs = References::default();

    visit_within(file.root(), &symbol.span, &mut |node| {
        match node.kind() {
            "identifier" => {
                refs.names.insert(file.text(node).to_string());
            }
            "qualified_name" => {
                refs.qualified.insert(dotted(file, node));
                return false;
            }
            "member_access_expression" => {
                let text = dotted(file, node);
                if text.split('.').all(is_identifier) {
                    refs.qualified.insert(text);
                }
            }
            "invocation_expression" => {
                let method = node
                    .child_by_field_name("function")
                    .filter(|f| f.kind() == "member_access_expression")
                    .and_then(|f| f.child_by_field_name("name"));
                if let Some(method) = method {
                    let name = match method.kind() {
                        "generic_name" => method.named_child(0).map(|n| file.text(n)),
                        _ => Some(file.text(method)),
                    };
                    if let Some(name) = name {
                        refs.member_calls.insert(name.to_string());
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

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '@')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
